use polybatch::GraphicsGeometry;

/// Something observable about a compiled geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Check {
    Batchable(bool),
    BatchParts(usize),
    DrawCalls(usize),
    VertexCount(usize),
    WideIndices(bool),
    /// Hit test at a point in graphics space.
    Contains { x: f32, y: f32, inside: bool },
}

/// A single expectation to validate after the batches are built.
#[derive(Debug, Clone, Copy)]
pub struct GeometryExpectation {
    pub check: Check,
    /// Human-readable label for failure messages.
    pub label: &'static str,
}

impl GeometryExpectation {
    pub fn new(check: Check, label: &'static str) -> Self {
        Self { check, label }
    }

    pub fn batchable(expected: bool, label: &'static str) -> Self {
        Self::new(Check::Batchable(expected), label)
    }

    pub fn batch_parts(count: usize, label: &'static str) -> Self {
        Self::new(Check::BatchParts(count), label)
    }

    pub fn draw_calls(count: usize, label: &'static str) -> Self {
        Self::new(Check::DrawCalls(count), label)
    }

    pub fn vertex_count(count: usize, label: &'static str) -> Self {
        Self::new(Check::VertexCount(count), label)
    }

    pub fn wide_indices(expected: bool, label: &'static str) -> Self {
        Self::new(Check::WideIndices(expected), label)
    }

    /// Convenience: expect the point to hit a filled shape.
    pub fn inside(x: f32, y: f32, label: &'static str) -> Self {
        Self::new(Check::Contains { x, y, inside: true }, label)
    }

    /// Convenience: expect the point to miss every filled shape.
    pub fn outside(x: f32, y: f32, label: &'static str) -> Self {
        Self::new(Check::Contains { x, y, inside: false }, label)
    }
}

/// Builds the geometry's batches and validates every expectation against them.
///
/// Returns a list of human-readable failure descriptions. An empty list means
/// all expectations passed.
pub fn check_geometry(
    geometry: &mut GraphicsGeometry,
    expectations: &[GeometryExpectation],
) -> Vec<String> {
    geometry.update_batches();

    let mut failures = Vec::new();
    for expectation in expectations {
        let label = expectation.label;
        match expectation.check {
            Check::Batchable(expected) => {
                let actual = geometry.is_batchable();
                if actual != expected {
                    failures.push(format!("[{label}] batchable: expected {expected}, got {actual}"));
                }
            }
            Check::BatchParts(expected) => {
                let actual = geometry.batches().len();
                if actual != expected {
                    failures.push(format!("[{label}] batch parts: expected {expected}, got {actual}"));
                }
            }
            Check::DrawCalls(expected) => {
                let actual = geometry.draw_calls().len();
                if actual != expected {
                    failures.push(format!("[{label}] draw calls: expected {expected}, got {actual}"));
                }
            }
            Check::VertexCount(expected) => {
                let actual = geometry.vertex_count();
                if actual != expected {
                    failures.push(format!("[{label}] vertices: expected {expected}, got {actual}"));
                }
            }
            Check::WideIndices(expected) => {
                let actual = geometry.index_buffer().is_wide();
                if actual != expected {
                    failures.push(format!(
                        "[{label}] 32-bit indices: expected {expected}, got {actual}"
                    ));
                }
            }
            Check::Contains { x, y, inside } => {
                let actual = geometry.contains_point(x, y);
                if actual != inside {
                    failures.push(format!(
                        "[{label}] point ({x}, {y}): expected inside={inside}, got inside={actual}"
                    ));
                }
            }
        }
    }

    failures
}
