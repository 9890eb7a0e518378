//! GPU buffers for one [`GraphicsGeometry`].
//!
//! [`GeometryBuffers::upload`] copies the packed vertices and indices into `wgpu` buffers
//! whenever the geometry's batch stamp has moved, growing the buffers only when they are
//! too small. [`GeometryBuffers::draw`] then records one indexed draw per draw call, or
//! one per batch part for batchable geometry, and hands pipeline and texture binding to
//! the caller.

use crate::batch::PrimitiveType;
use crate::geometry::GraphicsGeometry;
use crate::texture::Texture;
use tracing::debug;
use wgpu::util::DeviceExt;

#[derive(Debug, Clone, Copy)]
struct BufferSizingDecision {
    should_reallocate: bool,
}

fn decide_buffer_sizing(existing_size: Option<u64>, required_size: usize) -> BufferSizingDecision {
    let required_size = required_size as u64;
    let should_reallocate = existing_size
        .map(|size| size < required_size)
        .unwrap_or(true);

    BufferSizingDecision { should_reallocate }
}

fn upsert_gpu_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    buffer: &mut Option<wgpu::Buffer>,
    label: &'static str,
    bytes: &[u8],
    usage: wgpu::BufferUsages,
) {
    let decision =
        decide_buffer_sizing(buffer.as_ref().map(|existing| existing.size()), bytes.len());

    if decision.should_reallocate {
        *buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytes,
            usage,
        }));
    } else if let Some(existing_buffer) = buffer.as_ref() {
        queue.write_buffer(existing_buffer, 0, bytes);
    }
}

/// Copies `bytes` into `scratch`, zero padded to the buffer copy alignment.
fn pad_to_copy_alignment<'a>(bytes: &[u8], scratch: &'a mut Vec<u8>) -> &'a [u8] {
    let alignment = wgpu::COPY_BUFFER_ALIGNMENT as usize;
    let padded_len = bytes.len().div_ceil(alignment) * alignment;

    scratch.clear();
    scratch.extend_from_slice(bytes);
    scratch.resize(padded_len, 0);
    scratch
}

/// Maps a draw call's primitive onto the pipeline topology that renders it.
pub fn primitive_topology(primitive: PrimitiveType) -> wgpu::PrimitiveTopology {
    match primitive {
        PrimitiveType::Triangles => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveType::Lines => wgpu::PrimitiveTopology::LineList,
    }
}

/// What the caller must bind before an indexed draw is recorded.
#[derive(Debug, Clone, Copy)]
pub struct DrawBinding<'a> {
    pub primitive: PrimitiveType,
    /// Texture for each slot the draw's vertices reference through their texture id.
    pub textures: &'a [Texture],
}

/// GPU copies of one geometry's packed buffers.
#[derive(Debug, Default)]
pub struct GeometryBuffers {
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_format: Option<wgpu::IndexFormat>,
    uploaded_batch_dirty: Option<u64>,
    index_scratch: Vec<u8>,
}

impl GeometryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the geometry's batches and uploads them if they changed since the last call.
    ///
    /// Returns whether anything was written to the GPU.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        geometry: &mut GraphicsGeometry,
    ) -> bool {
        geometry.update_batches();

        let batch_dirty = geometry.batch_dirty();
        if self.uploaded_batch_dirty == Some(batch_dirty) {
            return false;
        }
        self.uploaded_batch_dirty = Some(batch_dirty);

        let vertex_bytes = geometry.packed_bytes();
        let index_buffer = geometry.index_buffer();
        if vertex_bytes.is_empty() || index_buffer.is_empty() {
            self.index_format = None;
            return false;
        }

        upsert_gpu_buffer(
            device,
            queue,
            &mut self.vertex_buffer,
            "Geometry Vertex Buffer",
            vertex_bytes,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );

        let index_bytes = pad_to_copy_alignment(index_buffer.as_bytes(), &mut self.index_scratch);
        upsert_gpu_buffer(
            device,
            queue,
            &mut self.index_buffer,
            "Geometry Index Buffer",
            index_bytes,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        );
        self.index_format = Some(index_buffer.format());

        debug!(
            vertex_bytes = vertex_bytes.len(),
            index_bytes = index_bytes.len(),
            batch_dirty,
            "uploaded geometry buffers"
        );
        true
    }

    /// Records the geometry's draws into `pass`.
    ///
    /// `bind` runs before each draw and must set the pipeline for the binding's primitive
    /// and bind its textures. Nothing is recorded until the geometry has been uploaded.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        geometry: &GraphicsGeometry,
        mut bind: impl FnMut(&mut wgpu::RenderPass<'_>, DrawBinding<'_>),
    ) {
        let (Some(vertex_buffer), Some(index_buffer), Some(index_format)) =
            (&self.vertex_buffer, &self.index_buffer, self.index_format)
        else {
            return;
        };

        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_index_buffer(index_buffer.slice(..), index_format);

        if geometry.is_batchable() {
            for part in geometry.batches() {
                let Some(style) = part.style() else {
                    continue;
                };
                bind(
                    pass,
                    DrawBinding {
                        primitive: part.primitive(),
                        textures: std::slice::from_ref(&style.texture),
                    },
                );
                pass.draw_indexed(
                    part.index_start() as u32..part.index_end() as u32,
                    part.attrib_start() as i32,
                    0..1,
                );
            }
        } else {
            for call in geometry.draw_calls() {
                if call.size() == 0 {
                    continue;
                }
                bind(
                    pass,
                    DrawBinding {
                        primitive: call.primitive(),
                        textures: call.textures(),
                    },
                );
                let start = call.start() as u32;
                pass.draw_indexed(start..start + call.size() as u32, 0, 0..1);
            }
        }
    }
}
