//! Batching pipeline for vector graphics geometry.
//!
//! Shapes are recorded into a [`GraphicsGeometry`] together with their fill and line
//! styles. When the batches are requested, new shapes are tessellated with `lyon`, grouped
//! into [`BatchPart`]s by style, and either packed for an external batch renderer or
//! compiled into [`BatchDrawCall`]s that each bind a bounded number of textures.
//! [`GeometryBuffers`] takes the packed output to the GPU through `wgpu`.
//!
//! ```
//! use polybatch::{Color, FillStyle, GraphicsGeometry, LineStyle, Shape};
//!
//! let mut geometry = GraphicsGeometry::new();
//! geometry.draw_shape(
//!     Shape::rect(0.0, 0.0, 100.0, 50.0),
//!     FillStyle::solid(Color::rgb(200, 40, 40)),
//!     LineStyle::default(),
//!     None,
//! );
//! geometry.update_batches();
//!
//! assert!(geometry.is_batchable());
//! assert_eq!(geometry.batches().len(), 1);
//! assert_eq!(geometry.packed_bytes().len(), 4 * 24);
//! ```

pub use lyon;
pub use wgpu;

mod batch;
mod color;
mod config;
mod geometry;
mod pool;
mod record;
mod shape;
mod style;
mod tessellation;
mod texture;
mod upload;
mod vertex;

pub use batch::{BatchDrawCall, BatchPart, PrimitiveType};
pub use color::Color;
pub use config::GeometryConfig;
pub use geometry::{GraphicsGeometry, IndexBuffer};
pub use lyon::tessellation::{LineCap, LineJoin};
pub use pool::{get_global_pool_manager, initialize_global_pool_manager, PoolManager};
pub use record::ShapeRecord;
pub use shape::{
    BorderRadii, Circle, Ellipse, Polygon, PolygonBuilder, Rectangle, RoundedRectangle, Shape,
};
pub use style::{mergeable, BatchStyle, FillStyle, LineStyle};
pub use tessellation::{TessellationCounts, TessellationError, Tessellator};
pub use texture::{BaseTexture, Frame, Texture, TextureError, TextureId, WrapMode};
pub use upload::{primitive_topology, DrawBinding, GeometryBuffers};
pub use vertex::BatchVertex;
