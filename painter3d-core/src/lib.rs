/// Painter3D core library: software 3D rendering onto 2D polygon surfaces
///
/// Geometry is projected through a trackball camera, culled, shaded and sorted
/// back to front, then handed to a 2D drawing surface as flat polygons.
/// Nothing here touches a GPU or a window; front-ends implement
/// [`render::DrawingSurface`] and [`camera::InteractionSurface`].

pub mod camera;
pub mod color;
pub mod error;
pub mod geometry;
pub mod lighting;
pub mod obj;
pub mod projection;
pub mod render;
pub mod stl;
pub mod trackball;
pub mod transform;

// Re-export commonly used types
pub use camera::{Camera, CameraConfig, InteractionEvent, InteractionSurface, PointerButton, ScrollDirection};
pub use color::{Color, Colormap, FaceColors, FaceFill};
pub use error::{GeometryError, Result};
pub use geometry::Mesh;
pub use lighting::Light;
pub use projection::ProjectionMode;
pub use render::{CullMode, DrawingSurface, LayerId, MemorySurface, Polygon, PolygonBatch, Renderer};
pub use trackball::Trackball;
pub use transform::Transform;
