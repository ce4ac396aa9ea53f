/// Headless surface keeping the latest batch of every layer in memory
use crate::camera::InteractionSurface;

use super::{DrawingSurface, LayerId, Polygon, PolygonBatch};

/// In-memory drawing and interaction surface.
///
/// Useful for offscreen rendering and for driving a camera without a window:
/// it records layers, the view extent, the status text and how many redraws
/// were requested.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    layers: Vec<PolygonBatch>,
    extent: f32,
    status: String,
    redraws: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            extent: 1.0,
            status: String::new(),
            redraws: 0,
        }
    }

    pub fn layer(&self, layer: LayerId) -> Option<&PolygonBatch> {
        self.layers.get(layer.0)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Every polygon in paint order, layer by layer
    pub fn polygons(&self) -> impl Iterator<Item = &Polygon> {
        self.layers.iter().flat_map(|batch| batch.polygons.iter())
    }

    /// Half-width of the visible region around the origin
    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn redraws(&self) -> usize {
        self.redraws
    }
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawingSurface for MemorySurface {
    fn add_layer(&mut self) -> LayerId {
        self.layers.push(PolygonBatch::default());
        LayerId(self.layers.len() - 1)
    }

    fn replace_polygons(&mut self, layer: LayerId, batch: &PolygonBatch) {
        match self.layers.get_mut(layer.0) {
            Some(slot) => slot.clone_from(batch),
            None => log::warn!("ignoring polygons for unknown layer {layer:?}"),
        }
    }
}

impl InteractionSurface for MemorySurface {
    fn set_extent(&mut self, extent: f32) {
        self.extent = extent;
    }

    fn set_status(&mut self, status: &str) {
        self.status.clear();
        self.status.push_str(status);
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use nalgebra::Point2;

    #[test]
    fn test_layers_are_replaced_not_appended() {
        let mut surface = MemorySurface::new();
        let a = surface.add_layer();
        let b = surface.add_layer();
        assert_eq!((a, b), (LayerId(0), LayerId(1)));

        let polygon = Polygon {
            points: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)],
            fill: Color::WHITE,
            edge: Color::BLACK,
            line_width: 1.0,
        };
        let batch = PolygonBatch {
            polygons: vec![polygon.clone(), polygon],
            antialiased: true,
        };
        surface.replace_polygons(a, &batch);
        surface.replace_polygons(a, &batch);
        assert_eq!(surface.layer(a).map(PolygonBatch::len), Some(2));
        assert_eq!(surface.polygons().count(), 2);

        surface.replace_polygons(LayerId(7), &batch);
        assert_eq!(surface.layer_count(), 2);
    }
}
