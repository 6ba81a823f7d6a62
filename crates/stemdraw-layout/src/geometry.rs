use std::collections::BTreeMap;
use stemdraw_core::{Scene, SceneObject};

/// Working coordinates during a solve: object centers, keyed by id.
pub type Centers = BTreeMap<String, (f64, f64)>;

/// Axis-aligned bounding box around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn around(center: (f64, f64), object: &SceneObject) -> Self {
        let (w, h) = (object.dimensions.width(), object.dimensions.height());
        Self {
            min_x: center.0 - w / 2.0,
            min_y: center.1 - h / 2.0,
            max_x: center.0 + w / 2.0,
            max_y: center.1 + h / 2.0,
        }
    }

    pub fn overlaps(&self, other: &BBox) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Overlap area; zero when disjoint.
    pub fn intersection_area(&self, other: &BBox) -> f64 {
        let w = (self.max_x.min(other.max_x) - self.min_x.max(other.min_x)).max(0.0);
        let h = (self.max_y.min(other.max_y) - self.min_y.max(other.min_y)).max(0.0);
        w * h
    }

    pub fn inside(&self, width: f64, height: f64) -> bool {
        self.min_x >= 0.0 && self.min_y >= 0.0 && self.max_x <= width && self.max_y <= height
    }
}

pub fn euclidean(a: (f64, f64), b: (f64, f64)) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Objects the geometric solvers position directly: everything except
/// labels (placed post-solve) and endpoint-derived connectors.
pub fn solvable<'a>(scene: &'a Scene) -> impl Iterator<Item = &'a SceneObject> {
    scene
        .objects
        .iter()
        .filter(|o| o.label_target.is_none() && !is_connector(o))
}

pub fn is_connector(object: &SceneObject) -> bool {
    object.properties.contains_key("from") && object.properties.contains_key("to")
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{Dimensions, PrimitiveKind};

    #[test]
    fn bbox_overlap_detection() {
        let a = SceneObject::new("a", PrimitiveKind::Rect, Dimensions::rect(100.0, 100.0));
        let left = BBox::around((100.0, 100.0), &a);
        let near = BBox::around((150.0, 100.0), &a);
        let far = BBox::around((300.0, 100.0), &a);
        assert!(left.overlaps(&near));
        assert!(!left.overlaps(&far));
        assert!(left.intersection_area(&near) > 0.0);
        assert_eq!(left.intersection_area(&far), 0.0);
    }
}
