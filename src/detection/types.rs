//! Detection data model: boxes, detections, class catalog, result sets.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// An axis-aligned bounding box in normalized viewport coordinates.
///
/// `x`/`y` is the top-left corner; all four fields are fractions of the
/// image dimensions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl BBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmax(&self) -> f32 {
        self.x + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2., self.y + self.height / 2.)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &BBox) -> f32 {
        let l = self.x.max(another.x);
        let r = self.xmax().min(another.xmax());
        let t = self.y.max(another.y);
        let b = self.ymax().min(another.ymax());
        (r - l).max(0.) * (b - t).max(0.)
    }

    pub fn union(&self, another: &BBox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    /// Intersection over union; `0.0` when the union is empty.
    pub fn iou(&self, another: &BBox) -> f32 {
        let union = self.union(another);
        if union <= 0. {
            return 0.;
        }
        self.intersection_area(another) / union
    }
}

/// One scored detection. Value type; never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    class_id: usize,
    score: f32,
    bbox: BBox,
}

impl Detection {
    pub fn new(class_id: usize, score: f32, bbox: BBox) -> Self {
        Self {
            class_id,
            score,
            bbox,
        }
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }
}

/// Ordered, fixed list of class names; a `class_id` indexes into it.
///
/// Configured once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ClassCatalog {
    names: Vec<String>,
}

impl ClassCatalog {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Loads a label file with one class name per line. Blank lines and
    /// surrounding whitespace are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;
        let names: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// The published result of one completed inference cycle.
///
/// Detections are sorted by descending score. `cycle` is the monotonic
/// number of the inference cycle that produced them; a set is superseded
/// by the next cycle's result, never mutated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionSet {
    cycle: u64,
    detections: Vec<Detection>,
}

impl DetectionSet {
    pub fn new(cycle: u64, detections: Vec<Detection>) -> Self {
        Self { cycle, detections }
    }

    pub fn empty(cycle: u64) -> Self {
        Self {
            cycle,
            detections: Vec::new(),
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn iou_is_symmetric() {
        let a = BBox::new(0.1, 0.1, 0.4, 0.4);
        let b = BBox::new(0.3, 0.3, 0.4, 0.4);
        assert!(close(a.iou(&b), b.iou(&a)));
        assert!(a.iou(&b) > 0.);
    }

    #[test]
    fn iou_with_itself_is_one() {
        let a = BBox::new(0.2, 0.3, 0.5, 0.4);
        assert!(close(a.iou(&a), 1.0));
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = BBox::new(0.0, 0.0, 0.2, 0.2);
        let b = BBox::new(0.5, 0.5, 0.2, 0.2);
        assert!(close(a.iou(&b), 0.0));
    }

    #[test]
    fn iou_guards_empty_union() {
        let a = BBox::new(0.1, 0.1, 0.0, 0.0);
        assert!(close(a.iou(&a), 0.0));
    }

    #[test]
    fn catalog_resolves_names_in_order() {
        let catalog = ClassCatalog::new(vec!["person".into(), "cup".into()]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.name(0), Some("person"));
        assert_eq!(catalog.name(1), Some("cup"));
        assert_eq!(catalog.name(2), None);
    }
}
