/// Detection data model and algorithms.
///
/// - types:  boxes, detections, class catalog, result sets
/// - nms:    non-maximum suppression
/// - labels: temporal label identity tracking
pub mod labels;
pub mod nms;
pub mod types;

pub use labels::{LabelEvent, LabelTracker, TrackedLabel};
pub use nms::non_max_suppression;
pub use types::{BBox, ClassCatalog, Detection, DetectionSet};
