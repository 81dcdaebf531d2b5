//! Real-time object-detection post-processing for YOLO-family models:
//! raw output tensor decoding, non-maximum suppression, and per-frame
//! orchestration with frame skipping, result holding and label identity
//! tracking.
//!
//! Model execution, camera capture and rendering are external
//! collaborators behind narrow seams ([`engine::InferenceEngine`] in,
//! [`detection::DetectionSet`] and [`detection::LabelEvent`] out).

pub mod config; // pipeline parameters
pub mod decoder; // tensor -> candidate detections
pub mod detection; // data model, NMS, label tracking
pub mod engine; // inference collaborator seam
pub mod error;
pub mod pipeline; // per-frame orchestration
pub mod tensor; // raw output layout dispatch

pub use crate::config::{PipelineConfig, ScoreMode};
pub use crate::decoder::Decoder;
pub use crate::detection::{
    non_max_suppression, BBox, ClassCatalog, Detection, DetectionSet, LabelEvent, LabelTracker,
    TrackedLabel,
};
pub use crate::engine::{Frame, InferenceEngine, StubEngine};
pub use crate::error::{Error, Result};
pub use crate::pipeline::{
    CyclePhase, DetectionPipeline, PipelineStats, SessionState, StepOutcome,
};
pub use crate::tensor::{TensorLayout, TensorView};
