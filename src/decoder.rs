//! Decodes raw model output tensors into candidate detections.

use crate::config::{PipelineConfig, ScoreMode};
use crate::detection::types::{BBox, Detection};
use crate::tensor::TensorView;

/// Turns one inference output into gated, normalized candidates.
///
/// Per-candidate anomalies (degenerate boxes, sub-threshold scores) are
/// filtered, never escalated; shape problems are caught when the tensor
/// view is constructed, before decoding starts.
pub struct Decoder {
    input_size: f32,
    pixel_coords: bool,
    confidence_threshold: f32,
    score_mode: ScoreMode,
    class_filter: Option<Vec<usize>>,
    max_candidates: usize,
}

impl Decoder {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            input_size: config.input_size as f32,
            pixel_coords: config.pixel_coords,
            confidence_threshold: config.confidence_threshold,
            score_mode: config.score_mode,
            class_filter: config.class_filter.clone(),
            // worst-case cost guard: scanning stops once this many
            // candidates have been accepted
            max_candidates: config.max_detections.saturating_mul(3),
        }
    }

    pub fn decode(&self, view: &TensorView) -> Vec<Detection> {
        let class_base = if view.has_objectness() { 5 } else { 4 };
        let num_classes = view.channels() - class_base;
        let mut candidates = Vec::new();

        for i in 0..view.detections() {
            if candidates.len() >= self.max_candidates {
                break;
            }

            let mut cx = view.value(i, 0);
            let mut cy = view.value(i, 1);
            let mut w = view.value(i, 2);
            let mut h = view.value(i, 3);
            if self.pixel_coords {
                cx /= self.input_size;
                cy /= self.input_size;
                w /= self.input_size;
                h /= self.input_size;
            }
            if w <= 0. || h <= 0. {
                continue;
            }

            let objectness = if view.has_objectness() {
                view.value(i, 4)
            } else {
                1.0
            };

            // argmax over the class channels; the lowest index wins ties
            let mut best: Option<(usize, f32)> = None;
            for c in 0..num_classes {
                let class_score = view.value(i, class_base + c);
                if class_score.is_nan() {
                    continue;
                }
                if best.map_or(true, |(_, s)| class_score > s) {
                    best = Some((c, class_score));
                }
            }
            let Some((class_id, class_score)) = best else {
                continue;
            };

            let score = match self.score_mode {
                ScoreMode::ObjectnessTimesClass => objectness * class_score,
                ScoreMode::ClassOnly => class_score,
            };
            if score <= self.confidence_threshold {
                continue;
            }
            if let Some(filter) = &self.class_filter {
                if !filter.contains(&class_id) {
                    continue;
                }
            }

            candidates.push(Detection::new(
                class_id,
                score,
                BBox::new(cx - w / 2., cy - h / 2., w, h),
            ));
        }

        candidates
    }
}
