//! Greedy per-class non-maximum suppression.

use super::types::Detection;

/// Reduces candidate detections to a deduplicated, capped result list.
///
/// Repeatedly selects the remaining candidate with the globally highest
/// score (ties go to the earliest input position) and suppresses every
/// remaining candidate of the same class overlapping it above
/// `iou_threshold`. Stops once `max_detections` results are kept or no
/// candidates remain.
///
/// The result is sorted by descending score, holds at most
/// `max_detections` entries, contains no same-class pair with IoU above
/// `iou_threshold`, and running the suppression on its own output returns
/// it unchanged.
pub fn non_max_suppression(
    candidates: &[Detection],
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<Detection> {
    if candidates.is_empty() || max_detections == 0 {
        return Vec::new();
    }

    let mut alive = vec![true; candidates.len()];
    let mut keep = Vec::with_capacity(max_detections.min(candidates.len()));

    while keep.len() < max_detections {
        // strict comparison keeps the earliest candidate on score ties
        let mut best: Option<usize> = None;
        for (i, det) in candidates.iter().enumerate() {
            if !alive[i] {
                continue;
            }
            if best.map_or(true, |b| det.score() > candidates[b].score()) {
                best = Some(i);
            }
        }
        let Some(b) = best else {
            break;
        };
        alive[b] = false;

        for (i, det) in candidates.iter().enumerate() {
            if alive[i]
                && det.class_id() == candidates[b].class_id()
                && det.bbox().iou(&candidates[b].bbox()) > iou_threshold
            {
                alive[i] = false;
            }
        }
        keep.push(candidates[b]);
    }

    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::types::BBox;

    fn det(class_id: usize, score: f32, x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection::new(class_id, score, BBox::new(x, y, w, h))
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let kept = non_max_suppression(&[], 0.5, 5);
        assert!(kept.is_empty());
    }

    #[test]
    fn suppresses_same_class_overlap() {
        // two boxes of the same class with heavy overlap: only the
        // stronger one survives
        let candidates = vec![
            det(3, 0.7, 0.10, 0.10, 0.40, 0.40),
            det(3, 0.9, 0.11, 0.11, 0.40, 0.40),
        ];
        let kept = non_max_suppression(&candidates, 0.5, 5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score(), 0.9);
    }

    #[test]
    fn keeps_overlapping_boxes_of_different_classes() {
        let candidates = vec![
            det(1, 0.9, 0.10, 0.10, 0.40, 0.40),
            det(2, 0.8, 0.10, 0.10, 0.40, 0.40),
        ];
        let kept = non_max_suppression(&candidates, 0.5, 5);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn caps_result_at_max_detections() {
        // five disjoint candidates, cap of two: only the top two by score
        let candidates = vec![
            det(0, 0.5, 0.0, 0.0, 0.1, 0.1),
            det(0, 0.9, 0.2, 0.0, 0.1, 0.1),
            det(0, 0.3, 0.4, 0.0, 0.1, 0.1),
            det(0, 0.7, 0.6, 0.0, 0.1, 0.1),
            det(0, 0.1, 0.8, 0.0, 0.1, 0.1),
        ];
        let kept = non_max_suppression(&candidates, 0.5, 2);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score(), 0.9);
        assert_eq!(kept[1].score(), 0.7);
    }

    #[test]
    fn output_is_sorted_by_descending_score() {
        let candidates = vec![
            det(0, 0.4, 0.0, 0.0, 0.1, 0.1),
            det(1, 0.8, 0.3, 0.3, 0.1, 0.1),
            det(2, 0.6, 0.6, 0.6, 0.1, 0.1),
        ];
        let kept = non_max_suppression(&candidates, 0.5, 5);
        let scores: Vec<f32> = kept.iter().map(Detection::score).collect();
        assert_eq!(scores, vec![0.8, 0.6, 0.4]);
    }

    #[test]
    fn no_kept_same_class_pair_exceeds_threshold() {
        let candidates = vec![
            det(0, 0.9, 0.10, 0.10, 0.30, 0.30),
            det(0, 0.8, 0.15, 0.15, 0.30, 0.30),
            det(0, 0.7, 0.50, 0.50, 0.30, 0.30),
            det(0, 0.6, 0.52, 0.52, 0.30, 0.30),
        ];
        let kept = non_max_suppression(&candidates, 0.45, 10);
        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                if a.class_id() == b.class_id() {
                    assert!(a.bbox().iou(&b.bbox()) <= 0.45);
                }
            }
        }
    }

    #[test]
    fn suppression_is_idempotent() {
        let candidates = vec![
            det(0, 0.9, 0.10, 0.10, 0.30, 0.30),
            det(0, 0.8, 0.12, 0.12, 0.30, 0.30),
            det(1, 0.7, 0.50, 0.50, 0.20, 0.20),
            det(1, 0.6, 0.80, 0.10, 0.15, 0.15),
        ];
        let once = non_max_suppression(&candidates, 0.5, 5);
        let twice = non_max_suppression(&once, 0.5, 5);
        assert_eq!(once, twice);
    }

    #[test]
    fn score_ties_break_to_earliest_candidate() {
        let candidates = vec![
            det(0, 0.8, 0.00, 0.00, 0.10, 0.10),
            det(0, 0.8, 0.50, 0.50, 0.10, 0.10),
        ];
        let kept = non_max_suppression(&candidates, 0.5, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].bbox().x(), 0.00);
    }
}
