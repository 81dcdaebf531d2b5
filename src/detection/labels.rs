//! Temporal identity tracking for rendered labels.
//!
//! Detections carry no identity from cycle to cycle; this module gives
//! them one so a renderer can move an existing label instead of tearing
//! it down and recreating it every cycle.

use std::time::{Duration, Instant};

use log::debug;

use super::types::{BBox, ClassCatalog, Detection};

/// A label with stable identity across update cycles.
#[derive(Debug, Clone)]
pub struct TrackedLabel {
    key: String,
    class_id: usize,
    class_name: String,
    score: f32,
    position: (f32, f32),
    bbox: BBox,
    last_seen: Instant,
}

impl TrackedLabel {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn position(&self) -> (f32, f32) {
        self.position
    }

    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }
}

/// Incremental update for the presentation collaborator.
#[derive(Debug, Clone)]
pub enum LabelEvent {
    Created(TrackedLabel),
    Updated(TrackedLabel),
    Removed(String),
}

/// Keyed label store with class + proximity matching.
///
/// A detection updates the nearest unclaimed label of its class within
/// `position_tolerance`; otherwise it creates a label under a freshly
/// generated key. Labels unseen for longer than `label_lifetime` are
/// evicted. Each label is claimed by at most one detection per cycle.
pub struct LabelTracker {
    labels: Vec<TrackedLabel>,
    next_id: u64,
    position_tolerance: f32,
    label_lifetime: Duration,
}

impl LabelTracker {
    pub fn new(position_tolerance: f32, label_lifetime: Duration) -> Self {
        Self {
            labels: Vec::new(),
            next_id: 0,
            position_tolerance,
            label_lifetime,
        }
    }

    /// Feeds one cycle's detections into the store.
    pub fn update(&mut self, detections: &[Detection], catalog: &ClassCatalog) -> Vec<LabelEvent> {
        self.update_at(detections, catalog, Instant::now())
    }

    /// Same as [`update`](Self::update) with an injected clock.
    pub fn update_at(
        &mut self,
        detections: &[Detection],
        catalog: &ClassCatalog,
        now: Instant,
    ) -> Vec<LabelEvent> {
        let mut events = Vec::new();
        let mut claimed = vec![false; self.labels.len()];

        for det in detections {
            let center = det.bbox().center();

            // nearest unclaimed label of the same class within tolerance
            let mut best: Option<(usize, f32)> = None;
            for (idx, label) in self.labels.iter().enumerate() {
                if claimed[idx] || label.class_id != det.class_id() {
                    continue;
                }
                let dist = distance(center, label.position);
                if dist < self.position_tolerance && best.map_or(true, |(_, d)| dist < d) {
                    best = Some((idx, dist));
                }
            }

            match best {
                Some((idx, _)) => {
                    claimed[idx] = true;
                    let label = &mut self.labels[idx];
                    label.position = center;
                    label.bbox = det.bbox();
                    label.score = det.score();
                    label.last_seen = now;
                    events.push(LabelEvent::Updated(label.clone()));
                }
                None => {
                    let class_name = catalog
                        .name(det.class_id())
                        .unwrap_or("unknown")
                        .to_string();
                    self.next_id += 1;
                    let label = TrackedLabel {
                        key: format!("{}-{}", class_name, self.next_id),
                        class_id: det.class_id(),
                        class_name,
                        score: det.score(),
                        position: center,
                        bbox: det.bbox(),
                        last_seen: now,
                    };
                    claimed.push(true);
                    events.push(LabelEvent::Created(label.clone()));
                    self.labels.push(label);
                }
            }
        }

        // evict labels unseen for longer than the lifetime
        let mut idx = 0;
        while idx < self.labels.len() {
            if now.duration_since(self.labels[idx].last_seen) > self.label_lifetime {
                let label = self.labels.remove(idx);
                debug!("label {} expired", label.key);
                events.push(LabelEvent::Removed(label.key));
            } else {
                idx += 1;
            }
        }

        events
    }

    pub fn labels(&self) -> &[TrackedLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}
