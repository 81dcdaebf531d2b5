//! Pipeline configuration - adjustable via JSON file or struct literal.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a candidate's final confidence is composed from the raw scores.
///
/// Both policies occur in deployed exports; neither is inferred from the
/// tensor, the caller states which one their model was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// `objectness * class_score`, for models with a trained objectness
    /// channel.
    ObjectnessTimesClass,
    /// `class_score` alone, for models whose objectness channel is
    /// absent or unreliable.
    #[default]
    ClassOnly,
}

/// Detection pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    // === Decoder parameters ===
    pub input_size: u32,            // model input resolution (pixels)
    pub confidence_threshold: f32,  // final-score gate, 0.01-0.99
    pub score_mode: ScoreMode,      // final-score composition policy
    #[serde(default)]
    pub pixel_coords: bool,         // tensor boxes are in input pixels, not 0..1
    #[serde(default)]
    pub class_filter: Option<Vec<usize>>, // restrict decoding to these classes

    // === Suppression parameters ===
    pub iou_threshold: f32,         // same-class overlap gate, 0.1-0.9
    pub max_detections: usize,      // result cap per cycle

    // === Scheduling parameters ===
    pub run_every_n_frames: u32,    // inference cadence
    pub interpolate_detections: bool, // reuse cached results on skipped ticks
    pub hold_frames: u32,           // empty cycles to bridge before clearing

    // === Label tracking parameters ===
    pub position_tolerance: f32,    // same-class merge radius, viewport units
    pub label_lifetime_secs: f32,   // unseen labels evicted after this long
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_size: 640,
            confidence_threshold: 0.25,
            score_mode: ScoreMode::ClassOnly,
            pixel_coords: false,
            class_filter: None,
            iou_threshold: 0.45,
            max_detections: 5,
            run_every_n_frames: 1,
            interpolate_detections: true,
            hold_frames: 5,
            position_tolerance: 0.1,
            label_lifetime_secs: 2.0,
        }
    }
}

impl PipelineConfig {
    /// Loads a configuration from a JSON file. Parse failures and
    /// out-of-range values are fatal; no cycles run with a bad config.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {e}")))?;
        fs::write(path, json)
            .map_err(|e| Error::Config(format!("failed to write {}: {e}", path.display())))?;
        Ok(())
    }

    /// Checks every parameter against its recognized range.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::Config("input_size must be at least 1".into()));
        }
        if !(0.01..=0.99).contains(&self.confidence_threshold) {
            return Err(Error::Config(format!(
                "confidence_threshold {} outside 0.01..=0.99",
                self.confidence_threshold
            )));
        }
        if !(0.1..=0.9).contains(&self.iou_threshold) {
            return Err(Error::Config(format!(
                "iou_threshold {} outside 0.1..=0.9",
                self.iou_threshold
            )));
        }
        if self.max_detections == 0 {
            return Err(Error::Config("max_detections must be at least 1".into()));
        }
        if self.run_every_n_frames == 0 {
            return Err(Error::Config("run_every_n_frames must be at least 1".into()));
        }
        if self.hold_frames == 0 {
            return Err(Error::Config("hold_frames must be at least 1".into()));
        }
        if self.position_tolerance <= 0.0 {
            return Err(Error::Config("position_tolerance must be positive".into()));
        }
        if self.label_lifetime_secs <= 0.0 {
            return Err(Error::Config("label_lifetime_secs must be positive".into()));
        }
        Ok(())
    }
}
