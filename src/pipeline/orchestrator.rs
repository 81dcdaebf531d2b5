//! Per-frame orchestration: decode -> suppress -> track -> publish.
//!
//! The pipeline is a synchronous, scheduler-agnostic state machine. The
//! owner calls [`DetectionPipeline::step`] once per frame tick from any
//! loop or thread; at most one inference cycle is in flight at a time
//! and the caller's thread is never blocked beyond the cycle itself.

use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, warn};

use crate::config::PipelineConfig;
use crate::decoder::Decoder;
use crate::detection::labels::{LabelEvent, LabelTracker, TrackedLabel};
use crate::detection::nms::non_max_suppression;
use crate::detection::types::{ClassCatalog, DetectionSet};
use crate::engine::{Frame, InferenceEngine};
use crate::error::{Error, Result};
use crate::tensor::TensorView;

/// Lifecycle of a detection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCamera,
    AwaitingModel,
    Running,
    Faulted,
}

/// Progress of the current inference cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Decoding,
    Suppressing,
    Published,
}

/// What one `step` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A fresh inference cycle ran; `current()` is its result.
    Fresh,
    /// Skipped tick; the cached set is presented unchanged.
    Interpolated,
    /// Fresh cycle came back empty; the previous non-empty set is still
    /// presented.
    Held,
    /// Nothing presented: no new frame, engine not ready, skipped tick
    /// with interpolation off, or a faulted session.
    Skipped,
}

/// Counters and timings for one session.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    pub ticks: u64,
    pub cycles: u64,
    pub skipped: u64,
    pub held: u64,
    pub last_inference_ms: f64,
    pub fps: f64,
}

/// Drives decode, suppression and label tracking over an inference
/// engine, applying the frame-skip and hold policies.
///
/// Sole owner and writer of the cached detection state; consumers only
/// ever receive immutable snapshots.
pub struct DetectionPipeline<E> {
    config: PipelineConfig,
    catalog: ClassCatalog,
    engine: E,
    decoder: Decoder,
    tracker: LabelTracker,

    state: SessionState,
    phase: CyclePhase,
    tick: u64,
    cycle: u64,
    current: DetectionSet,
    last_nonempty: Option<DetectionSet>,
    held_cycles: u32,
    pending_events: Vec<LabelEvent>,
    publisher: Option<Sender<DetectionSet>>,

    stats: PipelineStats,
    fps_window_start: Instant,
    fps_window_cycles: u64,
}

impl<E: InferenceEngine> DetectionPipeline<E> {
    /// Validates the configuration and builds an idle pipeline. A bad
    /// configuration is fatal here; no cycles run.
    pub fn new(config: PipelineConfig, catalog: ClassCatalog, engine: E) -> Result<Self> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(Error::Config("class catalog is empty".into()));
        }
        let decoder = Decoder::new(&config);
        let tracker = LabelTracker::new(
            config.position_tolerance,
            Duration::from_secs_f32(config.label_lifetime_secs),
        );
        Ok(Self {
            config,
            catalog,
            engine,
            decoder,
            tracker,
            state: SessionState::AwaitingCamera,
            phase: CyclePhase::Idle,
            tick: 0,
            cycle: 0,
            current: DetectionSet::default(),
            last_nonempty: None,
            held_cycles: 0,
            pending_events: Vec::new(),
            publisher: None,
            stats: PipelineStats::default(),
            fps_window_start: Instant::now(),
            fps_window_cycles: 0,
        })
    }

    /// Attaches a bounded detection stream. Every fresh cycle's result
    /// is pushed with `try_send`; results are dropped on backpressure
    /// rather than blocking the pipeline. Interpolated and held ticks
    /// never republish, so received sets are in strict cycle order.
    pub fn detection_stream(&mut self, capacity: usize) -> Receiver<DetectionSet> {
        let (tx, rx) = bounded(capacity);
        self.publisher = Some(tx);
        rx
    }

    /// Advances the pipeline by one frame tick. `frame` is `None` when
    /// the camera has no new data this tick.
    pub fn step(&mut self, frame: Option<Frame<'_>>) -> Result<StepOutcome> {
        match self.state {
            SessionState::Faulted => return Ok(StepOutcome::Skipped),
            SessionState::AwaitingCamera => {
                if frame.is_none() {
                    return Ok(StepOutcome::Skipped);
                }
                self.state = SessionState::AwaitingModel;
            }
            _ => {}
        }
        if self.state == SessionState::AwaitingModel {
            if !self.engine.ready() {
                return Ok(StepOutcome::Skipped);
            }
            self.state = SessionState::Running;
        }

        let Some(frame) = frame else {
            return Ok(StepOutcome::Skipped);
        };

        self.tick += 1;
        self.stats.ticks = self.tick;

        // frame-skip policy: inference runs on tick 1, N+1, 2N+1, ...
        let cadence = self.config.run_every_n_frames as u64;
        if (self.tick - 1) % cadence != 0 {
            self.stats.skipped += 1;
            if self.config.interpolate_detections {
                return Ok(StepOutcome::Interpolated);
            }
            self.current = DetectionSet::empty(self.cycle);
            return Ok(StepOutcome::Skipped);
        }

        self.run_cycle(&frame)
    }

    fn run_cycle(&mut self, frame: &Frame) -> Result<StepOutcome> {
        self.cycle += 1;
        self.stats.cycles = self.cycle;
        let started = Instant::now();

        let raw = match self.engine.infer(frame) {
            Ok(tensor) => tensor,
            Err(err) => {
                // session-halting: no further cycles are scheduled and
                // the last good detections stay intact
                self.state = SessionState::Faulted;
                self.phase = CyclePhase::Idle;
                error!("inference failed on cycle {}, halting session: {err:#}", self.cycle);
                return Err(Error::Inference(err));
            }
        };

        self.phase = CyclePhase::Decoding;
        let candidates = match TensorView::wrap(&raw, self.catalog.len()) {
            Ok(view) => self.decoder.decode(&view),
            Err(err) => {
                // recoverable input error: this cycle yields no candidates
                warn!("cycle {}: {err}", self.cycle);
                Vec::new()
            }
        };

        self.phase = CyclePhase::Suppressing;
        let kept = non_max_suppression(
            &candidates,
            self.config.iou_threshold,
            self.config.max_detections,
        );
        let fresh = DetectionSet::new(self.cycle, kept);

        self.phase = CyclePhase::Published;
        let outcome = self.publish(fresh);

        self.stats.last_inference_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.fps_window_cycles += 1;
        let elapsed = self.fps_window_start.elapsed().as_secs_f64();
        if elapsed >= 1.0 {
            self.stats.fps = self.fps_window_cycles as f64 / elapsed;
            self.fps_window_start = Instant::now();
            self.fps_window_cycles = 0;
        }
        if self.cycle % 60 == 0 {
            debug!(
                "cycle {}: showing {} | {:.1}ms | {:.1}fps | skipped {} | held {}",
                self.cycle,
                self.current.len(),
                self.stats.last_inference_ms,
                self.stats.fps,
                self.stats.skipped,
                self.stats.held,
            );
        }

        Ok(outcome)
    }

    fn publish(&mut self, fresh: DetectionSet) -> StepOutcome {
        // label lifetimes run on fresh results regardless of the hold
        // policy, so labels start decaying the moment detections vanish
        self.pending_events = self.tracker.update(fresh.detections(), &self.catalog);

        if fresh.is_empty()
            && self.last_nonempty.is_some()
            && self.held_cycles < self.config.hold_frames
        {
            self.held_cycles += 1;
            self.stats.held += 1;
            return StepOutcome::Held;
        }

        self.held_cycles = 0;
        self.last_nonempty = if fresh.is_empty() {
            None
        } else {
            Some(fresh.clone())
        };
        self.current = fresh;
        if let Some(tx) = &self.publisher {
            let _ = tx.try_send(self.current.clone());
        }
        StepOutcome::Fresh
    }

    /// The set a renderer should present right now.
    pub fn current(&self) -> &DetectionSet {
        &self.current
    }

    /// Label events produced by the most recent fresh cycle.
    pub fn drain_label_events(&mut self) -> Vec<LabelEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn labels(&self) -> &[TrackedLabel] {
        self.tracker.labels()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Tears the session down to its initial state, discarding cached
    /// results, tracked labels and statistics.
    pub fn reset(&mut self) {
        self.state = SessionState::AwaitingCamera;
        self.phase = CyclePhase::Idle;
        self.tick = 0;
        self.cycle = 0;
        self.current = DetectionSet::default();
        self.last_nonempty = None;
        self.held_cycles = 0;
        self.pending_events.clear();
        self.tracker.clear();
        self.stats = PipelineStats::default();
        self.fps_window_start = Instant::now();
        self.fps_window_cycles = 0;
    }
}
