/// Pipeline orchestration.
///
/// One synchronous state machine per session:
/// - session: AwaitingCamera -> AwaitingModel -> Running -> Faulted
/// - cycle:   Idle -> Decoding -> Suppressing -> Published
pub mod orchestrator;

pub use orchestrator::{
    CyclePhase, DetectionPipeline, PipelineStats, SessionState, StepOutcome,
};
