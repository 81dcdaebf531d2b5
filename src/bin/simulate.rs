//! Synthetic pipeline run.
//!
//! Scripts a drifting detection through stub inference and drives the
//! full decode -> suppress -> track -> publish loop, printing what a
//! renderer would present on every tick. No model runtime required.

use clap::Parser;
use ndarray::{Array3, ArrayD};
use rand::Rng;

use yolo_detect_rs::{
    ClassCatalog, DetectionPipeline, Frame, LabelEvent, PipelineConfig, StubEngine,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Synthetic detection pipeline run", long_about = None)]
struct Args {
    /// Frame ticks to simulate
    #[arg(short, long, default_value_t = 30)]
    ticks: u32,

    /// Run inference every N ticks
    #[arg(short = 'n', long, default_value_t = 3)]
    every: u32,

    /// Confidence threshold
    #[arg(short, long, default_value_t = 0.25)]
    conf: f32,

    /// IoU threshold
    #[arg(long, default_value_t = 0.45)]
    iou: f32,

    /// JSON config file; overrides the flags above
    #[arg(long)]
    config: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig {
            confidence_threshold: args.conf,
            iou_threshold: args.iou,
            run_every_n_frames: args.every,
            ..Default::default()
        },
    };
    let catalog = ClassCatalog::new(vec!["person".into(), "cup".into(), "chair".into()]);

    // Script one strong class-0 box wandering across the viewport, then
    // a few empty cycles so the hold policy is visible at the end.
    let mut rng = rand::thread_rng();
    let mut outputs: Vec<ArrayD<f32>> = Vec::new();
    let cadence = config.run_every_n_frames.max(1);
    let cycles = args.ticks / cadence + 1;
    let mut cx = 0.3_f32;
    let mut cy = 0.4_f32;
    for _ in 0..cycles.saturating_sub(2) {
        cx = (cx + rng.gen_range(-0.02..0.02) + 0.01).clamp(0.15, 0.85);
        cy = (cy + rng.gen_range(-0.02..0.02)).clamp(0.15, 0.85);
        outputs.push(detection_tensor(catalog.len(), cx, cy, 0.2, 0.3, 0, 0.9));
    }
    outputs.push(empty_tensor(catalog.len()));
    outputs.push(empty_tensor(catalog.len()));

    let engine = StubEngine::new(outputs);
    let mut pipeline = DetectionPipeline::new(config, catalog, engine)?;
    let stream = pipeline.detection_stream(64);

    for tick in 1..=args.ticks {
        let frame = Frame {
            pixels: &[],
            width: 640,
            height: 640,
        };
        let outcome = pipeline.step(Some(frame))?;
        println!(
            "tick {tick:>3} [{outcome:?}] showing {} detection(s)",
            pipeline.current().len()
        );
        for event in pipeline.drain_label_events() {
            match event {
                LabelEvent::Created(label) => println!(
                    "         + {} at ({:.2}, {:.2}) conf {:.2}",
                    label.key(),
                    label.position().0,
                    label.position().1,
                    label.score()
                ),
                LabelEvent::Updated(label) => println!(
                    "         ~ {} at ({:.2}, {:.2}) conf {:.2}",
                    label.key(),
                    label.position().0,
                    label.position().1,
                    label.score()
                ),
                LabelEvent::Removed(key) => println!("         - {key}"),
            }
        }
    }

    let published = stream.try_iter().count();
    let stats = pipeline.stats();
    println!(
        "\n{} ticks | {} cycles | {} skipped | {} held | {} published | last {:.2}ms",
        stats.ticks, stats.cycles, stats.skipped, stats.held, published, stats.last_inference_ms
    );
    Ok(())
}

/// `[1, 4+classes, 16]` tensor carrying a single box in slot 0.
fn detection_tensor(
    num_classes: usize,
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    class_id: usize,
    score: f32,
) -> ArrayD<f32> {
    let mut tensor = Array3::<f32>::zeros((1, 4 + num_classes, 16));
    tensor[[0, 0, 0]] = cx;
    tensor[[0, 1, 0]] = cy;
    tensor[[0, 2, 0]] = w;
    tensor[[0, 3, 0]] = h;
    tensor[[0, 4 + class_id, 0]] = score;
    tensor.into_dyn()
}

fn empty_tensor(num_classes: usize) -> ArrayD<f32> {
    Array3::<f32>::zeros((1, 4 + num_classes, 16)).into_dyn()
}
