//! The inference collaborator seam.
//!
//! Model loading, GPU dispatch and image preprocessing live behind this
//! trait; the pipeline only sees preprocessed frames going in and raw
//! output tensors coming out.

use anyhow::Result;
use ndarray::ArrayD;

/// One preprocessed camera frame, sized to the model input resolution.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
}

/// External model-execution collaborator.
pub trait InferenceEngine {
    /// True once the engine can accept frames. The pipeline idles until
    /// this reports ready.
    fn ready(&self) -> bool {
        true
    }

    /// Runs the model on one frame and returns the raw output tensor,
    /// shaped `[1, channels, detections]` or `[1, detections, channels]`.
    fn infer(&mut self, frame: &Frame) -> Result<ArrayD<f32>>;
}

/// Replays scripted output tensors, cycling when the script runs out.
/// Used by tests and the simulator binary.
pub struct StubEngine {
    outputs: Vec<ArrayD<f32>>,
    cursor: usize,
}

impl StubEngine {
    pub fn new(outputs: Vec<ArrayD<f32>>) -> Self {
        Self { outputs, cursor: 0 }
    }
}

impl InferenceEngine for StubEngine {
    fn infer(&mut self, _frame: &Frame) -> Result<ArrayD<f32>> {
        if self.outputs.is_empty() {
            anyhow::bail!("stub engine has no scripted outputs");
        }
        let output = self.outputs[self.cursor % self.outputs.len()].clone();
        self.cursor += 1;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn stub_engine_cycles_through_script() {
        let a = Array3::<f32>::from_elem((1, 12, 4), 1.0).into_dyn();
        let b = Array3::<f32>::from_elem((1, 12, 4), 2.0).into_dyn();
        let mut engine = StubEngine::new(vec![a.clone(), b.clone()]);
        let frame = Frame {
            pixels: &[],
            width: 640,
            height: 640,
        };
        assert_eq!(engine.infer(&frame).unwrap(), a);
        assert_eq!(engine.infer(&frame).unwrap(), b);
        assert_eq!(engine.infer(&frame).unwrap(), a);
    }

    #[test]
    fn empty_script_is_an_error() {
        let mut engine = StubEngine::new(Vec::new());
        let frame = Frame {
            pixels: &[],
            width: 640,
            height: 640,
        };
        assert!(engine.infer(&frame).is_err());
    }
}
