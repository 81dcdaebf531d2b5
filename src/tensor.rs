//! Layout-independent view over raw detection output tensors.
//!
//! Different export pipelines transpose the model output: the same
//! network may come back as `[1, channels, detections]` or
//! `[1, detections, channels]`. The view resolves the orientation once
//! per tensor and downstream code addresses values by logical field.

use ndarray::ArrayD;

use crate::error::{Error, Result};

/// Physical layout of a `[1, A, B]` detection output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[batch, channels, detections]`
    ChannelsFirst,
    /// `[batch, detections, channels]`
    DetectionsFirst,
}

/// Uniform accessor over one raw output tensor.
pub struct TensorView<'a> {
    data: &'a ArrayD<f32>,
    layout: TensorLayout,
    detections: usize,
    channels: usize,
    has_objectness: bool,
}

impl<'a> TensorView<'a> {
    /// Resolves the tensor orientation and validates the channel schema.
    ///
    /// The larger of the two trailing dimensions is taken as the
    /// detection count, the smaller as the channel count; a square
    /// tensor resolves to channels-first. The channel count must be
    /// `4 + num_classes` (box only) or `5 + num_classes` (box plus an
    /// objectness channel); anything else is an invalid-shape error.
    pub fn wrap(output: &'a ArrayD<f32>, num_classes: usize) -> Result<Self> {
        let shape = output.shape();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(Error::InvalidShape(format!(
                "expected a [1, A, B] output tensor, got {:?}",
                shape
            )));
        }

        let (a, b) = (shape[1], shape[2]);
        let (layout, channels, detections) = if a <= b {
            (TensorLayout::ChannelsFirst, a, b)
        } else {
            (TensorLayout::DetectionsFirst, b, a)
        };

        let has_objectness = if channels == num_classes + 5 {
            true
        } else if channels == num_classes + 4 {
            false
        } else {
            return Err(Error::InvalidShape(format!(
                "channel count {} matches neither {} (box + {} classes) nor {} (box + objectness + {} classes)",
                channels,
                num_classes + 4,
                num_classes,
                num_classes + 5,
                num_classes
            )));
        };

        Ok(Self {
            data: output,
            layout,
            detections,
            channels,
            has_objectness,
        })
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    pub fn detections(&self) -> usize {
        self.detections
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn has_objectness(&self) -> bool {
        self.has_objectness
    }

    /// Value of one logical field of one detection slot.
    #[inline]
    pub fn value(&self, detection: usize, channel: usize) -> f32 {
        match self.layout {
            TensorLayout::ChannelsFirst => self.data[[0, channel, detection]],
            TensorLayout::DetectionsFirst => self.data[[0, detection, channel]],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn resolves_channels_first() {
        // 80 classes without objectness: 84 channels, 8400 slots
        let output = Array3::<f32>::zeros((1, 84, 8400)).into_dyn();
        let view = TensorView::wrap(&output, 80).unwrap();
        assert_eq!(view.layout(), TensorLayout::ChannelsFirst);
        assert_eq!(view.channels(), 84);
        assert_eq!(view.detections(), 8400);
        assert!(!view.has_objectness());
    }

    #[test]
    fn resolves_detections_first() {
        let output = Array3::<f32>::zeros((1, 8400, 85)).into_dyn();
        let view = TensorView::wrap(&output, 80).unwrap();
        assert_eq!(view.layout(), TensorLayout::DetectionsFirst);
        assert_eq!(view.channels(), 85);
        assert_eq!(view.detections(), 8400);
        assert!(view.has_objectness());
    }

    #[test]
    fn square_tensor_resolves_to_channels_first() {
        let output = Array3::<f32>::zeros((1, 12, 12)).into_dyn();
        let view = TensorView::wrap(&output, 8).unwrap();
        assert_eq!(view.layout(), TensorLayout::ChannelsFirst);
    }

    #[test]
    fn accessor_is_layout_independent() {
        let mut cf = Array3::<f32>::zeros((1, 12, 20));
        cf[[0, 3, 7]] = 0.42;
        let mut df = Array3::<f32>::zeros((1, 20, 12));
        df[[0, 7, 3]] = 0.42;

        let cf = cf.into_dyn();
        let df = df.into_dyn();
        let cf_view = TensorView::wrap(&cf, 8).unwrap();
        let df_view = TensorView::wrap(&df, 8).unwrap();
        assert_eq!(cf_view.value(7, 3), 0.42);
        assert_eq!(df_view.value(7, 3), 0.42);
    }

    #[test]
    fn rejects_wrong_rank() {
        let output = ndarray::Array2::<f32>::zeros((84, 8400)).into_dyn();
        assert!(matches!(
            TensorView::wrap(&output, 80),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn rejects_wrong_batch_size() {
        let output = Array3::<f32>::zeros((2, 84, 8400)).into_dyn();
        assert!(matches!(
            TensorView::wrap(&output, 80),
            Err(Error::InvalidShape(_))
        ));
    }

    #[test]
    fn rejects_unknown_channel_schema() {
        // 10 channels can't be 4+80 or 5+80
        let output = Array3::<f32>::zeros((1, 10, 8400)).into_dyn();
        assert!(matches!(
            TensorView::wrap(&output, 80),
            Err(Error::InvalidShape(_))
        ));
    }
}
