use std::collections::BTreeMap;

use anyhow::{anyhow, Result};

use crate::frame::Frame;
use crate::labels::LabelSet;
use crate::model::Model;

use super::preprocess::preprocess;
use super::result::PredictionResult;

/// Classify a frame, degrading every failure to `None`.
///
/// A missing model or frame short-circuits before any work is done. Forward
/// pass errors are logged and reported as `None`.
pub fn infer(
    model: Option<&Model>,
    labels: &LabelSet,
    frame: Option<&Frame>,
) -> Option<PredictionResult> {
    let Some(model) = model else {
        log::debug!("inference skipped: no model loaded");
        return None;
    };
    let Some(frame) = frame else {
        log::debug!("inference skipped: no frame");
        return None;
    };

    match try_infer(model, labels, frame) {
        Ok(result) => Some(result),
        Err(err) => {
            log::warn!("inference failed: {:#}", err);
            None
        }
    }
}

/// Preprocess, run the forward pass and reduce to a top-1 result.
pub fn try_infer(model: &Model, labels: &LabelSet, frame: &Frame) -> Result<PredictionResult> {
    let input = preprocess(frame)?;
    let probs = model.forward(&input)?;
    reduce(probs, labels)
}

/// Reduce a probability vector to a `PredictionResult`.
///
/// Ties resolve to the lowest index. Indices past the end of `labels` are
/// named `class_<index>`.
pub fn reduce(probs: Vec<f32>, labels: &LabelSet) -> Result<PredictionResult> {
    let index = argmax(&probs).ok_or_else(|| anyhow!("model produced an empty output vector"))?;

    let all: BTreeMap<String, f32> = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| (labels.name_for(i).into_owned(), p))
        .collect();

    Ok(PredictionResult {
        index,
        label: labels.name_for(index).into_owned(),
        confidence: probs[index],
        all,
        scores: probs,
    })
}

/// Index of the largest value, first occurrence on ties. A NaN compares
/// above everything, so the first NaN wins and its confidence fails any
/// threshold.
fn argmax(values: &[f32]) -> Option<usize> {
    if let Some(nan) = values.iter().position(|v| v.is_nan()) {
        return Some(nan);
    }
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if best.map_or(true, |(_, top)| v > top) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InputTensor;
    use crate::model::Classifier;

    struct Fixed(Vec<f32>);

    impl Classifier for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn forward(&self, input: &InputTensor) -> Result<Vec<f32>> {
            assert_eq!(input.shape(), [1, 224, 224, 3]);
            Ok(self.0.clone())
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn forward(&self, _input: &InputTensor) -> Result<Vec<f32>> {
            Err(anyhow!("device lost"))
        }
    }

    fn model(probs: Vec<f32>) -> Model {
        Model::new("fixed", Box::new(Fixed(probs)))
    }

    #[test]
    fn picks_top_class() -> Result<()> {
        let labels = LabelSet::from(&["safe", "unsafe"][..]);
        let result = reduce(vec![0.2, 0.8], &labels)?;
        assert_eq!(result.index, 1);
        assert_eq!(result.label, "unsafe");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.all.get("safe"), Some(&0.2));
        assert_eq!(result.all.get("unsafe"), Some(&0.8));
        Ok(())
    }

    #[test]
    fn ties_break_to_lowest_index() -> Result<()> {
        let result = reduce(vec![0.1, 0.45, 0.45], &LabelSet::default())?;
        assert_eq!(result.index, 1);
        assert_eq!(result.label, "class_1");
        Ok(())
    }

    #[test]
    fn short_label_set_synthesizes_names() -> Result<()> {
        let labels = LabelSet::from(&["safe"][..]);
        let result = reduce(vec![0.3, 0.7], &labels)?;
        assert_eq!(result.index, 1);
        assert_eq!(result.label, "class_1");
        assert_eq!(result.all.keys().collect::<Vec<_>>(), vec!["class_1", "safe"]);
        Ok(())
    }

    #[test]
    fn first_nan_wins_and_fails_thresholds() -> Result<()> {
        let result = reduce(vec![0.4, f32::NAN, 0.6, f32::NAN], &LabelSet::default())?;
        assert_eq!(result.index, 1);
        assert!(!result.meets(0.0));
        Ok(())
    }

    #[test]
    fn empty_output_is_an_error() {
        assert!(reduce(Vec::new(), &LabelSet::default()).is_err());
    }

    #[test]
    fn distribution_matches_argmax() -> Result<()> {
        let labels = LabelSet::from(&["a", "b", "c", "d"][..]);
        let frame = Frame::filled(640, 480, [40, 80, 120])?;
        let m = model(vec![0.1, 0.2, 0.6, 0.1]);

        let result = infer(Some(&m), &labels, Some(&frame)).expect("prediction");
        let total: f32 = result.all.values().sum();
        assert!((total - 1.0).abs() < 1e-5);

        let (best_label, best_p) = result
            .all
            .iter()
            .fold(("", f32::MIN), |acc, (k, &v)| if v > acc.1 { (k.as_str(), v) } else { acc });
        assert_eq!(best_label, result.label);
        assert_eq!(best_p, result.confidence);
        assert_eq!(result.index, 2);
        Ok(())
    }

    #[test]
    fn missing_model_or_frame_short_circuits() -> Result<()> {
        let labels = LabelSet::default();
        let frame = Frame::filled(8, 8, [0, 0, 0])?;
        let m = model(vec![1.0]);

        assert!(infer(None, &labels, Some(&frame)).is_none());
        assert!(infer(Some(&m), &labels, None).is_none());
        assert!(infer(Some(&m), &labels, Some(&frame)).is_some());
        Ok(())
    }

    #[test]
    fn forward_errors_degrade_to_none() -> Result<()> {
        let broken = Model::new("broken", Box::new(Broken));
        let frame = Frame::filled(8, 8, [0, 0, 0])?;
        assert!(infer(Some(&broken), &LabelSet::default(), Some(&frame)).is_none());
        assert!(try_infer(&broken, &LabelSet::default(), &frame).is_err());
        Ok(())
    }
}
