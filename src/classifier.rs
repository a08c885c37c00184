//! The classifier boundary.
//!
//! The trained classifier is an opaque model blob loaded once at startup. It consumes one feature
//! vector and yields a class index in `0..36`. Absence of the blob is a normal, user-visible
//! condition ("no trained model"), not a crash.

use std::path::Path;

use tract_onnx::prelude::Tensor;

use crate::error::Error;
use crate::features::{FeatureVector, FEATURE_LEN};
use crate::labels::NUM_CLASSES;
use crate::nn::Model;

/// A classifier mapping feature vectors to class indices.
pub trait Classify: Send + Sync {
    /// Predicts the class index for one feature vector. The result is always in
    /// `0..`[`NUM_CLASSES`].
    fn predict(&self, features: &FeatureVector) -> anyhow::Result<u8>;
}

/// A persisted classifier loaded from an ONNX file.
///
/// Loading validates the model against the feature layout: its input must accept exactly
/// [`FEATURE_LEN`] floats and its output must score all [`NUM_CLASSES`] classes. A model trained
/// against a different feature ordering of the same length cannot be caught here; datasets record
/// [`crate::features::FEATURE_LAYOUT`] so that mismatch is caught at training time instead.
#[derive(Debug)]
pub struct OnnxClassifier {
    model: Model,
    input_shape: Vec<usize>,
}

impl OnnxClassifier {
    /// Loads the classifier from an `.onnx` file.
    ///
    /// Fails with [`Error::ModelNotLoaded`] if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ModelNotLoaded.into());
        }

        let model = Model::load(path)?;
        let input_shape = model.input_shape()?;
        let len: usize = input_shape.iter().product();
        anyhow::ensure!(
            len == FEATURE_LEN,
            "classifier input takes {} values, the feature normalizer produces {}",
            len,
            FEATURE_LEN,
        );
        Ok(Self { model, input_shape })
    }
}

/// Shapes a feature vector into the input tensor a model declared.
fn input_tensor(shape: &[usize], features: &FeatureVector) -> anyhow::Result<Tensor> {
    Ok(Tensor::from_shape(shape, features.as_slice())?)
}

impl Classify for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> anyhow::Result<u8> {
        let input = input_tensor(&self.input_shape, features)?;
        let outputs = self.model.run(input)?;
        let scores = outputs[0].as_slice::<f32>()?;
        anyhow::ensure!(
            scores.len() == NUM_CLASSES,
            "classifier scored {} classes, expected {}",
            scores.len(),
            NUM_CLASSES,
        );

        Ok(argmax(scores) as u8)
    }
}

/// Index of the highest score. Ties resolve to the first maximum.
fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::features;
    use crate::hand::{HandLandmarks, NUM_LANDMARKS};

    #[test]
    fn input_tensor_follows_the_declared_shape() {
        let hand = HandLandmarks::new(vec![[0.1, 0.2]; NUM_LANDMARKS]);
        let features = features::extract(&hand).unwrap();
        // Models declaring a flat [42] input must not be fed a [1, 42] tensor.
        assert_eq!(
            input_tensor(&[FEATURE_LEN], &features).unwrap().shape(),
            &[FEATURE_LEN],
        );
        assert_eq!(
            input_tensor(&[1, FEATURE_LEN], &features).unwrap().shape(),
            &[1, FEATURE_LEN],
        );
    }

    #[test]
    fn argmax_picks_highest() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[2.0, -1.0, 0.5]), 0);
    }

    #[test]
    fn argmax_ties_resolve_to_first() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
    }

    #[test]
    fn missing_model_is_reported() {
        let err = OnnxClassifier::load("does-not-exist.onnx").unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::ModelNotLoaded));
    }
}
