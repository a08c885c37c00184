//! Landmark-to-feature normalization.
//!
//! Classifier inputs are built from one hand's landmarks by shifting every coordinate by the
//! per-hand minimum, which makes the vector invariant to the hand's position in the frame (but
//! not to scale or rotation).
//!
//! The output ordering — x then y per landmark, in landmark order — is a hard contract with the
//! trained classifier: a mismatch produces garbage predictions with no detectable error. It is
//! therefore named by [`FEATURE_LAYOUT`], which is recorded in built datasets and must match the
//! layout the persisted classifier was trained with.

use crate::error::Error;
use crate::hand::{HandLandmarks, NUM_LANDMARKS};

/// Length of a feature vector: one x and one y component per landmark.
pub const FEATURE_LEN: usize = NUM_LANDMARKS * 2;

/// Version tag for the feature ordering produced by [`extract`].
pub const FEATURE_LAYOUT: &str = "xy-interleaved-minshift-v1";

/// A fixed-length, translation-invariant classifier input derived from one hand.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Derives the feature vector for one hand.
///
/// The output contains `(x_i - min_x, y_i - min_y)` for every landmark `i`, interleaved x then y,
/// in the same order as the input landmarks. Pure and deterministic.
///
/// Fails with [`Error::InvalidInput`] if the landmark count does not match the fixed topology;
/// that indicates a broken landmark provider, not a runtime condition.
pub fn extract(hand: &HandLandmarks) -> anyhow::Result<FeatureVector> {
    if hand.len() != NUM_LANDMARKS {
        return Err(Error::InvalidInput {
            expected: NUM_LANDMARKS,
            got: hand.len(),
        }
        .into());
    }

    let [min_x, min_y] = hand.min_xy();
    let mut features = [0.0; FEATURE_LEN];
    for (i, &[x, y]) in hand.positions().iter().enumerate() {
        features[i * 2] = x - min_x;
        features[i * 2 + 1] = y - min_y;
    }
    Ok(FeatureVector(features))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::Error;

    fn hand_from(points: Vec<[f32; 2]>) -> HandLandmarks {
        HandLandmarks::new(points)
    }

    fn synthetic_hand() -> HandLandmarks {
        let points = (0..NUM_LANDMARKS)
            .map(|i| {
                let t = i as f32 / NUM_LANDMARKS as f32;
                [0.25 + t * 0.4, 0.9 - t * 0.5]
            })
            .collect();
        hand_from(points)
    }

    #[test]
    fn output_length_and_translation_invariance() {
        let features = extract(&synthetic_hand()).unwrap();
        assert_eq!(features.as_slice().len(), FEATURE_LEN);

        let min_x = features
            .as_slice()
            .iter()
            .step_by(2)
            .fold(f32::INFINITY, |a, &b| a.min(b));
        let min_y = features
            .as_slice()
            .iter()
            .skip(1)
            .step_by(2)
            .fold(f32::INFINITY, |a, &b| a.min(b));
        assert_abs_diff_eq!(min_x, 0.0);
        assert_abs_diff_eq!(min_y, 0.0);
    }

    #[test]
    fn shifted_hands_yield_equal_features() {
        let base = synthetic_hand();
        let shifted = hand_from(
            base.positions()
                .iter()
                .map(|&[x, y]| [x + 0.05, y - 0.2])
                .collect(),
        );

        let a = extract(&base).unwrap();
        let b = extract(&shifted).unwrap();
        for (&x, &y) in a.as_slice().iter().zip(b.as_slice()) {
            assert_abs_diff_eq!(x, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn identical_points_yield_zero_vector() {
        let hand = hand_from(vec![[0.37, 0.62]; NUM_LANDMARKS]);
        let features = extract(&hand).unwrap();
        assert!(features.as_slice().iter().all(|&f| f == 0.0));
    }

    #[test]
    fn ordering_follows_input_order() {
        let mut points = vec![[0.5, 0.5]; NUM_LANDMARKS];
        points[0] = [0.1, 0.2];
        points[4] = [0.9, 0.8];
        let features = extract(&hand_from(points)).unwrap();

        // min is (0.1, 0.2); landmark 4 lands at vector slots 8 and 9.
        assert_abs_diff_eq!(features.as_slice()[8], 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(features.as_slice()[9], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn wrong_landmark_count_is_invalid_input() {
        let err = extract(&hand_from(vec![[0.0, 0.0]; 5])).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::InvalidInput {
                expected: NUM_LANDMARKS,
                got: 5
            })
        );
    }
}
