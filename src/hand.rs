//! Hand landmark data model and the landmark provider boundary.

use anyhow::anyhow;
use tract_onnx::prelude::{tract_ndarray, Tensor};

use crate::image::Frame;
use crate::nn::{InputLayout, Model};

/// Number of landmarks per detected hand. The topology is externally defined and fixed.
pub const NUM_LANDMARKS: usize = 21;

/// Names for the hand landmarks.
///
/// # Terminology
///
/// - **CMC**: Carpometacarpal joint, the lowest joint of the thumb, located near the wrist.
/// - **MCP**: Metacarpophalangeal joint, the lower joint forming the knuckles near the palm.
/// - **PIP**: Proximal Interphalangeal joint, the joint between the MCP and DIP.
/// - **DIP**: Distal Interphalangeal joint, the highest joint of a finger.
/// - **Tip**: placed on the tip of the finger, above the DIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandmarkIdx {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexFingerMcp,
    IndexFingerPip,
    IndexFingerDip,
    IndexFingerTip,
    MiddleFingerMcp,
    MiddleFingerPip,
    MiddleFingerDip,
    MiddleFingerTip,
    RingFingerMcp,
    RingFingerPip,
    RingFingerDip,
    RingFingerTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Index pairs describing which landmarks are connected when drawing the hand skeleton.
///
/// This is part of the landmark provider's fixed topology; it is only used for drawing.
pub const CONNECTIVITY: &[(LandmarkIdx, LandmarkIdx)] = {
    use LandmarkIdx::*;
    &[
        // Surround the palm:
        (Wrist, ThumbCmc),
        (ThumbCmc, IndexFingerMcp),
        (IndexFingerMcp, MiddleFingerMcp),
        (MiddleFingerMcp, RingFingerMcp),
        (RingFingerMcp, PinkyMcp),
        (PinkyMcp, Wrist),
        // Thumb:
        (ThumbCmc, ThumbMcp),
        (ThumbMcp, ThumbIp),
        (ThumbIp, ThumbTip),
        // Index:
        (IndexFingerMcp, IndexFingerPip),
        (IndexFingerPip, IndexFingerDip),
        (IndexFingerDip, IndexFingerTip),
        // Middle:
        (MiddleFingerMcp, MiddleFingerPip),
        (MiddleFingerPip, MiddleFingerDip),
        (MiddleFingerDip, MiddleFingerTip),
        // Ring:
        (RingFingerMcp, RingFingerPip),
        (RingFingerPip, RingFingerDip),
        (RingFingerDip, RingFingerTip),
        // Pinky:
        (PinkyMcp, PinkyPip),
        (PinkyPip, PinkyDip),
        (PinkyDip, PinkyTip),
    ]
};

/// The landmarks of one detected hand, in normalized image coordinates.
///
/// Each landmark is an `[x, y]` pair with both coordinates in `0.0..=1.0`, relative to the frame's
/// width and height. The order matches [`LandmarkIdx`] and is load-bearing: the feature normalizer
/// emits coordinates in exactly this order.
#[derive(Debug, Clone)]
pub struct HandLandmarks {
    points: Box<[[f32; 2]]>,
}

impl HandLandmarks {
    /// Creates a landmark set from normalized `[x, y]` positions.
    ///
    /// The length is not validated here; consumers that require the fixed topology (the feature
    /// normalizer) check it and report a contract violation.
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self {
            points: points.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the normalized positions in landmark order.
    pub fn positions(&self) -> &[[f32; 2]] {
        &self.points
    }

    /// Returns the position of a named landmark.
    pub fn position(&self, index: LandmarkIdx) -> [f32; 2] {
        self.points[index as usize]
    }

    /// Smallest x and y coordinate over all landmarks of this hand.
    ///
    /// Returns `[0.0, 0.0]` for an empty landmark set.
    pub fn min_xy(&self) -> [f32; 2] {
        let mut min = [f32::INFINITY; 2];
        for &[x, y] in self.points.iter() {
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
        }
        if self.points.is_empty() {
            [0.0, 0.0]
        } else {
            min
        }
    }

}

/// The landmark provider boundary.
///
/// Given a frame, a provider returns zero or more hands, each an ordered set of
/// [`NUM_LANDMARKS`] normalized keypoints. The first hand in the returned order is the one used
/// for classification; all hands are drawn.
pub trait DetectLandmarks {
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<Vec<HandLandmarks>>;
}

impl<D: DetectLandmarks + ?Sized> DetectLandmarks for &mut D {
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<Vec<HandLandmarks>> {
        (**self).detect(frame)
    }
}

/// Default presence threshold below which a hand is considered absent.
const PRESENCE_THRESHOLD: f32 = 0.3;

/// A hand-landmark estimation network loaded from an ONNX file.
///
/// The network takes one full camera frame (stretched to its input size) and outputs 21 screen
/// landmarks in input-pixel units plus a presence flag. This matches the MediaPipe hand landmark
/// models. At most one hand is reported per frame.
pub struct OnnxLandmarker {
    model: Model,
    layout: InputLayout,
    input_w: usize,
    input_h: usize,
    threshold: f32,
}

impl OnnxLandmarker {
    /// Loads the landmark network from an `.onnx` file.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let model = Model::load(path.as_ref())?;
        let (layout, input_w, input_h) = model.image_input_layout()?;
        Ok(Self {
            model,
            layout,
            input_w,
            input_h,
            threshold: PRESENCE_THRESHOLD,
        })
    }

    /// Sets the presence threshold below which detections are discarded.
    pub fn set_presence_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    fn input_tensor(&self, frame: &Frame) -> Tensor {
        let (w, h) = (self.input_w, self.input_h);
        // Nearest-neighbour sample of the (stretched) frame, sRGB mapped linearly to 0..=1.
        let sample = |x: usize, y: usize, c: usize| {
            let fx = (x as f32 / w as f32 * frame.width() as f32) as u32;
            let fy = (y as f32 / h as f32 * frame.height() as f32) as u32;
            let color = frame.get(fx.min(frame.width() - 1), fy.min(frame.height() - 1));
            f32::from(color[c]) / 255.0
        };
        match self.layout {
            InputLayout::Nchw => {
                tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| sample(x, y, c))
                    .into()
            }
            InputLayout::Nhwc => {
                tract_ndarray::Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| sample(x, y, c))
                    .into()
            }
        }
    }
}

impl DetectLandmarks for OnnxLandmarker {
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<Vec<HandLandmarks>> {
        anyhow::ensure!(
            frame.width() > 0 && frame.height() > 0,
            "cannot run landmark detection on an empty frame"
        );

        let outputs = self.model.run(self.input_tensor(frame))?;
        anyhow::ensure!(
            outputs.len() >= 2,
            "landmark network must output screen landmarks and a presence flag"
        );

        let landmarks = outputs[0].as_slice::<f32>()?;
        let presence = outputs[1].as_slice::<f32>()?[0];
        if presence < self.threshold {
            return Ok(Vec::new());
        }

        // The network emits [x, y, z] triplets in input-pixel units; z is dropped and x/y are
        // mapped back to normalized frame coordinates.
        if landmarks.len() != NUM_LANDMARKS * 3 {
            return Err(anyhow!(
                "unexpected landmark output length {} (want {})",
                landmarks.len(),
                NUM_LANDMARKS * 3
            ));
        }
        let points = landmarks
            .chunks_exact(3)
            .map(|lm| {
                [
                    (lm[0] / self.input_w as f32).clamp(0.0, 1.0),
                    (lm[1] / self.input_h as f32).clamp(0.0, 1.0),
                ]
            })
            .collect();

        Ok(vec![HandLandmarks::new(points)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_covers_all_landmarks() {
        let mut seen = [false; NUM_LANDMARKS];
        for &(a, b) in CONNECTIVITY {
            seen[a as usize] = true;
            seen[b as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn min_xy_over_landmarks() {
        let hand = HandLandmarks::new(vec![[0.2, 0.8], [0.5, 0.3], [0.4, 0.4]]);
        assert_eq!(hand.min_xy(), [0.2, 0.3]);
    }
}
