//! The live recognition loop.
//!
//! [`Recognizer`] owns a background worker thread that reads camera frames, locates a hand,
//! classifies its sign, and publishes annotated frames through a bounded channel. The channel
//! holds a single frame; when the consumer lags behind the camera, the newest frame is dropped
//! rather than queued, so the consumer never receives frames out of order.

use std::{
    panic::resume_unwind,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::JoinHandle,
};

use crossbeam::channel::{self, Receiver, TrySendError};

use crate::annotate;
use crate::camera::FrameSource;
use crate::classifier::Classify;
use crate::error::Error;
use crate::features;
use crate::hand::DetectLandmarks;
use crate::image::Frame;
use crate::labels;
use crate::timer::{FpsCounter, Timer};

/// One annotated frame produced by the recognition loop.
pub struct Recognition {
    /// The mirrored camera frame with landmarks, bounding box, and label drawn onto it.
    pub frame: Frame,
    /// The recognized symbol, if a hand was visible and classified.
    pub symbol: Option<char>,
}

/// Runs hand-sign recognition on a background thread.
pub struct Recognizer {
    classifier: Option<Arc<dyn Classify>>,
    worker: Option<Worker>,
}

struct Worker {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Recognizer {
    /// Creates a recognizer with no classifier loaded.
    ///
    /// [`Recognizer::start`] fails with [`Error::ModelNotLoaded`] until a classifier is set.
    pub fn new() -> Self {
        Self {
            classifier: None,
            worker: None,
        }
    }

    /// Sets the classifier used to map hand features to symbols.
    pub fn set_classifier(&mut self, classifier: Arc<dyn Classify>) {
        self.classifier = Some(classifier);
    }

    /// Returns whether the recognition loop is currently running.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |worker| !worker.handle.is_finished())
    }

    /// Starts the recognition loop on a background thread.
    ///
    /// `source` and `landmarker` are moved into the worker, which owns them until it exits.
    /// Returns the receiving end of the frame channel. The loop ends when [`Recognizer::stop`] is
    /// called, the receiver is dropped, or the frame source fails.
    ///
    /// Fails with [`Error::ModelNotLoaded`] if no classifier has been set, and with an error if
    /// the loop is already running.
    pub fn start<S, D>(&mut self, source: S, landmarker: D) -> anyhow::Result<Receiver<Recognition>>
    where
        S: FrameSource + Send + 'static,
        D: DetectLandmarks + Send + 'static,
    {
        let classifier = self.classifier.clone().ok_or(Error::ModelNotLoaded)?;
        if self.is_running() {
            anyhow::bail!("recognition loop is already running");
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = channel::bounded(1);
        let handle = std::thread::Builder::new()
            .name("recognize".into())
            .spawn({
                let cancel = cancel.clone();
                move || recognition_loop(source, landmarker, classifier, sender, cancel)
            })?;

        self.worker = Some(Worker { cancel, handle });
        Ok(receiver)
    }

    /// Stops the recognition loop and waits for the worker thread to exit.
    ///
    /// Does nothing if the loop is not running. If the worker thread panicked, the panic is
    /// propagated to the caller.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.cancel.store(true, Ordering::Relaxed);
            if let Err(payload) = worker.handle.join() {
                resume_unwind(payload);
            }
        }
    }
}

impl Default for Recognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Recognizer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn recognition_loop<S: FrameSource, D: DetectLandmarks>(
    mut source: S,
    mut landmarker: D,
    classifier: Arc<dyn Classify>,
    sender: channel::Sender<Recognition>,
    cancel: Arc<AtomicBool>,
) {
    let mut fps = FpsCounter::new("recognize");
    let t_read = Timer::new("read");
    let t_detect = Timer::new("detect");
    let t_classify = Timer::new("classify");
    while !cancel.load(Ordering::Relaxed) {
        let mut frame = match t_read.time(|| source.read_frame()) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("failed to read camera frame: {e}");
                break;
            }
        };
        frame.flip_horizontal_in_place();

        let hands = match t_detect.time(|| landmarker.detect(&frame)) {
            Ok(hands) => hands,
            Err(e) => {
                log::error!("hand landmarking failed: {e}");
                Vec::new()
            }
        };

        let symbol = t_classify
            .time(|| hands.first().and_then(|hand| classify_hand(&*classifier, hand)));
        annotate::annotate(&mut frame, &hands, symbol);
        fps.tick_with([&t_read, &t_detect, &t_classify]);

        match sender.try_send(Recognition { frame, symbol }) {
            Ok(()) => {}
            // Consumer is still busy with the previous frame; drop this one.
            Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => break,
        }
    }
}

fn classify_hand(classifier: &dyn Classify, hand: &crate::hand::HandLandmarks) -> Option<char> {
    let features = match features::extract(hand) {
        Ok(features) => features,
        Err(e) => {
            log::error!("feature extraction failed: {e}");
            return None;
        }
    };
    let class = match classifier.predict(&features) {
        Ok(class) => class,
        Err(e) => {
            log::error!("classification failed: {e}");
            return None;
        }
    };
    match labels::symbol(class) {
        Some(symbol) => Some(symbol),
        None => {
            log::warn!("classifier produced out-of-range class {class}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::features::FeatureVector;
    use crate::hand::{HandLandmarks, NUM_LANDMARKS};

    /// Yields a fixed number of tiny frames, then fails like a disconnected camera.
    struct CannedSource {
        remaining: u32,
    }

    impl FrameSource for CannedSource {
        fn read_frame(&mut self) -> anyhow::Result<Frame> {
            if self.remaining == 0 {
                return Err(Error::CameraUnavailable.into());
            }
            self.remaining -= 1;
            Ok(Frame::new(32, 32))
        }
    }

    struct OneHand;

    impl DetectLandmarks for OneHand {
        fn detect(&mut self, _frame: &Frame) -> anyhow::Result<Vec<HandLandmarks>> {
            Ok(vec![HandLandmarks::new(vec![[0.5, 0.5]; NUM_LANDMARKS])])
        }
    }

    struct ConstClassifier(u8);

    impl Classify for ConstClassifier {
        fn predict(&self, _features: &FeatureVector) -> anyhow::Result<u8> {
            Ok(self.0)
        }
    }

    #[test]
    fn start_without_classifier_fails_fast() {
        let mut recognizer = Recognizer::new();
        let err = recognizer
            .start(CannedSource { remaining: 1 }, OneHand)
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::ModelNotLoaded));
        assert!(!recognizer.is_running());
    }

    #[test]
    fn recognitions_carry_the_classified_symbol() {
        let mut recognizer = Recognizer::new();
        recognizer.set_classifier(Arc::new(ConstClassifier(5)));
        let receiver = recognizer
            .start(CannedSource { remaining: 100 }, OneHand)
            .unwrap();
        let recognition = receiver.recv().unwrap();
        assert_eq!(recognition.symbol, Some('F'));
        assert_eq!(recognition.frame.width(), 32);
        recognizer.stop();
    }

    #[test]
    fn source_failure_ends_the_loop() {
        let mut recognizer = Recognizer::new();
        recognizer.set_classifier(Arc::new(ConstClassifier(0)));
        let receiver = recognizer
            .start(CannedSource { remaining: 3 }, OneHand)
            .unwrap();
        // Drain until the worker breaks on the read error and drops the sender.
        while receiver.recv().is_ok() {}
        recognizer.stop();
        assert!(!recognizer.is_running());
    }

    #[test]
    fn stop_is_idempotent() {
        let mut recognizer = Recognizer::new();
        recognizer.set_classifier(Arc::new(ConstClassifier(0)));
        let _receiver = recognizer
            .start(CannedSource { remaining: u32::MAX }, OneHand)
            .unwrap();
        recognizer.stop();
        recognizer.stop();
        assert!(!recognizer.is_running());
    }

    #[test]
    fn starting_twice_is_an_error() {
        let mut recognizer = Recognizer::new();
        recognizer.set_classifier(Arc::new(ConstClassifier(0)));
        let _receiver = recognizer
            .start(CannedSource { remaining: u32::MAX }, OneHand)
            .unwrap();
        assert!(recognizer
            .start(CannedSource { remaining: 1 }, OneHand)
            .is_err());
        recognizer.stop();
    }
}
