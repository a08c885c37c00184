//! Guided per-class training image collection.
//!
//! A [`CollectSession`] walks through the classes of a [`CollectTarget`]. For each class it
//! publishes preview frames until the operator signals [`Signal::Begin`], then captures a fixed
//! number of frames into `data/<class>/<n>.jpg`. [`Signal::Cancel`] aborts the session at the
//! next frame boundary.

use std::{
    ops::Range,
    path::PathBuf,
    str::FromStr,
};

use crossbeam::channel::{Receiver, Sender, TryRecvError};

use crate::camera::FrameSource;
use crate::error::Error;
use crate::image::Frame;
use crate::labels;

/// Number of images captured per class.
pub const IMAGES_PER_CLASS: u32 = 40;

/// Selects which classes a collection session covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectTarget {
    /// All letter classes, `A` through `Z`.
    Letters,
    /// All digit classes, `0` through `9`.
    Numbers,
    /// Every class.
    All,
    /// A single letter class.
    Letter(char),
    /// A single digit class.
    Digit(u8),
}

impl CollectTarget {
    /// Returns the contiguous class range this target covers.
    pub fn classes(&self) -> anyhow::Result<Range<u8>> {
        match *self {
            Self::Letters => Ok(0..26),
            Self::Numbers => Ok(26..36),
            Self::All => Ok(0..labels::NUM_CLASSES as u8),
            Self::Letter(ch) => {
                let class = labels::class_of(ch.to_ascii_uppercase())
                    .filter(|&class| class < 26)
                    .ok_or_else(|| anyhow::anyhow!("'{ch}' is not a collectable letter"))?;
                Ok(class..class + 1)
            }
            Self::Digit(digit) => {
                anyhow::ensure!(digit <= 9, "{digit} is not a collectable digit");
                let class = 26 + digit;
                Ok(class..class + 1)
            }
        }
    }
}

impl FromStr for CollectTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "letters" => Ok(Self::Letters),
            "numbers" => Ok(Self::Numbers),
            "all" => Ok(Self::All),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) if ch.is_ascii_alphabetic() => Ok(Self::Letter(ch)),
                    (Some(ch), None) if ch.is_ascii_digit() => {
                        Ok(Self::Digit(ch as u8 - b'0'))
                    }
                    _ => anyhow::bail!(
                        "invalid collection target '{s}' (expected `letters`, `numbers`, `all`, \
                         a letter, or a digit)"
                    ),
                }
            }
        }
    }
}

/// Operator input driving a collection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Ends the preview phase and starts capturing the current class.
    Begin,
    /// Aborts the session.
    Cancel,
}

/// Progress reported by a collection session.
pub enum CollectEvent {
    /// A preview frame for `class`; capturing has not started yet.
    Preview { class: u8, frame: Frame },
    /// Frame `index` of `class` was captured and written to disk.
    Captured { class: u8, index: u32, frame: Frame },
    /// All images for `class` have been captured.
    ClassDone { class: u8 },
}

/// A guided image collection session.
pub struct CollectSession {
    data_dir: PathBuf,
    images_per_class: u32,
}

impl CollectSession {
    /// Creates a session that stores captured images below `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            images_per_class: IMAGES_PER_CLASS,
        }
    }

    /// Overrides the number of images captured per class.
    pub fn images_per_class(mut self, count: u32) -> Self {
        self.images_per_class = count;
        self
    }

    /// Runs the session to completion.
    ///
    /// For each class in `target`, preview frames are published on `events` until a
    /// [`Signal::Begin`] arrives on `signals`, then `images_per_class` frames are captured into
    /// `<data_dir>/<class>/<n>.jpg`.
    ///
    /// Fails with [`Error::Cancelled`] when a [`Signal::Cancel`] arrives or either channel
    /// disconnects, and with [`Error::CameraUnavailable`] when the frame source fails.
    pub fn run<S: FrameSource>(
        &self,
        mut source: S,
        target: CollectTarget,
        signals: &Receiver<Signal>,
        events: &Sender<CollectEvent>,
    ) -> anyhow::Result<()> {
        for class in target.classes()? {
            let class_dir = self.data_dir.join(class.to_string());
            std::fs::create_dir_all(&class_dir)?;
            log::info!(
                "collecting class {} ('{}') into {}",
                class,
                labels::symbol(class).unwrap_or('?'),
                class_dir.display(),
            );

            // Preview until the operator is ready.
            loop {
                let frame = read(&mut source)?;
                match signals.try_recv() {
                    Ok(Signal::Begin) => break,
                    Ok(Signal::Cancel) | Err(TryRecvError::Disconnected) => {
                        return Err(Error::Cancelled.into());
                    }
                    Err(TryRecvError::Empty) => {}
                }
                publish(events, CollectEvent::Preview { class, frame })?;
            }

            for index in 0..self.images_per_class {
                if matches!(signals.try_recv(), Ok(Signal::Cancel)) {
                    return Err(Error::Cancelled.into());
                }
                let frame = read(&mut source)?;
                frame.save(class_dir.join(format!("{index}.jpg")))?;
                publish(events, CollectEvent::Captured { class, index, frame })?;
            }

            publish(events, CollectEvent::ClassDone { class })?;
        }
        Ok(())
    }
}

fn read<S: FrameSource>(source: &mut S) -> anyhow::Result<Frame> {
    match source.read_frame() {
        Ok(mut frame) => {
            frame.flip_horizontal_in_place();
            Ok(frame)
        }
        Err(e) => {
            log::error!("failed to read camera frame: {e}");
            Err(Error::CameraUnavailable.into())
        }
    }
}

fn publish(events: &Sender<CollectEvent>, event: CollectEvent) -> anyhow::Result<()> {
    events.send(event).map_err(|_| Error::Cancelled.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;

    use crossbeam::channel;

    use crate::image::Color;

    struct SolidSource(Color);

    impl FrameSource for SolidSource {
        fn read_frame(&mut self) -> anyhow::Result<Frame> {
            let mut frame = Frame::new(16, 16);
            for y in 0..16 {
                for x in 0..16 {
                    frame.set(x, y, self.0);
                }
            }
            Ok(frame)
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("handsign-{name}-{}", fastrand::u64(..)));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn jpg_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter(|entry| {
                entry.as_ref().unwrap().path().extension().map_or(false, |e| e == "jpg")
            })
            .count()
    }

    #[test]
    fn target_class_ranges() {
        assert_eq!(CollectTarget::Letters.classes().unwrap(), 0..26);
        assert_eq!(CollectTarget::Numbers.classes().unwrap(), 26..36);
        assert_eq!(CollectTarget::All.classes().unwrap(), 0..36);
        assert_eq!(CollectTarget::Letter('b').classes().unwrap(), 1..2);
        assert_eq!(CollectTarget::Digit(7).classes().unwrap(), 33..34);
        assert!(CollectTarget::Letter('!').classes().is_err());
        assert!(CollectTarget::Digit(10).classes().is_err());
    }

    #[test]
    fn target_parsing() {
        assert_eq!("letters".parse::<CollectTarget>().unwrap(), CollectTarget::Letters);
        assert_eq!("all".parse::<CollectTarget>().unwrap(), CollectTarget::All);
        assert_eq!("Q".parse::<CollectTarget>().unwrap(), CollectTarget::Letter('Q'));
        assert_eq!("4".parse::<CollectTarget>().unwrap(), CollectTarget::Digit(4));
        assert!("nope".parse::<CollectTarget>().is_err());
    }

    #[test]
    fn captures_the_configured_number_of_images() {
        let dir = temp_dir("capture");
        let (signal_tx, signal_rx) = channel::unbounded();
        let (event_tx, event_rx) = channel::unbounded();
        signal_tx.send(Signal::Begin).unwrap();

        let session = CollectSession::new(&dir).images_per_class(3);
        session
            .run(
                SolidSource(Color::WHITE),
                CollectTarget::Letter('A'),
                &signal_rx,
                &event_tx,
            )
            .unwrap();

        assert_eq!(jpg_count(&dir.join("0")), 3);
        let done = event_rx
            .try_iter()
            .filter(|ev| matches!(ev, CollectEvent::ClassDone { class: 0 }))
            .count();
        assert_eq!(done, 1);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn cancel_aborts_the_session() {
        let dir = temp_dir("cancel");
        let (signal_tx, signal_rx) = channel::unbounded();
        let (event_tx, _event_rx) = channel::unbounded();
        signal_tx.send(Signal::Cancel).unwrap();

        let session = CollectSession::new(&dir).images_per_class(3);
        let err = session
            .run(
                SolidSource(Color::WHITE),
                CollectTarget::Digit(0),
                &signal_rx,
                &event_tx,
            )
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::Cancelled));
        assert_eq!(jpg_count(&dir.join("26")), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn source_failure_is_reported_as_camera_unavailable() {
        struct FailingSource;
        impl FrameSource for FailingSource {
            fn read_frame(&mut self) -> anyhow::Result<Frame> {
                anyhow::bail!("gone")
            }
        }

        let dir = temp_dir("fail");
        let (_signal_tx, signal_rx) = channel::unbounded::<Signal>();
        let (event_tx, _event_rx) = channel::unbounded();
        let err = CollectSession::new(&dir)
            .run(FailingSource, CollectTarget::Letter('A'), &signal_rx, &event_tx)
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::CameraUnavailable));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
