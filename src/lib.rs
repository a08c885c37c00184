//! Hand-sign recognition toolkit.
//!
//! This crate captures labeled hand-sign images per class from a camera feed and performs live
//! hand-sign recognition: hand landmarks are extracted from each frame, normalized into a
//! translation-invariant feature vector, and classified into one of 36 symbols (`A`-`Z`, `0`-`9`).
//!
//! # Environment Variables
//!
//! * `HANDSIGN_CAMERA`: Forces the device to use for [`Webcam`]s created without an explicit
//!   device name. If unset, the first device that supports a compatible image format will be used.
//! * `HANDSIGN_MODEL`: Path to the persisted classifier model (default `model.onnx`).
//! * `HANDSIGN_LANDMARKER`: Path to the hand-landmark network (default `hand_landmark.onnx`).
//! * `HANDSIGN_DATA`: Directory for collected training images (default `data`).
//! * `HANDSIGN_DATASET`: Output path for the built feature CSV (default `dataset.csv`).
//!
//! [`Webcam`]: camera::Webcam

use log::LevelFilter;

pub mod annotate;
pub mod camera;
pub mod classifier;
pub mod collect;
pub mod dataset;
pub mod error;
pub mod features;
pub mod hand;
pub mod image;
pub mod labels;
pub mod nn;
pub mod recognize;
pub mod timer;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and `handsign` will log at *debug* level; `RUST_LOG` can override this.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
