//! V4L2 webcam access.
//!
//! Currently, only V4L2 `VIDEO_CAPTURE` devices yielding JFIF JPEG or Motion JPEG frames are
//! supported.

use std::{cmp::Reverse, env};

use anyhow::bail;
use linuxvideo::{
    format::{FrameIntervals, FrameSizes, PixFormat, PixelFormat},
    stream::ReadStream,
    BufType, CapabilityFlags, Device, Fract,
};

use crate::image::Frame;

/// A blocking source of camera frames.
///
/// Implemented by [`Webcam`]. The capture and recognition loops are generic over this trait so
/// that they can be driven by canned frames in tests.
pub trait FrameSource {
    /// Reads the next frame, blocking until one is available.
    fn read_frame(&mut self) -> anyhow::Result<Frame>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn read_frame(&mut self) -> anyhow::Result<Frame> {
        (**self).read_frame()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct FramePrefs {
    resolution: Option<(u32, u32)>,
    fps: Option<u32>,
}

/// Format negotiation options.
#[derive(Default)]
pub struct WebcamOptions {
    name: Option<String>,
    frame: FramePrefs,
}

impl WebcamOptions {
    /// Sets the name of the webcam device to open.
    ///
    /// If no webcam with the given name can be found, opening the webcam will result in an error.
    #[inline]
    pub fn name(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the desired image resolution.
    ///
    /// A lower resolution might be selected if the webcam cannot deliver the desired resolution.
    #[inline]
    pub fn resolution(mut self, width: u32, height: u32) -> Self {
        self.frame.resolution = Some((width, height));
        self
    }

    /// Sets the desired frame rate.
    ///
    /// A lower frame rate might be selected if the webcam cannot deliver the desired frame rate.
    #[inline]
    pub fn fps(mut self, fps: u32) -> Self {
        self.frame.fps = Some(fps);
        self
    }
}

#[derive(Clone, Copy)]
struct FrameFormat {
    width: u32,
    height: u32,
    frame_interval: Fract,
}

fn negotiate_format(device: &Device, mut prefs: FramePrefs) -> anyhow::Result<(PixFormat, Fract)> {
    let mut pixel_format = None;
    for format in device.formats(BufType::VIDEO_CAPTURE) {
        let format = format?;
        if format.pixel_format() == PixelFormat::JPEG || format.pixel_format() == PixelFormat::MJPG {
            pixel_format = Some(format.pixel_format());
            break;
        }
    }

    let Some(pixel_format) = pixel_format else {
        bail!("no supported pixel format found");
    };

    let mut formats = Vec::new();
    match device.frame_sizes(pixel_format)? {
        FrameSizes::Discrete(sizes) => {
            for size in sizes {
                let intervals =
                    match device.frame_intervals(pixel_format, size.width(), size.height())? {
                        FrameIntervals::Discrete(intervals) => intervals,
                        FrameIntervals::Stepwise(_) | FrameIntervals::Continuous(_) => {
                            bail!("stepwise or continuous frame rates are not supported")
                        }
                    };
                for rate in intervals {
                    formats.push(FrameFormat {
                        width: size.width(),
                        height: size.height(),
                        frame_interval: *rate.fract(),
                    });
                }
            }
        }
        FrameSizes::Stepwise(_) | FrameSizes::Continuous(_) => {
            bail!("stepwise or continuous resolutions are not supported");
        }
    }

    loop {
        if let Some(fmt) = negotiate_format_step(&formats, prefs) {
            return Ok((
                PixFormat::new(fmt.width, fmt.height, pixel_format),
                fmt.frame_interval,
            ));
        }

        log::debug!("failed to negotiate format with prefs {:?}", prefs);
        if prefs.resolution.take().is_none() && prefs.fps.take().is_none() {
            break;
        }
        log::debug!("retrying with new prefs {:?}", prefs);
    }

    bail!("failed to negotiate a webcam format")
}

fn negotiate_format_step(formats: &[FrameFormat], prefs: FramePrefs) -> Option<FrameFormat> {
    let eligible = formats
        .iter()
        .filter(|fmt| {
            prefs
                .resolution
                .map_or(true, |(w, h)| fmt.width >= w && fmt.height >= h)
                && prefs.fps.map_or(true, |fps| {
                    (1.0 / fmt.frame_interval.as_f32()).round() >= fps as f32
                })
        })
        .copied();
    let mut formats = eligible.collect::<Vec<_>>();
    formats.sort_by_key(|fmt| (fmt.width * fmt.height, Reverse(fmt.frame_interval)));
    formats.last().copied()
}

/// A webcam yielding a stream of [`Frame`]s.
pub struct Webcam {
    stream: ReadStream,
    width: u32,
    height: u32,
}

const ENV_VAR_CAMERA_NAME: &str = "HANDSIGN_CAMERA";

impl Webcam {
    /// Opens the first supported webcam found.
    ///
    /// The `HANDSIGN_CAMERA` environment variable restricts the search to a device with a matching
    /// card name.
    ///
    /// This function can block for a significant amount of time while the webcam initializes (on
    /// the order of hundreds of milliseconds).
    pub fn open(options: WebcamOptions) -> anyhow::Result<Self> {
        if let Ok(name) = env::var(ENV_VAR_CAMERA_NAME) {
            log::debug!(
                "webcam override: `{}` is set to '{}'",
                ENV_VAR_CAMERA_NAME,
                name,
            );
        }
        for res in linuxvideo::list()? {
            match res {
                Ok(dev) => match Self::open_impl(dev, &options) {
                    Ok(Some(webcam)) => return Ok(webcam),
                    Ok(None) => {}
                    Err(e) => {
                        log::debug!("{}", e);
                    }
                },
                Err(e) => {
                    log::warn!("{}", e);
                }
            }
        }

        bail!("no supported webcam device found")
    }

    fn open_impl(dev: Device, options: &WebcamOptions) -> anyhow::Result<Option<Self>> {
        let caps = dev.capabilities()?;
        let cam_name_from_env = env::var(ENV_VAR_CAMERA_NAME).ok();
        if let Some(name) = &options.name.as_deref().or(cam_name_from_env.as_deref()) {
            if caps.card() != *name {
                return Ok(None);
            }
        }

        let cap_flags = caps.device_capabilities();
        let path = dev.path()?;
        log::debug!(
            "device {} ({}) capabilities: {:?}",
            caps.card(),
            path.display(),
            cap_flags,
        );

        if !cap_flags.contains(CapabilityFlags::VIDEO_CAPTURE) {
            return Ok(None);
        }

        let (pixfmt, fract) = negotiate_format(&dev, options.frame)?;

        let capture = dev.video_capture(pixfmt)?;

        let format = capture.format();
        let width = format.width();
        let height = format.height();

        let actual = capture.set_frame_interval(fract)?;

        log::info!(
            "opened {} ({}), {}x{} @ {:.1}Hz",
            caps.card(),
            path.display(),
            width,
            height,
            1.0 / actual.as_f32(),
        );

        let stream = capture.into_stream()?;

        Ok(Some(Self {
            stream,
            width,
            height,
        }))
    }

    /// Reads the next frame from the camera.
    ///
    /// If no frame is available, this method will block until one is.
    pub fn read(&mut self) -> anyhow::Result<Frame> {
        self.stream
            .dequeue(|buf| {
                let frame = match Frame::decode_jpeg(&buf) {
                    Ok(frame) => frame,
                    Err(e) => {
                        // Even high-quality webcams produce occasional corrupted MJPG frames.
                        // Hand back a blank frame instead of skipping it, which would cause 2x
                        // latency spikes.
                        log::error!("webcam decode error: {}", e);
                        Frame::new(self.width, self.height)
                    }
                };
                Ok(frame)
            })
            .map_err(Into::into)
    }
}

impl FrameSource for Webcam {
    fn read_frame(&mut self) -> anyhow::Result<Frame> {
        self.read()
    }
}
