//! Image buffers and drawing.
//!
//! This module provides:
//!
//! - The [`Frame`] type, an owned RGBA image holding one camera frame.
//! - A variety of [`draw`] functions to overlay recognition results.
//! - [`Rect`], an integer-valued rectangle for bounding boxes and overlays.

pub mod draw;
mod rect;

use std::{fmt, ops::Index, path::Path};

use embedded_graphics::{pixelcolor::raw::RawU32, prelude::PixelColor};
use image::{ImageBuffer, Rgba, RgbaImage};

pub use rect::Rect;

#[derive(Debug, Clone, Copy)]
enum FrameFormat {
    Jpeg,
    Png,
}

impl FrameFormat {
    fn from_path(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("jpg" | "jpeg") => Ok(Self::Jpeg),
            Some("png") => Ok(Self::Png),
            _ => anyhow::bail!(
                "invalid image path '{}' (must have one of the supported extensions)",
                path.display()
            ),
        }
    }
}

/// An 8-bit sRGB image with alpha channel.
#[derive(Clone)]
pub struct Frame {
    buf: RgbaImage,
}

impl Frame {
    /// Creates an empty frame of a specified size.
    ///
    /// The frame starts out black and fully transparent.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: ImageBuffer::new(width, height),
        }
    }

    /// Loads a frame from the filesystem.
    ///
    /// The path must have a supported file extension (`jpeg`, `jpg` or `png`).
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> anyhow::Result<Self> {
        match FrameFormat::from_path(path)? {
            FrameFormat::Jpeg => {
                let data = std::fs::read(path)?;
                Self::decode_jpeg(&data)
            }
            FrameFormat::Png => {
                let data = std::fs::read(path)?;
                let buf =
                    image::load_from_memory_with_format(&data, image::ImageFormat::Png)?.to_rgba8();
                Ok(Self { buf })
            }
        }
    }

    /// Decodes a JFIF JPEG or Motion JPEG from a byte slice.
    pub fn decode_jpeg(data: &[u8]) -> anyhow::Result<Self> {
        let mut decoder = jpeg_decoder::Decoder::new(data);
        let pixels = decoder.decode()?;
        let info = decoder
            .info()
            .ok_or_else(|| anyhow::anyhow!("JPEG decoder produced no image info"))?;

        let (width, height) = (u32::from(info.width), u32::from(info.height));
        let mut buf = ImageBuffer::new(width, height);
        match info.pixel_format {
            jpeg_decoder::PixelFormat::RGB24 => {
                for (rgb, out) in pixels.chunks_exact(3).zip(buf.pixels_mut()) {
                    *out = Rgba([rgb[0], rgb[1], rgb[2], 255]);
                }
            }
            jpeg_decoder::PixelFormat::L8 => {
                for (&l, out) in pixels.iter().zip(buf.pixels_mut()) {
                    *out = Rgba([l, l, l, 255]);
                }
            }
            fmt => anyhow::bail!("unsupported JPEG pixel format {:?}", fmt),
        }
        Ok(Self { buf })
    }

    /// Saves a frame to the file system.
    ///
    /// The path must have a supported file extension (`jpeg`, `jpg` or `png`).
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        match FrameFormat::from_path(path.as_ref())? {
            FrameFormat::Jpeg => {
                // The JPEG encoder does not accept an alpha channel.
                let rgb = image::DynamicImage::ImageRgba8(self.buf.clone()).into_rgb8();
                rgb.save_with_format(path.as_ref(), image::ImageFormat::Jpeg)?;
            }
            FrameFormat::Png => {
                self.buf.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
            }
        }
        Ok(())
    }

    /// Returns the width of this frame, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    /// Returns the height of this frame, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Gets the color at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this frame.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Color {
        Color(self.buf[(x, y)].0)
    }

    /// Sets the color at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this frame.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.buf[(x, y)] = Rgba(color.0);
    }

    /// Mirrors the frame around its vertical axis.
    pub fn flip_horizontal_in_place(&mut self) {
        image::imageops::flip_horizontal_in_place(&mut self.buf);
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} Frame", self.width(), self.height())
    }
}

/// An 8-bit RGBA color.
///
/// Colors are always in the sRGB color space and use non-premultiplied alpha.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Color(pub(crate) [u8; 4]);

impl Color {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const RED: Self = Self([255, 0, 0, 255]);
    pub const GREEN: Self = Self([0, 255, 0, 255]);
    pub const BLUE: Self = Self([0, 0, 255, 255]);

    #[inline]
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    #[inline]
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    #[inline]
    pub fn g(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn b(&self) -> u8 {
        self.0[2]
    }

    #[inline]
    pub fn a(&self) -> u8 {
        self.0[3]
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:02x}{:02x}{:02x}{:02x}",
            self.r(),
            self.g(),
            self.b(),
            self.a(),
        )
    }
}

impl Index<usize> for Color {
    type Output = u8;

    #[inline]
    fn index(&self, index: usize) -> &u8 {
        &self.0[index]
    }
}

impl PixelColor for Color {
    type Raw = RawU32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_roundtrip() {
        let mut frame = Frame::new(4, 4);
        frame.set(1, 2, Color::RED);
        assert_eq!(frame.get(1, 2), Color::RED);
        assert_eq!(frame.get(0, 0).a(), 0);
    }

    #[test]
    fn horizontal_flip_mirrors_pixels() {
        let mut frame = Frame::new(3, 1);
        frame.set(0, 0, Color::RED);
        frame.set(2, 0, Color::BLUE);
        frame.flip_horizontal_in_place();
        assert_eq!(frame.get(0, 0), Color::BLUE);
        assert_eq!(frame.get(2, 0), Color::RED);
    }
}
