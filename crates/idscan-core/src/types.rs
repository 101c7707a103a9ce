// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: the borrowed input frame and the normalised document
// bounds returned by a successful detection.

use serde::{Deserialize, Serialize};

use crate::error::{IdScanError, Result};

// -- Input -------------------------------------------------------------------

/// Channel layout of an input frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Rgb,
    Rgba,
    Bgr,
    Bgra,
    Gray,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn channels(&self) -> usize {
        match self {
            Self::Rgb | Self::Bgr => 3,
            Self::Rgba | Self::Bgra => 4,
            Self::Gray => 1,
        }
    }

    /// Byte offsets of the red, green and blue samples within one pixel, or
    /// `None` for single-channel input.
    pub fn rgb_offsets(&self) -> Option<(usize, usize, usize)> {
        match self {
            Self::Rgb | Self::Rgba => Some((0, 1, 2)),
            Self::Bgr | Self::Bgra => Some((2, 1, 0)),
            Self::Gray => None,
        }
    }

    /// Numeric tag used by the C header (`ID_READER_FORMAT_*`).
    pub fn tag(&self) -> u32 {
        match self {
            Self::Rgb => 0,
            Self::Rgba => 1,
            Self::Bgr => 2,
            Self::Bgra => 3,
            Self::Gray => 4,
        }
    }

    /// Inverse of [`PixelFormat::tag`].
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Rgb),
            1 => Ok(Self::Rgba),
            2 => Ok(Self::Bgr),
            3 => Ok(Self::Bgra),
            4 => Ok(Self::Gray),
            other => Err(IdScanError::InvalidInput(format!(
                "unsupported pixel format tag {other}"
            ))),
        }
    }
}

/// A borrowed, validated view over a raw pixel buffer.
///
/// Rows are `stride` bytes apart; only the first `width * channels` bytes of
/// each row are read. The view never copies or mutates the caller's buffer.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
}

impl<'a> ImageView<'a> {
    /// Validate and wrap a caller-owned buffer.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(IdScanError::InvalidInput("image buffer is empty".into()));
        }
        if width == 0 || height == 0 {
            return Err(IdScanError::InvalidInput(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let row_bytes = (width as usize)
            .checked_mul(format.channels())
            .ok_or_else(|| IdScanError::InvalidInput("image row size overflows".into()))?;
        if stride < row_bytes {
            return Err(IdScanError::InvalidInput(format!(
                "stride {stride} is shorter than a {width}px {format:?} row ({row_bytes} bytes)"
            )));
        }

        let required = stride
            .checked_mul(height as usize - 1)
            .and_then(|bytes| bytes.checked_add(row_bytes))
            .ok_or_else(|| IdScanError::InvalidInput("image buffer size overflows".into()))?;
        if data.len() < required {
            return Err(IdScanError::InvalidInput(format!(
                "buffer holds {} bytes but {width}x{height} with stride {stride} needs {required}",
                data.len()
            )));
        }

        Ok(Self {
            data,
            width,
            height,
            stride,
            format,
        })
    }

    /// Wrap a tightly packed buffer (stride = width * channels).
    pub fn packed(data: &'a [u8], width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let stride = (width as usize).saturating_mul(format.channels());
        Self::new(data, width, height, stride, format)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// The visible bytes of row `y` (padding excluded).
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.stride;
        let len = self.width as usize * self.format.channels();
        &self.data[start..start + len]
    }
}

// -- Output ------------------------------------------------------------------

/// A corner position in normalised image coordinates (`0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Corner {
    pub x: f32,
    pub y: f32,
}

impl Corner {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// Result of a successful detection: four ordered corners plus confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentBounds {
    pub top_left: Corner,
    pub top_right: Corner,
    pub bottom_right: Corner,
    pub bottom_left: Corner,
    /// Detection confidence in `0.0..=1.0`.
    pub confidence: f32,
}

impl DocumentBounds {
    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Corner; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Map the normalised corners back onto a `width` x `height` frame.
    pub fn to_pixels(&self, width: u32, height: u32) -> [(f32, f32); 4] {
        self.corners()
            .map(|c| (c.x * width as f32, c.y * height as f32))
    }

    /// Fraction of the frame covered by the quadrilateral (shoelace formula).
    pub fn area(&self) -> f32 {
        let corners = self.corners();
        let mut twice_area = 0.0f32;
        for i in 0..corners.len() {
            let j = (i + 1) % corners.len();
            twice_area += corners[i].x * corners[j].y;
            twice_area -= corners[j].x * corners[i].y;
        }
        twice_area.abs() / 2.0
    }

    /// True when every coordinate and the confidence lie in `0.0..=1.0`.
    pub fn is_normalized(&self) -> bool {
        self.corners().iter().all(Corner::in_unit_square)
            && (0.0..=1.0).contains(&self.confidence)
    }
}
