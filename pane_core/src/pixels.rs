// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU pixel buffers.
//!
//! [`BufferLayout`] computes the byte layout of a 32-bit-per-pixel buffer and
//! rejects sizes the shared-memory protocol cannot describe (offsets, strides
//! and pool sizes are `i32` on the wire). [`paint`] fills a buffer with a
//! [`Pattern`], never writing past the layout's `byte_len`.
//!
//! Pixels are stored as little-endian `u32` values in `0xAARRGGBB` order, so
//! the bytes in memory are `B, G, R, A`. This is both `wl_shm` ARGB8888 and a
//! top-down 32-bit Windows DIB.

use core::fmt;
use core::str::FromStr;

use crate::backend::FrameContext;
use crate::size::SurfaceSize;

/// Bytes per pixel for every supported format.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Supported pixel formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    /// 32-bit with alpha.
    #[default]
    Argb8888,
    /// 32-bit, alpha byte ignored by the consumer.
    Xrgb8888,
}

/// Layout errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// The buffer would not fit the protocol's `i32` byte counts.
    #[error("{size} buffer exceeds i32::MAX bytes")]
    TooLarge {
        /// Requested size.
        size: SurfaceSize,
    },
    /// A destination slice is shorter than the layout requires.
    #[error("buffer holds {actual} bytes, layout needs {required}")]
    BufferTooSmall {
        /// Bytes the layout needs.
        required: usize,
        /// Bytes available.
        actual: usize,
    },
}

/// Byte layout of a packed 32-bit-per-pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferLayout {
    size: SurfaceSize,
    format: PixelFormat,
    stride: u32,
    byte_len: u32,
}

impl BufferLayout {
    /// Computes `stride = width * 4` and `byte_len = stride * height`.
    pub fn new(size: SurfaceSize, format: PixelFormat) -> Result<Self, LayoutError> {
        const LIMIT: u64 = i32::MAX as u64;
        let stride = u64::from(size.width()) * u64::from(BYTES_PER_PIXEL);
        let byte_len = stride * u64::from(size.height());
        if stride > LIMIT || byte_len > LIMIT {
            return Err(LayoutError::TooLarge { size });
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "both values were checked against i32::MAX"
        )]
        let (stride, byte_len) = (stride as u32, byte_len as u32);
        Ok(Self {
            size,
            format,
            stride,
            byte_len,
        })
    }

    /// Buffer dimensions.
    #[must_use]
    pub const fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Pixel format.
    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row.
    #[must_use]
    pub const fn stride(&self) -> u32 {
        self.stride
    }

    /// Total bytes.
    #[must_use]
    pub const fn byte_len(&self) -> usize {
        self.byte_len as usize
    }

    /// Stride as the `i32` the shared-memory protocol expects.
    #[must_use]
    #[expect(clippy::cast_possible_wrap, reason = "bounded by i32::MAX")]
    pub const fn stride_i32(&self) -> i32 {
        self.stride as i32
    }

    /// Total bytes as the `i32` the shared-memory protocol expects.
    #[must_use]
    #[expect(clippy::cast_possible_wrap, reason = "bounded by i32::MAX")]
    pub const fn byte_len_i32(&self) -> i32 {
        self.byte_len as i32
    }
}

/// A 32-bit `0xAARRGGBB` colour.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Argb(pub u32);

impl Argb {
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque red.
    pub const RED: Self = Self(0xFFFF_0000);
    /// Opaque blue.
    pub const BLUE: Self = Self(0xFF00_00FF);
    /// Dark teal, the GPU clear colour.
    pub const TEAL: Self = Self::rgb(0x33, 0x4C, 0x4C);

    /// Opaque colour from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(0xFF00_0000 | (r as u32) << 16 | (g as u32) << 8 | b as u32)
    }

    /// Channels as `[a, r, g, b]`.
    #[must_use]
    pub const fn channels(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Scales the colour channels by `level / 255`, keeping alpha.
    #[must_use]
    pub const fn dimmed(self, level: u8) -> Self {
        let [a, r, g, b] = self.channels();
        Self(u32::from_be_bytes([
            a,
            scale_channel(r, level),
            scale_channel(g, level),
            scale_channel(b, level),
        ]))
    }

    /// Linear blend towards `other`, `t` in `0..=255`.
    #[must_use]
    pub fn lerp(self, other: Self, t: u8) -> Self {
        let a = self.channels();
        let b = other.channels();
        let mut out = [0_u8; 4];
        for (o, (x, y)) in out.iter_mut().zip(a.iter().zip(b.iter())) {
            let x = u16::from(*x);
            let y = u16::from(*y);
            let t = u16::from(t);
            #[expect(clippy::cast_possible_truncation, reason = "result is <= 255")]
            let v = ((x * (255 - t) + y * t) / 255) as u8;
            *o = v;
        }
        Self(u32::from_be_bytes(out))
    }

    fn with_format(self, format: PixelFormat) -> u32 {
        match format {
            PixelFormat::Argb8888 => self.0,
            PixelFormat::Xrgb8888 => self.0 | 0xFF00_0000,
        }
    }
}

#[expect(clippy::cast_possible_truncation, reason = "result is <= 255")]
const fn scale_channel(c: u8, level: u8) -> u8 {
    ((c as u16 * level as u16) / 255) as u8
}

impl fmt::Debug for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Argb(0x{:08X})", self.0)
    }
}

impl fmt::Display for Argb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Colour parse failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("expected #RRGGBB, #AARRGGBB or 0xAARRGGBB")]
pub struct ParseColorError;

impl FromStr for Argb {
    type Err = ParseColorError;

    /// Accepts `#RRGGBB` (opaque), `#AARRGGBB` and `0xAARRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, opaque) = if let Some(hex) = s.strip_prefix('#') {
            (hex, hex.len() == 6)
        } else if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            (hex, false)
        } else {
            return Err(ParseColorError);
        };
        if !matches!(digits.len(), 6 | 8) || (digits.len() == 6 && !opaque) {
            return Err(ParseColorError);
        }
        let value = u32::from_str_radix(digits, 16).map_err(|_| ParseColorError)?;
        Ok(if opaque {
            Self(0xFF00_0000 | value)
        } else {
            Self(value)
        })
    }
}

/// What [`paint`] draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pattern {
    /// Every pixel the same colour.
    Solid(Argb),
    /// A square of side `min(width, height) / 2` in the middle.
    CenteredSquare {
        /// Square colour.
        fg: Argb,
        /// Background colour.
        bg: Argb,
    },
    /// A solid colour whose brightness follows a triangle wave.
    Pulse {
        /// Colour at full brightness.
        color: Argb,
        /// Length of one dark-bright-dark cycle in milliseconds.
        period_ms: u32,
    },
    /// Horizontal blend from `left` to `right`.
    Gradient {
        /// Colour of the first column.
        left: Argb,
        /// Colour of the last column.
        right: Argb,
    },
}

impl Default for Pattern {
    fn default() -> Self {
        Self::Solid(Argb::RED)
    }
}

impl Pattern {
    /// Returns `true` if the output depends on elapsed time.
    #[must_use]
    pub const fn is_animated(&self) -> bool {
        matches!(self, Self::Pulse { .. })
    }
}

/// Fills `buf` according to `layout`.
///
/// Only the first `layout.byte_len()` bytes are written.
pub fn paint(
    buf: &mut [u8],
    layout: &BufferLayout,
    pattern: &Pattern,
    frame: &FrameContext,
) -> Result<(), LayoutError> {
    let required = layout.byte_len();
    let Some(buf) = buf.get_mut(..required) else {
        return Err(LayoutError::BufferTooSmall {
            required,
            actual: buf.len(),
        });
    };
    let width = layout.size().width();
    let height = layout.size().height();
    let format = layout.format();

    match *pattern {
        Pattern::Solid(color) => fill(buf, color.with_format(format)),
        Pattern::Pulse { color, period_ms } => {
            let level = pulse_level(frame.elapsed.as_millis(), period_ms);
            fill(buf, color.dimmed(level).with_format(format));
        }
        Pattern::CenteredSquare { fg, bg } => {
            let side = width.min(height) / 2;
            let x0 = (width - side) / 2;
            let y0 = (height - side) / 2;
            let (fg, bg) = (fg.with_format(format), bg.with_format(format));
            for (y, row) in rows(buf, layout).take(height as usize).enumerate() {
                let y = y as u64;
                let inside_row = y >= u64::from(y0) && y < u64::from(y0 + side);
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let x = x as u64;
                    let inside = inside_row && x >= u64::from(x0) && x < u64::from(x0 + side);
                    px.copy_from_slice(&if inside { fg } else { bg }.to_le_bytes());
                }
            }
        }
        Pattern::Gradient { left, right } => {
            let span = u64::from(width.saturating_sub(1).max(1));
            for row in rows(buf, layout) {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    #[expect(clippy::cast_possible_truncation, reason = "result is <= 255")]
                    let t = ((x as u64).min(span) * 255 / span) as u8;
                    px.copy_from_slice(&left.lerp(right, t).with_format(format).to_le_bytes());
                }
            }
        }
    }
    Ok(())
}

/// Picks the buffer to paint next from a ring of buffers.
///
/// `busy[i]` is `true` while the consumer still reads buffer `i` (from its
/// commit until the matching release). Starting at `next` and wrapping
/// around, the first free buffer wins; `None` when all are busy.
#[must_use]
pub fn next_free_buffer(busy: &[bool], next: usize) -> Option<usize> {
    let count = busy.len();
    (0..count)
        .map(|offset| (next + offset) % count)
        .find(|&index| !busy[index])
}

fn rows<'a>(buf: &'a mut [u8], layout: &BufferLayout) -> core::slice::ChunksExactMut<'a, u8> {
    buf.chunks_exact_mut(layout.stride() as usize)
}

fn fill(buf: &mut [u8], pixel: u32) {
    let bytes = pixel.to_le_bytes();
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&bytes);
    }
}

/// Triangle wave over `period_ms`, `0` at the start of a period and `255`
/// halfway through.
#[expect(clippy::cast_possible_truncation, reason = "result is <= 255")]
fn pulse_level(elapsed_ms: u64, period_ms: u32) -> u8 {
    let period = u64::from(period_ms.max(2));
    let phase = elapsed_ms % period;
    let half = period / 2;
    let rising = if phase < half { phase } else { period - phase };
    (rising.min(half) * 255 / half) as u8
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::time::Duration;

    fn frame(elapsed_ms: u64, size: SurfaceSize) -> FrameContext {
        FrameContext {
            frame_index: 0,
            size,
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    fn pixel(buf: &[u8], layout: &BufferLayout, x: u32, y: u32) -> u32 {
        let at = (y * layout.stride() + x * 4) as usize;
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    fn size(w: u32, h: u32) -> SurfaceSize {
        SurfaceSize::new(w, h).expect("non-zero test size")
    }

    #[test]
    fn layout_is_width_times_height_times_four() {
        for (w, h) in [(1, 1), (3, 7), (640, 480), (1921, 1)] {
            let layout = BufferLayout::new(size(w, h), PixelFormat::Argb8888).expect("fits");
            assert_eq!(layout.stride(), w * 4, "stride for {w}x{h}");
            assert_eq!(layout.byte_len(), (w * h * 4) as usize, "len for {w}x{h}");
        }
    }

    #[test]
    fn layout_rejects_i32_overflow() {
        let err = BufferLayout::new(size(40_000, 40_000), PixelFormat::Argb8888);
        assert!(matches!(err, Err(LayoutError::TooLarge { .. })), "{err:?}");
        let wide = BufferLayout::new(size(u32::MAX, 1), PixelFormat::Argb8888);
        assert!(wide.is_err(), "stride overflow");
    }

    #[test]
    fn paint_never_touches_bytes_past_the_layout() {
        for (w, h) in [(1, 1), (2, 3), (5, 5), (17, 4)] {
            let s = size(w, h);
            let layout = BufferLayout::new(s, PixelFormat::Argb8888).expect("fits");
            let mut buf = vec![0xAB_u8; layout.byte_len() + 16];
            let patterns = [
                Pattern::Solid(Argb::RED),
                Pattern::CenteredSquare {
                    fg: Argb::WHITE,
                    bg: Argb::BLACK,
                },
                Pattern::Pulse {
                    color: Argb::BLUE,
                    period_ms: 1000,
                },
                Pattern::Gradient {
                    left: Argb::RED,
                    right: Argb::BLUE,
                },
            ];
            for pattern in &patterns {
                paint(&mut buf, &layout, pattern, &frame(250, s)).expect("paint");
                assert!(
                    buf[layout.byte_len()..].iter().all(|b| *b == 0xAB),
                    "{pattern:?} wrote past {w}x{h}"
                );
            }
        }
    }

    #[test]
    fn short_buffer_is_rejected() {
        let s = size(4, 4);
        let layout = BufferLayout::new(s, PixelFormat::Argb8888).expect("fits");
        let mut buf = vec![0_u8; 63];
        assert_eq!(
            paint(&mut buf, &layout, &Pattern::default(), &frame(0, s)),
            Err(LayoutError::BufferTooSmall {
                required: 64,
                actual: 63
            })
        );
    }

    #[test]
    fn solid_is_little_endian_argb() {
        let s = size(2, 1);
        let layout = BufferLayout::new(s, PixelFormat::Argb8888).expect("fits");
        let mut buf = vec![0_u8; layout.byte_len()];
        paint(&mut buf, &layout, &Pattern::Solid(Argb::RED), &frame(0, s)).expect("paint");
        assert_eq!(buf, [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn xrgb_forces_opaque_alpha() {
        let s = size(1, 1);
        let layout = BufferLayout::new(s, PixelFormat::Xrgb8888).expect("fits");
        let mut buf = vec![0_u8; 4];
        paint(&mut buf, &layout, &Pattern::Solid(Argb(0x0012_3456)), &frame(0, s)).expect("paint");
        assert_eq!(pixel(&buf, &layout, 0, 0), 0xFF12_3456);
    }

    #[test]
    fn centered_square_covers_the_middle() {
        let s = size(8, 4);
        let layout = BufferLayout::new(s, PixelFormat::Argb8888).expect("fits");
        let mut buf = vec![0_u8; layout.byte_len()];
        let pattern = Pattern::CenteredSquare {
            fg: Argb::WHITE,
            bg: Argb::BLACK,
        };
        paint(&mut buf, &layout, &pattern, &frame(0, s)).expect("paint");
        // side 2, origin (3, 1)
        assert_eq!(pixel(&buf, &layout, 3, 1), Argb::WHITE.0);
        assert_eq!(pixel(&buf, &layout, 4, 2), Argb::WHITE.0);
        assert_eq!(pixel(&buf, &layout, 2, 1), Argb::BLACK.0);
        assert_eq!(pixel(&buf, &layout, 5, 1), Argb::BLACK.0);
        assert_eq!(pixel(&buf, &layout, 3, 3), Argb::BLACK.0);
    }

    #[test]
    fn gradient_spans_both_colours() {
        let s = size(5, 2);
        let layout = BufferLayout::new(s, PixelFormat::Argb8888).expect("fits");
        let mut buf = vec![0_u8; layout.byte_len()];
        let pattern = Pattern::Gradient {
            left: Argb::RED,
            right: Argb::BLUE,
        };
        paint(&mut buf, &layout, &pattern, &frame(0, s)).expect("paint");
        assert_eq!(pixel(&buf, &layout, 0, 1), Argb::RED.0);
        assert_eq!(pixel(&buf, &layout, 4, 1), Argb::BLUE.0);
    }

    #[test]
    fn pulse_follows_a_triangle_wave() {
        assert_eq!(pulse_level(0, 1000), 0);
        assert_eq!(pulse_level(500, 1000), 255);
        assert_eq!(pulse_level(250, 1000), 127);
        assert_eq!(pulse_level(1000, 1000), 0);
        assert!(Pattern::Pulse {
            color: Argb::RED,
            period_ms: 1
        }
        .is_animated(), "pulse animates");
    }

    #[test]
    fn colours_parse() {
        assert_eq!("#FF0000".parse::<Argb>(), Ok(Argb::RED));
        assert_eq!("0x800000FF".parse::<Argb>(), Ok(Argb(0x8000_00FF)));
        assert_eq!("#80FF0000".parse::<Argb>(), Ok(Argb(0x80FF_0000)));
        assert_eq!("red".parse::<Argb>(), Err(ParseColorError));
        assert_eq!("0xFFFFFF".parse::<Argb>(), Err(ParseColorError));
    }

    #[test]
    fn free_buffer_prefers_next() {
        assert_eq!(next_free_buffer(&[false, false], 1), Some(1));
        assert_eq!(next_free_buffer(&[false, false], 0), Some(0));
    }

    #[test]
    fn free_buffer_skips_busy_ones() {
        assert_eq!(next_free_buffer(&[false, true], 1), Some(0));
        assert_eq!(next_free_buffer(&[true, false], 0), Some(1));
        assert_eq!(next_free_buffer(&[true, true, false], 0), Some(2));
    }

    #[test]
    fn free_buffer_is_none_when_all_are_busy() {
        assert_eq!(next_free_buffer(&[true, true], 0), None);
        assert_eq!(next_free_buffer(&[true, true], 1), None);
        assert_eq!(next_free_buffer(&[], 0), None);
    }
}
