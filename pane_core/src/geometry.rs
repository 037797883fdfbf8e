// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The static triangle drawn by every GPU renderer.
//!
//! ```text
//!            (0.0, 0.5) red
//!                 /\
//!                /  \
//!               /    \
//!              /______\
//! (-0.5, -0.5) green    (0.5, -0.5) blue
//! ```
//!
//! Coordinates are normalized device coordinates. The vertex layout is
//! interleaved `position: vec2<f32>, color: vec3<f32>`, 20 bytes per vertex.

use bytemuck::{Pod, Zeroable};

/// One interleaved vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in normalized device coordinates.
    pub position: [f32; 2],
    /// Linear RGB colour.
    pub color: [f32; 3],
}

/// Vertices of the triangle, counter-clockwise.
pub const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5],
        color: [1.0, 0.0, 0.0],
    },
    Vertex {
        position: [-0.5, -0.5],
        color: [0.0, 1.0, 0.0],
    },
    Vertex {
        position: [0.5, -0.5],
        color: [0.0, 0.0, 1.0],
    },
];

/// Background colour, RGBA.
pub const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

/// Bytes between consecutive vertices.
#[expect(clippy::cast_possible_truncation, reason = "a few bytes")]
pub const VERTEX_STRIDE: u32 = size_of::<Vertex>() as u32;

/// Byte offset of `position`.
pub const POSITION_OFFSET: u32 = 0;

/// Byte offset of `color`.
#[expect(clippy::cast_possible_truncation, reason = "a few bytes")]
pub const COLOR_OFFSET: u32 = size_of::<[f32; 2]>() as u32;

/// Number of vertices drawn.
#[expect(clippy::cast_possible_truncation, reason = "a few bytes")]
pub const VERTEX_COUNT: u32 = TRIANGLE.len() as u32;

/// The triangle as raw bytes, ready for upload.
#[must_use]
pub fn triangle_bytes() -> &'static [u8] {
    bytemuck::cast_slice(&TRIANGLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_interleaved_vec2_vec3() {
        assert_eq!(VERTEX_STRIDE, 20);
        assert_eq!(COLOR_OFFSET, 8);
        assert_eq!(
            core::mem::offset_of!(Vertex, color) as u32,
            COLOR_OFFSET,
            "repr(C) keeps fields in order"
        );
        assert_eq!(triangle_bytes().len(), 60);
    }

    #[test]
    fn triangle_is_counter_clockwise() {
        let [a, b, c] = TRIANGLE.map(|v| v.position);
        let area2 = (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]);
        assert!(area2 > 0.0, "signed area {area2}");
    }
}
