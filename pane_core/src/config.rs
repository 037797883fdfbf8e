// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Window creation parameters.

use alloc::string::String;

use crate::size::SurfaceSize;

/// Cosmetic metadata and the initial size of a top-level window.
///
/// Title and app id are set once when the window is created. The size is
/// only a starting point; the compositor may configure something else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    /// Window title.
    pub title: String,
    /// Application id (Wayland) used by compositors to group windows.
    pub app_id: String,
    /// Size used until the compositor suggests one.
    pub size: SurfaceSize,
}

impl WindowConfig {
    /// Creates a configuration with the given title and default app id and
    /// size.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("pane"),
            app_id: String::from("org.pane.demo"),
            size: SurfaceSize::DEFAULT,
        }
    }
}
