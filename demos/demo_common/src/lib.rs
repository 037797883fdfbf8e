// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Command-line and logging setup shared by the demos.

use clap::Args;
use pane_core::pixels::{Argb, Pattern};
use pane_core::{SurfaceSize, WindowConfig};
use tracing_subscriber::EnvFilter;

/// Window options every demo accepts.
#[derive(Args, Clone, Debug)]
pub struct WindowArgs {
    /// Initial client width in pixels.
    #[arg(long, default_value_t = SurfaceSize::DEFAULT.width())]
    pub width: u32,
    /// Initial client height in pixels.
    #[arg(long, default_value_t = SurfaceSize::DEFAULT.height())]
    pub height: u32,
    /// Window title.
    #[arg(long)]
    pub title: Option<String>,
    /// Application id reported to the compositor.
    #[arg(long)]
    pub app_id: Option<String>,
}

impl WindowArgs {
    /// Builds the window configuration, titling it `default_title` unless
    /// `--title` was given.
    ///
    /// Zero sizes fall back to the default.
    #[must_use]
    pub fn config(&self, default_title: &str) -> WindowConfig {
        let defaults = WindowConfig::default();
        WindowConfig {
            title: self.title.clone().unwrap_or_else(|| default_title.to_owned()),
            app_id: self.app_id.clone().unwrap_or(defaults.app_id),
            size: SurfaceSize::new(self.width, self.height).unwrap_or(defaults.size),
        }
    }
}

/// CPU fill pattern choices.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PatternKind {
    /// One colour everywhere.
    #[default]
    Solid,
    /// A square in the middle of a black background.
    Square,
    /// Brightness pulsing once per second.
    Pulse,
    /// Left-to-right blend to white.
    Gradient,
}

/// Pattern options of the CPU demos.
#[derive(Args, Clone, Debug)]
pub struct PatternArgs {
    /// What to draw.
    #[arg(long, value_enum, default_value_t = PatternKind::Solid)]
    pub pattern: PatternKind,
    /// Main colour as `#RRGGBB`, `#AARRGGBB` or `0xAARRGGBB`.
    #[arg(long, default_value_t = Argb::RED)]
    pub color: Argb,
}

impl PatternArgs {
    /// The selected pattern.
    #[must_use]
    pub fn pattern(&self) -> Pattern {
        match self.pattern {
            PatternKind::Solid => Pattern::Solid(self.color),
            PatternKind::Square => Pattern::CenteredSquare {
                fg: self.color,
                bg: Argb::BLACK,
            },
            PatternKind::Pulse => Pattern::Pulse {
                color: self.color,
                period_ms: 1000,
            },
            PatternKind::Gradient => Pattern::Gradient {
                left: self.color,
                right: Argb::WHITE,
            },
        }
    }
}

/// Installs a `tracing` subscriber filtered by `RUST_LOG` (default `info`),
/// writing to stderr.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
