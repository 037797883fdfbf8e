// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Win32 backend errors.

use pane_core::BackendError;

/// Fatal Win32 failure.
#[derive(Debug, thiserror::Error)]
pub enum Win32Error {
    /// A Win32 or COM call failed.
    #[error("{call} failed: {source}")]
    Call {
        /// Function name.
        call: &'static str,
        /// `HRESULT` or `GetLastError` diagnostic.
        #[source]
        source: windows_core::Error,
    },
    /// Renderer creation failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl Win32Error {
    /// Wraps the error of a named call.
    pub(crate) fn call(call: &'static str) -> impl FnOnce(windows_core::Error) -> Self {
        move |source| Self::Call { call, source }
    }

    /// The calling thread's last error, for calls that signal failure with a
    /// sentinel return value.
    pub(crate) fn last(call: &'static str) -> Self {
        Self::Call {
            call,
            source: windows_core::Error::from_thread(),
        }
    }
}
