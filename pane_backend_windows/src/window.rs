// Copyright 2026 the Pane Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A top-level Win32 window and its message pump.
//!
//! The window procedure cannot return errors or borrow Rust state, so it
//! only decodes messages into [`WindowEvent`]s and queues them on the
//! creating thread; [`Window::pump`] drains the queue.

#![expect(unsafe_code, reason = "Win32 window creation and message dispatch")]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::OnceLock;

use pane_core::{SurfaceSize, WindowConfig};
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    AdjustWindowRectEx, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, CreateWindowExW, DefWindowProcW,
    DestroyWindow, DispatchMessageW, GetClientRect, IDC_ARROW, LoadCursorW, MSG, PM_REMOVE,
    PeekMessageW, RegisterClassExW, SW_SHOW, ShowWindow, TranslateMessage, WINDOW_EX_STYLE,
    WNDCLASSEXW, WS_OVERLAPPEDWINDOW,
};
use windows_core::{HSTRING, PCWSTR, w};

use crate::error::Win32Error;
use crate::message::{self, WindowEvent};

const CLASS_NAME: PCWSTR = w!("PaneWindow");

static CLASS_ATOM: OnceLock<u16> = OnceLock::new();

thread_local! {
    static EVENTS: RefCell<VecDeque<WindowEvent>> = const { RefCell::new(VecDeque::new()) };
}

/// A visible top-level window.
#[derive(Debug)]
pub struct Window {
    hwnd: HWND,
}

impl Window {
    /// Registers the window class (once per process), creates the window
    /// with a client area of `config.size` and shows it.
    pub fn create(config: &WindowConfig) -> Result<Self, Win32Error> {
        // SAFETY: plain Win32 calls with valid, owned arguments. `CLASS_NAME`
        // and `title` outlive the calls that read them.
        unsafe {
            let instance: HINSTANCE = GetModuleHandleW(None)
                .map_err(Win32Error::call("GetModuleHandleW"))?
                .into();
            register_class(instance)?;

            let (width, height) = config.size.to_i32();
            let mut rect = RECT {
                left: 0,
                top: 0,
                right: width,
                bottom: height,
            };
            AdjustWindowRectEx(
                &mut rect,
                WS_OVERLAPPEDWINDOW,
                false.into(),
                WINDOW_EX_STYLE::default(),
            )
            .map_err(Win32Error::call("AdjustWindowRectEx"))?;

            let title = HSTRING::from(config.title.as_str());
            let hwnd = CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                CLASS_NAME,
                &title,
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                rect.right - rect.left,
                rect.bottom - rect.top,
                None,
                None,
                Some(instance),
                None,
            )
            .map_err(Win32Error::call("CreateWindowExW"))?;
            let _ = ShowWindow(hwnd, SW_SHOW);
            tracing::debug!(width, height, title = %config.title, "window created");
            Ok(Self { hwnd })
        }
    }

    /// The native handle.
    #[must_use]
    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    /// Current client-area size, or `None` while minimised.
    #[must_use]
    pub fn client_size(&self) -> Option<SurfaceSize> {
        let mut rect = RECT::default();
        // SAFETY: `hwnd` is alive until drop; `rect` is a local out-param.
        unsafe { GetClientRect(self.hwnd, &mut rect) }.ok()?;
        let width = u32::try_from(rect.right - rect.left).ok()?;
        let height = u32::try_from(rect.bottom - rect.top).ok()?;
        SurfaceSize::new(width, height)
    }

    /// Dispatches every queued message and returns the events they produced.
    pub fn pump(&mut self) -> Vec<WindowEvent> {
        let mut msg = MSG::default();
        // SAFETY: `msg` is a local out-param; translate/dispatch receive the
        // message PeekMessageW just filled in.
        unsafe {
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        EVENTS.with_borrow_mut(|queue| queue.drain(..).collect())
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        // SAFETY: the handle was created by `create` and not destroyed since.
        if let Err(err) = unsafe { DestroyWindow(self.hwnd) } {
            tracing::debug!(%err, "DestroyWindow failed");
        }
        EVENTS.with_borrow_mut(VecDeque::clear);
    }
}

/// # Safety
///
/// `instance` must be this module's handle.
unsafe fn register_class(instance: HINSTANCE) -> Result<(), Win32Error> {
    if CLASS_ATOM.get().is_some() {
        return Ok(());
    }
    // SAFETY: `IDC_ARROW` is a system cursor; `class` points at statics and
    // a function with the window-procedure signature.
    unsafe {
        let class = WNDCLASSEXW {
            cbSize: size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };
        let atom = RegisterClassExW(&class);
        if atom == 0 {
            return Err(Win32Error::last("RegisterClassExW"));
        }
        let _ = CLASS_ATOM.set(atom);
    }
    Ok(())
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if let Some(event) = message::translate(msg, wparam.0, lparam.0) {
        EVENTS.with_borrow_mut(|queue| queue.push_back(event));
        // Closing is the run loop's decision; the window is destroyed on drop.
        if event == WindowEvent::CloseRequested {
            return LRESULT(0);
        }
    }
    // SAFETY: forwards the arguments of the message being handled.
    unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) }
}
