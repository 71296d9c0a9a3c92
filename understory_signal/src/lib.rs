// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_signal --heading-base-level=0

//! Understory Signal: deterministic, `no_std` signal/slot dispatch for UI.
//!
//! ## Overview
//!
//! This crate provides the callback plumbing that window, input and widget code
//! is built on: attach behaviour to an event, get a handle back, and later
//! disable or drop that behaviour without touching the event's owner.
//! It does not know anything about windows or widgets; it only orders and
//! calls handlers.
//!
//! Two dispatchers share one connection model:
//!
//! - [`Signal`](crate::signal::Signal): multicast. Every live handler is called
//!   once, oldest connection first.
//! - [`VirtualFunction`](crate::virtual_function::VirtualFunction): override
//!   chain. The newest handler is called and receives a
//!   [`Super`](crate::virtual_function::Super) it can use to call the next
//!   older handler, like an override calling its base implementation.
//!
//! Both return a [`Slot`](crate::slot::Slot) from every `connect*` call.
//!
//! ## Connections
//!
//! A connection is live while it is valid (never [invalidated](crate::slot::Slot::invalidate),
//! owner still alive) and [enabled](crate::slot::Slot::set_enabled).
//! Handlers can be attached as:
//!
//! - a closure or plain function (`connect`),
//! - a function plus a user-data value (`connect_with`),
//! - a method bound to an `Rc` owner, held weakly (`connect_method`),
//! - a bound method plus a user-data value (`connect_method_with`).
//!
//! Invalid connections are skipped at once and physically removed the next
//! time anything connects to the same dispatcher.
//!
//! ## Re-entrancy
//!
//! Each dispatch works on a snapshot of the live connections taken when it
//! starts. Handlers may connect, invalidate, disable or dispatch again; the
//! current pass is unaffected and later passes see the change.
//!
//! ## Errors
//!
//! Handler errors propagate unchanged and abort the rest of the pass.
//! The core's own failures are [`DispatchError`](crate::error::DispatchError)
//! values; dispatchers accept any handler error type implementing
//! `From<DispatchError>`.
//!
//! ## Example
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//! use understory_signal::signal::Signal;
//! use understory_signal::virtual_function::VirtualFunction;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! // Multicast: every listener hears about the resize.
//! let resized: Signal<(u32, u32)> = Signal::new();
//! let l = log.clone();
//! let _layout = resized.connect(move |(w, h)| l.borrow_mut().push(format!("layout {w}x{h}")));
//! let l = log.clone();
//! let _status = resized.connect(move |(w, h)| l.borrow_mut().push(format!("status {w}x{h}")));
//! resized.notify((640, 480));
//!
//! // Override chain: a subclass-like handler wraps the default paint.
//! let paint: VirtualFunction<&'static str> = VirtualFunction::new();
//! let l = log.clone();
//! let _default = paint.connect(move |what, _base| {
//!     l.borrow_mut().push(format!("paint {what}"));
//!     Ok(())
//! });
//! let l = log.clone();
//! let _custom = paint.connect(move |what, base| {
//!     l.borrow_mut().push("begin".into());
//!     base.invoke(what)?;
//!     l.borrow_mut().push("end".into());
//!     Ok(())
//! });
//! paint.invoke("button").unwrap();
//!
//! assert_eq!(
//!     *log.borrow(),
//!     ["layout 640x480", "status 640x480", "begin", "paint button", "end"]
//! );
//! ```
//!
//! ## Threading
//!
//! Everything here is single-threaded (`Rc`, `Cell`, `RefCell`); the types are
//! neither `Send` nor `Sync`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod callback;
pub mod container;
pub mod error;
pub(crate) mod registry;
pub mod signal;
pub mod slot;
pub mod virtual_function;

pub use callback::Callback;
pub use container::SlotContainer;
pub use error::DispatchError;
pub use signal::{IntoSignalResult, Signal};
pub use slot::{Slot, SlotFlags};
pub use virtual_function::{Super, VirtualFunction};
