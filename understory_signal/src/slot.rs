// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connections and the [`Slot`] handles that control them.
//!
//! ## Overview
//!
//! Every `connect*` call on a dispatcher creates one connection: a handler plus
//! a small piece of state ([`SlotFlags`] and, for bound methods, a weak probe of
//! the owner). The connection is shared between the dispatcher's registry and
//! every clone of the [`Slot`] returned to the caller.
//!
//! ## Liveness
//!
//! A connection participates in dispatch while it is *live*:
//! - [`SlotFlags::VALID`] is set (cleared for good by [`Slot::invalidate`]),
//! - [`SlotFlags::ENABLED`] is set (toggled by [`Slot::set_enabled`]),
//! - its owner, if it has one, has not been dropped.
//!
//! Invalid connections are skipped immediately and physically removed from the
//! registry the next time anything connects to the same dispatcher.

use alloc::rc::{Rc, Weak};
use core::any::Any;
use core::cell::Cell;

bitflags::bitflags! {
    /// Connection flags controlling participation in dispatch.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SlotFlags: u8 {
        /// Connection has not been invalidated. Never set again once cleared.
        const VALID   = 0b0000_0001;
        /// Connection is enabled (temporarily suppressible without invalidation).
        const ENABLED = 0b0000_0010;
    }
}

impl Default for SlotFlags {
    fn default() -> Self {
        Self::VALID | Self::ENABLED
    }
}

/// Per-connection state shared by the registry entry and its slots.
pub(crate) struct SlotState {
    flags: Cell<SlotFlags>,
    owner: Option<Weak<dyn Any>>,
}

impl SlotState {
    pub(crate) fn new(owner: Option<Weak<dyn Any>>) -> Self {
        Self {
            flags: Cell::new(SlotFlags::default()),
            owner,
        }
    }

    pub(crate) fn flags(&self) -> SlotFlags {
        self.flags.get()
    }

    /// False once a bound owner has been dropped. Ignores the flags.
    pub(crate) fn owner_alive(&self) -> bool {
        self.owner.as_ref().is_none_or(|w| w.strong_count() > 0)
    }

    /// Valid: not invalidated and the owner (if any) still exists.
    pub(crate) fn is_valid(&self) -> bool {
        self.flags().contains(SlotFlags::VALID) && self.owner_alive()
    }

    /// Live: valid and enabled.
    pub(crate) fn is_live(&self) -> bool {
        self.flags().contains(SlotFlags::ENABLED) && self.is_valid()
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        let mut flags = self.flags();
        flags.set(SlotFlags::ENABLED, enabled);
        self.flags.set(flags);
    }

    pub(crate) fn invalidate(&self) {
        self.flags.set(self.flags() - SlotFlags::VALID);
    }
}

impl core::fmt::Debug for SlotState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotState")
            .field("flags", &self.flags())
            .field("owned", &self.owner.is_some())
            .field("owner_alive", &self.owner_alive())
            .finish()
    }
}

/// A registered handler together with its state.
///
/// `H` is a concrete closure type at construction and an unsized `dyn Fn` once
/// stored in a registry.
pub(crate) struct Connection<H: ?Sized> {
    pub(crate) state: SlotState,
    pub(crate) handler: H,
}

impl<H> Connection<H> {
    pub(crate) fn new(handler: H, owner: Option<Weak<dyn Any>>) -> Self {
        Self {
            state: SlotState::new(owner),
            handler,
        }
    }
}

/// Type-erased access to a connection's state, independent of its handler signature.
pub(crate) trait ConnectionState {
    fn state(&self) -> &SlotState;
}

impl<H: ?Sized> ConnectionState for Connection<H> {
    fn state(&self) -> &SlotState {
        &self.state
    }
}

/// Erase an owner to a liveness probe.
pub(crate) fn owner_probe<T: 'static>(owner: &Rc<T>) -> Weak<dyn Any> {
    let weak: Weak<T> = Rc::downgrade(owner);
    weak
}

/// Handle to one connection on a [`Signal`](crate::signal::Signal),
/// [`VirtualFunction`](crate::virtual_function::VirtualFunction) or similar dispatcher.
///
/// Cloning a `Slot` shares the connection; it never duplicates the handler.
/// Dropping a `Slot` does not disconnect: the dispatcher keeps its own
/// reference until the connection is invalidated and pruned. Keep slots in a
/// [`SlotContainer`](crate::container::SlotContainer) to tie them to an owner's
/// lifetime.
///
/// All operations stay well-defined after the connection has been pruned;
/// they simply no longer affect any dispatch.
#[derive(Clone)]
pub struct Slot {
    conn: Rc<dyn ConnectionState>,
}

impl Slot {
    pub(crate) fn new(conn: Rc<dyn ConnectionState>) -> Self {
        Self { conn }
    }

    fn state(&self) -> &SlotState {
        self.conn.state()
    }

    /// Current flags of the connection.
    pub fn flags(&self) -> SlotFlags {
        self.state().flags()
    }

    /// Enable or disable the connection without removing it.
    pub fn set_enabled(&self, enabled: bool) {
        self.state().set_enabled(enabled);
    }

    /// Shorthand for `set_enabled(true)`.
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Shorthand for `set_enabled(false)`.
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Whether the connection is enabled. Independent of validity.
    pub fn is_enabled(&self) -> bool {
        self.flags().contains(SlotFlags::ENABLED)
    }

    /// Permanently invalidate the connection.
    ///
    /// It is skipped by every later dispatch and removed from its registry on
    /// the next connect. Invalidating twice is a no-op.
    pub fn invalidate(&self) {
        self.state().invalidate();
    }

    /// Whether the connection is still valid (not invalidated, owner alive).
    pub fn is_valid(&self) -> bool {
        self.state().is_valid()
    }

    /// Whether the connection would take part in a dispatch started now.
    pub fn is_live(&self) -> bool {
        self.state().is_live()
    }

    /// True if both slots refer to the same connection.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.conn, &other.conn)
    }
}

impl core::fmt::Debug for Slot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Slot")
            .field("flags", &self.flags())
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}
