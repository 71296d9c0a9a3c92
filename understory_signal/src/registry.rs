// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered connection storage shared by a dispatcher and all of its clones.
//!
//! Entries are only ever appended or removed, so registration order is stable.
//! Removal happens in exactly one place, [`Registry::append`], which drops every
//! invalid entry before pushing the new one. Dispatch never mutates the
//! registry; it works on a [`Registry::snapshot`] instead.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::slot::Connection;

pub(crate) struct Registry<H: ?Sized> {
    entries: RefCell<Vec<Rc<Connection<H>>>>,
}

impl<H: ?Sized> Registry<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            entries: RefCell::new(Vec::with_capacity(n)),
        }
    }

    pub(crate) fn reserve(&self, n: usize) {
        self.entries.borrow_mut().reserve(n);
    }

    /// Prune invalid entries, then append `conn`.
    pub(crate) fn append(&self, conn: Rc<Connection<H>>) {
        let pruned: Vec<_> = {
            let mut entries = self.entries.borrow_mut();
            let pruned: Vec<_> = entries.extract_if(.., |c| !c.state.is_valid()).collect();
            entries.push(conn);
            log::trace!(
                "connected slot: {} registered, {} pruned",
                entries.len(),
                pruned.len()
            );
            pruned
        };
        // Released only after the borrow ends: a handler's captures may reach
        // back into this registry when they drop.
        drop(pruned);
    }

    /// Clone out the entries that are live right now, in registration order.
    pub(crate) fn snapshot(&self) -> Vec<Rc<Connection<H>>> {
        self.entries
            .borrow()
            .iter()
            .filter(|c| c.state.is_live())
            .cloned()
            .collect()
    }

    /// Entries physically present, including invalid ones awaiting pruning.
    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Entries that would take part in a dispatch started now.
    pub(crate) fn live_len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|c| c.state.is_live())
            .count()
    }
}

impl<H: ?Sized> core::fmt::Debug for Registry<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .field("live", &self.live_len())
            .finish_non_exhaustive()
    }
}
