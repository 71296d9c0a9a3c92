// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Multicast signals.
//!
//! ## Overview
//!
//! A [`Signal`] calls every live connection once per [`Signal::emit`], in the
//! order the connections were made. Handlers return nothing or a
//! `Result<(), E>`; the first error aborts the emission and is returned to the
//! caller, and the remaining handlers are not called.
//!
//! ## Re-entrancy
//!
//! `emit` works on a snapshot taken when it starts. Handlers may connect,
//! invalidate, disable or emit again on the same signal; changes become
//! visible to the next emission, never to the one in progress.
//!
//! ```
//! use core::cell::RefCell;
//! use std::rc::Rc;
//! use understory_signal::signal::Signal;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sig: Signal<u32> = Signal::new();
//!
//! let l = log.clone();
//! let _a = sig.connect(move |v| l.borrow_mut().push(("a", v)));
//! let l = log.clone();
//! let b = sig.connect(move |v| l.borrow_mut().push(("b", v)));
//!
//! sig.notify(1);
//! b.disable();
//! sig.notify(2);
//! assert_eq!(*log.borrow(), [("a", 1), ("b", 1), ("a", 2)]);
//! ```

use alloc::rc::{Rc, Weak};
use core::any::Any;
use core::convert::Infallible;

use crate::registry::Registry;
use crate::slot::{Connection, Slot, owner_probe};

pub(crate) type SignalHandler<A, E> = dyn Fn(A) -> Result<(), E>;

/// Return types accepted from [`Signal`] handlers: `()` or `Result<(), E>`.
pub trait IntoSignalResult<E> {
    /// Convert the handler's return value into the emission result.
    fn into_signal_result(self) -> Result<(), E>;
}

impl<E> IntoSignalResult<E> for () {
    #[inline]
    fn into_signal_result(self) -> Result<(), E> {
        Ok(())
    }
}

impl<E> IntoSignalResult<E> for Result<(), E> {
    #[inline]
    fn into_signal_result(self) -> Self {
        self
    }
}

/// Multicast dispatcher.
///
/// `A` is the parameter list (use a tuple for several parameters, `()` for
/// none) and must be `Clone` to emit. `E` is the handler error type;
/// it defaults to [`Infallible`], for which [`Signal::notify`] is available.
///
/// Clones share the same connections: connecting through one clone is seen by
/// every other.
pub struct Signal<A, E = Infallible> {
    registry: Rc<Registry<SignalHandler<A, E>>>,
}

impl<A, E> Clone for Signal<A, E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<A, E> Default for Signal<A, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, E> core::fmt::Debug for Signal<A, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signal")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<A, E> Signal<A, E> {
    /// Create a signal with no connections.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry::new()),
        }
    }

    /// Create a signal with room for `n` connections.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            registry: Rc::new(Registry::with_capacity(n)),
        }
    }

    /// Reserve room for at least `n` more connections.
    pub fn reserve(&self, n: usize) {
        self.registry.reserve(n);
    }

    /// Connections currently stored, including invalidated ones not yet pruned.
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Connections that would be called by an emission started now.
    pub fn live_count(&self) -> usize {
        self.registry.live_len()
    }

    /// True if both values share the same connections.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }

    /// Connect a closure or plain function.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect<F, O>(&self, f: F) -> Slot
    where
        F: Fn(A) -> O + 'static,
        O: IntoSignalResult<E>,
    {
        self.attach(None, move |args| f(args).into_signal_result())
    }

    /// Connect a function along with a user-data value passed to every call.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect_with<U, F, O>(&self, user_data: U, f: F) -> Slot
    where
        U: 'static,
        F: Fn(A, &U) -> O + 'static,
        O: IntoSignalResult<E>,
    {
        self.attach(None, move |args| f(args, &user_data).into_signal_result())
    }

    /// Connect a method bound to `owner`.
    ///
    /// Only a weak reference is kept. The connection becomes invalid when the
    /// owner is dropped, and is pruned on the next connect.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect_method<T, F, O>(&self, owner: &Rc<T>, method: F) -> Slot
    where
        T: 'static,
        F: Fn(&T, A) -> O + 'static,
        O: IntoSignalResult<E>,
    {
        let weak = Rc::downgrade(owner);
        self.attach(Some(owner_probe(owner)), move |args| match weak.upgrade() {
            Some(this) => method(&this, args).into_signal_result(),
            // Owner dropped by an earlier handler of this same emission.
            None => Ok(()),
        })
    }

    /// Connect a method bound to `owner`, along with a user-data value.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect_method_with<T, U, F, O>(&self, owner: &Rc<T>, user_data: U, method: F) -> Slot
    where
        T: 'static,
        U: 'static,
        F: Fn(&T, A, &U) -> O + 'static,
        O: IntoSignalResult<E>,
    {
        let weak = Rc::downgrade(owner);
        self.attach(Some(owner_probe(owner)), move |args| match weak.upgrade() {
            Some(this) => method(&this, args, &user_data).into_signal_result(),
            None => Ok(()),
        })
    }

    fn attach<F>(&self, owner: Option<Weak<dyn Any>>, handler: F) -> Slot
    where
        F: Fn(A) -> Result<(), E> + 'static,
    {
        let conn = Rc::new(Connection::new(handler, owner));
        let slot = Slot::new(conn.clone());
        self.registry.append(conn);
        slot
    }

    /// Call every live connection, in connection order.
    ///
    /// Connections are read once, when the emission starts. The first handler
    /// error is returned and the rest of the emission is skipped.
    pub fn emit(&self, args: A) -> Result<(), E>
    where
        A: Clone,
    {
        let snapshot = self.registry.snapshot();
        let Some((last, rest)) = snapshot.split_last() else {
            return Ok(());
        };
        for conn in rest {
            (conn.handler)(args.clone())?;
        }
        (last.handler)(args)
    }
}

impl<A: Clone> Signal<A, Infallible> {
    /// Emit on a signal whose handlers cannot fail.
    pub fn notify(&self, args: A) {
        match self.emit(args) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
}
