// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Override chains: dispatch to the newest handler, which may call the older ones.
//!
//! ## Overview
//!
//! A [`VirtualFunction`] behaves like an overridable method. Each connection is
//! an override of everything connected before it. [`VirtualFunction::invoke`]
//! calls the most recently connected live handler and hands it a [`Super`]:
//! the rest of the chain. Calling [`Super::invoke`] runs the next older live
//! handler (which gets its own `Super`, and so on), the same way an override
//! calls its base implementation.
//!
//! A handler decides for itself whether to run before, after, instead of, or
//! around its base, and may post-process the value the base returns.
//!
//! ## Ordering
//!
//! - Handlers are reached newest first.
//! - Each `Super` only covers handlers strictly older than the one it was given
//!   to, so a handler can never re-enter itself through its `Super`.
//! - A handler that does not call its `Super` stops the chain there.
//! - Calling a `Super` with nothing left returns
//!   [`DispatchError::Exhausted`](crate::error::DispatchError::Exhausted).
//!   Use [`Super::is_invokable`] when delegation is optional.
//!
//! ## Snapshot
//!
//! The live connections are captured once when `invoke` starts. Connecting,
//! disabling or invalidating from inside a handler only affects later calls.
//!
//! ```
//! use understory_signal::error::DispatchError;
//! use understory_signal::virtual_function::VirtualFunction;
//!
//! let area: VirtualFunction<(f64, f64), f64> = VirtualFunction::new();
//! let _base = area.connect(|(w, h), _base| Ok(w * h));
//! // Override: add a 1.0 margin on every side, then defer to the base.
//! let _margin = area.connect(|(w, h), base| base.invoke((w + 2.0, h + 2.0)));
//!
//! assert_eq!(area.invoke((3.0, 4.0)), Ok(30.0));
//!
//! let empty: VirtualFunction<(), u32> = VirtualFunction::new();
//! assert_eq!(empty.invoke(()), Err(DispatchError::Exhausted));
//! ```

use alloc::rc::{Rc, Weak};
use core::any::Any;

use crate::error::DispatchError;
use crate::registry::Registry;
use crate::slot::{Connection, Slot, owner_probe};

pub(crate) type ChainHandler<A, R, E> = dyn for<'s> Fn(A, Super<'s, A, R, E>) -> Result<R, E>;

type Entry<A, R, E> = Rc<Connection<ChainHandler<A, R, E>>>;

/// Chained dispatcher ("virtual function").
///
/// `A` is the parameter list (a tuple for several parameters, `()` for none),
/// `R` the return type (`()` for none) and `E` the error type, which must be
/// able to carry a [`DispatchError`].
///
/// Clones share the same connections.
pub struct VirtualFunction<A, R = (), E = DispatchError> {
    registry: Rc<Registry<ChainHandler<A, R, E>>>,
}

impl<A, R, E> Clone for VirtualFunction<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<A, R, E> Default for VirtualFunction<A, R, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R, E> core::fmt::Debug for VirtualFunction<A, R, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualFunction")
            .field("registry", &self.registry)
            .finish()
    }
}

impl<A, R, E> VirtualFunction<A, R, E> {
    /// Create a virtual function with no connections.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(Registry::new()),
        }
    }

    /// Create a virtual function with room for `n` connections.
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

    /// Connections that an invocation started now could reach.
    pub fn live_count(&self) -> usize {
        self.registry.live_len()
    }

    /// True if at least one live connection exists, so `invoke` would not fail
    /// with [`DispatchError::Exhausted`] right away.
    pub fn is_invokable(&self) -> bool {
        self.live_count() > 0
    }

    /// True if both values share the same connections.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }

    /// Connect an override given as a closure or plain function.
    ///
    /// The handler receives the arguments and a [`Super`] for the older
    /// handlers.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect<F>(&self, f: F) -> Slot
    where
        F: for<'s> Fn(A, Super<'s, A, R, E>) -> Result<R, E> + 'static,
    {
        self.attach(None, f)
    }

    /// Connect an override along with a user-data value passed to every call.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect_with<U, F>(&self, user_data: U, f: F) -> Slot
    where
        U: 'static,
        F: for<'s> Fn(A, &U, Super<'s, A, R, E>) -> Result<R, E> + 'static,
    {
        self.attach(None, move |args, sup| f(args, &user_data, sup))
    }

    fn attach<F>(&self, owner: Option<Weak<dyn Any>>, handler: F) -> Slot
    where
        F: for<'s> Fn(A, Super<'s, A, R, E>) -> Result<R, E> + 'static,
    {
        let conn = Rc::new(Connection::new(handler, owner));
        let slot = Slot::new(conn.clone());
        self.registry.append(conn);
        slot
    }
}

impl<A, R, E: From<DispatchError>> VirtualFunction<A, R, E> {
    /// Connect an override bound to a method of `owner`.
    ///
    /// Only a weak reference is kept; the connection becomes invalid when the
    /// owner is dropped. If the owner disappears while an invocation that
    /// already captured this connection is running, the override is passed
    /// through: the call goes straight to its `Super`.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect_method<T, F>(&self, owner: &Rc<T>, method: F) -> Slot
    where
        T: 'static,
        F: for<'s> Fn(&T, A, Super<'s, A, R, E>) -> Result<R, E> + 'static,
    {
        let weak = Rc::downgrade(owner);
        self.attach(Some(owner_probe(owner)), move |args, sup| {
            match weak.upgrade() {
                Some(this) => method(&this, args, sup),
                None => sup.invoke(args),
            }
        })
    }

    /// Connect an override bound to a method of `owner`, along with a user-data value.
    #[must_use = "dropping the slot keeps the connection, but loses the only way to disable it"]
    pub fn connect_method_with<T, U, F>(&self, owner: &Rc<T>, user_data: U, method: F) -> Slot
    where
        T: 'static,
        U: 'static,
        F: for<'s> Fn(&T, A, &U, Super<'s, A, R, E>) -> Result<R, E> + 'static,
    {
        let weak = Rc::downgrade(owner);
        self.attach(Some(owner_probe(owner)), move |args, sup| {
            match weak.upgrade() {
                Some(this) => method(&this, args, &user_data, sup),
                None => sup.invoke(args),
            }
        })
    }

    /// Call the newest live handler, giving it access to the older ones.
    ///
    /// Returns that handler's result, or [`DispatchError::Exhausted`] if no
    /// live handler exists.
    pub fn invoke(&self, args: A) -> Result<R, E> {
        let snapshot = self.registry.snapshot();
        Super {
            remaining: &snapshot,
        }
        .invoke(args)
    }
}

/// The part of an override chain older than the handler currently running.
///
/// Handed to every handler by [`VirtualFunction::invoke`]. It borrows the
/// invocation's snapshot and cannot outlive the call it was created for.
/// It is `Copy`: a handler may consult it, or even delegate several times.
pub struct Super<'s, A, R = (), E = DispatchError> {
    // Oldest first; the next handler to run is the last element.
    remaining: &'s [Entry<A, R, E>],
}

impl<A, R, E> Clone for Super<'_, A, R, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A, R, E> Copy for Super<'_, A, R, E> {}

impl<A, R, E> core::fmt::Debug for Super<'_, A, R, E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Super")
            .field("remaining", &self.remaining.len())
            .finish()
    }
}

impl<A, R, E> Super<'_, A, R, E> {
    /// True if delegating would reach an older handler.
    ///
    /// Bound-method overrides whose owner was dropped during this invocation
    /// are passed through by [`Super::invoke`], so they do not count.
    pub fn is_invokable(&self) -> bool {
        self.remaining.iter().any(|c| c.state.owner_alive())
    }

    /// True if delegating would fail with [`DispatchError::Exhausted`].
    pub fn is_null(&self) -> bool {
        !self.is_invokable()
    }

    /// Number of older handlers still reachable from here.
    pub fn remaining(&self) -> usize {
        self.remaining
            .iter()
            .filter(|c| c.state.owner_alive())
            .count()
    }
}

impl<A, R, E: From<DispatchError>> Super<'_, A, R, E> {
    /// Delegate to the next older handler and return its result.
    pub fn invoke(self, args: A) -> Result<R, E> {
        let Some((next, older)) = self.remaining.split_last() else {
            log::debug!("override chain exhausted: no older handler to delegate to");
            return Err(DispatchError::Exhausted.into());
        };
        (next.handler)(args, Super { remaining: older })
    }

    /// Delegate if an older handler exists, otherwise return `None`.
    pub fn try_invoke(self, args: A) -> Option<Result<R, E>> {
        self.is_invokable().then(|| self.invoke(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::{Cell, RefCell};

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn push(log: &Log, s: &'static str) {
        log.borrow_mut().push(s);
    }

    /// Handler that logs its name and always delegates.
    fn delegating(
        log: &Log,
        name: &'static str,
    ) -> impl for<'s> Fn((), Super<'s, ()>) -> Result<(), DispatchError> + 'static {
        let log = log.clone();
        move |(), sup| {
            push(&log, name);
            sup.invoke(())
        }
    }

    #[test]
    fn newest_runs_first_and_delegates_down_to_exhaustion() {
        let log = Log::default();
        let vf: VirtualFunction<()> = VirtualFunction::new();
        let _a = vf.connect(delegating(&log, "A"));
        let _b = vf.connect(delegating(&log, "B"));
        let _c = vf.connect(delegating(&log, "C"));
        assert_eq!(vf.invoke(()), Err(DispatchError::Exhausted));
        assert_eq!(*log.borrow(), ["C", "B", "A"]);
    }

    #[test]
    fn empty_chain_is_exhausted() {
        let vf: VirtualFunction<u8, u8> = VirtualFunction::new();
        assert!(!vf.is_invokable());
        assert_eq!(vf.invoke(1), Err(DispatchError::Exhausted));
    }

    #[test]
    fn handler_that_does_not_delegate_short_circuits() {
        let log = Log::default();
        let vf: VirtualFunction<()> = VirtualFunction::new();
        let _a = vf.connect(delegating(&log, "A"));
        let l = log.clone();
        let _b = vf.connect(move |(), _sup| {
            push(&l, "B");
            Ok(())
        });
        let _c = vf.connect(delegating(&log, "C"));
        assert_eq!(vf.invoke(()), Ok(()));
        assert_eq!(*log.borrow(), ["C", "B"]);
    }

    #[test]
    fn override_brackets_base_and_forwards_its_result() {
        let log = Log::default();
        let vf: VirtualFunction<(), &'static str> = VirtualFunction::new();
        let l = log.clone();
        let _h1 = vf.connect(move |(), _sup| {
            push(&l, "H1");
            Ok("from H1")
        });
        let l = log.clone();
        let _h2 = vf.connect(move |(), sup| {
            push(&l, "H2 pre");
            let r = sup.invoke(());
            push(&l, "H2 post");
            r
        });
        assert_eq!(vf.invoke(()), Ok("from H1"));
        assert_eq!(*log.borrow(), ["H2 pre", "H1", "H2 post"]);
    }

    #[test]
    fn override_can_post_process_and_rewrite_arguments() {
        let vf: VirtualFunction<i32, i32> = VirtualFunction::new();
        let _base = vf.connect(|x, _| Ok(x * 10));
        let _plus = vf.connect(|x, sup| Ok(sup.invoke(x + 1)? + 5));
        assert_eq!(vf.invoke(2), Ok(35));
    }

    #[test]
    fn super_reports_remaining_handlers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let vf: VirtualFunction<(), ()> = VirtualFunction::new();
        for _ in 0..3 {
            let seen = seen.clone();
            let _ = vf.connect(move |(), sup| {
                seen.borrow_mut().push((sup.remaining(), sup.is_invokable(), sup.is_null()));
                match sup.try_invoke(()) {
                    Some(r) => r,
                    None => Ok(()),
                }
            });
        }
        assert_eq!(vf.invoke(()), Ok(()));
        assert_eq!(
            *seen.borrow(),
            [(2, true, false), (1, true, false), (0, false, true)]
        );
    }

    #[test]
    fn disabled_override_is_skipped_then_restored() {
        let log = Log::default();
        let vf: VirtualFunction<()> = VirtualFunction::new();
        let l = log.clone();
        let _base = vf.connect(move |(), _| {
            push(&l, "base");
            Ok(())
        });
        let mid = vf.connect(delegating(&log, "mid"));
        let _top = vf.connect(delegating(&log, "top"));
        mid.disable();
        assert_eq!(vf.invoke(()), Ok(()));
        assert_eq!(vf.connection_count(), 3);
        mid.enable();
        assert_eq!(vf.invoke(()), Ok(()));
        assert_eq!(*log.borrow(), ["top", "base", "top", "mid", "base"]);
    }

    #[test]
    fn fully_disabled_chain_is_exhausted() {
        let vf: VirtualFunction<(), u8> = VirtualFunction::new();
        let a = vf.connect(|(), _| Ok(1));
        a.disable();
        assert!(!vf.is_invokable());
        assert_eq!(vf.invoke(()), Err(DispatchError::Exhausted));
    }

    #[test]
    fn invalidated_override_is_pruned_exactly_once() {
        let vf: VirtualFunction<(), u8> = VirtualFunction::new();
        let a = vf.connect(|(), _| Ok(1));
        let _b = vf.connect(|(), sup| sup.invoke(()));
        a.invalidate();
        let _c = vf.connect(|(), sup| sup.invoke(()));
        a.invalidate();
        let _d = vf.connect(|(), sup| sup.invoke(()));
        assert_eq!(vf.connection_count(), 3);
        // With the base gone the delegating chain runs dry.
        assert_eq!(vf.invoke(()), Err(DispatchError::Exhausted));
    }

    #[test]
    fn mutation_during_invoke_is_seen_next_time() {
        let log = Log::default();
        let vf: VirtualFunction<()> = VirtualFunction::new();
        let base_slot: Rc<RefCell<Option<Slot>>> = Rc::default();
        let l = log.clone();
        *base_slot.borrow_mut() = Some(vf.connect(move |(), _| {
            push(&l, "base");
            Ok(())
        }));
        let added = Rc::new(Cell::new(false));
        {
            let vf2 = vf.clone();
            let log = log.clone();
            let base_slot = base_slot.clone();
            let _ = vf.connect(move |(), sup| {
                push(&log, "top");
                if !added.replace(true) {
                    // Neither change may affect this invocation.
                    if let Some(s) = base_slot.borrow().as_ref() {
                        s.invalidate();
                    }
                    let l = log.clone();
                    let _ = vf2.connect(move |(), _| {
                        push(&l, "late");
                        Ok(())
                    });
                }
                sup.invoke(())
            });
        }
        assert_eq!(vf.invoke(()), Ok(()));
        assert_eq!(*log.borrow(), ["top", "base"]);
        assert_eq!(vf.invoke(()), Ok(()));
        assert_eq!(*log.borrow(), ["top", "base", "late"]);
    }

    #[test]
    fn nested_invoke_on_same_function() {
        let vf: VirtualFunction<u32, u32> = VirtualFunction::new();
        let _base = vf.connect(|n, _| Ok(n));
        let vf2 = vf.clone();
        let _rec = vf.connect(move |n, sup| {
            if n == 0 {
                sup.invoke(0)
            } else {
                Ok(n + vf2.invoke(n - 1)?)
            }
        });
        assert_eq!(vf.invoke(4), Ok(10));
    }

    #[derive(Debug, PartialEq)]
    enum AppError {
        Dispatch(DispatchError),
        Rejected(u32),
    }

    impl From<DispatchError> for AppError {
        fn from(e: DispatchError) -> Self {
            Self::Dispatch(e)
        }
    }

    #[test]
    fn handler_errors_propagate_unchanged() {
        let called = Rc::new(Cell::new(false));
        let vf: VirtualFunction<u32, u32, AppError> = VirtualFunction::new();
        let c = called.clone();
        let _base = vf.connect(move |n, _| {
            c.set(true);
            Ok(n)
        });
        let _guard = vf.connect(|n, sup| {
            if n > 10 {
                Err(AppError::Rejected(n))
            } else {
                sup.invoke(n)
            }
        });
        assert_eq!(vf.invoke(3), Ok(3));
        assert!(called.get());
        called.set(false);
        assert_eq!(vf.invoke(11), Err(AppError::Rejected(11)));
        assert!(!called.get());
    }

    #[test]
    fn exhaustion_converts_into_handler_error_type() {
        let vf: VirtualFunction<(), (), AppError> = VirtualFunction::new();
        let _a = vf.connect(|(), sup| sup.invoke(()));
        assert_eq!(vf.invoke(()), Err(AppError::Dispatch(DispatchError::Exhausted)));
    }

    struct Widget {
        name: &'static str,
        renders: Cell<u32>,
    }

    impl Widget {
        fn render(&self, scale: u32, sup: Super<'_, u32, u32>) -> Result<u32, DispatchError> {
            self.renders.set(self.renders.get() + 1);
            Ok(sup.invoke(scale)? + scale)
        }

        fn render_with(
            &self,
            scale: u32,
            extra: &u32,
            _sup: Super<'_, u32, u32>,
        ) -> Result<u32, DispatchError> {
            self.renders.set(self.renders.get() + 1);
            Ok(scale * extra + u32::try_from(self.name.len()).unwrap_or(0))
        }
    }

    #[test]
    fn bound_methods_follow_owner_lifetime() {
        let vf: VirtualFunction<u32, u32> = VirtualFunction::new();
        let base = Rc::new(Widget {
            name: "base",
            renders: Cell::new(0),
        });
        let over = Rc::new(Widget {
            name: "over",
            renders: Cell::new(0),
        });
        let _b = vf.connect_method_with(&base, 100_u32, Widget::render_with);
        let o = vf.connect_method(&over, Widget::render);
        // over: base(2) + 2 = (2 * 100 + 4) + 2
        assert_eq!(vf.invoke(2), Ok(206));
        assert_eq!((base.renders.get(), over.renders.get()), (1, 1));

        drop(over);
        assert!(!o.is_valid());
        assert_eq!(vf.invoke(2), Ok(204));
        assert_eq!(vf.connection_count(), 2);
        let _n = vf.connect(|n, sup| sup.invoke(n));
        assert_eq!(vf.connection_count(), 2);
    }

    #[test]
    fn owner_dropped_mid_invoke_passes_through() {
        let vf: VirtualFunction<u32, u32> = VirtualFunction::new();
        let _base = vf.connect(|n, _| Ok(n));
        let widget = Rc::new(Widget {
            name: "w",
            renders: Cell::new(0),
        });
        let holder: Rc<RefCell<Option<Rc<Widget>>>> = Rc::new(RefCell::new(Some(widget)));
        if let Some(w) = holder.borrow().as_ref() {
            let _ = vf.connect_method(w, Widget::render);
        }
        let h = holder.clone();
        let _dropper = vf.connect(move |n, sup| {
            h.borrow_mut().take();
            sup.invoke(n)
        });
        // Widget::render would have added `n`; passed through it does not.
        assert_eq!(vf.invoke(5), Ok(5));
    }

    #[test]
    fn guards_skip_overrides_whose_owner_dropped_mid_invoke() {
        let vf: VirtualFunction<u32, u32> = VirtualFunction::new();
        let widget = Rc::new(Widget {
            name: "w",
            renders: Cell::new(0),
        });
        let _w = vf.connect_method(&widget, Widget::render);
        let holder = Rc::new(RefCell::new(Some(widget)));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (h, s) = (holder.clone(), seen.clone());
        let _top = vf.connect(move |n, sup| {
            s.borrow_mut().push((sup.is_invokable(), sup.remaining()));
            h.borrow_mut().take();
            s.borrow_mut().push((sup.is_invokable(), sup.remaining()));
            match sup.try_invoke(n) {
                Some(r) => r,
                None => Ok(n + 100),
            }
        });
        assert_eq!(vf.invoke(1), Ok(101));
        assert_eq!(*seen.borrow(), [(true, 1), (false, 0)]);
    }

    #[test]
    fn user_data_is_threaded_through() {
        let vf: VirtualFunction<u32, u32> = VirtualFunction::new();
        let _a = vf.connect_with(7_u32, |n, k, _| Ok(n * k));
        assert_eq!(vf.invoke(6), Ok(42));
    }

    #[test]
    fn clones_alias_the_registry() {
        let a: VirtualFunction<(), u8> = VirtualFunction::new();
        let b = a.clone();
        let _s = b.connect(|(), _| Ok(9));
        assert!(a.ptr_eq(&b));
        assert_eq!(a.invoke(()), Ok(9));
    }
}
