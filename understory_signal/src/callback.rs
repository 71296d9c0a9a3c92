// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-target hooks.
//!
//! A [`Callback`] holds at most one handler. Setting a new handler replaces the
//! previous one. This suits hooks that have exactly one consumer, such as a
//! button's "clicked" action or a widget's render function, where a
//! [`Signal`](crate::signal::Signal) would be needlessly permissive.
//!
//! ```
//! use understory_signal::callback::Callback;
//! use understory_signal::error::DispatchError;
//!
//! let clicked: Callback<u32, u32> = Callback::new();
//! assert!(clicked.is_null());
//! assert_eq!(clicked.invoke(1), Err(DispatchError::NullCallback));
//!
//! clicked.set(|n| n + 1);
//! assert_eq!(clicked.invoke(1), Ok(2));
//! ```

use alloc::rc::{Rc, Weak};
use core::any::Any;
use core::cell::RefCell;

use crate::error::DispatchError;
use crate::slot::{Connection, owner_probe};

// `None` means the bound owner is gone.
type CallbackHandler<A, R> = dyn Fn(A) -> Option<R>;
type Current<A, R> = Option<Rc<Connection<CallbackHandler<A, R>>>>;

/// Replaceable single-handler hook.
///
/// Clones share the same handler. Handlers bound to an owner through
/// [`Callback::set_method`] only hold it weakly; once the owner is dropped the
/// callback reads as null.
pub struct Callback<A, R = ()> {
    current: Rc<RefCell<Current<A, R>>>,
}

impl<A, R> Clone for Callback<A, R> {
    fn clone(&self) -> Self {
        Self {
            current: self.current.clone(),
        }
    }
}

impl<A, R> Default for Callback<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> core::fmt::Debug for Callback<A, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Callback")
            .field("null", &self.is_null())
            .finish_non_exhaustive()
    }
}

impl<A, R> Callback<A, R> {
    /// Create a null callback.
    pub fn new() -> Self {
        Self {
            current: Rc::new(RefCell::new(None)),
        }
    }

    /// Set the handler to a closure or plain function, replacing any previous one.
    pub fn set<F>(&self, f: F)
    where
        F: Fn(A) -> R + 'static,
    {
        self.replace(None, move |args| Some(f(args)));
    }

    /// Set the handler to a function along with a user-data value.
    pub fn set_with<U, F>(&self, user_data: U, f: F)
    where
        U: 'static,
        F: Fn(A, &U) -> R + 'static,
    {
        self.replace(None, move |args| Some(f(args, &user_data)));
    }

    /// Set the handler to a method bound to `owner`, held weakly.
    pub fn set_method<T, F>(&self, owner: &Rc<T>, method: F)
    where
        T: 'static,
        F: Fn(&T, A) -> R + 'static,
    {
        let weak = Rc::downgrade(owner);
        self.replace(Some(owner_probe(owner)), move |args| {
            weak.upgrade().map(|this| method(&this, args))
        });
    }

    fn replace<F>(&self, owner: Option<Weak<dyn Any>>, f: F)
    where
        F: Fn(A) -> Option<R> + 'static,
    {
        let old = self
            .current
            .borrow_mut()
            .replace(Rc::new(Connection::new(f, owner)));
        // Dropped outside the borrow; the old handler's captures may touch this callback.
        drop(old);
    }

    /// Remove the handler.
    pub fn clear(&self) {
        let old = self.current.borrow_mut().take();
        drop(old);
    }

    /// True if no live handler is set.
    pub fn is_null(&self) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_none_or(|c| !c.state.is_live())
    }

    /// Call the handler.
    ///
    /// The handler may replace or clear this callback while it runs; the
    /// running call completes with the handler it started with.
    pub fn invoke(&self, args: A) -> Result<R, DispatchError> {
        let current = self.current.borrow().clone();
        match current {
            Some(conn) if conn.state.is_live() => {
                (conn.handler)(args).ok_or(DispatchError::NullCallback)
            }
            _ => Err(DispatchError::NullCallback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn null_until_set_and_after_clear() {
        let cb: Callback<()> = Callback::new();
        assert!(cb.is_null());
        assert_eq!(cb.invoke(()), Err(DispatchError::NullCallback));
        cb.set(|()| {});
        assert!(!cb.is_null());
        assert_eq!(cb.invoke(()), Ok(()));
        cb.clear();
        assert!(cb.is_null());
    }

    #[test]
    fn set_replaces_previous_handler() {
        let cb: Callback<u32, u32> = Callback::new();
        cb.set(|n| n + 1);
        cb.set(|n| n * 2);
        assert_eq!(cb.invoke(5), Ok(10));
    }

    #[test]
    fn user_data_is_threaded_through() {
        let cb: Callback<u32, u32> = Callback::new();
        cb.set_with(3_u32, |n, k| n * k);
        assert_eq!(cb.invoke(5), Ok(15));
    }

    #[test]
    fn clones_share_the_handler() {
        let a: Callback<(), u8> = Callback::new();
        let b = a.clone();
        b.set(|()| 4);
        assert_eq!(a.invoke(()), Ok(4));
        a.clear();
        assert!(b.is_null());
    }

    struct Button {
        clicks: Cell<u32>,
    }

    impl Button {
        fn on_click(&self, n: u32) -> u32 {
            self.clicks.set(self.clicks.get() + n);
            self.clicks.get()
        }
    }

    #[test]
    fn method_owner_drop_makes_callback_null() {
        let cb: Callback<u32, u32> = Callback::new();
        let button = Rc::new(Button { clicks: Cell::new(0) });
        cb.set_method(&button, Button::on_click);
        assert_eq!(cb.invoke(2), Ok(2));
        assert_eq!(cb.invoke(3), Ok(5));
        drop(button);
        assert!(cb.is_null());
        assert_eq!(cb.invoke(1), Err(DispatchError::NullCallback));
    }

    #[test]
    fn handler_may_replace_itself_while_running() {
        let cb: Callback<(), &'static str> = Callback::new();
        let again = cb.clone();
        cb.set(move |()| {
            again.set(|()| "second");
            "first"
        });
        assert_eq!(cb.invoke(()), Ok("first"));
        assert_eq!(cb.invoke(()), Ok("second"));
    }
}
