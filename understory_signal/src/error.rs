// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors raised by the dispatch core itself.
//!
//! Handler errors are never wrapped: dispatchers are generic over the handler
//! error type `E` and only require `E: From<DispatchError>` so the core can
//! surface its own failures through the same channel.

/// Failures produced by the dispatch machinery (as opposed to by handlers).
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// A [`Super`](crate::virtual_function::Super) was invoked with no live
    /// handler left between its position and the oldest connection.
    ///
    /// This is also what the outermost
    /// [`VirtualFunction::invoke`](crate::virtual_function::VirtualFunction::invoke)
    /// returns when the chain is empty or fully disabled.
    #[error("called non-invokable super function")]
    Exhausted,
    /// [`Callback::invoke`](crate::callback::Callback::invoke) was called with
    /// no live handler set.
    #[error("called null callback")]
    NullCallback,
}
