//! `MonadDefer` type class - suspension of side effects.
//!
//! This module provides the `MonadDefer` trait which extends
//! [`MonadError`] with the ability to defer the construction of a
//! computation until it is run.
//!
//! # Laws
//!
//! ## No Premature Evaluation
//!
//! Building `suspend(thunk)` or `delay(thunk)` never calls `thunk`.
//!
//! ## Suspend Flattening
//!
//! ```text
//! suspend(|| suspend(thunk)) == suspend(thunk)
//! ```
//!
//! ## Suspend Sequencing
//!
//! ```text
//! flat_map(suspend(thunk), f) == suspend(|| flat_map(thunk(), f))
//! ```
//!
//! ## Delay Consistency
//!
//! ```text
//! delay(thunk) == suspend(|| pure(thunk()))
//! ```
//!
//! Implementations may override `delay` (for example to memoize), as long
//! as the expression still runs no earlier than the first run.
//!
//! # Examples
//!
//! ```rust
//! use suspension::control::{Eval, EvalError};
//! use suspension::effect::MonadDefer;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! fn tick<M: MonadDefer<EvalError>>(counter: Rc<Cell<u32>>) -> M::WithType<u32> {
//!     M::delay(move || {
//!         counter.set(counter.get() + 1);
//!         counter.get()
//!     })
//! }
//!
//! let counter = Rc::new(Cell::new(0));
//! let ticked = tick::<Eval<()>>(Rc::clone(&counter));
//! assert_eq!(counter.get(), 0);
//! assert_eq!(ticked.force(), Ok(1));
//! ```

use super::MonadError;
use crate::control::{Eval, EvalError};

/// A type class for monads that can suspend the construction of a
/// computation.
///
/// `suspend` is the primitive; `delay`, `delay_result` and `unit` are
/// derived from it and from [`MonadError`].
pub trait MonadDefer<E>: MonadError<E> {
    /// Defers `thunk` until the computation is run.
    ///
    /// Errors raised while evaluating `thunk` travel through the error
    /// channel of the monad and can be recovered with `handle_error_with`.
    fn suspend<A, F>(thunk: F) -> Self::WithType<A>
    where
        A: Clone + 'static,
        F: Fn() -> Self::WithType<A> + 'static;

    /// Lifts a value-producing expression into a deferred computation.
    #[inline]
    fn delay<A, F>(thunk: F) -> Self::WithType<A>
    where
        A: Clone + 'static,
        F: Fn() -> A + 'static,
    {
        Self::suspend::<A, _>(move || Self::pure(thunk()))
    }

    /// Lifts a fallible expression into a deferred computation.
    ///
    /// `Err` results become failures of the computation.
    #[inline]
    fn delay_result<A, F>(thunk: F) -> Self::WithType<A>
    where
        A: Clone + 'static,
        F: Fn() -> Result<A, E> + 'static,
    {
        Self::suspend::<A, _>(move || Self::from_result(thunk()))
    }

    /// The computation producing `()`.
    #[inline]
    fn unit() -> Self::WithType<()> {
        Self::pure(())
    }
}

// =============================================================================
// Eval Implementation
// =============================================================================

impl<X> MonadDefer<EvalError> for Eval<X> {
    /// Builds a repeatable `Eval`: `thunk` runs on every force.
    #[inline]
    fn suspend<A, F>(thunk: F) -> Eval<A>
    where
        A: Clone + 'static,
        F: Fn() -> Eval<A> + 'static,
    {
        Eval::defer(thunk)
    }

    /// Builds a memoized `Eval`: `thunk` runs on the first force only.
    #[inline]
    fn delay<A, F>(thunk: F) -> Eval<A>
    where
        A: Clone + 'static,
        F: Fn() -> A + 'static,
    {
        Eval::later(thunk)
    }
}
