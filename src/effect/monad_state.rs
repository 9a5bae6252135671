//! `MonadState` type class - stateful computation capability.
//!
//! This module provides the `MonadState` trait which abstracts
//! the ability to read and replace a state threaded through a
//! computation. [`StateT`](super::StateT) implements it over any base monad.
//!
//! # Laws
//!
//! ## Get Put Law
//!
//! Getting and then putting the same state is a no-op:
//!
//! ```text
//! get().flat_map(|s| put(s)) == pure(())
//! ```
//!
//! ## Put Get Law
//!
//! After putting a state, get returns that state:
//!
//! ```text
//! put(s).then(get()) returns s
//! ```
//!
//! ## Put Put Law
//!
//! Consecutive puts result in the last put winning:
//!
//! ```text
//! put(s1).then(put(s2)) == put(s2)
//! ```
//!
//! ## Modify Composition Law
//!
//! ```text
//! modify(f).then(modify(g)) == modify(|s| g(f(s)))
//! ```

use crate::typeclass::Monad;

/// A type class for monads that can read and replace a state of type `S`.
///
/// `state` is the primitive transition; `modify` and `gets` are derived
/// from it.
///
/// # Examples
///
/// ```rust
/// use suspension::control::Eval;
/// use suspension::effect::{MonadState, StateT};
///
/// type Counter = StateT<i32, Eval<()>, ()>;
///
/// let computation = <Counter as MonadState<i32>>::state(|count| (count * 10, count + 1));
/// assert_eq!(computation.run(4).force(), Ok((40, 5)));
/// ```
pub trait MonadState<S>: Monad {
    /// Retrieves the current state without modifying it.
    fn get() -> Self::WithType<S>
    where
        S: Clone + 'static;

    /// Replaces the state and produces unit.
    fn put(state: S) -> Self::WithType<()>
    where
        S: Clone + 'static;

    /// Applies a state transition producing a value and the next state.
    fn state<A, F>(transition: F) -> Self::WithType<A>
    where
        A: Clone + 'static,
        F: Fn(S) -> (A, S) + 'static;

    /// Transforms the state and produces unit.
    #[inline]
    fn modify<F>(modifier: F) -> Self::WithType<()>
    where
        F: Fn(S) -> S + 'static,
    {
        Self::state::<(), _>(move |state| ((), modifier(state)))
    }

    /// Projects a value from the state without modifying it.
    #[inline]
    fn gets<A, F>(projection: F) -> Self::WithType<A>
    where
        A: Clone + 'static,
        F: Fn(&S) -> A + 'static,
    {
        Self::state::<A, _>(move |state| (projection(&state), state))
    }
}
