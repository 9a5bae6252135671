//! Monad type class - sequencing computations within a context.
//!
//! This module provides the `Monad` trait: lifting pure values, sequencing
//! computations where each step depends on the result of the previous one,
//! and running stack-safe monadic loops with `tail_rec_m`.
//!
//! Operations are associated functions on a *representative* type (see
//! [`TypeConstructor`]), so a generic function names the family it works in
//! rather than receiving a value of it:
//!
//! ```rust
//! use suspension::control::Eval;
//! use suspension::typeclass::Monad;
//!
//! fn double<M: Monad>(computation: M::WithType<i32>) -> M::WithType<i32> {
//!     M::map::<i32, i32, _>(computation, |value| value * 2)
//! }
//!
//! let doubled = double::<Eval<()>>(Eval::now(21));
//! assert_eq!(doubled.force(), Ok(42));
//! ```
//!
//! # Laws
//!
//! ## Left Identity Law
//!
//! ```text
//! flat_map(pure(a), f) == f(a)
//! ```
//!
//! ## Right Identity Law
//!
//! ```text
//! flat_map(m, pure) == m
//! ```
//!
//! ## Associativity Law
//!
//! ```text
//! flat_map(flat_map(m, f), g) == flat_map(m, |x| flat_map(f(x), g))
//! ```
//!
//! ## Tail Recursion Law
//!
//! `tail_rec_m` agrees with the naive recursive loop built from `flat_map`,
//! and never grows the call stack with the number of iterations.

use super::higher::TypeConstructor;
use crate::control::Either;

/// A type class for computation families that support sequencing.
///
/// Unlike `Option::and_then`, the functions handed to `flat_map` are `Fn`:
/// computations in this crate can be run more than once, and every run
/// calls the continuation again.
pub trait Monad: TypeConstructor {
    /// Lifts a pure value into the family.
    fn pure<A>(value: A) -> Self::WithType<A>
    where
        A: Clone + 'static;

    /// Sequences `computation` with a function producing the next computation.
    fn flat_map<A, B, F>(computation: Self::WithType<A>, function: F) -> Self::WithType<B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        F: Fn(A) -> Self::WithType<B> + 'static;

    /// Runs `step` from `seed` until it yields `Either::Right`.
    ///
    /// `Either::Left(next)` continues the loop with `next` as the new seed.
    /// Implementations must execute the loop iteratively.
    fn tail_rec_m<A, B, F>(seed: A, step: F) -> Self::WithType<B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        F: Fn(A) -> Self::WithType<Either<A, B>> + 'static;

    /// Applies a function to the produced value.
    #[inline]
    fn map<A, B, F>(computation: Self::WithType<A>, function: F) -> Self::WithType<B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        F: Fn(A) -> B + 'static,
    {
        Self::flat_map::<A, B, _>(computation, move |value| Self::pure(function(value)))
    }

    /// Sequences two computations, discarding the first result.
    ///
    /// Failures of `computation` still propagate and skip `next`.
    #[inline]
    fn then<A, B>(computation: Self::WithType<A>, next: Self::WithType<B>) -> Self::WithType<B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        Self::WithType<B>: Clone,
    {
        Self::flat_map::<A, B, _>(computation, move |_| next.clone())
    }
}
