//! `MonadError` type class - error handling capability.
//!
//! This module provides the `MonadError` trait which abstracts
//! the ability to raise and recover from errors within a monadic context.
//!
//! # Laws
//!
//! All `MonadError` implementations must satisfy these laws:
//!
//! ## Throw Catch Law
//!
//! Recovering from a raised error applies the handler:
//!
//! ```text
//! handle_error_with(raise_error(e), handler) == handler(e)
//! ```
//!
//! ## Catch Pure Law
//!
//! Recovering when there's no error returns the original:
//!
//! ```text
//! handle_error_with(pure(a), handler) == pure(a)
//! ```
//!
//! ## Throw Short-Circuit Law
//!
//! Raising an error short-circuits subsequent computations:
//!
//! ```text
//! flat_map(raise_error(e), f) == raise_error(e)
//! ```
//!
//! # Examples
//!
//! ```rust
//! use suspension::control::{Eval, EvalError};
//! use suspension::effect::MonadError;
//!
//! let failed: Eval<usize> =
//!     <Eval<()> as MonadError<EvalError>>::raise_error(EvalError::raised("error"));
//! let recovered = <Eval<()> as MonadError<EvalError>>::handle_error_with(failed, |error| {
//!     Eval::now(error.message().len())
//! });
//! assert_eq!(recovered.force(), Ok(5));
//! ```

use crate::control::{Eval, EvalError};
use crate::typeclass::Monad;

/// A type class for monads that can fail with an error of type `E`.
///
/// # Type Parameters
///
/// - `E`: The error type
///
/// Errors raised with `raise_error` are inert until the computation is run;
/// they skip every `flat_map` continuation until a `handle_error_with`
/// recovers them.
pub trait MonadError<E>: Monad {
    /// Creates a computation that fails with `error`.
    fn raise_error<A>(error: E) -> Self::WithType<A>
    where
        A: Clone + 'static;

    /// Recovers from a failure of `computation`.
    ///
    /// The handler receives the error and produces the computation to run
    /// in its place. Successful values pass through unchanged.
    fn handle_error_with<A, F>(computation: Self::WithType<A>, handler: F) -> Self::WithType<A>
    where
        A: Clone + 'static,
        F: Fn(E) -> Self::WithType<A> + 'static;

    /// Recovers from a failure with a plain value.
    #[inline]
    fn handle_error<A, F>(computation: Self::WithType<A>, handler: F) -> Self::WithType<A>
    where
        A: Clone + 'static,
        F: Fn(E) -> A + 'static,
    {
        Self::handle_error_with::<A, _>(computation, move |error| Self::pure(handler(error)))
    }

    /// Exposes failures as `Err` values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::{Eval, EvalError};
    /// use suspension::effect::MonadError;
    ///
    /// let failed: Eval<i32> = Eval::raise_error(EvalError::raised("boom"));
    /// let attempted = <Eval<()> as MonadError<EvalError>>::attempt(failed);
    /// assert_eq!(attempted.force(), Ok(Err(EvalError::raised("boom"))));
    /// ```
    fn attempt<A>(computation: Self::WithType<A>) -> Self::WithType<Result<A, E>>
    where
        A: Clone + 'static,
        E: Clone + 'static,
    {
        let succeeded = Self::map::<A, Result<A, E>, _>(computation, Ok);
        Self::handle_error_with::<Result<A, E>, _>(succeeded, |error| {
            Self::pure(Err::<A, E>(error))
        })
    }

    /// Turns `Err` values back into failures. Inverse of [`attempt`](Self::attempt).
    fn rethrow<A>(computation: Self::WithType<Result<A, E>>) -> Self::WithType<A>
    where
        A: Clone + 'static,
        E: Clone + 'static,
    {
        Self::flat_map::<Result<A, E>, A, _>(computation, |result| Self::from_result::<A>(result))
    }

    /// Lifts a `Result` into the monad.
    fn from_result<A>(result: Result<A, E>) -> Self::WithType<A>
    where
        A: Clone + 'static,
    {
        match result {
            Ok(value) => Self::pure(value),
            Err(error) => Self::raise_error::<A>(error),
        }
    }
}

// =============================================================================
// Eval Implementation
// =============================================================================

impl<X> MonadError<EvalError> for Eval<X> {
    #[inline]
    fn raise_error<A>(error: EvalError) -> Eval<A>
    where
        A: Clone + 'static,
    {
        Eval::raise_error(error)
    }

    #[inline]
    fn handle_error_with<A, F>(computation: Eval<A>, handler: F) -> Eval<A>
    where
        A: Clone + 'static,
        F: Fn(EvalError) -> Eval<A> + 'static,
    {
        computation.handle_error_with(handler)
    }

    #[inline]
    fn attempt<A>(computation: Eval<A>) -> Eval<Result<A, EvalError>>
    where
        A: Clone + 'static,
    {
        computation.attempt()
    }
}
