//! Either type - a value that can be one of two types.
//!
//! `Either<L, R>` is the step signal of monadic loops (`Monad::tail_rec_m`):
//! `Left` carries the seed of the next iteration and `Right` carries the
//! final result.
//!
//! # Examples
//!
//! ```rust
//! use suspension::control::Either;
//!
//! fn step(counter: u32) -> Either<u32, String> {
//!     if counter < 3 {
//!         Either::Left(counter + 1)
//!     } else {
//!         Either::Right(format!("stopped at {counter}"))
//!     }
//! }
//!
//! assert_eq!(step(0), Either::Left(1));
//! assert_eq!(step(3), Either::Right("stopped at 3".to_string()));
//! ```

use std::fmt;

/// A value that can be one of two types.
///
/// In loops `Left` means "continue" and `Right` means "done".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Either<L, R> {
    /// The left variant: continue looping with a new seed.
    Left(L),
    /// The right variant: the loop finished with this result.
    Right(R),
}

impl<L: fmt::Debug, R: fmt::Debug> fmt::Debug for Either<L, R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left(value) => formatter.debug_tuple("Left").field(value).finish(),
            Self::Right(value) => formatter.debug_tuple("Right").field(value).finish(),
        }
    }
}
