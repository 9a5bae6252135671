//! Control structures for suspended computations.
//!
//! This module provides:
//!
//! - [`Eval`]: A lazy value with eager, memoized, and repeatable forms
//! - [`EvalError`]: The error channel of `Eval`
//! - [`Either`]: The continue/done signal of monadic loops
//!
//! # Examples
//!
//! ## Lazy Evaluation
//!
//! ```rust
//! use suspension::control::Eval;
//!
//! let lazy = Eval::later(|| {
//!     println!("Computing...");
//!     42
//! });
//! // "Computing..." is not printed yet
//!
//! assert_eq!(lazy.force(), Ok(42));
//! // Printed exactly once, even if forced again
//! assert_eq!(lazy.force(), Ok(42));
//! ```
//!
//! ## Stack-Safe Recursion
//!
//! ```rust
//! use suspension::control::Eval;
//!
//! fn factorial(n: u64, accumulator: u64) -> Eval<u64> {
//!     if n <= 1 {
//!         Eval::now(accumulator)
//!     } else {
//!         Eval::defer(move || factorial(n - 1, n * accumulator))
//!     }
//! }
//!
//! assert_eq!(factorial(10, 1).force(), Ok(3_628_800));
//! ```

mod either;
mod error;
mod eval;

pub use either::Either;
pub use error::EvalError;
pub use eval::Eval;
