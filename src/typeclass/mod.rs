//! Type class traits for functional programming abstractions.
//!
//! This module provides the foundation the effect capabilities build on:
//!
//! - [`TypeConstructor`]: Trait for emulating higher-kinded types
//! - [`Monad`]: Lifting pure values, sequencing computations with
//!   dependency, and stack-safe monadic loops
//!
//! ## Higher-Kinded Types Emulation
//!
//! Rust does not have native support for higher-kinded types (HKT).
//! This library uses Generic Associated Types (GAT) to emulate HKT
//! behavior. Type class operations are associated functions called on a
//! representative member of the family:
//!
//! ```rust
//! use suspension::control::Eval;
//! use suspension::typeclass::Monad;
//!
//! let computation = <Eval<()> as Monad>::pure(20);
//! let answer = <Eval<()> as Monad>::map(computation, |value| value + 22);
//! assert_eq!(answer.force(), Ok(42));
//! ```

mod higher;
mod monad;

pub use higher::TypeConstructor;
pub use monad::Monad;
