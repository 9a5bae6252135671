//! # suspension
//!
//! Suspension of synchronous, possibly failing computations inside a
//! generic computation type.
//!
//! ## Overview
//!
//! The crate layers three capabilities on top of each other:
//!
//! - **Sequencing** ([`typeclass::Monad`]): `pure`, `flat_map`, and
//!   stack-safe loops with `tail_rec_m`
//! - **Error Handling** ([`effect::MonadError`]): `raise_error` and
//!   `handle_error_with`
//! - **Suspension** ([`effect::MonadDefer`]): `suspend` and `delay`
//!
//! Two computation types implement them:
//!
//! - [`control::Eval`]: A lazy value that is eager, memoized, or repeatable
//! - [`effect::StateT`]: A state-threading transformer over any base that
//!   already has the capabilities
//!
//! ## Feature Flags
//!
//! The type classes (`typeclass`) and control structures (`control`) depend
//! on each other and are always built.
//!
//! - `effect`: Effect capabilities and `StateT` (enabled by default)
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use suspension::prelude::*;
//!
//! type Counter = StateT<u32, Eval<()>, ()>;
//!
//! let step = <Counter as MonadState<u32>>::modify(|count| count + 1)
//!     .flat_map(|()| <Counter as MonadDefer<EvalError>>::delay(|| "stepped"));
//!
//! assert_eq!(step.run(0).force(), Ok(("stepped", 1)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use suspension::prelude::*;
/// ```
pub mod prelude {

    pub use crate::typeclass::*;

    pub use crate::control::*;

    #[cfg(feature = "effect")]
    pub use crate::effect::*;
}

pub mod typeclass;

pub mod control;

#[cfg(feature = "effect")]
pub mod effect;
