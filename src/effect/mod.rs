//! Effect capabilities for deferred, fallible, and stateful computations.
//!
//! # MTL-Style Type Classes
//!
//! This module provides MTL (Monad Transformer Library) style type classes
//! layered on top of [`Monad`](crate::typeclass::Monad):
//!
//! - [`MonadError`]: Raising and recovering from errors
//! - [`MonadDefer`]: Suspending the construction of a computation
//! - [`MonadState`]: Reading and replacing a threaded state
//!
//! [`Eval`](crate::control::Eval) implements `MonadError` and `MonadDefer`
//! directly. [`StateT`] derives every capability its base monad has.
//!
//! # Suspending Side Effects
//!
//! ```rust
//! use suspension::control::{Eval, EvalError};
//! use suspension::effect::MonadDefer;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let writer = Rc::clone(&log);
//! let logged = <Eval<()> as MonadDefer<EvalError>>::suspend(move || {
//!     writer.borrow_mut().push("ran");
//!     Eval::now(())
//! });
//!
//! // Side effects don't occur until the computation is forced
//! assert!(log.borrow().is_empty());
//! assert_eq!(logged.force(), Ok(()));
//! assert_eq!(*log.borrow(), vec!["ran"]);
//! ```
//!
//! # Monad Transformers
//!
//! - [`StateT`]: Adds state threading to any monad

// =============================================================================
// MTL-Style Type Classes
// =============================================================================

mod monad_defer;
mod monad_error;
mod monad_state;

pub use monad_defer::MonadDefer;
pub use monad_error::MonadError;
pub use monad_state::MonadState;

// =============================================================================
// Monad Transformers
// =============================================================================

mod state_transformer;

pub use state_transformer::StateT;
