//! `StateT` - State Monad Transformer.
//!
//! `StateT` adds state threading to any base monad, and carries the base
//! monad's capabilities over to the transformed computation.
//!
//! # Overview
//!
//! `StateT<S, F, A>` encapsulates a function `S -> F::WithType<(A, S)>` where
//! `S` is the state type, `F` is a *representative* of the base monad family
//! (for example `Eval<()>`), and `A` is the produced value.
//!
//! Whenever the base family implements a capability, the transformer does
//! too:
//!
//! | base `F`              | `StateT<S, F, _>`     |
//! |-----------------------|-----------------------|
//! | `Monad`               | `Monad`, `MonadState<S>` |
//! | `MonadError<E>`       | `MonadError<E>`       |
//! | `MonadDefer<E>`       | `MonadDefer<E>`       |
//!
//! # Examples
//!
//! ```rust
//! use suspension::control::Eval;
//! use suspension::effect::StateT;
//!
//! let state: StateT<i32, Eval<()>, i32> = StateT::new(|s| Eval::now((s * 2, s + 1)));
//! assert_eq!(state.run(10).force(), Ok((20, 11)));
//! ```
//!
//! Deferring an effect until the state is supplied:
//!
//! ```rust
//! use suspension::control::{Eval, EvalError};
//! use suspension::effect::{MonadDefer, MonadState, StateT};
//!
//! type Counter = StateT<u32, Eval<()>, ()>;
//!
//! let greeting = <Counter as MonadDefer<EvalError>>::delay(|| "hello".to_string())
//!     .flat_map(|text| {
//!         <Counter as MonadState<u32>>::gets(move |count| format!("{text} #{count}"))
//!     });
//! assert_eq!(greeting.eval(7).force(), Ok("hello #7".to_string()));
//! ```

#![forbid(unsafe_code)]

use std::any::Any;
use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use super::{MonadDefer, MonadError, MonadState};
use crate::control::Either;
use crate::typeclass::{Monad, TypeConstructor};

/// A monad transformer that threads a state through a base monad.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `F`: The representative of the base monad family (e.g., `Eval<()>`)
/// - `A`: The produced value type
///
/// Results pair the value with the final state as `(value, state)`.
pub struct StateT<S, F, A>
where
    S: 'static,
    F: TypeConstructor,
    A: 'static,
{
    /// The wrapped state transition function.
    /// Uses Rc so that the computation can be cloned and run many times.
    run_function: Rc<dyn Fn(S) -> F::WithType<(A, S)>>,
}

impl<S, F, A> StateT<S, F, A>
where
    S: 'static,
    F: TypeConstructor,
    A: 'static,
{
    /// Creates a new `StateT` from a state transition function.
    pub fn new<T>(transition: T) -> Self
    where
        T: Fn(S) -> F::WithType<(A, S)> + 'static,
    {
        Self {
            run_function: Rc::new(transition),
        }
    }

    /// Runs the computation from `initial_state`.
    ///
    /// The returned base computation yields `(value, final_state)`.
    pub fn run(&self, initial_state: S) -> F::WithType<(A, S)> {
        (self.run_function)(initial_state)
    }
}

impl<S, F, A> StateT<S, F, A>
where
    S: Clone + 'static,
    F: Monad + 'static,
    A: Clone + 'static,
{
    /// Runs the computation and keeps only the produced value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::Eval;
    /// use suspension::effect::StateT;
    ///
    /// let state: StateT<i32, Eval<()>, i32> = StateT::new(|s| Eval::now((s * 2, s + 1)));
    /// assert_eq!(state.eval(10).force(), Ok(20));
    /// ```
    pub fn eval(&self, initial_state: S) -> F::WithType<A> {
        F::map::<(A, S), A, _>(self.run(initial_state), |(value, _)| value)
    }

    /// Runs the computation and keeps only the final state.
    pub fn exec(&self, initial_state: S) -> F::WithType<S> {
        F::map::<(A, S), S, _>(self.run(initial_state), |(_, state)| state)
    }

    /// Lifts a base computation, leaving the state untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::Eval;
    /// use suspension::effect::StateT;
    ///
    /// let lifted: StateT<&str, Eval<()>, i32> = StateT::lift(Eval::always(|| 42));
    /// assert_eq!(lifted.run("untouched").force(), Ok((42, "untouched")));
    /// ```
    pub fn lift(inner: F::WithType<A>) -> Self
    where
        F::WithType<A>: Clone,
    {
        Self::new(move |state: S| {
            F::map::<A, (A, S), _>(inner.clone(), move |value| (value, state.clone()))
        })
    }

    /// Applies a function to the produced value.
    pub fn map<B, G>(self, function: G) -> StateT<S, F, B>
    where
        B: Clone + 'static,
        G: Fn(A) -> B + 'static,
    {
        <Self as Monad>::map::<A, B, G>(self, function)
    }

    /// Sequences this computation with a function producing the next one.
    ///
    /// The next computation runs from the state this one finished with.
    pub fn flat_map<B, G>(self, function: G) -> StateT<S, F, B>
    where
        B: Clone + 'static,
        G: Fn(A) -> StateT<S, F, B> + 'static,
    {
        <Self as Monad>::flat_map::<A, B, G>(self, function)
    }
}

// =============================================================================
// Clone Implementation
// =============================================================================

impl<S, F, A> Clone for StateT<S, F, A>
where
    S: 'static,
    F: TypeConstructor,
    A: 'static,
{
    fn clone(&self) -> Self {
        Self {
            run_function: Rc::clone(&self.run_function),
        }
    }
}

static_assertions::assert_not_impl_any!(StateT<i32, crate::control::Eval<()>, i32>: Send, Sync);

// =============================================================================
// Drop Implementation
// =============================================================================

thread_local! {
    /// Transition functions released while an outer release is still draining.
    static RELEASE_QUEUE: RefCell<Option<Vec<Box<dyn Any>>>> = const { RefCell::new(None) };
}

/// Resets the release queue when the outermost release finishes or unwinds.
struct DrainGuard;

impl Drop for DrainGuard {
    fn drop(&mut self) {
        let _ = RELEASE_QUEUE.try_with(|queue| queue.borrow_mut().take());
    }
}

/// Drops a detached transition function without recursing into the
/// computations it captured.
///
/// A nested release only enqueues. The outermost release drains the queue
/// in a loop, so a chain of `n` captured computations is dropped at constant
/// stack depth.
fn release(retired: Box<dyn Any>) {
    let retired = RELEASE_QUEUE.try_with(move |queue| {
        let mut queue = queue.borrow_mut();
        match queue.as_mut() {
            Some(pending) => {
                pending.push(retired);
                None
            }
            None => {
                *queue = Some(Vec::new());
                Some(retired)
            }
        }
    });
    let Ok(Some(retired)) = retired else {
        return;
    };

    let _guard = DrainGuard;
    drop(retired);
    while let Some(next) = RELEASE_QUEUE
        .try_with(|queue| queue.borrow_mut().as_mut().and_then(Vec::pop))
        .ok()
        .flatten()
    {
        drop(next);
    }
}

fn inert_transition<S, R>() -> Rc<dyn Fn(S) -> R>
where
    S: 'static,
    R: 'static,
{
    Rc::new(|_: S| -> R {
        unreachable!("a released StateT is never run")
    })
}

impl<S, F, A> Drop for StateT<S, F, A>
where
    S: 'static,
    F: TypeConstructor,
    A: 'static,
{
    fn drop(&mut self) {
        if Rc::strong_count(&self.run_function) == 1 {
            let detached = mem::replace(&mut self.run_function, inert_transition());
            release(Box::new(detached));
        }
    }
}

/// Runs `computation` from `state` inside a bind of the base family.
///
/// Nested runs then unfold one bind at a time when the base computation is
/// evaluated, instead of all at once on the call stack.
fn run_within<S, F, A>(computation: &StateT<S, F, A>, state: S) -> F::WithType<(A, S)>
where
    S: Clone + 'static,
    F: Monad + 'static,
    A: Clone + 'static,
{
    let computation = computation.clone();
    F::flat_map::<(), (A, S), _>(F::pure(()), move |()| computation.run(state.clone()))
}

// =============================================================================
// Type Class Implementations
// =============================================================================

impl<S, F, X> TypeConstructor for StateT<S, F, X>
where
    S: 'static,
    F: TypeConstructor + 'static,
    X: 'static,
{
    type Inner = X;
    type WithType<B: 'static> = StateT<S, F, B>;
}

impl<S, F, X> Monad for StateT<S, F, X>
where
    S: Clone + 'static,
    F: Monad + 'static,
    X: 'static,
{
    fn pure<A>(value: A) -> StateT<S, F, A>
    where
        A: Clone + 'static,
    {
        StateT::new(move |state| F::pure((value.clone(), state)))
    }

    fn flat_map<A, B, G>(computation: StateT<S, F, A>, function: G) -> StateT<S, F, B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        G: Fn(A) -> StateT<S, F, B> + 'static,
    {
        let function = Rc::new(function);
        StateT::new(move |state| {
            let function = Rc::clone(&function);
            F::flat_map::<(A, S), (B, S), _>(
                run_within(&computation, state),
                move |(value, next_state)| function(value).run(next_state),
            )
        })
    }

    /// Delegates the loop to the base family, carrying the state in the seed.
    fn tail_rec_m<A, B, G>(seed: A, step: G) -> StateT<S, F, B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        G: Fn(A) -> StateT<S, F, Either<A, B>> + 'static,
    {
        let step = Rc::new(step);
        StateT::new(move |state| {
            let step = Rc::clone(&step);
            F::tail_rec_m::<(A, S), (B, S), _>(
                (seed.clone(), state),
                move |(current, current_state)| {
                    F::map::<(Either<A, B>, S), Either<(A, S), (B, S)>, _>(
                        step(current).run(current_state),
                        |(signal, next_state)| match signal {
                            Either::Left(next) => Either::Left((next, next_state)),
                            Either::Right(result) => Either::Right((result, next_state)),
                        },
                    )
                },
            )
        })
    }
}

impl<S, F, X, E> MonadError<E> for StateT<S, F, X>
where
    S: Clone + 'static,
    F: MonadError<E> + 'static,
    X: 'static,
    E: Clone + 'static,
{
    fn raise_error<A>(error: E) -> StateT<S, F, A>
    where
        A: Clone + 'static,
    {
        StateT::new(move |_| F::raise_error::<(A, S)>(error.clone()))
    }

    /// Recovers from a failure, running the recovery from the original state.
    ///
    /// If the recovery itself fails, `handler` is applied once more to the
    /// nested error, again from the state the computation started with. A
    /// failure of that second recovery propagates.
    fn handle_error_with<A, H>(computation: StateT<S, F, A>, handler: H) -> StateT<S, F, A>
    where
        A: Clone + 'static,
        H: Fn(E) -> StateT<S, F, A> + 'static,
    {
        let handler = Rc::new(handler);
        StateT::new(move |state: S| {
            let original = state.clone();
            let handler = Rc::clone(&handler);
            F::handle_error_with::<(A, S), _>(run_within(&computation, state), move |error| {
                let retry = Rc::clone(&handler);
                let entered = original.clone();
                F::handle_error_with::<(A, S), _>(
                    handler(error).run(original.clone()),
                    move |nested| {
                        tracing::debug!("state recovery failed, recovering the nested error");
                        retry(nested).run(entered.clone())
                    },
                )
            })
        })
    }
}

impl<S, F, X, E> MonadDefer<E> for StateT<S, F, X>
where
    S: Clone + 'static,
    F: MonadDefer<E> + 'static,
    X: 'static,
    E: Clone + 'static,
{
    fn suspend<A, T>(thunk: T) -> StateT<S, F, A>
    where
        A: Clone + 'static,
        T: Fn() -> StateT<S, F, A> + 'static,
    {
        let thunk = Rc::new(thunk);
        StateT::new(move |state: S| {
            let thunk = Rc::clone(&thunk);
            F::suspend::<(A, S), _>(move || thunk().run(state.clone()))
        })
    }
}

impl<S, F, X> MonadState<S> for StateT<S, F, X>
where
    S: Clone + 'static,
    F: Monad + 'static,
    X: 'static,
{
    fn get() -> StateT<S, F, S> {
        StateT::new(|state: S| F::pure((state.clone(), state)))
    }

    fn put(state: S) -> StateT<S, F, ()> {
        StateT::new(move |_| F::pure(((), state.clone())))
    }

    fn state<A, T>(transition: T) -> StateT<S, F, A>
    where
        A: Clone + 'static,
        T: Fn(S) -> (A, S) + 'static,
    {
        StateT::new(move |state| F::pure(transition(state)))
    }
}
