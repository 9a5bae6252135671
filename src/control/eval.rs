//! Lazy values with optional memoization and an error channel.
//!
//! This module provides the `Eval<A>` type: a description of how to compute
//! a value of type `A`. Nothing runs until [`Eval::force`] is called.
//!
//! An `Eval` is built from one of three kinds of leaves:
//!
//! - **Eager** ([`Eval::now`]): the value is already known.
//! - **Memoized** ([`Eval::later`]): the thunk runs on the first force and
//!   its outcome is cached; later forces reuse it.
//! - **Repeatable** ([`Eval::defer`], [`Eval::always`]): the thunk runs on
//!   every force.
//!
//! Composition (`flat_map`, `handle_error_with`, ...) is itself deferred and
//! interpreted by an iterative evaluator that keeps its continuations on the
//! heap, so long chains of `defer` and `flat_map` do not grow the call stack.
//!
//! # Examples
//!
//! ```rust
//! use suspension::control::Eval;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let calls = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&calls);
//! let memoized = Eval::later(move || {
//!     counter.set(counter.get() + 1);
//!     21
//! });
//!
//! let doubled = memoized.map(|value| value * 2);
//! assert_eq!(calls.get(), 0);
//!
//! assert_eq!(doubled.force(), Ok(42));
//! assert_eq!(doubled.force(), Ok(42));
//! assert_eq!(calls.get(), 1);
//! ```
//!
//! # Errors
//!
//! Forcing returns `Result<A, EvalError>`. Errors raised with
//! [`Eval::raise_error`] and panics inside thunks, continuations, or
//! handlers all travel through the same channel and can be recovered with
//! [`Eval::handle_error_with`].
//!
//! ```rust
//! use suspension::control::{Eval, EvalError};
//!
//! let failing: Eval<i32> = Eval::always(|| panic!("sensor offline"));
//! let recovered = failing.handle_error_with(|error| {
//!     assert!(error.is_panic());
//!     Eval::now(0)
//! });
//! assert_eq!(recovered.force(), Ok(0));
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use super::either::Either;
use super::error::EvalError;
use crate::typeclass::{Monad, TypeConstructor};

type Erased = Box<dyn Any>;
type Outcome = Result<Erased, EvalError>;

/// The type-erased evaluation graph behind an `Eval`.
///
/// Every variant is cheap to clone so that the same graph can be forced
/// any number of times.
#[derive(Clone)]
enum Node {
    Now(Rc<dyn Fn() -> Erased>),
    Later(Rc<dyn Fn() -> Outcome>),
    Raise(EvalError),
    Defer(Rc<dyn Fn() -> Node>),
    FlatMap(Rc<Node>, Rc<dyn Fn(Erased) -> Node>),
    HandleErrorWith(Rc<Node>, Rc<dyn Fn(EvalError) -> Node>),
}

impl Node {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Now(_) => "Now",
            Self::Later(_) => "Later",
            Self::Raise(_) => "Raise",
            Self::Defer(_) => "Defer",
            Self::FlatMap(_, _) => "FlatMap",
            Self::HandleErrorWith(_, _) => "HandleErrorWith",
        }
    }
}

/// A pending continuation on the evaluator's stack.
enum Frame {
    Bind(Rc<dyn Fn(Erased) -> Node>),
    Recover(Rc<dyn Fn(EvalError) -> Node>),
}

/// Runs `function`, converting a panic into `EvalError::Panicked`.
fn catch_panic<T>(function: impl FnOnce() -> T) -> Result<T, EvalError> {
    catch_unwind(AssertUnwindSafe(function)).map_err(|payload| {
        let error = EvalError::from_panic(&*payload);
        tracing::debug!(panic = error.message(), "captured panic during evaluation");
        error
    })
}

fn downcast<A: 'static>(value: Erased) -> A {
    match value.downcast::<A>() {
        Ok(value) => *value,
        Err(_) => unreachable!("Eval graph produced a value of an unexpected type"),
    }
}

/// Interprets an evaluation graph without recursing on the call stack.
fn evaluate(root: Node) -> Outcome {
    let mut frames: Vec<Frame> = Vec::new();
    let mut current = root;

    loop {
        let outcome = match current {
            Node::Now(value) => Ok(value()),
            Node::Later(cell) => cell(),
            Node::Raise(error) => Err(error),
            Node::Defer(thunk) => match catch_panic(|| thunk()) {
                Ok(next) => {
                    current = next;
                    continue;
                }
                Err(error) => Err(error),
            },
            Node::FlatMap(source, bind) => {
                frames.push(Frame::Bind(bind));
                current = Node::clone(&source);
                continue;
            }
            Node::HandleErrorWith(source, handler) => {
                frames.push(Frame::Recover(handler));
                current = Node::clone(&source);
                continue;
            }
        };

        match unwind(&mut frames, outcome) {
            Either::Left(next) => current = next,
            Either::Right(outcome) => return outcome,
        }
    }
}

/// Feeds an outcome to the pending frames until one produces a new node.
///
/// Values skip `Recover` frames and errors skip `Bind` frames.
fn unwind(frames: &mut Vec<Frame>, mut outcome: Outcome) -> Either<Node, Outcome> {
    while let Some(frame) = frames.pop() {
        outcome = match (frame, outcome) {
            (Frame::Bind(bind), Ok(value)) => match catch_panic(|| bind(value)) {
                Ok(next) => return Either::Left(next),
                Err(error) => Err(error),
            },
            (Frame::Recover(handler), Err(error)) => match catch_panic(|| handler(error)) {
                Ok(next) => return Either::Left(next),
                Err(error) => Err(error),
            },
            (_, passing) => passing,
        };
    }
    Either::Right(outcome)
}

// =============================================================================
// Memo Cell
// =============================================================================

/// The state of a memoized thunk.
enum MemoState<A> {
    Unevaluated(Box<dyn FnOnce() -> Result<A, EvalError>>),
    /// The thunk is running; forcing the cell now is a reentrant force.
    Evaluating,
    Evaluated(A),
    Failed(EvalError),
}

/// A write-once cache cell.
///
/// Transitions `Unevaluated -> Evaluating -> Evaluated | Failed` happen
/// only on force, and the final state is terminal.
struct Memo<A> {
    state: RefCell<MemoState<A>>,
}

impl<A: Clone + 'static> Memo<A> {
    fn new<F>(thunk: F) -> Self
    where
        F: FnOnce() -> Result<A, EvalError> + 'static,
    {
        Self {
            state: RefCell::new(MemoState::Unevaluated(Box::new(thunk))),
        }
    }

    fn force(&self) -> Result<A, EvalError> {
        // Keep the borrow short: the thunk may force other cells.
        let thunk = {
            let mut state = self.state.borrow_mut();
            match &*state {
                MemoState::Evaluated(value) => return Ok(value.clone()),
                MemoState::Failed(error) => return Err(error.clone()),
                MemoState::Evaluating => return Err(EvalError::Reentrant),
                MemoState::Unevaluated(_) => {}
            }
            let MemoState::Unevaluated(thunk) =
                mem::replace(&mut *state, MemoState::Evaluating)
            else {
                unreachable!()
            };
            thunk
        };

        let outcome = catch_panic(thunk).and_then(|result| result);
        tracing::trace!(failed = outcome.is_err(), "memoized evaluation settled");

        *self.state.borrow_mut() = match &outcome {
            Ok(value) => MemoState::Evaluated(value.clone()),
            Err(error) => MemoState::Failed(error.clone()),
        };
        outcome
    }
}

// =============================================================================
// Eval
// =============================================================================

/// A lazily evaluated computation producing `A` or failing with
/// [`EvalError`].
///
/// `Eval` is cheap to clone: clones share the same evaluation graph, and in
/// particular the same memo cells. It is neither `Send` nor `Sync`; a
/// computation and all of its clones are forced on one thread.
///
/// # Laws
///
/// `Eval` forms a monad with errors:
///
/// - **Left Identity**: `Eval::now(a).flat_map(f) == f(a)`
/// - **Right Identity**: `m.flat_map(Eval::now) == m`
/// - **Associativity**: `m.flat_map(f).flat_map(g) == m.flat_map(|x| f(x).flat_map(g))`
/// - **Throw Catch**: `Eval::raise_error(e).handle_error_with(h) == h(e)`
pub struct Eval<A> {
    node: Node,
    marker: PhantomData<fn() -> A>,
}

impl<A> Eval<A> {
    const fn from_node(node: Node) -> Self {
        Self {
            node,
            marker: PhantomData,
        }
    }

    /// Takes the graph out, leaving an inert leaf for `Drop` to discard.
    fn into_node(mut self) -> Node {
        mem::replace(&mut self.node, Node::Raise(EvalError::Reentrant))
    }
}

impl<A: Clone + 'static> Eval<A> {
    /// Creates an eager value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::Eval;
    ///
    /// assert_eq!(Eval::now("ready").force(), Ok("ready"));
    /// ```
    pub fn now(value: A) -> Self {
        Self::from_node(Node::Now(Rc::new(move || {
            Box::new(value.clone()) as Erased
        })))
    }

    /// Creates a memoized value.
    ///
    /// `thunk` runs at most once, on the first force. Its outcome, value or
    /// failure, is returned by every later force.
    pub fn later<F>(thunk: F) -> Self
    where
        F: FnOnce() -> A + 'static,
    {
        Self::from_memo(Memo::new(move || Ok(thunk())))
    }

    /// Creates a repeatable value: `thunk` runs on every force.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::Eval;
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let calls = Rc::new(Cell::new(0));
    /// let counter = Rc::clone(&calls);
    /// let repeated = Eval::always(move || {
    ///     counter.set(counter.get() + 1);
    ///     counter.get()
    /// });
    ///
    /// assert_eq!(repeated.force(), Ok(1));
    /// assert_eq!(repeated.force(), Ok(2));
    /// ```
    pub fn always<F>(thunk: F) -> Self
    where
        F: Fn() -> A + 'static,
    {
        Self::defer(move || Self::now(thunk()))
    }

    /// Defers the construction of an `Eval` until it is forced.
    ///
    /// `thunk` runs on every force and the returned computation is forced in
    /// its place. Chains of `defer` are evaluated as trampoline bounces.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::Eval;
    ///
    /// fn count_down(n: u64) -> Eval<u64> {
    ///     if n == 0 {
    ///         Eval::now(0)
    ///     } else {
    ///         Eval::defer(move || count_down(n - 1))
    ///     }
    /// }
    ///
    /// assert_eq!(count_down(100_000).force(), Ok(0));
    /// ```
    pub fn defer<F>(thunk: F) -> Self
    where
        F: Fn() -> Self + 'static,
    {
        Self::from_node(Node::Defer(Rc::new(move || thunk().into_node())))
    }

    /// Creates a computation that fails with `error` when forced.
    pub fn raise_error(error: EvalError) -> Self {
        Self::from_node(Node::Raise(error))
    }

    /// Lifts a `Result` into `Eval`.
    pub fn from_result(result: Result<A, EvalError>) -> Self {
        match result {
            Ok(value) => Self::now(value),
            Err(error) => Self::raise_error(error),
        }
    }

    fn from_memo(memo: Memo<A>) -> Self {
        let cell = Rc::new(memo);
        Self::from_node(Node::Later(Rc::new(move || {
            cell.force().map(|value| Box::new(value) as Erased)
        })))
    }

    /// Forces the computation.
    ///
    /// # Errors
    ///
    /// Returns the error that was raised and not recovered, including
    /// panics captured as [`EvalError::Panicked`].
    pub fn force(&self) -> Result<A, EvalError> {
        evaluate(self.node.clone()).map(downcast::<A>)
    }

    /// Applies a function to the produced value.
    pub fn map<B, F>(self, function: F) -> Eval<B>
    where
        B: Clone + 'static,
        F: Fn(A) -> B + 'static,
    {
        self.flat_map(move |value| Eval::now(function(value)))
    }

    /// Sequences this computation with a function producing the next one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::Eval;
    ///
    /// let total = Eval::now(40).flat_map(|value| Eval::always(move || value + 2));
    /// assert_eq!(total.force(), Ok(42));
    /// ```
    pub fn flat_map<B, F>(self, function: F) -> Eval<B>
    where
        B: Clone + 'static,
        F: Fn(A) -> Eval<B> + 'static,
    {
        Eval::from_node(Node::FlatMap(
            Rc::new(self.into_node()),
            Rc::new(move |value| function(downcast::<A>(value)).into_node()),
        ))
    }

    /// Recovers from a failure of this computation.
    ///
    /// The handler runs only when the result is forced and this computation
    /// failed; successful values pass through unchanged.
    pub fn handle_error_with<F>(self, handler: F) -> Self
    where
        F: Fn(EvalError) -> Self + 'static,
    {
        Self::from_node(Node::HandleErrorWith(
            Rc::new(self.into_node()),
            Rc::new(move |error| handler(error).into_node()),
        ))
    }

    /// Exposes the outcome as a value, turning failures into `Err`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::{Eval, EvalError};
    ///
    /// let failed: Eval<i32> = Eval::raise_error(EvalError::raised("nope"));
    /// assert_eq!(failed.attempt().force(), Ok(Err(EvalError::raised("nope"))));
    /// ```
    pub fn attempt(self) -> Eval<Result<A, EvalError>> {
        self.map(Ok)
            .handle_error_with(|error| Eval::now(Err(error)))
    }

    /// Caches the outcome of this computation after its first force.
    ///
    /// Eager and already memoized values are returned unchanged.
    pub fn memoize(self) -> Self {
        if matches!(self.node, Node::Now(_) | Node::Later(_)) {
            return self;
        }
        Self::from_memo(Memo::new(move || self.force()))
    }

    /// Runs `step` from `seed` until it yields `Either::Right`.
    ///
    /// Every iteration forces `step(current)`; `Left(next)` replaces the
    /// loop variable and `Right(result)` ends the loop with `Eval::now`. The
    /// loop is a plain `loop`, so the number of iterations is unbounded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use suspension::control::{Either, Eval};
    ///
    /// let counted = Eval::tail_rec_m(0_u64, |n| {
    ///     Eval::now(if n < 100_000 { Either::Left(n + 1) } else { Either::Right(n) })
    /// });
    /// assert_eq!(counted.force(), Ok(100_000));
    /// ```
    pub fn tail_rec_m<S, F>(seed: S, step: F) -> Self
    where
        S: Clone + 'static,
        F: Fn(S) -> Eval<Either<S, A>> + 'static,
    {
        Self::defer(move || {
            let mut current = seed.clone();
            loop {
                match step(current).force() {
                    Ok(Either::Left(next)) => current = next,
                    Ok(Either::Right(result)) => return Self::now(result),
                    Err(error) => return Self::raise_error(error),
                }
            }
        })
    }
}

impl<A> Clone for Eval<A> {
    fn clone(&self) -> Self {
        Self::from_node(self.node.clone())
    }
}

/// Unlinks uniquely owned sources one level at a time, so that dropping a long
/// eagerly built chain does not recurse through it.
impl<A> Drop for Eval<A> {
    fn drop(&mut self) {
        let mut node = mem::replace(&mut self.node, Node::Raise(EvalError::Reentrant));
        loop {
            let source = match node {
                Node::FlatMap(source, bind) => {
                    drop(bind);
                    source
                }
                Node::HandleErrorWith(source, handler) => {
                    drop(handler);
                    source
                }
                _ => break,
            };
            match Rc::try_unwrap(source) {
                Ok(inner) => node = inner,
                Err(_) => break,
            }
        }
    }
}

impl<A> fmt::Debug for Eval<A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("Eval")
            .field(&self.node.kind())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Eval<i32>: Send, Sync);

// =============================================================================
// Type Class Implementations
// =============================================================================

impl<X> TypeConstructor for Eval<X> {
    type Inner = X;
    type WithType<B: 'static> = Eval<B>;
}

impl<X> Monad for Eval<X> {
    #[inline]
    fn pure<A>(value: A) -> Eval<A>
    where
        A: Clone + 'static,
    {
        Eval::now(value)
    }

    #[inline]
    fn flat_map<A, B, F>(computation: Eval<A>, function: F) -> Eval<B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        F: Fn(A) -> Eval<B> + 'static,
    {
        computation.flat_map(function)
    }

    #[inline]
    fn tail_rec_m<A, B, F>(seed: A, step: F) -> Eval<B>
    where
        A: Clone + 'static,
        B: Clone + 'static,
        F: Fn(A) -> Eval<Either<A, B>> + 'static,
    {
        Eval::tail_rec_m(seed, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;

    fn counting<T: Clone + 'static>(value: T) -> (Rc<Cell<usize>>, impl Fn() -> T + 'static) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        (calls, move || {
            counter.set(counter.get() + 1);
            value.clone()
        })
    }

    #[rstest]
    fn test_now_forces_to_value() {
        assert_eq!(Eval::now(42).force(), Ok(42));
    }

    #[rstest]
    fn test_later_runs_thunk_once() {
        let (calls, thunk) = counting(7);
        let memoized = Eval::later(thunk);
        assert_eq!(calls.get(), 0);
        assert_eq!(memoized.force(), Ok(7));
        assert_eq!(memoized.force(), Ok(7));
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    fn test_always_runs_thunk_every_force() {
        let (calls, thunk) = counting("again");
        let repeated = Eval::always(thunk);
        let _ = repeated.force();
        let _ = repeated.force();
        let _ = repeated.force();
        assert_eq!(calls.get(), 3);
    }

    #[rstest]
    fn test_clones_share_memo_cell() {
        let (calls, thunk) = counting(1);
        let original = Eval::later(thunk);
        let copy = original.clone();
        assert_eq!(original.force(), Ok(1));
        assert_eq!(copy.force(), Ok(1));
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    fn test_memoized_failure_is_terminal() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let failing: Eval<i32> = Eval::later(move || {
            counter.set(counter.get() + 1);
            panic!("first force fails")
        });
        assert!(failing.force().is_err_and(|error| error.is_panic()));
        assert!(failing.force().is_err());
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    fn test_reentrant_memo_force_is_reported() {
        let slot: Rc<RefCell<Option<Eval<i32>>>> = Rc::new(RefCell::new(None));
        let inner_slot = Rc::clone(&slot);
        let cyclic = Eval::later(move || {
            let this = inner_slot.borrow().clone();
            this.map_or(0, |eval| eval.force().unwrap_or(-1))
        });
        *slot.borrow_mut() = Some(cyclic.clone());
        assert_eq!(cyclic.force(), Ok(-1));
        slot.borrow_mut().take();
    }

    #[rstest]
    fn test_raise_error_is_inert_until_forced() {
        let failing: Eval<u8> = Eval::raise_error(EvalError::raised("late"));
        assert_eq!(failing.force(), Err(EvalError::raised("late")));
    }

    #[rstest]
    fn test_error_skips_flat_map() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let failing: Eval<i32> = Eval::raise_error(EvalError::raised("stop"));
        let chained = failing.flat_map(move |value| {
            counter.set(counter.get() + 1);
            Eval::now(value + 1)
        });
        assert_eq!(chained.force(), Err(EvalError::raised("stop")));
        assert_eq!(calls.get(), 0);
    }

    #[rstest]
    fn test_handle_error_with_passes_values_through() {
        let recovered = Eval::now(5).handle_error_with(|_| Eval::now(0));
        assert_eq!(recovered.force(), Ok(5));
    }

    #[rstest]
    fn test_panic_in_flat_map_is_recoverable() {
        let broken = Eval::now(1).flat_map(|_: i32| -> Eval<i32> { panic!("bad continuation") });
        let recovered = broken.handle_error_with(|error| {
            Eval::now(i32::try_from(error.message().len()).unwrap_or(0))
        });
        assert_eq!(recovered.force(), Ok(16));
    }

    #[rstest]
    fn test_error_in_handler_propagates_outward() {
        let failing: Eval<i32> = Eval::raise_error(EvalError::raised("first"));
        let rethrown = failing
            .handle_error_with(|_| Eval::raise_error(EvalError::raised("second")))
            .handle_error_with(|error| {
                Eval::now(if error.message() == "second" { 2 } else { 0 })
            });
        assert_eq!(rethrown.force(), Ok(2));
    }

    #[rstest]
    fn test_memoize_turns_repeatable_into_memoized() {
        let (calls, thunk) = counting(3);
        let memoized = Eval::always(thunk).memoize();
        assert_eq!(memoized.force(), Ok(3));
        assert_eq!(memoized.force(), Ok(3));
        assert_eq!(calls.get(), 1);
    }

    #[rstest]
    fn test_deep_lazily_built_flat_map_chain() {
        fn count_up(n: u64) -> Eval<u64> {
            if n == 0 {
                Eval::now(0)
            } else {
                Eval::defer(move || count_up(n - 1)).map(|value| value + 1)
            }
        }
        assert_eq!(count_up(100_000).force(), Ok(100_000));
    }

    #[rstest]
    fn test_tail_rec_m_propagates_errors() {
        let looped: Eval<u32> = Eval::tail_rec_m(0_u32, |n| {
            if n == 10 {
                Eval::raise_error(EvalError::raised("limit"))
            } else {
                Eval::now(Either::Left(n + 1))
            }
        });
        assert_eq!(looped.force(), Err(EvalError::raised("limit")));
    }

    #[rstest]
    #[case(Eval::now(1), "Eval(\"Now\")")]
    #[case(Eval::later(|| 1), "Eval(\"Later\")")]
    #[case(Eval::always(|| 1), "Eval(\"Defer\")")]
    #[case(Eval::now(1).map(|x| x), "Eval(\"FlatMap\")")]
    fn test_debug_shows_node_kind(#[case] eval: Eval<i32>, #[case] expected: &str) {
        assert_eq!(format!("{eval:?}"), expected);
    }
}
