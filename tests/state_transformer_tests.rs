#![cfg(feature = "effect")]
//! Tests for StateT (State Transformer).
//!
//! StateT threads a state through a base monad and carries over its
//! error handling and suspension capabilities.

use rstest::rstest;
use std::cell::Cell;
use std::rc::Rc;
use suspension::control::{Either, Eval, EvalError};
use suspension::effect::{MonadDefer, MonadError, MonadState, StateT};
use suspension::typeclass::Monad;

type Counter = StateT<i32, Eval<()>, ()>;

fn raise<A: Clone + 'static>(message: &str) -> StateT<i32, Eval<()>, A> {
    <Counter as MonadError<EvalError>>::raise_error(EvalError::raised(message))
}

fn modify(delta: i32) -> StateT<i32, Eval<()>, ()> {
    <Counter as MonadState<i32>>::modify(move |state| state + delta)
}

// =============================================================================
// Basic Structure Tests
// =============================================================================

#[rstest]
fn state_transformer_new_and_run_with_eval() {
    let state_transformer: StateT<i32, Eval<()>, String> = StateT::new(|state: i32| {
        Eval::now((format!("state: {state}"), state + 1))
    });
    let result = state_transformer.run(10);
    assert_eq!(result.force(), Ok(("state: 10".to_string(), 11)));
}

#[rstest]
fn state_transformer_pure_leaves_state_untouched() {
    let pure = <Counter as Monad>::pure("value");
    assert_eq!(pure.run(5).force(), Ok(("value", 5)));
}

#[rstest]
fn state_transformer_flat_map_threads_state() {
    let computation = modify(1)
        .flat_map(|()| modify(10))
        .flat_map(|()| <Counter as MonadState<i32>>::get());
    assert_eq!(computation.run(0).force(), Ok((11, 11)));
}

#[rstest]
fn state_transformer_gets_projects_without_modifying() {
    let projected = <Counter as MonadState<i32>>::gets(|state| state % 3 == 0);
    assert_eq!(projected.run(9).force(), Ok((true, 9)));
}

#[rstest]
fn state_transformer_run_is_repeatable() {
    let computation = modify(2).flat_map(|()| <Counter as MonadState<i32>>::get());
    assert_eq!(computation.run(1).force(), Ok((3, 3)));
    assert_eq!(computation.run(100).force(), Ok((102, 102)));
}

// =============================================================================
// Stack Safety Tests
// =============================================================================

#[rstest]
fn state_transformer_tail_rec_m_counts_to_one_hundred_thousand() {
    let counted = <Counter as Monad>::tail_rec_m(0_u64, |n| {
        <Counter as Monad>::pure(if n < 100_000 {
            Either::Left(n + 1)
        } else {
            Either::Right(n)
        })
    });
    assert_eq!(counted.run(0).force(), Ok((100_000, 0)));
}

#[rstest]
fn state_transformer_tail_rec_m_threads_state_through_iterations() {
    let counted = <Counter as Monad>::tail_rec_m(0_u32, |n| {
        modify(2).map(move |()| {
            if n < 50_000 {
                Either::Left(n + 1)
            } else {
                Either::Right(n)
            }
        })
    });
    assert_eq!(counted.run(0).force(), Ok((50_000, 100_002)));
}

#[rstest]
fn state_transformer_left_nested_flat_map_chain_of_one_hundred_thousand() {
    let mut chain = modify(0);
    for _ in 0..100_000 {
        chain = chain.flat_map(|()| modify(1));
    }
    assert_eq!(chain.exec(0).force(), Ok(100_000));
    drop(chain);
}

#[rstest]
fn state_transformer_left_nested_recovery_chain_of_one_hundred_thousand() {
    let mut chain = raise::<i32>("E");
    for _ in 0..100_000 {
        chain = <Counter as MonadError<EvalError>>::handle_error(chain, |_| 1);
    }
    assert_eq!(chain.run(7).force(), Ok((1, 7)));
    drop(chain);
}

// =============================================================================
// Error Recovery Tests
// =============================================================================

#[rstest]
#[case(0)]
#[case(-17)]
fn state_transformer_single_failure_recovers_from_original_state(#[case] initial: i32) {
    let failing = modify(5).flat_map(|()| raise::<&str>("E"));
    let recovered = <Counter as MonadError<EvalError>>::handle_error_with(failing, |_| {
        <Counter as Monad>::pure("fallback")
    });
    assert_eq!(recovered.run(initial).force(), Ok(("fallback", initial)));
}

/// Recovers `raise("E1")`; the first recovery moves the state by `first`
/// and fails, the second moves it by `second` and succeeds.
fn recover_twice(first: i32, second: i32) -> (StateT<i32, Eval<()>, &'static str>, Rc<Cell<i32>>) {
    let attempts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&attempts);
    let failing = raise::<&str>("E1");
    let recovered = <Counter as MonadError<EvalError>>::handle_error_with(failing, move |_| {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            modify(first).flat_map(|()| raise("E2"))
        } else {
            modify(second).flat_map(|()| <Counter as Monad>::pure("fallback"))
        }
    });
    (recovered, attempts)
}

#[rstest]
#[case::second_recovery_moves_state(10, 10, 0, ("fallback", 10))]
#[case::second_recovery_keeps_state(10, 0, 0, ("fallback", 0))]
#[case::first_recovery_moves_further(25, 3, 100, ("fallback", 103))]
fn state_transformer_nested_failure_recovers_from_original_state(
    #[case] first: i32,
    #[case] second: i32,
    #[case] initial: i32,
    #[case] expected: (&str, i32),
) {
    let (recovered, attempts) = recover_twice(first, second);
    assert_eq!(recovered.run(initial).force(), Ok(expected));
    assert_eq!(attempts.get(), 2);
}

#[rstest]
fn state_transformer_third_failure_propagates() {
    let failing = raise::<i32>("E1");
    let recovered = <Counter as MonadError<EvalError>>::handle_error_with(failing, |error| {
        raise(&format!("{}+", error.message()))
    });
    assert_eq!(recovered.run(0).force(), Err(EvalError::raised("E1++")));
}

#[rstest]
fn state_transformer_rethrow_restores_failure() {
    let attempted = <Counter as MonadError<EvalError>>::attempt(raise::<i32>("lost"));
    let rethrown = <Counter as MonadError<EvalError>>::rethrow(attempted);
    assert_eq!(rethrown.run(4).force(), Err(EvalError::raised("lost")));

    let kept = <Counter as MonadError<EvalError>>::rethrow(modify(3).map(|()| Ok(8)));
    assert_eq!(kept.run(4).force(), Ok((8, 7)));
}

#[rstest]
fn state_transformer_success_skips_handler() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let recovered = <Counter as MonadError<EvalError>>::handle_error_with(modify(4), move |_| {
        counter.set(counter.get() + 1);
        <Counter as Monad>::pure(())
    });
    assert_eq!(recovered.run(1).force(), Ok(((), 5)));
    assert_eq!(calls.get(), 0);
}

// =============================================================================
// Suspension Tests
// =============================================================================

#[rstest]
fn state_transformer_suspend_runs_thunk_per_run() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let suspended = <Counter as MonadDefer<EvalError>>::suspend(move || {
        counter.set(counter.get() + 1);
        modify(counter.get())
    });
    assert_eq!(calls.get(), 0);

    assert_eq!(suspended.exec(0).force(), Ok(1));
    assert_eq!(suspended.exec(0).force(), Ok(2));
}

#[rstest]
fn state_transformer_lift_memoized_base() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let base = Eval::later(move || {
        counter.set(counter.get() + 1);
        "once"
    });
    let lifted: StateT<i32, Eval<()>, &str> = StateT::lift(base);

    assert_eq!(lifted.run(1).force(), Ok(("once", 1)));
    assert_eq!(lifted.run(2).force(), Ok(("once", 2)));
    assert_eq!(calls.get(), 1);
}
