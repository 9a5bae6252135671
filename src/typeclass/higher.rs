//! Higher-Kinded Type emulation through Generic Associated Types.
//!
//! Rust does not natively support Higher-Kinded Types. We cannot write a
//! trait that abstracts over `Eval<_>` or `StateT<S, F, _>` as type
//! constructors, so this module uses GAT to work around the limitation.
//!
//! A *representative* type names a family of computations. Any member of
//! the family can act as the representative; by convention the unit member
//! is used (`Eval<()>`), and `WithType<B>` selects the member producing `B`.
//!
//! # Example
//!
//! ```rust
//! use suspension::control::Eval;
//! use suspension::typeclass::TypeConstructor;
//!
//! fn assert_family<T: TypeConstructor<WithType<String> = Eval<String>>>() {}
//!
//! assert_family::<Eval<()>>();
//! assert_family::<Eval<i32>>();
//! ```

/// A trait representing a type constructor.
///
/// # Associated Types
///
/// - `Inner`: The type parameter that this type constructor is currently applied to.
/// - `WithType<B>`: The same type constructor applied to a different type `B`.
///
/// Computations in this crate are re-runnable closures stored behind `Rc`,
/// so every member of a family must be `'static`.
///
/// # Laws
///
/// 1. **Consistency**: `<F as TypeConstructor>::WithType<F::Inner>` is `F`.
pub trait TypeConstructor {
    /// The inner type that this type constructor is applied to.
    type Inner;

    /// The same type constructor applied to a different type `B`.
    ///
    /// The constraint `TypeConstructor<Inner = B>` ensures that the resulting
    /// type is also a valid type constructor, so transformations chain.
    type WithType<B: 'static>: TypeConstructor<Inner = B> + 'static;
}
