//! Function wrappers shared by the nonlinear, quadrature, and optimization
//! problems.
//!
//! A [`Callable`] is anything that can be evaluated as `f(x, p) -> y`, as
//! `f(out, x, p)`, or both. It states which forms it supports through
//! [`Callable::signatures`], so the calling convention can be resolved without
//! ever calling it.
//!
//! A [`Function`] pairs a shared callable with the convention a solver must use.
//! Problems only ever store `Function`s; plain closures are wrapped on the way in
//! via [`Function::in_place`] or [`Function::out_of_place`].

use std::{fmt, marker::PhantomData, sync::Arc};

use thiserror::Error;

use crate::convention::{Convention, Signature, SignatureError, infer_convention};

/// Errors that can occur when evaluating a wrapped callable.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("callable does not support {0} evaluation")]
    Unsupported(Convention),

    #[error("dimension mismatch: expected length {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// A callable that can be wrapped in a [`Function`].
///
/// Implement whichever evaluation form the type supports and declare it in
/// [`signatures`](Callable::signatures). The form that is not implemented
/// returns [`EvaluationError::Unsupported`].
pub trait Callable<X, Y, P>: Send + Sync {
    /// Returns the call shapes this callable accepts.
    fn signatures(&self) -> &[Signature];

    /// Evaluates `f(x, p)` and returns a fresh value.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Unsupported`] unless overridden.
    fn call(&self, _x: &X, _p: &P) -> Result<Y, EvaluationError> {
        Err(EvaluationError::Unsupported(Convention::OutOfPlace))
    }

    /// Evaluates `f(out, x, p)`, writing the result into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Unsupported`] unless overridden.
    fn call_in_place(&self, _out: &mut Y, _x: &X, _p: &P) -> Result<(), EvaluationError> {
        Err(EvaluationError::Unsupported(Convention::InPlace))
    }
}

/// Arity of the in-place form `f(out, x, p)`.
const IN_PLACE_ARITY: usize = 3;

const MUTATING: &[Signature] = &[Signature::in_place(IN_PLACE_ARITY)];
const RETURNING: &[Signature] = &[Signature::out_of_place(IN_PLACE_ARITY - 1)];

/// Adapts a closure `Fn(&mut Y, &X, &P)` into an in-place [`Callable`].
pub struct MutatingFn<F, X, Y, P> {
    f: F,
    _marker: PhantomData<fn(&mut Y, &X, &P)>,
}

impl<F, X, Y, P> MutatingFn<F, X, Y, P>
where
    F: Fn(&mut Y, &X, &P) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, X, Y, P> Callable<X, Y, P> for MutatingFn<F, X, Y, P>
where
    F: Fn(&mut Y, &X, &P) + Send + Sync,
{
    fn signatures(&self) -> &[Signature] {
        MUTATING
    }

    fn call_in_place(&self, out: &mut Y, x: &X, p: &P) -> Result<(), EvaluationError> {
        (self.f)(out, x, p);
        Ok(())
    }
}

/// Adapts a closure `Fn(&X, &P) -> Y` into an out-of-place [`Callable`].
pub struct ReturningFn<F, X, Y, P> {
    f: F,
    _marker: PhantomData<fn(&X, &P) -> Y>,
}

impl<F, X, Y, P> ReturningFn<F, X, Y, P>
where
    F: Fn(&X, &P) -> Y + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<F, X, Y, P> Callable<X, Y, P> for ReturningFn<F, X, Y, P>
where
    F: Fn(&X, &P) -> Y + Send + Sync,
{
    fn signatures(&self) -> &[Signature] {
        RETURNING
    }

    fn call(&self, x: &X, p: &P) -> Result<Y, EvaluationError> {
        Ok((self.f)(x, p))
    }
}

/// A callable paired with the calling convention solvers must use.
///
/// Cloning a `Function` shares the underlying callable. `Function` does not
/// implement [`Callable`], so a wrapper can never be wrapped a second time;
/// every `impl Into<Function<..>>` argument in this crate passes an existing
/// wrapper through unchanged.
pub struct Function<X, Y, P> {
    callable: Arc<dyn Callable<X, Y, P>>,
    convention: Convention,
}

/// The residual `f(u, p) = 0` of a nonlinear problem.
pub type NonlinearFunction<U, P> = Function<U, U, P>;

/// The integrand of a quadrature problem.
pub type Integrand<X, Y, P> = Function<X, Y, P>;

impl<X, Y, P> Function<X, Y, P> {
    /// Arity of the in-place form `f(out, x, p)`.
    pub const IN_PLACE_ARITY: usize = IN_PLACE_ARITY;

    /// Wraps a callable, inferring its convention from its declared signatures.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the callable declares neither
    /// `f(out, x, p)` nor `f(x, p)`.
    pub fn new<C>(callable: C) -> Result<Self, SignatureError>
    where
        C: Callable<X, Y, P> + 'static,
    {
        let convention = infer_convention(callable.signatures(), Self::IN_PLACE_ARITY)?;
        Ok(Self::with_convention(convention, callable))
    }

    /// Wraps a callable with an explicitly pinned convention.
    ///
    /// No inference takes place. If the callable does not implement the pinned
    /// form, evaluation fails with [`EvaluationError::Unsupported`].
    pub fn with_convention<C>(convention: Convention, callable: C) -> Self
    where
        C: Callable<X, Y, P> + 'static,
    {
        Self {
            callable: Arc::new(callable),
            convention,
        }
    }

    /// Wraps a closure that writes its result into an output buffer.
    pub fn in_place<F>(f: F) -> Self
    where
        F: Fn(&mut Y, &X, &P) + Send + Sync + 'static,
        X: 'static,
        Y: 'static,
        P: 'static,
    {
        Self::with_convention(Convention::InPlace, MutatingFn::new(f))
    }

    /// Wraps a closure that returns its result.
    pub fn out_of_place<F>(f: F) -> Self
    where
        F: Fn(&X, &P) -> Y + Send + Sync + 'static,
        X: 'static,
        Y: 'static,
        P: 'static,
    {
        Self::with_convention(Convention::OutOfPlace, ReturningFn::new(f))
    }

    #[must_use]
    pub fn convention(&self) -> Convention {
        self.convention
    }

    #[must_use]
    pub fn is_in_place(&self) -> bool {
        self.convention.is_in_place()
    }

    /// Returns the signatures declared by the wrapped callable.
    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        self.callable.signatures()
    }

    /// Evaluates the out-of-place form.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Unsupported`] if the callable has no
    /// out-of-place form.
    pub fn call(&self, x: &X, p: &P) -> Result<Y, EvaluationError> {
        self.callable.call(x, p)
    }

    /// Evaluates the in-place form.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Unsupported`] if the callable has no in-place
    /// form.
    pub fn call_in_place(&self, out: &mut Y, x: &X, p: &P) -> Result<(), EvaluationError> {
        self.callable.call_in_place(out, x, p)
    }

    /// Returns `true` if both wrappers share the same callable.
    #[must_use]
    pub fn shares_callable(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callable, &other.callable)
    }
}

impl<X, Y, P> Clone for Function<X, Y, P> {
    fn clone(&self) -> Self {
        Self {
            callable: Arc::clone(&self.callable),
            convention: self.convention,
        }
    }
}

impl<X, Y, P> fmt::Debug for Function<X, Y, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("convention", &self.convention)
            .field("signatures", &self.callable.signatures())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::NullParameters;

    const BOTH: &[Signature] = &[Signature::out_of_place(2), Signature::in_place(3)];
    const TIMED: &[Signature] = &[Signature::in_place(4)];

    /// Declares both forms: `y = 2x`.
    struct Doubler;

    impl Callable<f64, f64, NullParameters> for Doubler {
        fn signatures(&self) -> &[Signature] {
            BOTH
        }

        fn call(&self, x: &f64, _p: &NullParameters) -> Result<f64, EvaluationError> {
            Ok(2.0 * x)
        }

        fn call_in_place(
            &self,
            out: &mut f64,
            x: &f64,
            _p: &NullParameters,
        ) -> Result<(), EvaluationError> {
            *out = 2.0 * x;
            Ok(())
        }
    }

    /// Declares a time-dependent shape that no problem here accepts.
    struct Timed;

    impl Callable<f64, f64, NullParameters> for Timed {
        fn signatures(&self) -> &[Signature] {
            TIMED
        }
    }

    #[test]
    fn infers_in_place_when_both_declared() {
        let f = Function::new(Doubler).unwrap();

        assert_eq!(f.convention(), Convention::InPlace);
        assert_eq!(f.call(&1.5, &NullParameters), Ok(3.0));

        let mut out = 0.0;
        f.call_in_place(&mut out, &4.0, &NullParameters).unwrap();
        assert_eq!(out, 8.0);
    }

    #[test]
    fn unmatched_signature_fails_fast() {
        let err = Function::new(Timed).unwrap_err();
        assert!(matches!(
            err,
            SignatureError::NoMatchingSignature {
                in_place_arity: 3,
                ..
            }
        ));
    }

    #[test]
    fn pinned_convention_skips_inference() {
        let f = Function::with_convention(Convention::OutOfPlace, Timed);

        assert!(!f.is_in_place());
        assert_eq!(
            f.call(&1.0, &NullParameters),
            Err(EvaluationError::Unsupported(Convention::OutOfPlace))
        );
    }

    #[test]
    fn closures_declare_their_own_form() {
        let square = Function::out_of_place(|x: &f64, p: &f64| x * x + p);
        assert_eq!(square.convention(), Convention::OutOfPlace);
        assert_eq!(square.signatures(), &[Signature::out_of_place(2)]);
        assert_eq!(square.call(&3.0, &1.0), Ok(10.0));

        let mut out = 0.0;
        assert_eq!(
            square.call_in_place(&mut out, &3.0, &1.0),
            Err(EvaluationError::Unsupported(Convention::InPlace))
        );

        let negate = Function::in_place(|out: &mut Vec<f64>, x: &Vec<f64>, _p: &NullParameters| {
            out.clear();
            out.extend(x.iter().map(|v| -v));
        });
        assert!(negate.is_in_place());

        let mut buffer = Vec::new();
        negate
            .call_in_place(&mut buffer, &vec![1.0, -2.0], &NullParameters)
            .unwrap();
        assert_eq!(buffer, vec![-1.0, 2.0]);
    }

    #[test]
    fn clones_share_the_callable() {
        let f = Function::out_of_place(|x: &f64, _p: &NullParameters| *x);
        let g = f.clone();
        let h = Function::out_of_place(|x: &f64, _p: &NullParameters| *x);

        assert!(f.shares_callable(&g));
        assert!(!f.shares_callable(&h));
    }

    #[test]
    fn into_passes_wrappers_through() {
        type Residual = NonlinearFunction<f64, NullParameters>;

        fn wrap(f: impl Into<Residual>) -> Residual {
            f.into()
        }

        let f = Function::out_of_place(|u: &f64, _p: &NullParameters| u - 1.0);
        let wrapped = wrap(f.clone());

        assert!(wrapped.shares_callable(&f));
        assert_eq!(wrapped.convention(), f.convention());
    }
}
