use std::{fmt, sync::Arc};

use log::debug;

use crate::{
    NullParameters, SolverOptions,
    convention::{Convention, SignatureError},
    function::{Callable, Function, NonlinearFunction},
};

/// A root-finding problem `f(u, p) = 0`.
///
/// The residual is always held as a [`NonlinearFunction`], and its convention
/// is the problem's convention.
pub struct NonlinearProblem<U, P = NullParameters> {
    f: NonlinearFunction<U, P>,
    u0: U,
    p: Arc<P>,
    options: SolverOptions,
}

impl<U> NonlinearProblem<U, NullParameters> {
    /// Creates a nonlinear problem without parameters.
    ///
    /// Closures are wrapped with [`Function::in_place`] or
    /// [`Function::out_of_place`] first; an existing wrapper is stored as is.
    pub fn new(f: impl Into<NonlinearFunction<U, NullParameters>>, u0: U) -> Self {
        Self::with_params(f, u0, NullParameters)
    }
}

impl<U, P> NonlinearProblem<U, P> {
    /// Creates a nonlinear problem from a residual wrapper and parameters.
    pub fn with_params(f: impl Into<NonlinearFunction<U, P>>, u0: U, p: P) -> Self {
        Self::from_parts(f.into(), u0, Arc::new(p))
    }

    /// Creates a nonlinear problem from a callable, inferring its convention.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the callable declares neither `f(du, u, p)`
    /// nor `f(u, p)`.
    pub fn from_callable<C>(f: C, u0: U, p: P) -> Result<Self, SignatureError>
    where
        C: Callable<U, U, P> + 'static,
    {
        Ok(Self::with_params(Function::new(f)?, u0, p))
    }

    /// Creates a nonlinear problem with an explicitly pinned convention.
    pub fn with_convention<C>(convention: Convention, f: C, u0: U, p: P) -> Self
    where
        C: Callable<U, U, P> + 'static,
    {
        Self::with_params(Function::with_convention(convention, f), u0, p)
    }

    /// Creates a problem from an existing one.
    ///
    /// The residual and parameters are shared with `other`, not copied.
    pub fn from_problem(other: &Self) -> Self
    where
        U: Clone,
    {
        Self {
            f: other.f.clone(),
            u0: other.u0.clone(),
            p: Arc::clone(&other.p),
            options: other.options,
        }
    }

    /// Returns a copy of this problem with a new initial guess.
    ///
    /// The residual, parameters, and options are shared with `self`.
    #[must_use]
    pub fn with_u0(&self, u0: U) -> Self {
        Self::from_parts(self.f.clone(), u0, Arc::clone(&self.p)).with_options(self.options)
    }

    #[must_use]
    pub fn with_options(self, options: SolverOptions) -> Self {
        Self { options, ..self }
    }

    fn from_parts(f: NonlinearFunction<U, P>, u0: U, p: Arc<P>) -> Self {
        debug!("nonlinear problem: {} residual", f.convention());

        Self {
            f,
            u0,
            p,
            options: SolverOptions::default(),
        }
    }

    pub fn f(&self) -> &NonlinearFunction<U, P> {
        &self.f
    }

    pub fn u0(&self) -> &U {
        &self.u0
    }

    pub fn params(&self) -> &P {
        &self.p
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn convention(&self) -> Convention {
        self.f.convention()
    }

    pub fn is_in_place(&self) -> bool {
        self.f.is_in_place()
    }

    /// Returns `true` if both problems share the same parameter value.
    pub fn shares_params(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.p, &other.p)
    }
}

impl<U: Clone, P> Clone for NonlinearProblem<U, P> {
    fn clone(&self) -> Self {
        Self::from_problem(self)
    }
}

impl<U: fmt::Debug, P: fmt::Debug> fmt::Debug for NonlinearProblem<U, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NonlinearProblem")
            .field("f", &self.f)
            .field("u0", &self.u0)
            .field("p", &self.p)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::{Array1, array};

    use crate::{EvaluationError, Signature};

    type Vector = Array1<f64>;

    /// Residual of `u² = p`, evaluated elementwise.
    fn square_root_residual() -> NonlinearFunction<Vector, f64> {
        Function::out_of_place(|u: &Vector, p: &f64| u.mapv(|x| x * x - p))
    }

    const TIMED: &[Signature] = &[Signature::in_place(4), Signature::out_of_place(3)];

    /// Declares an ODE-style right-hand side, which is not a residual shape.
    struct OdeRhs;

    impl Callable<f64, f64, NullParameters> for OdeRhs {
        fn signatures(&self) -> &[Signature] {
            TIMED
        }
    }

    #[test]
    fn closure_residual_keeps_its_convention() {
        let problem = NonlinearProblem::with_params(square_root_residual(), array![1.0, 3.0], 4.0);

        assert_eq!(problem.convention(), Convention::OutOfPlace);
        assert_eq!(problem.u0(), &array![1.0, 3.0]);
        assert_eq!(problem.params(), &4.0);

        let residual = problem.f().call(problem.u0(), problem.params()).unwrap();
        assert_eq!(residual, array![-3.0, 5.0]);
    }

    #[test]
    fn in_place_residual() {
        let f = Function::in_place(|du: &mut Vector, u: &Vector, _p: &NullParameters| {
            du.assign(&u.mapv(|x| x - 1.0));
        });
        let problem = NonlinearProblem::new(f, array![0.0, 2.0]);

        assert!(problem.is_in_place());
        assert_eq!(problem.params(), &NullParameters);

        let mut du = Array1::zeros(2);
        problem
            .f()
            .call_in_place(&mut du, problem.u0(), problem.params())
            .unwrap();
        assert_eq!(du, array![-1.0, 1.0]);
        assert_eq!(
            problem.f().call(problem.u0(), problem.params()),
            Err(EvaluationError::Unsupported(Convention::OutOfPlace))
        );
    }

    const RESIDUAL_FORMS: &[Signature] = &[Signature::out_of_place(2), Signature::in_place(3)];
    const RETURNS_ONLY: &[Signature] = &[Signature::out_of_place(2)];

    /// Residual of `u - p`, in whichever forms `forms` declares.
    struct Offset {
        forms: &'static [Signature],
    }

    impl Callable<f64, f64, f64> for Offset {
        fn signatures(&self) -> &[Signature] {
            self.forms
        }

        fn call(&self, u: &f64, p: &f64) -> Result<f64, EvaluationError> {
            Ok(u - p)
        }

        fn call_in_place(&self, du: &mut f64, u: &f64, p: &f64) -> Result<(), EvaluationError> {
            *du = u - p;
            Ok(())
        }
    }

    #[test]
    fn from_callable_infers_the_declared_convention() {
        let both = Offset {
            forms: RESIDUAL_FORMS,
        };
        let problem = NonlinearProblem::from_callable(both, 3.0, 1.0).unwrap();

        assert_eq!(problem.convention(), Convention::InPlace);
        let mut du = 0.0;
        problem
            .f()
            .call_in_place(&mut du, problem.u0(), problem.params())
            .unwrap();
        assert_eq!(du, 2.0);

        let returning = Offset {
            forms: RETURNS_ONLY,
        };
        let problem = NonlinearProblem::from_callable(returning, 3.0, 1.0).unwrap();

        assert_eq!(problem.convention(), Convention::OutOfPlace);
        assert_eq!(problem.f().call(problem.u0(), problem.params()), Ok(2.0));
    }

    #[test]
    fn callable_with_wrong_shape_fails_construction() {
        let result = NonlinearProblem::from_callable(OdeRhs, 0.0, NullParameters);
        assert!(matches!(
            result,
            Err(SignatureError::NoMatchingSignature { .. })
        ));
    }

    #[test]
    fn pinned_convention_bypasses_inference() {
        let problem =
            NonlinearProblem::with_convention(Convention::InPlace, OdeRhs, 0.0, NullParameters);
        assert!(problem.is_in_place());
    }

    #[test]
    fn from_problem_aliases_function_and_params() {
        let original = NonlinearProblem::with_params(square_root_residual(), array![1.0], 2.0)
            .with_options(SolverOptions::default().with_maxiters(5));
        let copy = NonlinearProblem::from_problem(&original);

        assert!(copy.f().shares_callable(original.f()));
        assert!(copy.shares_params(&original));
        assert_eq!(copy.u0(), original.u0());
        assert_eq!(copy.options(), original.options());
    }

    #[test]
    fn with_u0_remakes_around_a_new_guess() {
        let original = NonlinearProblem::with_params(square_root_residual(), array![1.0], 2.0);
        let remade = original.with_u0(array![1.5]);

        assert_eq!(remade.u0(), &array![1.5]);
        assert_eq!(original.u0(), &array![1.0]);
        assert!(remade.f().shares_callable(original.f()));
        assert!(remade.shares_params(&original));
    }

    #[test]
    fn independent_problems_do_not_share_params() {
        let a = NonlinearProblem::with_params(square_root_residual(), array![1.0], 2.0);
        let b = NonlinearProblem::with_params(a.f().clone(), array![1.0], 2.0);

        assert!(a.f().shares_callable(b.f()));
        assert!(!a.shares_params(&b));
    }
}
