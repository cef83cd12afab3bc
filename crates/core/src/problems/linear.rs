use std::{fmt, sync::Arc};

use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1, LinalgScalar};

use crate::{
    NullParameters, SolverOptions,
    convention::{Convention, Signature, SignatureError, infer_convention},
    function::EvaluationError,
};

/// A matrix-free linear operator.
///
/// Implementors apply the operator to a vector without materializing a matrix.
/// Like [`Callable`](crate::Callable), an operator declares which evaluation
/// forms it supports: the in-place form is `apply_into(du, u, p, t)` (arity 4),
/// the allocating form is `apply(u, p, t)` (arity 3).
pub trait LinearOperator<T, P>: Send + Sync {
    /// Returns `(nrows, ncols)`.
    fn size(&self) -> (usize, usize);

    /// Returns the call shapes this operator accepts.
    fn signatures(&self) -> &[Signature];

    /// Computes `A(p, t) * u` into a fresh vector.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Unsupported`] unless overridden.
    fn apply(&self, _u: ArrayView1<'_, T>, _p: &P, _t: f64) -> Result<Array1<T>, EvaluationError> {
        Err(EvaluationError::Unsupported(Convention::OutOfPlace))
    }

    /// Computes `A(p, t) * u` into `du`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Unsupported`] unless overridden.
    fn apply_into(
        &self,
        _du: ArrayViewMut1<'_, T>,
        _u: ArrayView1<'_, T>,
        _p: &P,
        _t: f64,
    ) -> Result<(), EvaluationError> {
        Err(EvaluationError::Unsupported(Convention::InPlace))
    }
}

/// The `A` of a linear problem `A u = b`.
///
/// The variant decides the calling convention: a dense matrix is applied in
/// place, a scalar out of place, and a custom operator uses whichever form it
/// declares.
pub enum Operator<T, P = NullParameters> {
    Matrix(Array2<T>),
    Scalar(T),
    Custom(Arc<dyn LinearOperator<T, P>>),
}

impl<T, P> Operator<T, P> {
    /// Arity of the in-place form `apply_into(du, u, p, t)`.
    pub const IN_PLACE_ARITY: usize = 4;

    /// Wraps a matrix-free operator.
    pub fn custom<O>(op: O) -> Self
    where
        O: LinearOperator<T, P> + 'static,
    {
        Self::Custom(Arc::new(op))
    }

    /// Resolves the calling convention for this operator.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if a custom operator declares neither
    /// evaluation form.
    pub fn convention(&self) -> Result<Convention, SignatureError> {
        match self {
            Self::Matrix(_) => Ok(Convention::InPlace),
            Self::Scalar(_) => Ok(Convention::OutOfPlace),
            Self::Custom(op) => infer_convention(op.signatures(), Self::IN_PLACE_ARITY),
        }
    }

    /// Returns `(nrows, ncols)`, or `None` for a scalar.
    #[must_use]
    pub fn size(&self) -> Option<(usize, usize)> {
        match self {
            Self::Matrix(a) => Some(a.dim()),
            Self::Scalar(_) => None,
            Self::Custom(op) => Some(op.size()),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Matrix(_) => "matrix",
            Self::Scalar(_) => "scalar",
            Self::Custom(_) => "custom",
        }
    }
}

impl<T: LinalgScalar, P> Operator<T, P> {
    /// Computes `A u` into a fresh vector.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::DimensionMismatch`] if `u` does not match the
    /// matrix's column count, or whatever a custom operator reports.
    pub fn apply(&self, u: ArrayView1<'_, T>, p: &P, t: f64) -> Result<Array1<T>, EvaluationError> {
        match self {
            Self::Matrix(a) => {
                check_len(a.ncols(), u.len())?;
                Ok(a.dot(&u))
            }
            Self::Scalar(s) => {
                let s = *s;
                Ok(u.mapv(|x| s * x))
            }
            Self::Custom(op) => op.apply(u, p, t),
        }
    }

    /// Computes `A u` into `du`.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::DimensionMismatch`] if `u` or `du` has the
    /// wrong length, or whatever a custom operator reports.
    pub fn apply_into(
        &self,
        mut du: ArrayViewMut1<'_, T>,
        u: ArrayView1<'_, T>,
        p: &P,
        t: f64,
    ) -> Result<(), EvaluationError> {
        match self {
            Self::Matrix(a) => {
                check_len(a.ncols(), u.len())?;
                check_len(a.nrows(), du.len())?;
                du.assign(&a.dot(&u));
                Ok(())
            }
            Self::Scalar(s) => {
                check_len(u.len(), du.len())?;
                let s = *s;
                du.zip_mut_with(&u, |d, &x| *d = s * x);
                Ok(())
            }
            Self::Custom(op) => op.apply_into(du, u, p, t),
        }
    }
}

fn check_len(expected: usize, found: usize) -> Result<(), EvaluationError> {
    if expected == found {
        Ok(())
    } else {
        Err(EvaluationError::DimensionMismatch { expected, found })
    }
}

impl<T, P> From<Array2<T>> for Operator<T, P> {
    fn from(matrix: Array2<T>) -> Self {
        Self::Matrix(matrix)
    }
}

impl<T: Clone, P> Clone for Operator<T, P> {
    fn clone(&self) -> Self {
        match self {
            Self::Matrix(a) => Self::Matrix(a.clone()),
            Self::Scalar(s) => Self::Scalar(s.clone()),
            Self::Custom(op) => Self::Custom(Arc::clone(op)),
        }
    }
}

impl<T: fmt::Debug, P> fmt::Debug for Operator<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Matrix(a) => f.debug_tuple("Matrix").field(a).finish(),
            Self::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Self::Custom(op) => f
                .debug_struct("Custom")
                .field("size", &op.size())
                .field("signatures", &op.signatures())
                .finish(),
        }
    }
}

/// A linear system `A u = b`.
pub struct LinearProblem<T, P = NullParameters> {
    a: Operator<T, P>,
    b: Array1<T>,
    u0: Option<Array1<T>>,
    p: Arc<P>,
    options: SolverOptions,
    convention: Convention,
}

impl<T> LinearProblem<T, NullParameters> {
    /// Creates a linear problem without parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if `a` is a custom operator that declares
    /// neither evaluation form.
    pub fn new(a: impl Into<Operator<T>>, b: Array1<T>) -> Result<Self, SignatureError> {
        Self::with_params(a, b, NullParameters)
    }
}

impl<T, P> LinearProblem<T, P> {
    /// Creates a linear problem, resolving the convention from the operator.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if `a` is a custom operator that declares
    /// neither evaluation form.
    pub fn with_params(
        a: impl Into<Operator<T, P>>,
        b: Array1<T>,
        p: P,
    ) -> Result<Self, SignatureError> {
        let a = a.into();
        let convention = a.convention()?;
        Ok(Self::with_convention(convention, a, b, p))
    }

    /// Creates a linear problem with an explicitly pinned convention.
    pub fn with_convention(
        convention: Convention,
        a: impl Into<Operator<T, P>>,
        b: Array1<T>,
        p: P,
    ) -> Self {
        let a = a.into();
        debug!(
            "linear problem: {} operator, {} right-hand side entries, {convention} evaluation",
            a.kind(),
            b.len(),
        );

        Self {
            a,
            b,
            u0: None,
            p: Arc::new(p),
            options: SolverOptions::default(),
            convention,
        }
    }

    /// Returns the problem with an initial guess for `u`.
    #[must_use]
    pub fn with_u0(self, u0: Array1<T>) -> Self {
        Self {
            u0: Some(u0),
            ..self
        }
    }

    #[must_use]
    pub fn with_options(self, options: SolverOptions) -> Self {
        Self { options, ..self }
    }

    pub fn operator(&self) -> &Operator<T, P> {
        &self.a
    }

    pub fn b(&self) -> &Array1<T> {
        &self.b
    }

    pub fn u0(&self) -> Option<&Array1<T>> {
        self.u0.as_ref()
    }

    pub fn params(&self) -> &P {
        &self.p
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn is_in_place(&self) -> bool {
        self.convention.is_in_place()
    }
}

impl<T: Clone, P> Clone for LinearProblem<T, P> {
    fn clone(&self) -> Self {
        Self {
            a: self.a.clone(),
            b: self.b.clone(),
            u0: self.u0.clone(),
            p: Arc::clone(&self.p),
            options: self.options,
            convention: self.convention,
        }
    }
}

impl<T: fmt::Debug, P: fmt::Debug> fmt::Debug for LinearProblem<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearProblem")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("u0", &self.u0)
            .field("p", &self.p)
            .field("options", &self.options)
            .field("convention", &self.convention)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    /// Second-difference operator on `n` points, scaled by `p` and `t`.
    struct Laplacian {
        n: usize,
    }

    const APPLY_INTO: &[Signature] = &[Signature::in_place(4)];
    const APPLY: &[Signature] = &[Signature::out_of_place(3)];
    const MISSING_TIME: &[Signature] = &[Signature::in_place(3)];

    impl LinearOperator<f64, f64> for Laplacian {
        fn size(&self) -> (usize, usize) {
            (self.n, self.n)
        }

        fn signatures(&self) -> &[Signature] {
            APPLY_INTO
        }

        fn apply_into(
            &self,
            mut du: ArrayViewMut1<'_, f64>,
            u: ArrayView1<'_, f64>,
            p: &f64,
            t: f64,
        ) -> Result<(), EvaluationError> {
            for i in 0..self.n {
                let left = if i > 0 { u[i - 1] } else { 0.0 };
                let right = if i + 1 < self.n { u[i + 1] } else { 0.0 };
                du[i] = p * t * (2.0 * u[i] - left - right);
            }
            Ok(())
        }
    }

    struct Reverser;

    impl LinearOperator<f64, NullParameters> for Reverser {
        fn size(&self) -> (usize, usize) {
            (2, 2)
        }

        fn signatures(&self) -> &[Signature] {
            APPLY
        }

        fn apply(
            &self,
            u: ArrayView1<'_, f64>,
            _p: &NullParameters,
            _t: f64,
        ) -> Result<Array1<f64>, EvaluationError> {
            Ok(u.iter().rev().copied().collect())
        }
    }

    struct Timeless;

    impl LinearOperator<f64, NullParameters> for Timeless {
        fn size(&self) -> (usize, usize) {
            (1, 1)
        }

        fn signatures(&self) -> &[Signature] {
            MISSING_TIME
        }
    }

    #[test]
    fn matrix_operator_is_in_place() {
        let problem = LinearProblem::new(array![[4.0, 1.0], [1.0, 3.0]], array![1.0, 2.0]).unwrap();

        assert_eq!(problem.convention(), Convention::InPlace);
        assert!(problem.is_in_place());
        assert_eq!(problem.u0(), None);
        assert_eq!(problem.params(), &NullParameters);
        assert_eq!(problem.b(), &array![1.0, 2.0]);
        assert_eq!(problem.operator().size(), Some((2, 2)));
        assert!(problem.options().is_empty());
    }

    #[test]
    fn scalar_operator_is_out_of_place() {
        let problem = LinearProblem::new(Operator::Scalar(2.0), array![4.0, 6.0]).unwrap();

        assert_eq!(problem.convention(), Convention::OutOfPlace);
        assert_eq!(problem.operator().size(), None);

        let au = problem
            .operator()
            .apply(array![1.0, 1.5].view(), problem.params(), 0.0)
            .unwrap();
        assert_eq!(au, array![2.0, 3.0]);
    }

    #[test]
    fn custom_operator_declares_its_convention() {
        let laplacian = Operator::custom(Laplacian { n: 3 });
        let in_place = LinearProblem::with_params(laplacian, array![0.0, 0.0, 0.0], 1.0).unwrap();
        assert!(in_place.is_in_place());

        let reverser = Operator::custom(Reverser);
        let out_of_place = LinearProblem::new(reverser, array![1.0, 2.0]).unwrap();
        assert!(!out_of_place.is_in_place());
    }

    #[test]
    fn undeclared_operator_shape_fails_construction() {
        let err = LinearProblem::new(Operator::custom(Timeless), array![1.0]).unwrap_err();

        assert!(matches!(
            err,
            SignatureError::NoMatchingSignature {
                in_place_arity: 4,
                out_of_place_arity: 3,
                ..
            }
        ));
    }

    #[test]
    fn explicit_convention_is_kept() {
        let problem = LinearProblem::with_convention(
            Convention::OutOfPlace,
            array![[1.0]],
            array![1.0],
            NullParameters,
        );

        assert_eq!(problem.convention(), Convention::OutOfPlace);
    }

    #[test]
    fn builder_style_fields_round_trip() {
        let options = SolverOptions::default().with_maxiters(10);
        let a = array![[2.0, 0.0], [0.0, 2.0]];
        let problem = LinearProblem::with_params(a, array![2.0, 4.0], vec![0.5])
            .unwrap()
            .with_u0(array![1.0, 1.0])
            .with_options(options);

        assert_eq!(problem.u0(), Some(&array![1.0, 1.0]));
        assert_eq!(problem.params(), &vec![0.5]);
        assert_eq!(problem.options().maxiters(), Some(10));
    }

    #[test]
    fn matrix_apply_forms_agree() {
        let a: Operator<f64> = array![[4.0, 1.0], [1.0, 3.0]].into();
        let u = array![1.0, -1.0];

        let fresh = a.apply(u.view(), &NullParameters, 0.0).unwrap();

        let mut du = Array1::zeros(2);
        a.apply_into(du.view_mut(), u.view(), &NullParameters, 0.0)
            .unwrap();

        assert_relative_eq!(fresh[0], 3.0);
        assert_relative_eq!(fresh[1], -2.0);
        assert_eq!(fresh, du);
    }

    #[test]
    fn matrix_apply_checks_dimensions() {
        let a: Operator<f64> = array![[1.0, 0.0], [0.0, 1.0]].into();

        let err = a
            .apply(array![1.0, 2.0, 3.0].view(), &NullParameters, 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );

        let mut du = Array1::zeros(3);
        let err = a
            .apply_into(du.view_mut(), array![1.0, 2.0].view(), &NullParameters, 0.0)
            .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::DimensionMismatch {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn custom_operator_forwards_evaluation() {
        let lap: Operator<f64, f64> = Operator::custom(Laplacian { n: 3 });
        let u = array![1.0, 2.0, 3.0];

        let mut du = Array1::zeros(3);
        lap.apply_into(du.view_mut(), u.view(), &2.0, 0.5).unwrap();
        assert_eq!(du, array![0.0, 0.0, 4.0]);

        assert_eq!(
            lap.apply(u.view(), &2.0, 0.5),
            Err(EvaluationError::Unsupported(Convention::OutOfPlace))
        );
    }
}
