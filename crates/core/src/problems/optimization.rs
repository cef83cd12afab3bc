//! Optimization problems: minimize or maximize `f(x, p)` subject to bounds and
//! constraints.
//!
//! An [`OptimizationProblem`] holds an [`OptimizationFunction`], an initial
//! point, parameters, and the optional bounds, constraint bounds, and sense.
//! Problems are assembled with an [`OptimizationProblemBuilder`], which enforces
//! the one rule that applies here: bounds on `x` are given as a pair or not at
//! all.

mod builder;
mod function;


pub use builder::{BoundsError, OptimizationProblemBuilder};
pub use function::{
    ConstraintHessians, ConstraintJacobian, Constraints, Gradient, Hessian, HessianVectorProduct,
    OptimizationFunction,
};

use std::{fmt, sync::Arc};

use ndarray::Array1;

use crate::{
    NullParameters, SolverOptions,
    ad::{AdType, NoAD},
    convention::Convention,
};

/// Whether a problem seeks a minimum or a maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    /// Maps an objective value onto one a minimizer can use.
    ///
    /// Returns the value unchanged for [`Sense::Minimize`] and negated for
    /// [`Sense::Maximize`].
    #[must_use]
    pub fn transform(self, value: f64) -> f64 {
        match self {
            Self::Minimize => value,
            Self::Maximize => -value,
        }
    }
}

/// An optimization problem.
pub struct OptimizationProblem<P = NullParameters, AD = NoAD> {
    f: OptimizationFunction<P, AD>,
    u0: Array1<f64>,
    p: Arc<P>,
    lb: Option<Array1<f64>>,
    ub: Option<Array1<f64>>,
    lcons: Option<Array1<f64>>,
    ucons: Option<Array1<f64>>,
    sense: Option<Sense>,
    options: SolverOptions,
}

impl OptimizationProblem<NullParameters, NoAD> {
    /// Starts a problem without parameters from a bare objective.
    ///
    /// The objective is wrapped with no derivatives, no automatic
    /// differentiation, and in-place evaluation.
    pub fn objective_builder<F>(
        f: F,
        u0: Array1<f64>,
    ) -> OptimizationProblemBuilder<NullParameters, NoAD>
    where
        F: Fn(&Array1<f64>, &NullParameters) -> f64 + Send + Sync + 'static,
    {
        Self::objective_builder_with_params(f, u0, NullParameters)
    }
}

impl<P> OptimizationProblem<P, NoAD> {
    /// Starts a problem from a bare objective and its parameters.
    ///
    /// Wraps the objective the same way as
    /// [`objective_builder`](OptimizationProblem::objective_builder).
    pub fn objective_builder_with_params<F>(
        f: F,
        u0: Array1<f64>,
        p: P,
    ) -> OptimizationProblemBuilder<P, NoAD>
    where
        F: Fn(&Array1<f64>, &P) -> f64 + Send + Sync + 'static,
    {
        Self::builder_with_params(OptimizationFunction::from_objective(f), u0, p)
    }
}

impl<AD: AdType> OptimizationProblem<NullParameters, AD> {
    /// Starts a problem without parameters from an optimization function.
    pub fn builder(
        f: OptimizationFunction<NullParameters, AD>,
        u0: Array1<f64>,
    ) -> OptimizationProblemBuilder<NullParameters, AD> {
        Self::builder_with_params(f, u0, NullParameters)
    }
}

impl<P, AD: AdType> OptimizationProblem<P, AD> {
    /// Starts a problem from an optimization function and its parameters.
    pub fn builder_with_params(
        f: OptimizationFunction<P, AD>,
        u0: Array1<f64>,
        p: P,
    ) -> OptimizationProblemBuilder<P, AD> {
        OptimizationProblemBuilder::new(f, u0, p)
    }

    /// Returns a copy of this problem starting from a new point.
    ///
    /// The function and parameters are shared with `self`; bounds, sense,
    /// and options are copied.
    #[must_use]
    pub fn with_u0(&self, u0: Array1<f64>) -> Self {
        Self {
            f: self.f.clone(),
            u0,
            p: Arc::clone(&self.p),
            lb: self.lb.clone(),
            ub: self.ub.clone(),
            lcons: self.lcons.clone(),
            ucons: self.ucons.clone(),
            sense: self.sense,
            options: self.options,
        }
    }

    pub fn f(&self) -> &OptimizationFunction<P, AD> {
        &self.f
    }

    pub fn u0(&self) -> &Array1<f64> {
        &self.u0
    }

    pub fn params(&self) -> &P {
        &self.p
    }

    pub fn lb(&self) -> Option<&Array1<f64>> {
        self.lb.as_ref()
    }

    pub fn ub(&self) -> Option<&Array1<f64>> {
        self.ub.as_ref()
    }

    pub fn lcons(&self) -> Option<&Array1<f64>> {
        self.lcons.as_ref()
    }

    pub fn ucons(&self) -> Option<&Array1<f64>> {
        self.ucons.as_ref()
    }

    pub fn sense(&self) -> Option<Sense> {
        self.sense
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

    /// Returns `true` if `x` is bounded.
    pub fn is_bounded(&self) -> bool {
        self.lb.is_some()
    }

    /// Returns `true` if both problems share the same parameter value.
    pub fn shares_params(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.p, &other.p)
    }
}

impl<P, AD: AdType> Clone for OptimizationProblem<P, AD> {
    fn clone(&self) -> Self {
        self.with_u0(self.u0.clone())
    }
}

impl<P: fmt::Debug, AD: AdType> fmt::Debug for OptimizationProblem<P, AD> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationProblem")
            .field("f", &self.f)
            .field("u0", &self.u0)
            .field("p", &self.p)
            .field("lb", &self.lb)
            .field("ub", &self.ub)
            .field("lcons", &self.lcons)
            .field("ucons", &self.ucons)
            .field("sense", &self.sense)
            .field("options", &self.options)
            .finish()
    }
}
