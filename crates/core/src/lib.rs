//! Problem definitions for numerical solvers.
//!
//! This crate describes *what* to solve, never *how*. Each problem type is an
//! immutable bundle of a user function, an initial guess or bounds, parameters,
//! and solver options:
//!
//! - [`LinearProblem`]: `A u = b`, with `A` a matrix, scalar, or operator
//! - [`NonlinearProblem`]: root finding `f(u, p) = 0`
//! - [`QuadratureProblem`]: integration of `f(x, p)` over `[lb, ub]`
//! - [`OptimizationProblem`]: minimization or maximization of `f(x, p)`
//!
//! User functions come in two calling conventions (see [`Convention`]). The
//! convention is fixed when a problem is built and travels with it, so solvers
//! can dispatch on it without probing the function again.

pub mod ad;
mod convention;
mod function;
mod options;
mod params;
mod problems;
mod sparsity;

pub use convention::{Convention, Signature, SignatureError, infer_convention};
pub use function::{
    Callable, EvaluationError, Function, Integrand, MutatingFn, NonlinearFunction, ReturningFn,
};
pub use options::{OptionValue, OptionsError, SolverOptions};
pub use params::{IndexParameters, NullParameters, ParameterError};
pub use problems::{
    linear::{LinearOperator, LinearProblem, Operator},
    nonlinear::NonlinearProblem,
    optimization::{
        BoundsError, ConstraintHessians, ConstraintJacobian, Constraints, Gradient, Hessian,
        HessianVectorProduct, OptimizationFunction, OptimizationProblem,
        OptimizationProblemBuilder, Sense,
    },
    quadrature::QuadratureProblem,
};
pub use sparsity::{SparsityError, SparsityPattern};
