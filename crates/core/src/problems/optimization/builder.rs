use std::sync::Arc;

use log::debug;
use ndarray::Array1;
use thiserror::Error;

use crate::{SolverOptions, ad::AdType};

use super::{OptimizationFunction, OptimizationProblem, Sense};

/// Errors that can occur when building an optimization problem.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BoundsError {
    #[error("`lb` was provided without `ub`: if any of `lb` or `ub` is provided, both must be")]
    MissingUpper,

    #[error("`ub` was provided without `lb`: if any of `lb` or `ub` is provided, both must be")]
    MissingLower,
}

/// Collects the optional pieces of an [`OptimizationProblem`].
///
/// Bounds on `x` must come as a pair; [`build`](Self::build) rejects a lone
/// `lb` or `ub`. Constraint bounds and the sense are passed through untouched.
#[must_use]
pub struct OptimizationProblemBuilder<P, AD> {
    f: OptimizationFunction<P, AD>,
    u0: Array1<f64>,
    p: P,
    lb: Option<Array1<f64>>,
    ub: Option<Array1<f64>>,
    lcons: Option<Array1<f64>>,
    ucons: Option<Array1<f64>>,
    sense: Option<Sense>,
    options: SolverOptions,
}

impl<P, AD: AdType> OptimizationProblemBuilder<P, AD> {
    pub(super) fn new(f: OptimizationFunction<P, AD>, u0: Array1<f64>, p: P) -> Self {
        Self {
            f,
            u0,
            p,
            lb: None,
            ub: None,
            lcons: None,
            ucons: None,
            sense: None,
            options: SolverOptions::default(),
        }
    }

    /// Sets lower bounds on `x`.
    pub fn lb(self, lb: Array1<f64>) -> Self {
        Self {
            lb: Some(lb),
            ..self
        }
    }

    /// Sets upper bounds on `x`.
    pub fn ub(self, ub: Array1<f64>) -> Self {
        Self {
            ub: Some(ub),
            ..self
        }
    }

    /// Sets both bounds on `x`.
    pub fn bounds(self, lb: Array1<f64>, ub: Array1<f64>) -> Self {
        self.lb(lb).ub(ub)
    }

    /// Sets lower bounds on the constraint values.
    pub fn lcons(self, lcons: Array1<f64>) -> Self {
        Self {
            lcons: Some(lcons),
            ..self
        }
    }

    /// Sets upper bounds on the constraint values.
    pub fn ucons(self, ucons: Array1<f64>) -> Self {
        Self {
            ucons: Some(ucons),
            ..self
        }
    }

    pub fn sense(self, sense: Sense) -> Self {
        Self {
            sense: Some(sense),
            ..self
        }
    }

    pub fn options(self, options: SolverOptions) -> Self {
        Self { options, ..self }
    }

    /// Validates the collected pieces and builds the problem.
    ///
    /// # Errors
    ///
    /// Returns [`BoundsError`] if exactly one of `lb` and `ub` was set.
    pub fn build(self) -> Result<OptimizationProblem<P, AD>, BoundsError> {
        match (&self.lb, &self.ub) {
            (Some(_), None) => return Err(BoundsError::MissingUpper),
            (None, Some(_)) => return Err(BoundsError::MissingLower),
            _ => {}
        }

        debug!(
            "optimization problem: {} variable(s), {} evaluation, ad = {}, bounded = {}",
            self.u0.len(),
            self.f.convention(),
            AD::NAME,
            self.lb.is_some(),
        );

        Ok(OptimizationProblem {
            f: self.f,
            u0: self.u0,
            p: Arc::new(self.p),
            lb: self.lb,
            ub: self.ub,
            lcons: self.lcons,
            ucons: self.ucons,
            sense: self.sense,
            options: self.options,
        })
    }
}
