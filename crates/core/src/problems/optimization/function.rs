use std::{fmt, sync::Arc};

use ndarray::{Array1, Array2};

use crate::{
    NullParameters,
    ad::{AdType, NoAD},
    convention::Convention,
    function::Function,
    sparsity::SparsityPattern,
};

type Objective<P> = Arc<dyn Fn(&Array1<f64>, &P) -> f64 + Send + Sync>;

/// Gradient `∇f(x)`.
pub type Gradient<P> = Function<Array1<f64>, Array1<f64>, P>;

/// Hessian `∇²f(x)`.
pub type Hessian<P> = Function<Array1<f64>, Array2<f64>, P>;

/// Hessian-vector product `∇²f(x) v`, evaluated at `(x, v)`.
pub type HessianVectorProduct<P> = Function<(Array1<f64>, Array1<f64>), Array1<f64>, P>;

/// Constraint values `c(x)`.
pub type Constraints<P> = Function<Array1<f64>, Array1<f64>, P>;

/// Constraint Jacobian `∂c/∂x`.
pub type ConstraintJacobian<P> = Function<Array1<f64>, Array2<f64>, P>;

/// One Hessian per constraint.
pub type ConstraintHessians<P> = Function<Array1<f64>, Vec<Array2<f64>>, P>;

/// An objective `f(x, p)` bundled with optional derivative providers.
///
/// Every provider defaults to absent. Calling the wrapper evaluates the
/// objective and nothing else; the providers and sparsity prototypes are
/// metadata for the solver.
///
/// The calling convention belongs to the wrapper and is fixed when it is
/// built: an objective alone does not say how its derivative providers are
/// shaped. [`new`](Self::new) pins in-place evaluation.
pub struct OptimizationFunction<P = NullParameters, AD = NoAD> {
    f: Objective<P>,
    ad: AD,
    convention: Convention,
    grad: Option<Gradient<P>>,
    hess: Option<Hessian<P>>,
    hv: Option<HessianVectorProduct<P>>,
    cons: Option<Constraints<P>>,
    cons_j: Option<ConstraintJacobian<P>>,
    cons_h: Option<ConstraintHessians<P>>,
    hess_prototype: Option<SparsityPattern>,
    cons_jac_prototype: Option<SparsityPattern>,
    cons_hess_prototype: Option<Vec<SparsityPattern>>,
}

impl<P> OptimizationFunction<P, NoAD> {
    /// Wraps a bare objective with no derivatives and no automatic
    /// differentiation.
    pub fn from_objective<F>(f: F) -> Self
    where
        F: Fn(&Array1<f64>, &P) -> f64 + Send + Sync + 'static,
    {
        Self::new(f, NoAD)
    }
}

impl<P, AD: AdType> OptimizationFunction<P, AD> {
    /// Wraps an objective for in-place derivative evaluation.
    pub fn new<F>(f: F, ad: AD) -> Self
    where
        F: Fn(&Array1<f64>, &P) -> f64 + Send + Sync + 'static,
    {
        Self::with_convention(Convention::InPlace, f, ad)
    }

    /// Wraps an objective with an explicitly pinned convention.
    pub fn with_convention<F>(convention: Convention, f: F, ad: AD) -> Self
    where
        F: Fn(&Array1<f64>, &P) -> f64 + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            ad,
            convention,
            grad: None,
            hess: None,
            hv: None,
            cons: None,
            cons_j: None,
            cons_h: None,
            hess_prototype: None,
            cons_jac_prototype: None,
            cons_hess_prototype: None,
        }
    }

    /// Evaluates the objective.
    pub fn call(&self, x: &Array1<f64>, p: &P) -> f64 {
        (self.f)(x, p)
    }

    #[must_use]
    pub fn with_grad(self, grad: impl Into<Gradient<P>>) -> Self {
        Self {
            grad: Some(grad.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_hess(self, hess: impl Into<Hessian<P>>) -> Self {
        Self {
            hess: Some(hess.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_hv(self, hv: impl Into<HessianVectorProduct<P>>) -> Self {
        Self {
            hv: Some(hv.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_cons(self, cons: impl Into<Constraints<P>>) -> Self {
        Self {
            cons: Some(cons.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_cons_j(self, cons_j: impl Into<ConstraintJacobian<P>>) -> Self {
        Self {
            cons_j: Some(cons_j.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_cons_h(self, cons_h: impl Into<ConstraintHessians<P>>) -> Self {
        Self {
            cons_h: Some(cons_h.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_hess_prototype(self, pattern: SparsityPattern) -> Self {
        Self {
            hess_prototype: Some(pattern),
            ..self
        }
    }

    #[must_use]
    pub fn with_cons_jac_prototype(self, pattern: SparsityPattern) -> Self {
        Self {
            cons_jac_prototype: Some(pattern),
            ..self
        }
    }

    /// Sets one sparsity pattern per constraint Hessian.
    #[must_use]
    pub fn with_cons_hess_prototype(self, patterns: Vec<SparsityPattern>) -> Self {
        Self {
            cons_hess_prototype: Some(patterns),
            ..self
        }
    }

    pub fn ad(&self) -> AD {
        self.ad
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn is_in_place(&self) -> bool {
        self.convention.is_in_place()
    }

    pub fn grad(&self) -> Option<&Gradient<P>> {
        self.grad.as_ref()
    }

    pub fn hess(&self) -> Option<&Hessian<P>> {
        self.hess.as_ref()
    }

    pub fn hv(&self) -> Option<&HessianVectorProduct<P>> {
        self.hv.as_ref()
    }

    pub fn cons(&self) -> Option<&Constraints<P>> {
        self.cons.as_ref()
    }

    pub fn cons_j(&self) -> Option<&ConstraintJacobian<P>> {
        self.cons_j.as_ref()
    }

    pub fn cons_h(&self) -> Option<&ConstraintHessians<P>> {
        self.cons_h.as_ref()
    }

    pub fn hess_prototype(&self) -> Option<&SparsityPattern> {
        self.hess_prototype.as_ref()
    }

    pub fn cons_jac_prototype(&self) -> Option<&SparsityPattern> {
        self.cons_jac_prototype.as_ref()
    }

    pub fn cons_hess_prototype(&self) -> Option<&[SparsityPattern]> {
        self.cons_hess_prototype.as_deref()
    }

    /// Returns `true` if both wrappers share the same objective.
    pub fn shares_objective(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

impl<P, AD: Clone> Clone for OptimizationFunction<P, AD> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            ad: self.ad.clone(),
            convention: self.convention,
            grad: self.grad.clone(),
            hess: self.hess.clone(),
            hv: self.hv.clone(),
            cons: self.cons.clone(),
            cons_j: self.cons_j.clone(),
            cons_h: self.cons_h.clone(),
            hess_prototype: self.hess_prototype.clone(),
            cons_jac_prototype: self.cons_jac_prototype.clone(),
            cons_hess_prototype: self.cons_hess_prototype.clone(),
        }
    }
}

impl<P, AD: AdType> fmt::Debug for OptimizationFunction<P, AD> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizationFunction")
            .field("ad", &AD::NAME)
            .field("convention", &self.convention)
            .field("grad", &self.grad)
            .field("hess", &self.hess)
            .field("hv", &self.hv)
            .field("cons", &self.cons)
            .field("cons_j", &self.cons_j)
            .field("cons_h", &self.cons_h)
            .field("hess_prototype", &self.hess_prototype)
            .field("cons_jac_prototype", &self.cons_jac_prototype)
            .field("cons_hess_prototype", &self.cons_hess_prototype)
            .finish_non_exhaustive()
    }
}
