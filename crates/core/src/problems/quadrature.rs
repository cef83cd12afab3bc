use std::{fmt, sync::Arc};

use log::{debug, warn};

use crate::{
    NullParameters, SolverOptions,
    convention::{Convention, SignatureError},
    function::{Callable, Function, Integrand},
};

/// An integral of `f(x, p)` over `[lb, ub]`.
///
/// `nout` is the length of the integrand's output (1 for a scalar integrand).
/// `batch` is a hint that the integrand can evaluate that many points per call;
/// 0 means no batching. Solvers may ignore it.
pub struct QuadratureProblem<X, Y, P = NullParameters> {
    f: Integrand<X, Y, P>,
    lb: X,
    ub: X,
    nout: usize,
    batch: usize,
    p: Arc<P>,
    options: SolverOptions,
}

impl<X, Y> QuadratureProblem<X, Y, NullParameters> {
    /// Creates a quadrature problem without parameters, with `nout = 1` and no
    /// batching.
    pub fn new(f: impl Into<Integrand<X, Y, NullParameters>>, lb: X, ub: X) -> Self {
        Self::with_params(f, lb, ub, NullParameters)
    }
}

impl<X, Y, P> QuadratureProblem<X, Y, P> {
    /// Creates a quadrature problem with `nout = 1` and no batching.
    pub fn with_params(f: impl Into<Integrand<X, Y, P>>, lb: X, ub: X, p: P) -> Self {
        let f = f.into();
        debug!("quadrature problem: {} integrand", f.convention());

        Self {
            f,
            lb,
            ub,
            nout: 1,
            batch: 0,
            p: Arc::new(p),
            options: SolverOptions::default(),
        }
    }

    /// Creates a quadrature problem from a callable, inferring its convention.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if the callable declares neither `f(y, x, p)`
    /// nor `f(x, p)`.
    pub fn from_callable<C>(f: C, lb: X, ub: X, p: P) -> Result<Self, SignatureError>
    where
        C: Callable<X, Y, P> + 'static,
    {
        Ok(Self::with_params(Function::new(f)?, lb, ub, p))
    }

    /// Sets the integrand's output length.
    #[must_use]
    pub fn with_nout(self, nout: usize) -> Self {
        if nout == 0 {
            warn!("quadrature problem built with nout = 0");
        }
        Self { nout, ..self }
    }

    /// Sets the batching hint.
    #[must_use]
    pub fn with_batch(self, batch: usize) -> Self {
        Self { batch, ..self }
    }

    #[must_use]
    pub fn with_options(self, options: SolverOptions) -> Self {
        Self { options, ..self }
    }

    pub fn f(&self) -> &Integrand<X, Y, P> {
        &self.f
    }

    pub fn lb(&self) -> &X {
        &self.lb
    }

    pub fn ub(&self) -> &X {
        &self.ub
    }

    pub fn nout(&self) -> usize {
        self.nout
    }

    pub fn batch(&self) -> usize {
        self.batch
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
}

impl<X: Clone, Y, P> Clone for QuadratureProblem<X, Y, P> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            lb: self.lb.clone(),
            ub: self.ub.clone(),
            nout: self.nout,
            batch: self.batch,
            p: Arc::clone(&self.p),
            options: self.options,
        }
    }
}

impl<X: fmt::Debug, Y, P: fmt::Debug> fmt::Debug for QuadratureProblem<X, Y, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuadratureProblem")
            .field("f", &self.f)
            .field("lb", &self.lb)
            .field("ub", &self.ub)
            .field("nout", &self.nout)
            .field("batch", &self.batch)
            .field("p", &self.p)
            .field("options", &self.options)
            .finish()
    }
}
