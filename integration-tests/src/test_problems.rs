pub mod rosenbrock {
    use ndarray::Array1;
    use numprob_core::{
        BoundsError, Function, Gradient, OptimizationFunction, OptimizationProblem, Sense,
        SolverOptions, ad::NoAD,
    };
    use serde::{Deserialize, Serialize};

    /// Coefficients of `(a - x)^2 + b (y - x^2)^2`.
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Coefficients {
        pub a: f64,
        pub b: f64,
    }

    impl Default for Coefficients {
        fn default() -> Self {
            Self { a: 1.0, b: 100.0 }
        }
    }

    /// A study of the Rosenbrock function, as read from a config file.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct Study {
        #[serde(default)]
        pub coefficients: Coefficients,
        pub start: Vec<f64>,
        pub lb: Option<Vec<f64>>,
        pub ub: Option<Vec<f64>>,
        pub sense: Option<Sense>,
        #[serde(default)]
        pub options: SolverOptions,
    }

    pub fn objective(x: &Array1<f64>, p: &Coefficients) -> f64 {
        (p.a - x[0]).powi(2) + p.b * (x[1] - x[0].powi(2)).powi(2)
    }

    pub fn gradient() -> Gradient<Coefficients> {
        Function::in_place(|g: &mut Array1<f64>, x: &Array1<f64>, p: &Coefficients| {
            g[0] = -2.0 * (p.a - x[0]) - 4.0 * p.b * x[0] * (x[1] - x[0].powi(2));
            g[1] = 2.0 * p.b * (x[1] - x[0].powi(2));
        })
    }

    impl Study {
        /// Builds the optimization problem this study describes.
        ///
        /// # Errors
        ///
        /// Fails if the study gives only one of `lb` and `ub`.
        pub fn problem(self) -> Result<OptimizationProblem<Coefficients, NoAD>, BoundsError> {
            let f = OptimizationFunction::from_objective(objective).with_grad(gradient());
            let u0 = Array1::from(self.start);
            let mut builder = OptimizationProblem::builder_with_params(f, u0, self.coefficients)
                .options(self.options);

            if let Some(lb) = self.lb {
                builder = builder.lb(Array1::from(lb));
            }
            if let Some(ub) = self.ub {
                builder = builder.ub(Array1::from(ub));
            }
            if let Some(sense) = self.sense {
                builder = builder.sense(sense);
            }

            builder.build()
        }
    }
}

pub mod heat {
    use ndarray::{Array1, ArrayView1, ArrayViewMut1};
    use numprob_core::{EvaluationError, LinearOperator, Signature};

    const FORMS: &[Signature] = &[Signature::in_place(4), Signature::out_of_place(3)];

    /// Implicit-Euler step of 1-D heat conduction with fixed ends.
    ///
    /// Applies `(I - r L)` where `L` is the second-difference matrix and
    /// `r = alpha * dt / dx^2` is passed as the parameter.
    #[derive(Debug, Clone, Copy)]
    pub struct ImplicitStep {
        pub nodes: usize,
    }

    impl LinearOperator<f64, f64> for ImplicitStep {
        fn size(&self) -> (usize, usize) {
            (self.nodes, self.nodes)
        }

        fn signatures(&self) -> &[Signature] {
            FORMS
        }

        fn apply_into(
            &self,
            mut du: ArrayViewMut1<'_, f64>,
            u: ArrayView1<'_, f64>,
            r: &f64,
            _t: f64,
        ) -> Result<(), EvaluationError> {
            let n = self.nodes;
            for i in 0..n {
                let left = if i > 0 { u[i - 1] } else { 0.0 };
                let right = if i + 1 < n { u[i + 1] } else { 0.0 };
                du[i] = (1.0 + 2.0 * r) * u[i] - r * (left + right);
            }
            Ok(())
        }

        fn apply(
            &self,
            u: ArrayView1<'_, f64>,
            r: &f64,
            t: f64,
        ) -> Result<Array1<f64>, EvaluationError> {
            let mut du = Array1::zeros(self.nodes);
            self.apply_into(du.view_mut(), u, r, t)?;
            Ok(du)
        }
    }
}
