/// Tags which automatic-differentiation backend an optimization function
/// requests from its solver.
///
/// Tags carry no data and perform no differentiation themselves. A solver that
/// needs derivatives the function did not provide reads the tag to decide how
/// to obtain them.
pub trait AdType: Clone + Copy + Default + Send + Sync + 'static {
    /// Short, stable name of the backend.
    const NAME: &'static str;

    /// Whether the solver should generate missing derivatives.
    const GENERATES_DERIVATIVES: bool;
}

/// No automatic differentiation: only user-supplied derivatives are available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoAD;

impl AdType for NoAD {
    const NAME: &'static str = "none";
    const GENERATES_DERIVATIVES: bool = false;
}

/// Forward-mode automatic differentiation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AutoForwardDiff;

impl AdType for AutoForwardDiff {
    const NAME: &'static str = "forward";
    const GENERATES_DERIVATIVES: bool = true;
}

/// Finite-difference approximation of derivatives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AutoFiniteDiff;

impl AdType for AutoFiniteDiff {
    const NAME: &'static str = "finite-difference";
    const GENERATES_DERIVATIVES: bool = true;
}
