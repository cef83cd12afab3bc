pub mod linear;
pub mod nonlinear;
pub mod optimization;
pub mod quadrature;
