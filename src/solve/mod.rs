//! Symbolic equation solving
//!
//! - [`solve_for`]: one equation in one variable, other symbols as parameters
//! - [`solve_linear_system`]: Gauss-Jordan over symbolic coefficients
//! - [`solve_nonlinear_system`]: recursive elimination
//! - [`reduce_inequality`]: one-variable rational inequalities as a [`RealSet`]
//!
//! Every entry point takes a [`Budget`] so adversarial inputs stop with
//! `SolveError::BudgetExceeded` instead of running unbounded.

mod budget;
mod inequality;
mod linear;
mod nonlinear;
mod univariate;

pub use budget::Budget;
pub use inequality::{Interval, RealSet, reduce_inequality};
pub use linear::{LinearSolution, solve_linear_system};
pub use nonlinear::solve_nonlinear_system;
pub use univariate::solve_for;
