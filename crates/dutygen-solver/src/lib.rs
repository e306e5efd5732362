mod branch;
mod problem;
mod simplex;
mod solution;

pub use branch::{BranchAndBound, MipSolution, MipStatus};
pub use problem::{Constraint, ConstraintOp, LpProblem, Objective, VarKind};
pub use simplex::{Simplex, Solver};
pub use solution::{Analysis, Solution, SolutionStatus};
