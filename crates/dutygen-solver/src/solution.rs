/// The result of solving an LP problem
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal values for each variable
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Dual information at the optimum
    pub analysis: Analysis,
    /// Number of simplex pivots performed (both phases)
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot budget ran out before optimality was proven
    IterationLimit,
    /// The solver's deadline passed before optimality was proven
    TimeLimit,
}

/// Dual information of an optimal basis
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Analysis {
    /// Shadow prices (dual values), one per constraint.
    /// Rate of change of the objective per unit increase of the constraint's RHS.
    pub shadow_prices: Vec<f64>,

    /// Reduced costs, one per variable. Zero for basic variables.
    pub reduced_costs: Vec<f64>,

    /// Indices of the constraints with a non-zero shadow price
    pub binding_constraints: Vec<usize>,
}

impl Solution {
    pub fn infeasible() -> Self {
        Self::with_status(SolutionStatus::Infeasible, f64::INFINITY)
    }

    pub fn unbounded() -> Self {
        Self::with_status(SolutionStatus::Unbounded, f64::NEG_INFINITY)
    }

    pub fn iteration_limit() -> Self {
        Self::with_status(SolutionStatus::IterationLimit, f64::NAN)
    }

    pub fn time_limit() -> Self {
        Self::with_status(SolutionStatus::TimeLimit, f64::NAN)
    }

    fn with_status(status: SolutionStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
            analysis: Analysis::default(),
            iterations: 0,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }
}
