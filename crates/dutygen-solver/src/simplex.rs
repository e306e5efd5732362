use std::time::Instant;

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, Solution, SolutionStatus};

/// Consecutive degenerate pivots after which entering columns are picked by
/// Bland's rule instead of the most negative reduced cost.
const DEGENERATE_STREAK_LIMIT: usize = 50;

/// Pivots between two reads of the clock
const DEADLINE_CHECK_INTERVAL: usize = 16;

/// Simplex solver settings for linear programming problems
#[derive(Debug, Clone, Copy)]
pub struct Solver {
    /// Maximum pivots per solve before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Wall-clock instant after which a solve stops with `TimeLimit`
    deadline: Option<Instant>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            deadline: None,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Solution {
        Simplex::new(problem, *self).solve()
    }
}

/// A simplex tableau that survives between solves.
///
/// Columns can be appended after a solve; the last basis stays primal feasible
/// (the new variable enters at zero), so the next [`Simplex::solve`] resumes
/// from it instead of starting over. Slack and artificial columns are never
/// dropped: their tableau entries hold the basis inverse, which is what maps a
/// new column into the current basis.
#[derive(Debug, Clone)]
pub struct Simplex {
    settings: Solver,
    tableau: Tableau,
    /// Minimization-form cost of every tableau column
    costs: Vec<f64>,
    /// Cost of every structural variable as stated by the caller
    original_costs: Vec<f64>,
    /// Tableau column of each structural variable
    structural: Vec<usize>,
    /// Column that started out as the unit vector of each row
    identity: Vec<usize>,
    /// -1.0 for rows negated to get a non-negative RHS
    row_sign: Vec<f64>,
    minimize: bool,
    iterations: usize,
}

#[derive(Debug, Clone)]
struct Tableau {
    rows: Vec<Vec<f64>>,
    rhs: Vec<f64>,
    /// Reduced cost of every column in the current phase
    reduced: Vec<f64>,
    /// Objective value of the current phase at the current basis
    objective: f64,
    basic_vars: Vec<usize>,
    kinds: Vec<ColumnKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Structural,
    Slack,
    Artificial,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    IterationLimit,
    TimeLimit,
}

impl Simplex {
    pub fn new(problem: &LpProblem, settings: Solver) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();
        let minimize = problem.objective.minimize;

        let mut tableau = Tableau {
            rows: vec![Vec::new(); n_constraints],
            rhs: vec![0.0; n_constraints],
            reduced: Vec::new(),
            objective: 0.0,
            basic_vars: vec![0; n_constraints],
            kinds: Vec::new(),
        };
        let mut costs = Vec::new();
        let mut row_sign = vec![1.0; n_constraints];

        // Original variables
        let mut structural = Vec::with_capacity(n_vars);
        for j in 0..n_vars {
            let coef = problem.objective.coefficients.get(j).copied().unwrap_or(0.0);
            structural.push(tableau.kinds.len());
            tableau.kinds.push(ColumnKind::Structural);
            costs.push(if minimize { coef } else { -coef });
        }

        // RHS (ensure non-negative)
        for (i, c) in problem.constraints.iter().enumerate() {
            if c.rhs < 0.0 {
                row_sign[i] = -1.0;
            }
            tableau.rhs[i] = c.rhs * row_sign[i];
            tableau.rows[i] = (0..n_vars)
                .map(|j| c.coefficients.get(j).copied().unwrap_or(0.0) * row_sign[i])
                .collect();
        }

        // Add slack/surplus/artificial
        let mut identity = vec![0; n_constraints];
        for (i, c) in problem.constraints.iter().enumerate() {
            let flipped = row_sign[i] < 0.0;
            let op = match (c.op, flipped) {
                (ConstraintOp::Le, false) | (ConstraintOp::Ge, true) => ConstraintOp::Le,
                (ConstraintOp::Ge, false) | (ConstraintOp::Le, true) => ConstraintOp::Ge,
                (ConstraintOp::Eq, _) => ConstraintOp::Eq,
            };
            match op {
                ConstraintOp::Le => {
                    let col = tableau.push_unit_column(i, 1.0, ColumnKind::Slack);
                    costs.push(0.0);
                    identity[i] = col;
                }
                ConstraintOp::Ge => {
                    tableau.push_unit_column(i, -1.0, ColumnKind::Slack);
                    costs.push(0.0);
                    let col = tableau.push_unit_column(i, 1.0, ColumnKind::Artificial);
                    costs.push(0.0);
                    identity[i] = col;
                }
                ConstraintOp::Eq => {
                    let col = tableau.push_unit_column(i, 1.0, ColumnKind::Artificial);
                    costs.push(0.0);
                    identity[i] = col;
                }
            }
            tableau.basic_vars[i] = identity[i];
        }
        tableau.reduced = vec![0.0; tableau.kinds.len()];

        let mut simplex = Self {
            settings,
            tableau,
            costs,
            original_costs: problem.objective.coefficients.clone(),
            structural,
            identity,
            row_sign,
            minimize,
            iterations: 0,
        };
        simplex.crash_unit_columns();
        simplex
    }

    /// Replace basic artificials by structural columns that are a positive
    /// multiple of the row's unit vector. Such a pivot only rescales its own
    /// row and keeps the basis feasible, so a model that carries a unit
    /// column for every `=` row starts phase 2 directly.
    fn crash_unit_columns(&mut self) {
        let n_rows = self.tableau.rows.len();
        let mut unit_row: Vec<Option<usize>> = vec![None; self.structural.len()];
        let mut nonzeros = vec![0usize; self.structural.len()];
        for (i, row) in self.tableau.rows.iter().enumerate() {
            for (j, &col) in self.structural.iter().enumerate() {
                if row[col] != 0.0 {
                    nonzeros[j] += 1;
                    unit_row[j] = Some(i);
                }
            }
        }

        let mut crashed = vec![false; n_rows];
        for j in 0..self.structural.len() {
            let col = self.structural[j];
            let Some(i) = unit_row[j].filter(|_| nonzeros[j] == 1) else {
                continue;
            };
            let basic = self.tableau.basic_vars[i];
            if crashed[i]
                || self.tableau.kinds[basic] != ColumnKind::Artificial
                || self.tableau.rows[i][col] <= self.settings.tolerance
            {
                continue;
            }
            self.pivot(i, col);
            crashed[i] = true;
        }
    }

    pub fn num_variables(&self) -> usize {
        self.structural.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.identity.len()
    }

    /// Append a variable given as a sparse column of `(constraint, coefficient)` entries.
    /// The column is expressed in the current basis, so a following `solve` warm starts.
    pub fn add_column(&mut self, cost: f64, column: &[(usize, f64)]) -> usize {
        let n_constraints = self.num_constraints();
        let mut entries = vec![0.0; n_constraints];
        for &(k, coef) in column {
            if k >= n_constraints {
                continue;
            }
            let a = coef * self.row_sign[k];
            let id_col = self.identity[k];
            for (i, entry) in entries.iter_mut().enumerate() {
                *entry += a * self.tableau.rows[i][id_col];
            }
        }
        for (row, entry) in self.tableau.rows.iter_mut().zip(entries) {
            row.push(entry);
        }
        self.tableau.reduced.push(0.0);
        self.tableau.kinds.push(ColumnKind::Structural);
        self.costs.push(if self.minimize { cost } else { -cost });
        self.original_costs.push(cost);
        self.structural.push(self.tableau.kinds.len() - 1);
        self.structural.len() - 1
    }

    /// Run both phases from the current basis
    pub fn solve(&mut self) -> Solution {
        self.iterations = 0;

        // Phase 1: Find initial basic feasible solution
        if self.has_positive_artificial() {
            self.set_phase1_objective();
            match self.iterate() {
                SimplexResult::IterationLimit => return self.stopped(Solution::iteration_limit()),
                SimplexResult::TimeLimit => return self.stopped(Solution::time_limit()),
                SimplexResult::Unbounded => return self.stopped(Solution::infeasible()),
                SimplexResult::Optimal => {}
            }
            if self.tableau.objective > self.settings.tolerance {
                return self.stopped(Solution::infeasible());
            }
        }
        self.drive_out_artificials();

        // Phase 2: Optimize
        self.set_phase2_objective();
        match self.iterate() {
            SimplexResult::Optimal => self.extract_solution(),
            SimplexResult::Unbounded => self.stopped(Solution::unbounded()),
            SimplexResult::IterationLimit => self.stopped(Solution::iteration_limit()),
            SimplexResult::TimeLimit => self.stopped(Solution::time_limit()),
        }
    }

    fn stopped(&self, mut solution: Solution) -> Solution {
        solution.iterations = self.iterations;
        solution
    }

    fn has_positive_artificial(&self) -> bool {
        let t = &self.tableau;
        t.basic_vars
            .iter()
            .zip(&t.rhs)
            .any(|(&b, &rhs)| t.kinds[b] == ColumnKind::Artificial && rhs > self.settings.tolerance)
    }

    /// Minimize the sum of artificial variables
    fn set_phase1_objective(&mut self) {
        let t = &mut self.tableau;
        for (j, kind) in t.kinds.iter().enumerate() {
            t.reduced[j] = if *kind == ColumnKind::Artificial { 1.0 } else { 0.0 };
        }
        t.objective = 0.0;
        for i in 0..t.rows.len() {
            if t.kinds[t.basic_vars[i]] == ColumnKind::Artificial {
                for (d, a) in t.reduced.iter_mut().zip(&t.rows[i]) {
                    *d -= a;
                }
                t.objective += t.rhs[i];
            }
        }
    }

    fn set_phase2_objective(&mut self) {
        let t = &mut self.tableau;
        t.reduced.clone_from(&self.costs);
        t.objective = 0.0;
        for i in 0..t.rows.len() {
            let cb = self.costs[t.basic_vars[i]];
            if cb != 0.0 {
                for (d, a) in t.reduced.iter_mut().zip(&t.rows[i]) {
                    *d -= cb * a;
                }
                t.objective += cb * t.rhs[i];
            }
        }
    }

    /// Pivot zero-valued artificials out of the basis where a real column can replace them.
    /// Rows with no such column are redundant and keep their artificial at zero.
    fn drive_out_artificials(&mut self) {
        for i in 0..self.tableau.rows.len() {
            let basic = self.tableau.basic_vars[i];
            if self.tableau.kinds[basic] != ColumnKind::Artificial {
                continue;
            }
            let replacement = (0..self.tableau.kinds.len()).find(|&j| {
                self.tableau.kinds[j] != ColumnKind::Artificial
                    && self.tableau.rows[i][j].abs() > self.settings.tolerance
            });
            if let Some(col) = replacement {
                self.pivot(i, col);
            }
        }
    }

    fn iterate(&mut self) -> SimplexResult {
        let mut degenerate_streak = 0;
        loop {
            let bland = degenerate_streak > DEGENERATE_STREAK_LIMIT;
            let Some(pivot_col) = self.find_pivot_column(bland) else {
                return SimplexResult::Optimal;
            };
            if self.iterations >= self.settings.max_iterations {
                return SimplexResult::IterationLimit;
            }
            if self.iterations % DEADLINE_CHECK_INTERVAL == 0
                && self.settings.deadline.is_some_and(|deadline| Instant::now() >= deadline)
            {
                return SimplexResult::TimeLimit;
            }
            let Some(pivot_row) = self.find_pivot_row(pivot_col) else {
                return SimplexResult::Unbounded;
            };
            let step = self.tableau.rhs[pivot_row] / self.tableau.rows[pivot_row][pivot_col];
            if step <= self.settings.tolerance {
                degenerate_streak += 1;
            } else {
                degenerate_streak = 0;
            }
            self.pivot(pivot_row, pivot_col);
            self.iterations += 1;
        }
    }

    /// Entering column: most negative reduced cost, or the first negative one under Bland's rule.
    /// Artificial columns never enter.
    fn find_pivot_column(&self, bland: bool) -> Option<usize> {
        let t = &self.tableau;
        let mut min_val = -self.settings.tolerance;
        let mut min_col = None;

        for (j, &d) in t.reduced.iter().enumerate() {
            if t.kinds[j] == ColumnKind::Artificial || d >= min_val {
                continue;
            }
            if bland {
                return Some(j);
            }
            min_val = d;
            min_col = Some(j);
        }

        min_col
    }

    /// Leaving row by minimum ratio; ties go to the smallest basic column index
    fn find_pivot_row(&self, col: usize) -> Option<usize> {
        let t = &self.tableau;
        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..t.rows.len() {
            let val = t.rows[i][col];
            if val <= self.settings.tolerance {
                continue;
            }
            let ratio = t.rhs[i].max(0.0) / val;
            let better = match min_row {
                None => true,
                Some(r) => {
                    ratio < min_ratio - self.settings.tolerance
                        || (ratio <= min_ratio + self.settings.tolerance && t.basic_vars[i] < t.basic_vars[r])
                }
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    fn pivot(&mut self, row: usize, col: usize) {
        let t = &mut self.tableau;

        // Update basic variable
        t.basic_vars[row] = col;

        // Scale pivot row
        let pivot_val = t.rows[row][col];
        for v in t.rows[row].iter_mut() {
            *v /= pivot_val;
        }
        t.rhs[row] /= pivot_val;
        t.rows[row][col] = 1.0;

        let pivot_row = t.rows[row].clone();
        let pivot_rhs = t.rhs[row];

        // Eliminate column in other rows
        for i in 0..t.rows.len() {
            if i == row {
                continue;
            }
            let factor = t.rows[i][col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in t.rows[i].iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
            t.rows[i][col] = 0.0;
            t.rhs[i] -= factor * pivot_rhs;
            if t.rhs[i].abs() < self.settings.tolerance * 1e-3 {
                t.rhs[i] = 0.0;
            }
        }

        let factor = t.reduced[col];
        if factor != 0.0 {
            for (d, p) in t.reduced.iter_mut().zip(&pivot_row) {
                *d -= factor * p;
            }
            t.objective += factor * pivot_rhs;
        }
        t.reduced[col] = 0.0;
    }

    fn extract_solution(&self) -> Solution {
        let t = &self.tableau;
        let n_vars = self.num_variables();

        // Extract variable values
        let mut values = vec![0.0; n_vars];
        let mut column_to_var = vec![None; t.kinds.len()];
        for (j, &col) in self.structural.iter().enumerate() {
            column_to_var[col] = Some(j);
        }
        for (i, &basic) in t.basic_vars.iter().enumerate() {
            if let Some(j) = column_to_var[basic] {
                values[j] = t.rhs[i].max(0.0);
            }
        }

        let objective_value = self
            .original_costs
            .iter()
            .zip(&values)
            .map(|(c, x)| c * x)
            .sum();

        let direction = if self.minimize { 1.0 } else { -1.0 };

        // Identity columns cost nothing in phase 2, so their reduced cost is minus the dual
        let shadow_prices: Vec<f64> = self
            .identity
            .iter()
            .zip(&self.row_sign)
            .map(|(&col, &sign)| -t.reduced[col] * sign * direction)
            .collect();

        let reduced_costs = self
            .structural
            .iter()
            .map(|&col| t.reduced[col] * direction)
            .collect();

        let binding_constraints = shadow_prices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.abs() > self.settings.tolerance)
            .map(|(i, _)| i)
            .collect();

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            analysis: Analysis {
                shadow_prices,
                reduced_costs,
                binding_constraints,
            },
            iterations: self.iterations,
        }
    }
}

impl Tableau {
    fn push_unit_column(&mut self, row: usize, value: f64, kind: ColumnKind) -> usize {
        for (i, r) in self.rows.iter_mut().enumerate() {
            r.push(if i == row { value } else { 0.0 });
        }
        self.kinds.push(kind);
        self.kinds.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::LpProblem;

    fn assert_close(actual: f64, expected: f64, what: &str) {
        assert!((actual - expected).abs() < 1e-6, "{} = {} (expected {})", what, actual, expected);
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        // Subject to:
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_close(solution.values[0], 3.0, "x");
        assert_close(solution.values[1], 1.0, "y");
        assert_close(solution.objective_value, 11.0, "obj");
        assert_close(solution.analysis.shadow_prices[0], 2.0, "dual(sum)");
        assert_close(solution.analysis.shadow_prices[1], 1.0, "dual(x_max)");
        assert_close(solution.analysis.shadow_prices[2], 0.0, "dual(y_max)");
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_close(solution.values[0], 3.0, "x");
        assert_close(solution.values[1], 1.0, "y");
        assert_close(solution.objective_value, 9.0, "obj");
        assert_close(solution.analysis.shadow_prices[0], 3.0, "dual(sum)");
        assert_close(solution.analysis.shadow_prices[1], -1.0, "dual(x_max)");
        assert_eq!(solution.analysis.binding_constraints, vec![0, 1]);
    }

    #[test]
    fn test_negative_rhs_is_flipped() {
        // Minimize x subject to -x <= -2  (i.e. x >= 2)
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("neg", vec![-1.0], ConstraintOp::Le, -2.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_close(solution.values[0], 2.0, "x");
        assert_close(solution.analysis.shadow_prices[0], -1.0, "dual(neg)");
    }

    #[test]
    fn test_infeasible() {
        // x >= 5
        // x <= 3
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_unbounded() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], false);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 1.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_set_partition_duals() {
        // Three items, singleton columns only: every dual equals the singleton cost
        let mut problem = LpProblem::new(Vec::new());
        for i in 0..3 {
            problem.add_constraint(format!("item{}", i), Vec::new(), ConstraintOp::Eq, 1.0);
        }
        for i in 0..3 {
            problem.add_variable(format!("s{}", i), 1.0, &[(i, 1.0)]);
        }

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_close(solution.objective_value, 3.0, "obj");
        for &y in &solution.analysis.shadow_prices {
            assert_close(y, 1.0, "dual");
        }
    }

    #[test]
    fn test_warm_column_append() {
        let mut problem = LpProblem::new(Vec::new());
        for i in 0..3 {
            problem.add_constraint(format!("item{}", i), Vec::new(), ConstraintOp::Eq, 1.0);
        }
        for i in 0..3 {
            problem.add_variable(format!("s{}", i), 1.0, &[(i, 1.0)]);
        }

        let mut simplex = Simplex::new(&problem, Solver::new());
        let first = simplex.solve();
        assert_close(first.objective_value, 3.0, "first obj");

        // A column covering items 0 and 1 saves one unit
        let pair = simplex.add_column(1.0, &[(0, 1.0), (1, 1.0)]);
        let second = simplex.solve();
        assert_eq!(second.status, SolutionStatus::Optimal);
        assert_close(second.objective_value, 2.0, "second obj");
        assert_close(second.values[pair], 1.0, "pair");

        // Covering everything at once leaves a single column
        let all = simplex.add_column(1.0, &[(0, 1.0), (1, 1.0), (2, 1.0)]);
        let third = simplex.solve();
        assert_close(third.objective_value, 1.0, "third obj");
        assert_close(third.values[all], 1.0, "all");

        // Same answer as a cold solve of the grown problem
        problem.add_variable("pair", 1.0, &[(0, 1.0), (1, 1.0)]);
        problem.add_variable("all", 1.0, &[(0, 1.0), (1, 1.0), (2, 1.0)]);
        let cold = Solver::new().solve(&problem);
        assert_close(cold.objective_value, third.objective_value, "cold obj");
    }

    #[test]
    fn test_unit_columns_skip_phase_one() {
        // One pivot per row would be needed without the unit-column start
        let n = 40;
        let mut problem = LpProblem::new(Vec::new());
        for i in 0..n {
            problem.add_constraint(format!("item{}", i), Vec::new(), ConstraintOp::Eq, 1.0);
        }
        for i in 0..n {
            problem.add_variable(format!("s{}", i), 1.0, &[(i, 1.0)]);
        }

        let solution = Solver::new().with_max_iterations(0).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.iterations, 0);
        assert_close(solution.objective_value, n as f64, "obj");
        for &y in &solution.analysis.shadow_prices {
            assert_close(y, 1.0, "dual");
        }
    }

    #[test]
    fn test_passed_deadline_stops_pivoting() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().with_deadline(Instant::now()).solve(&problem);

        assert_eq!(solution.status, SolutionStatus::TimeLimit);
        assert!(solution.values.is_empty());
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn test_redundant_equalities() {
        // Second row duplicates the first; its artificial stays basic at zero
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![1.0, 2.0], true);
        problem.add_constraint("a", vec![1.0, 1.0], ConstraintOp::Eq, 2.0);
        problem.add_constraint("b", vec![1.0, 1.0], ConstraintOp::Eq, 2.0);

        let solution = Solver::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_close(solution.objective_value, 2.0, "obj");
        assert_close(solution.values[0], 2.0, "x");
    }
}
