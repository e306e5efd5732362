use std::time::{Duration, Instant};

use crate::problem::{ConstraintOp, LpProblem};
use crate::simplex::Solver;
use crate::solution::{Solution, SolutionStatus};

/// Distance from an integer below which a value counts as integral
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Depth-first branch-and-bound over the integer variables of an [`LpProblem`].
///
/// Every node below the root re-solves the LP relaxation with its branching
/// bounds added as rows. The wall-clock limit is handed to each node's simplex
/// as a deadline, so a long relaxation is cut off mid-solve. The search then
/// reports the incumbent it has, so a caller that seeds a feasible incumbent
/// always gets one back.
#[derive(Debug, Clone, Default)]
pub struct BranchAndBound {
    solver: Solver,
    time_limit: Option<Duration>,
    /// All objective coefficients are integers, so bounds can be rounded up
    integral_objective: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MipStatus {
    /// The incumbent is proven optimal
    Optimal,
    /// The time limit stopped the search; the incumbent is feasible
    TimeLimit,
    /// No integer solution exists
    Infeasible,
    /// The relaxation is unbounded
    Unbounded,
    /// An LP relaxation ran out of pivots; the incumbent (if any) is unproven
    IterationLimit,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MipSolution {
    pub status: MipStatus,
    /// Incumbent values, integer variables rounded. Empty when there is no incumbent.
    pub values: Vec<f64>,
    /// Incumbent objective value
    pub objective_value: f64,
    /// Best proven bound on the optimum
    pub best_bound: f64,
    /// LP relaxations solved here; a root handed in by the caller is not counted
    pub nodes: usize,
    pub elapsed: Duration,
}

impl MipSolution {
    pub fn has_incumbent(&self) -> bool {
        !self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Bound {
    var: usize,
    op: ConstraintOp,
    value: f64,
}

struct Incumbent {
    values: Vec<f64>,
    /// Minimization-form objective
    objective: f64,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_integral_objective(mut self, integral: bool) -> Self {
        self.integral_objective = integral;
        self
    }

    /// Solve `problem` honoring its variable kinds. `warm_start` is used as the
    /// first incumbent when it is feasible and integral.
    pub fn solve(&self, problem: &LpProblem, warm_start: Option<&[f64]>) -> MipSolution {
        self.search(problem, None, warm_start)
    }

    /// Like [`solve`](Self::solve), with the root relaxation already solved by
    /// the caller. `root` must be an optimal solution of `problem` with every
    /// variable continuous; it is branched on without another simplex run.
    pub fn solve_from_root(&self, problem: &LpProblem, root: &Solution, warm_start: Option<&[f64]>) -> MipSolution {
        self.search(problem, Some(root).filter(|r| r.is_optimal()), warm_start)
    }

    fn search(&self, problem: &LpProblem, root: Option<&Solution>, warm_start: Option<&[f64]>) -> MipSolution {
        let start = Instant::now();
        let deadline = self.time_limit.and_then(|limit| start.checked_add(limit));
        let solver = match deadline {
            Some(deadline) => self.solver.with_deadline(deadline),
            None => self.solver,
        };
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };
        let tol = self.solver.tolerance();

        let mut incumbent = warm_start
            .filter(|values| self.is_integral(problem, values) && problem.is_feasible(values, 1e-6))
            .map(|values| {
                let values = self.round(problem, values);
                Incumbent {
                    objective: sense * problem.evaluate(&values),
                    values,
                }
            });

        let mut stack: Vec<Vec<Bound>> = vec![Vec::new()];
        let mut nodes = 0;
        let mut root_bound = None;
        let mut stopped = None;
        let mut unproven = false;

        while let Some(bounds) = stack.pop() {
            if self.time_limit.is_some_and(|limit| start.elapsed() >= limit) {
                stack.push(bounds);
                stopped = Some(MipStatus::TimeLimit);
                break;
            }

            let relaxation = match root {
                Some(root) if bounds.is_empty() => root.clone(),
                _ => {
                    nodes += 1;
                    solver.solve(&with_bounds(problem, &bounds))
                }
            };

            match relaxation.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::TimeLimit => {
                    stack.push(bounds);
                    stopped = Some(MipStatus::TimeLimit);
                    break;
                }
                SolutionStatus::Infeasible => continue,
                SolutionStatus::Unbounded => {
                    return MipSolution {
                        status: MipStatus::Unbounded,
                        values: Vec::new(),
                        objective_value: sense * f64::NEG_INFINITY,
                        best_bound: sense * f64::NEG_INFINITY,
                        nodes,
                        elapsed: start.elapsed(),
                    };
                }
                SolutionStatus::IterationLimit => {
                    unproven = true;
                    continue;
                }
            }

            let bound = sense * relaxation.objective_value;
            if bounds.is_empty() {
                root_bound = Some(bound);
            }
            if let Some(best) = &incumbent {
                if self.rounded_bound(bound, tol) >= best.objective - tol {
                    continue;
                }
            }

            match self.branching_variable(problem, &relaxation.values) {
                None => {
                    let values = self.round(problem, &relaxation.values);
                    let objective = sense * problem.evaluate(&values);
                    if incumbent.as_ref().is_none_or(|best| objective < best.objective - tol) {
                        incumbent = Some(Incumbent { values, objective });
                    }
                }
                Some(var) => {
                    let value = relaxation.values[var];
                    let mut down = bounds.clone();
                    down.push(Bound { var, op: ConstraintOp::Le, value: value.floor() });
                    let mut up = bounds;
                    up.push(Bound { var, op: ConstraintOp::Ge, value: value.ceil() });
                    // Up branch is explored first
                    stack.push(down);
                    stack.push(up);
                }
            }
        }

        let status = match (stopped, &incumbent) {
            (Some(status), _) => status,
            (None, _) if unproven => MipStatus::IterationLimit,
            (None, Some(_)) => MipStatus::Optimal,
            (None, None) => MipStatus::Infeasible,
        };

        let (values, objective) = match incumbent {
            Some(best) => (best.values, best.objective),
            None => (Vec::new(), f64::INFINITY),
        };
        let best_bound = if status == MipStatus::Optimal {
            objective
        } else {
            root_bound.map_or(objective, |b| self.rounded_bound(b, tol).min(objective))
        };

        MipSolution {
            status,
            values,
            objective_value: sense * objective,
            best_bound: sense * best_bound,
            nodes,
            elapsed: start.elapsed(),
        }
    }

    fn rounded_bound(&self, bound: f64, tol: f64) -> f64 {
        if self.integral_objective {
            (bound - tol).ceil()
        } else {
            bound
        }
    }

    fn is_integral(&self, problem: &LpProblem, values: &[f64]) -> bool {
        values
            .iter()
            .enumerate()
            .all(|(j, &x)| !problem.is_integer(j) || (x - x.round()).abs() <= INTEGRALITY_TOLERANCE)
    }

    fn round(&self, problem: &LpProblem, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(j, &x)| if problem.is_integer(j) { x.round() } else { x })
            .collect()
    }

    /// Most fractional integer variable; ties go to the lowest index
    fn branching_variable(&self, problem: &LpProblem, values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (j, &x) in values.iter().enumerate() {
            if !problem.is_integer(j) {
                continue;
            }
            let frac = (x - x.floor()).min(x.ceil() - x);
            if frac <= INTEGRALITY_TOLERANCE {
                continue;
            }
            if best.is_none_or(|(_, f)| frac > f + INTEGRALITY_TOLERANCE) {
                best = Some((j, frac));
            }
        }
        best.map(|(j, _)| j)
    }
}

fn with_bounds(problem: &LpProblem, bounds: &[Bound]) -> LpProblem {
    let mut node = problem.clone();
    let n = problem.num_variables();
    for b in bounds {
        let mut coefficients = vec![0.0; n];
        coefficients[b.var] = 1.0;
        node.add_constraint(format!("branch_x{}", b.var), coefficients, b.op, b.value);
    }
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VarKind;

    fn knapsack() -> LpProblem {
        // Maximize 5a + 4b + 3c subject to 2a + 3b + c <= 5, each <= 1
        // LP optimum is fractional; integer optimum a=1, b=1 with value 9
        let mut problem = LpProblem::new(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        problem.set_objective(vec![5.0, 4.0, 3.0], false);
        problem.add_constraint("weight", vec![2.0, 3.0, 1.0], ConstraintOp::Le, 5.0);
        problem.add_constraint("a_max", vec![1.0, 0.0, 0.0], ConstraintOp::Le, 1.0);
        problem.add_constraint("b_max", vec![0.0, 1.0, 0.0], ConstraintOp::Le, 1.0);
        problem.add_constraint("c_max", vec![0.0, 0.0, 1.0], ConstraintOp::Le, 1.0);
        problem.set_all_kinds(VarKind::Integer);
        problem
    }

    #[test]
    fn test_knapsack_optimum() {
        let problem = knapsack();
        let solution = BranchAndBound::new().solve(&problem, None);

        assert_eq!(solution.status, MipStatus::Optimal);
        assert!((solution.objective_value - 9.0).abs() < 1e-6, "obj = {}", solution.objective_value);
        assert!(problem.is_feasible(&solution.values, 1e-6));
        assert!(solution.nodes >= 1);
    }

    #[test]
    fn test_zero_time_limit_keeps_warm_start() {
        let problem = knapsack();
        let warm = [0.0, 0.0, 1.0];
        let solution = BranchAndBound::new()
            .with_time_limit(Duration::ZERO)
            .solve(&problem, Some(&warm));

        assert_eq!(solution.status, MipStatus::TimeLimit);
        assert_eq!(solution.values, vec![0.0, 0.0, 1.0]);
        assert!((solution.objective_value - 3.0).abs() < 1e-9);
        assert_eq!(solution.nodes, 0);
    }

    #[test]
    fn test_infeasible_warm_start_is_ignored() {
        let problem = knapsack();
        let warm = [1.0, 1.0, 1.0];
        let solution = BranchAndBound::new().solve(&problem, Some(&warm));

        assert_eq!(solution.status, MipStatus::Optimal);
        assert!((solution.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_partition_prefers_fewer_columns() {
        // Items {0,1,2}; columns: singletons, {0,1}, {1,2}, {0,2}, {0,1,2}
        let mut problem = LpProblem::new(Vec::new());
        for i in 0..3 {
            problem.add_constraint(format!("item{}", i), Vec::new(), ConstraintOp::Eq, 1.0);
        }
        for i in 0..3 {
            problem.add_variable(format!("s{}", i), 1.0, &[(i, 1.0)]);
        }
        problem.add_variable("p01", 1.0, &[(0, 1.0), (1, 1.0)]);
        problem.add_variable("p12", 1.0, &[(1, 1.0), (2, 1.0)]);
        problem.add_variable("p02", 1.0, &[(0, 1.0), (2, 1.0)]);
        problem.set_all_kinds(VarKind::Integer);

        let solution = BranchAndBound::new()
            .with_integral_objective(true)
            .solve(&problem, None);

        // The LP optimum is 1.5 (each pair at one half); the integer optimum is 2
        assert_eq!(solution.status, MipStatus::Optimal);
        assert!((solution.objective_value - 2.0).abs() < 1e-9);
        assert!(problem.is_feasible(&solution.values, 1e-6));
    }

    #[test]
    fn test_root_solution_is_reused() {
        let problem = knapsack();
        let mut relaxed = problem.clone();
        relaxed.set_all_kinds(VarKind::Continuous);
        let root = Solver::new().solve(&relaxed);
        assert!(root.is_optimal());

        let cold = BranchAndBound::new().solve(&problem, None);
        let seeded = BranchAndBound::new().solve_from_root(&problem, &root, None);

        assert_eq!(seeded.status, MipStatus::Optimal);
        assert!((seeded.objective_value - 9.0).abs() < 1e-6);
        assert_eq!(seeded.nodes + 1, cold.nodes);
    }

    #[test]
    fn test_non_optimal_root_is_solved_again() {
        let problem = knapsack();
        let seeded = BranchAndBound::new().solve_from_root(&problem, &Solution::iteration_limit(), None);

        assert_eq!(seeded.status, MipStatus::Optimal);
        assert!((seeded.objective_value - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_time_limit_interrupts_node_solves() {
        // Pairs around an odd cycle: the relaxation puts one half on every pair
        let n = 121;
        let mut problem = LpProblem::new(Vec::new());
        for i in 0..n {
            problem.add_constraint(format!("item{}", i), Vec::new(), ConstraintOp::Eq, 1.0);
        }
        for i in 0..n {
            problem.add_variable(format!("s{}", i), 1.0, &[(i, 1.0)]);
        }
        for i in 0..n {
            problem.add_variable(format!("p{}", i), 1.0, &[(i, 1.0), ((i + 1) % n, 1.0)]);
        }
        problem.set_all_kinds(VarKind::Integer);
        let singletons: Vec<f64> = (0..problem.num_variables()).map(|j| if j < n { 1.0 } else { 0.0 }).collect();

        let limit = Duration::from_millis(20);
        let solution = BranchAndBound::new()
            .with_time_limit(limit)
            .with_integral_objective(true)
            .solve(&problem, Some(&singletons));

        assert!(solution.has_incumbent());
        assert!(problem.is_feasible(&solution.values, 1e-6));
        assert!(solution.elapsed < limit + Duration::from_millis(500), "elapsed {:?}", solution.elapsed);
    }

    #[test]
    fn test_infeasible_integer_problem() {
        // 2x = 1 has no integer solution
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("half", vec![2.0], ConstraintOp::Eq, 1.0);
        problem.set_all_kinds(VarKind::Integer);

        let solution = BranchAndBound::new().solve(&problem, None);

        assert_eq!(solution.status, MipStatus::Infeasible);
        assert!(!solution.has_incumbent());
    }
}
