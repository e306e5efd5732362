use std::collections::HashSet;
use std::time::Duration;

use dutygen_solver::{BranchAndBound, ConstraintOp, LpProblem, MipStatus, Simplex, Solution, Solver, VarKind};
use tracing::debug;

use crate::error::MasterError;
use crate::trip::TripId;

/// Pivots allowed per trip row on top of the solver's own cap
const PIVOTS_PER_ROW: usize = 4;

/// A duty as a master variable: the trips it covers, sorted
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub trips: Vec<TripId>,
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct RelaxedSolution {
    pub objective: f64,
    /// One dual price per trip row
    pub duals: Vec<f64>,
    /// One value per column
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct IntegerSolution {
    pub objective: f64,
    /// Indices of the columns set to one, ascending
    pub selected: Vec<usize>,
    pub status: MipStatus,
    /// Lower bound proven by the search
    pub best_bound: f64,
    pub nodes: usize,
}

/// The set-partitioning model over duty columns.
///
/// Columns are only ever appended. Every trip row must be covered by exactly one
/// selected column.
pub trait MasterSolver {
    /// Reset to one row per trip, each covered by a singleton column of cost 1
    fn initialize(&mut self, trip_count: usize);

    /// Append a column. Repeated trip sets are kept as separate columns.
    fn add_column(&mut self, trips: &[TripId], cost: f64) -> Result<usize, MasterError>;

    /// Solve the LP relaxation. Anything but an optimal solve is fatal.
    fn solve_relaxed(&mut self) -> Result<RelaxedSolution, MasterError>;

    /// Solve with integral columns under a wall-clock limit
    fn solve_integer(&mut self, time_limit: Duration) -> Result<IntegerSolution, MasterError>;

    fn columns(&self) -> &[Column];

    /// Whether some column covers exactly `trips` (sorted)
    fn contains(&self, trips: &[TripId]) -> bool;
}

/// [`MasterSolver`] backed by a warm-started dense simplex and branch-and-bound
#[derive(Debug, Clone)]
pub struct SimplexMaster {
    settings: Solver,
    problem: LpProblem,
    /// Built by the first relaxed solve, then kept warm
    simplex: Option<Simplex>,
    columns: Vec<Column>,
    known: HashSet<Vec<TripId>>,
    /// Column values of the last relaxed solve
    last_values: Vec<f64>,
    /// The last relaxed optimum, dropped once a column is added
    root: Option<Solution>,
}

impl Default for SimplexMaster {
    fn default() -> Self {
        Self::new(Solver::default())
    }
}

impl SimplexMaster {
    pub fn new(settings: Solver) -> Self {
        Self {
            settings,
            problem: LpProblem::new(Vec::new()),
            simplex: None,
            columns: Vec::new(),
            known: HashSet::new(),
            last_values: Vec::new(),
            root: None,
        }
    }

    fn rows(&self) -> usize {
        self.problem.num_constraints()
    }

    /// The configured solver with its pivot cap raised to scale with the rows
    fn solver(&self) -> Solver {
        let cap = self.settings.max_iterations().max(PIVOTS_PER_ROW * self.rows());
        self.settings.with_max_iterations(cap)
    }

    /// Disjoint columns by descending LP value, completed with singletons
    fn greedy_incumbent(&self) -> Vec<f64> {
        let mut order: Vec<usize> = (0..self.columns.len()).collect();
        let value = |c: usize| self.last_values.get(c).copied().unwrap_or(0.0);
        order.sort_by(|&a, &b| value(b).total_cmp(&value(a)).then(a.cmp(&b)));

        let mut covered = vec![false; self.rows()];
        let mut values = vec![0.0; self.columns.len()];
        for c in order {
            let trips = &self.columns[c].trips;
            if trips.iter().any(|t| covered[t.index()]) {
                continue;
            }
            for t in trips {
                covered[t.index()] = true;
            }
            values[c] = 1.0;
        }
        values
    }
}

impl MasterSolver for SimplexMaster {
    fn initialize(&mut self, trip_count: usize) {
        self.problem = LpProblem::new(Vec::new());
        for t in 0..trip_count {
            self.problem
                .add_constraint(format!("cover_{}", t), Vec::new(), ConstraintOp::Eq, 1.0);
        }
        self.simplex = None;
        self.columns.clear();
        self.known.clear();
        self.last_values.clear();
        self.root = None;

        for t in 0..trip_count {
            self.problem
                .add_variable(format!("duty_{}", t), 1.0, &[(t, 1.0)]);
            self.columns.push(Column {
                trips: vec![TripId(t)],
                cost: 1.0,
            });
            self.known.insert(vec![TripId(t)]);
        }
    }

    fn add_column(&mut self, trips: &[TripId], cost: f64) -> Result<usize, MasterError> {
        if trips.is_empty() {
            return Err(MasterError::EmptyColumn);
        }
        let rows = self.rows();
        if let Some(&trip) = trips.iter().find(|t| t.index() >= rows) {
            return Err(MasterError::UnknownTrip { trip, rows });
        }

        let mut sorted = trips.to_vec();
        sorted.sort();
        let entries: Vec<(usize, f64)> = sorted.iter().map(|t| (t.index(), 1.0)).collect();

        let index = self
            .problem
            .add_variable(format!("duty_{}", self.columns.len()), cost, &entries);
        if let Some(simplex) = &mut self.simplex {
            simplex.add_column(cost, &entries);
        }
        self.root = None;
        self.known.insert(sorted.clone());
        self.columns.push(Column { trips: sorted, cost });
        Ok(index)
    }

    fn solve_relaxed(&mut self) -> Result<RelaxedSolution, MasterError> {
        let settings = self.solver();
        let problem = &self.problem;
        let simplex = self
            .simplex
            .get_or_insert_with(|| Simplex::new(problem, settings));
        let solution = simplex.solve();
        if !solution.is_optimal() {
            return Err(MasterError::FatalModelInfeasible {
                status: solution.status,
            });
        }

        debug!(
            objective = solution.objective_value,
            pivots = solution.iterations,
            columns = self.columns.len(),
            "master relaxation solved"
        );
        self.last_values.clone_from(&solution.values);
        self.root = Some(solution.clone());
        Ok(RelaxedSolution {
            objective: solution.objective_value,
            duals: solution.analysis.shadow_prices,
            values: solution.values,
        })
    }

    fn solve_integer(&mut self, time_limit: Duration) -> Result<IntegerSolution, MasterError> {
        if self.columns.is_empty() {
            return Ok(IntegerSolution {
                objective: 0.0,
                selected: Vec::new(),
                status: MipStatus::Optimal,
                best_bound: 0.0,
                nodes: 0,
            });
        }
        self.problem.set_all_kinds(VarKind::Integer);
        let integral_costs = self.columns.iter().all(|c| c.cost.fract() == 0.0);
        let warm_start = self.greedy_incumbent();

        let search = BranchAndBound::new()
            .with_solver(self.solver())
            .with_time_limit(time_limit)
            .with_integral_objective(integral_costs);
        let result = match &self.root {
            Some(root) => search.solve_from_root(&self.problem, root, Some(&warm_start)),
            None => search.solve(&self.problem, Some(&warm_start)),
        };

        if !result.has_incumbent() {
            return Err(MasterError::IntegerFailed {
                status: result.status,
            });
        }

        let selected = result
            .values
            .iter()
            .enumerate()
            .filter(|&(_, &x)| x > 0.5)
            .map(|(c, _)| c)
            .collect();
        Ok(IntegerSolution {
            objective: result.objective_value,
            selected,
            status: result.status,
            best_bound: result.best_bound,
            nodes: result.nodes,
        })
    }

    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn contains(&self, trips: &[TripId]) -> bool {
        self.known.contains(trips)
    }
}
