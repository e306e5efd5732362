use dutygen_solver::MipStatus;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::SolverConfig;
use crate::error::ColumnGenerationError;
use crate::graph::{GraphBuilder, TransferGraph};
use crate::master::{Column, MasterSolver, SimplexMaster};
use crate::pricing::{LabelTable, PricingSolver};
use crate::trip::{TripId, TripTable};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pricing,
    MasterLp,
    Converged,
    MasterIp,
    Done,
    Aborted,
}

/// Why the pricing loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No duty prices above one
    Converged,
    /// The best duty is already a column; its price exceeded one only by round-off
    Stagnated,
    /// The iteration cap was hit first
    IterationCap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Iterations,
    IntegerTimeLimit,
}

/// A budget ran out before the run finished on its own. The output is still a
/// feasible schedule; `objective` against `lp_bound` tells how far from optimal it may be.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceExhausted {
    pub resource: Resource,
    pub objective: f64,
    /// The relaxation objective, or its Farley estimate when the iteration cap
    /// stopped pricing. The estimate divides by the best price the pricing
    /// heuristic found, which can fall short of the true maximum, so it is not
    /// a proven lower bound and may sit above the true one.
    pub lp_bound: f64,
}

/// More than one selected duty covers `trip`; the first one keeps it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateCoverage {
    pub trip: TripId,
    pub chosen: usize,
    pub ignored: Vec<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    /// Selected duties, each as its sorted trips
    pub duties: Vec<Vec<TripId>>,
    /// Index into `duties` for every trip row
    pub assignment: Vec<usize>,
    /// Integer objective: the number of duties
    pub objective: f64,
    /// Relaxation objective once converged; an estimate when capped, see
    /// [`ResourceExhausted::lp_bound`]
    pub lp_bound: f64,
    /// Relaxation objective after each master solve
    pub lp_history: Vec<f64>,
    pub iterations: usize,
    pub columns_added: usize,
    pub stop: StopReason,
    pub integer_status: MipStatus,
    pub exhausted: Vec<ResourceExhausted>,
    pub duplicates: Vec<DuplicateCoverage>,
}

impl GenerationOutcome {
    fn empty() -> Self {
        Self {
            duties: Vec::new(),
            assignment: Vec::new(),
            objective: 0.0,
            lp_bound: 0.0,
            lp_history: Vec::new(),
            iterations: 0,
            columns_added: 0,
            stop: StopReason::Converged,
            integer_status: MipStatus::Optimal,
            exhausted: Vec::new(),
            duplicates: Vec::new(),
        }
    }

    /// Relative distance of the integer objective from the LP bound
    pub fn gap(&self) -> f64 {
        if self.objective.abs() < f64::EPSILON {
            0.0
        } else {
            ((self.objective - self.lp_bound) / self.objective).max(0.0)
        }
    }
}

/// Build the transfer graph and run column generation with a simplex master
pub fn solve(trips: &TripTable, config: &SolverConfig) -> Result<GenerationOutcome, ColumnGenerationError> {
    let graph = GraphBuilder::new(config.mode, config.rules).build(trips)?;
    ColumnGeneration::new(trips, &graph, config, SimplexMaster::default()).run()
}

/// Drives the price, add column, resolve loop and the final integer solve
pub struct ColumnGeneration<'a, M: MasterSolver> {
    trips: &'a TripTable,
    graph: &'a TransferGraph,
    config: &'a SolverConfig,
    pricing: PricingSolver,
    master: M,
    labels: LabelTable,
    phase: Phase,
}

impl<'a, M: MasterSolver> ColumnGeneration<'a, M> {
    pub fn new(trips: &'a TripTable, graph: &'a TransferGraph, config: &'a SolverConfig, master: M) -> Self {
        Self {
            trips,
            graph,
            config,
            pricing: PricingSolver::new(config.rules),
            master,
            labels: LabelTable::new(graph),
            phase: Phase::Pricing,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn master(&self) -> &M {
        &self.master
    }

    pub fn run(&mut self) -> Result<GenerationOutcome, ColumnGenerationError> {
        match self.generate() {
            Ok(outcome) => {
                self.phase = Phase::Done;
                Ok(outcome)
            }
            Err(e) => {
                self.phase = Phase::Aborted;
                error!(error = %e, "column generation aborted");
                Err(e)
            }
        }
    }

    fn generate(&mut self) -> Result<GenerationOutcome, ColumnGenerationError> {
        let trip_count = self.trips.len();
        if trip_count == 0 {
            info!("no trips to schedule");
            return Ok(GenerationOutcome::empty());
        }

        let threshold = 1.0 + self.config.convergence_epsilon;
        self.master.initialize(trip_count);
        self.phase = Phase::MasterLp;
        let mut relaxed = self.master.solve_relaxed()?;
        let mut lp_history = vec![relaxed.objective];
        let mut iterations = 0;
        let mut columns_added = 0;

        info!(trips = trip_count, objective = relaxed.objective, "column generation started");

        let stop = loop {
            self.phase = Phase::Pricing;
            if iterations >= self.config.max_iterations {
                break StopReason::IterationCap;
            }
            iterations += 1;

            let priced = self
                .pricing
                .price(self.graph, self.trips, &relaxed.duals, &mut self.labels)?;
            let Some(duty) = priced.filter(|d| d.price > threshold) else {
                break StopReason::Converged;
            };

            let mut trips = duty.trips();
            trips.sort();
            if self.master.contains(&trips) {
                debug!(iteration = iterations, price = duty.price, "priced duty is already a column");
                break StopReason::Stagnated;
            }

            self.master.add_column(&trips, 1.0)?;
            columns_added += 1;

            self.phase = Phase::MasterLp;
            relaxed = self.master.solve_relaxed()?;
            lp_history.push(relaxed.objective);
            debug!(
                iteration = iterations,
                price = duty.price,
                reduced_cost = duty.reduced_cost(),
                objective = relaxed.objective,
                columns = self.master.columns().len(),
                "column added"
            );
        };

        let lp_bound = match stop {
            StopReason::IterationCap => self.farley_bound(relaxed.objective, &relaxed.duals)?,
            StopReason::Converged | StopReason::Stagnated => relaxed.objective,
        };
        self.phase = Phase::Converged;
        info!(
            iterations,
            columns = self.master.columns().len(),
            objective = relaxed.objective,
            stop = ?stop,
            "relaxation finished"
        );

        self.phase = Phase::MasterIp;
        let integer = self.master.solve_integer(self.config.integer_time_limit())?;

        let mut exhausted = Vec::new();
        if stop == StopReason::IterationCap {
            warn!(
                iterations,
                objective = integer.objective,
                lp_bound,
                "iteration cap reached before convergence"
            );
            exhausted.push(ResourceExhausted {
                resource: Resource::Iterations,
                objective: integer.objective,
                lp_bound,
            });
        }
        if integer.status != MipStatus::Optimal {
            warn!(
                status = ?integer.status,
                objective = integer.objective,
                lp_bound,
                "integer solve stopped before proving optimality"
            );
            exhausted.push(ResourceExhausted {
                resource: Resource::IntegerTimeLimit,
                objective: integer.objective,
                lp_bound,
            });
        }

        let (duties, assignment, duplicates) =
            assign_trips(trip_count, self.master.columns(), &integer.selected)?;
        for dup in &duplicates {
            warn!(
                trip = %dup.trip,
                chosen = dup.chosen,
                ignored = ?dup.ignored,
                "trip covered by more than one duty"
            );
        }

        info!(
            duties = duties.len(),
            objective = integer.objective,
            lp_bound,
            nodes = integer.nodes,
            "schedule extracted"
        );
        Ok(GenerationOutcome {
            duties,
            assignment,
            objective: integer.objective,
            lp_bound,
            lp_history,
            iterations,
            columns_added,
            stop,
            integer_status: integer.status,
            exhausted,
            duplicates,
        })
    }

    /// Farley estimate for an unconverged relaxation: the LP objective divided
    /// by the best duty price under its duals. The price comes from the
    /// single-label DP, which can miss the most attractive duty, so the result
    /// is not guaranteed to lie below the true LP optimum.
    fn farley_bound(&mut self, objective: f64, duals: &[f64]) -> Result<f64, ColumnGenerationError> {
        let priced = self
            .pricing
            .price(self.graph, self.trips, duals, &mut self.labels)?;
        Ok(match priced {
            Some(duty) if duty.price > 1.0 => objective / duty.price,
            _ => objective,
        })
    }
}

type Assignment = (Vec<Vec<TripId>>, Vec<usize>, Vec<DuplicateCoverage>);

/// Map every trip to the first selected column covering it
fn assign_trips(
    trip_count: usize,
    columns: &[Column],
    selected: &[usize],
) -> Result<Assignment, ColumnGenerationError> {
    let mut duties = Vec::with_capacity(selected.len());
    let mut owners: Vec<Vec<usize>> = vec![Vec::new(); trip_count];
    for &c in selected {
        let duty = duties.len();
        for t in &columns[c].trips {
            owners[t.index()].push(duty);
        }
        duties.push(columns[c].trips.clone());
    }

    let mut assignment = Vec::with_capacity(trip_count);
    let mut duplicates = Vec::new();
    for (t, owner) in owners.into_iter().enumerate() {
        let Some((&chosen, rest)) = owner.split_first() else {
            return Err(ColumnGenerationError::UncoveredTrip(TripId(t)));
        };
        if !rest.is_empty() {
            duplicates.push(DuplicateCoverage {
                trip: TripId(t),
                chosen,
                ignored: rest.to_vec(),
            });
        }
        assignment.push(chosen);
    }
    Ok((duties, assignment, duplicates))
}
