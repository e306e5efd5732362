mod colgen;
mod config;
mod error;
mod export;
mod graph;
mod ingest;
mod master;
mod pricing;
mod rules;
mod trip;
mod verify;

pub use colgen::{
    solve, ColumnGeneration, DuplicateCoverage, GenerationOutcome, Phase, Resource, ResourceExhausted,
    StopReason,
};
pub use config::SolverConfig;
pub use error::{
    ColumnGenerationError, ConfigError, GraphConstructionError, MasterError, PricingError, ScheduleError,
};
pub use export::{DutyId, Schedule};
pub use graph::{DriverMode, GraphBuilder, GraphStats, Node, NodeId, TransferGraph, TripNode};
pub use ingest::{parse_clock, read_trips, read_trips_path};
pub use master::{Column, IntegerSolution, MasterSolver, RelaxedSolution, SimplexMaster};
pub use pricing::{Label, LabelTable, PricedDuty, PricingSolver};
pub use rules::{DutyRules, RuleViolation};
pub use trip::{EventKind, Location, Minutes, Trip, TripId, TripRecord, TripTable, VehicleId};
pub use verify::{verify, DutyViolation, VerificationReport, ViolationKind};
