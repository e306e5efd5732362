use std::path::PathBuf;

use dutygen_solver::{MipStatus, SolutionStatus};
use thiserror::Error;

use crate::graph::TripNode;
use crate::trip::{Minutes, TripId};

/// Raised before optimization starts; nothing is processed past it.
#[derive(Error, Debug)]
pub enum GraphConstructionError {
    #[error("row {row}: expected 9 fields, found {found}")]
    Arity { row: usize, found: usize },
    #[error("row {row}: cannot parse {field} time '{value}'")]
    Time {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("row {row}: unknown event kind '{value}'")]
    EventKind { row: usize, value: String },
    #[error("row {row}: cannot parse {field} location '{value}'")]
    Location {
        row: usize,
        field: &'static str,
        value: String,
    },
    #[error("row {row}: trip ends at {end} before it starts at {start}")]
    EndBeforeStart { row: usize, start: Minutes, end: Minutes },
    #[error("row {row}: trips of vehicle {vehicle} are not in start time order")]
    OutOfOrder { row: usize, vehicle: String },
    #[error("{trip} lasts {duration} minutes, longer than the {max_span} minute duty span")]
    TripTooLong {
        trip: TripId,
        duration: Minutes,
        max_span: Minutes,
    },
    #[error("transfer {from:?} -> {to:?} runs backwards in time order")]
    BackwardEdge { from: TripNode, to: TripNode },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("{0:?} has no continuation to the sink")]
    MissingSinkEdge(TripNode),
    #[error("priced duty covers {0} more than once")]
    RepeatedTrip(TripId),
    #[error("expected {expected} dual prices, got {found}")]
    DualLength { expected: usize, found: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MasterError {
    #[error("master problem not solved to optimality: {status:?}")]
    FatalModelInfeasible { status: SolutionStatus },
    #[error("integer master problem has no solution: {status:?}")]
    IntegerFailed { status: MipStatus },
    #[error("column references {trip}, but the model has {rows} trips")]
    UnknownTrip { trip: TripId, rows: usize },
    #[error("column covers no trip")]
    EmptyColumn,
}

#[derive(Error, Debug)]
pub enum ColumnGenerationError {
    #[error(transparent)]
    Graph(#[from] GraphConstructionError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Master(#[from] MasterError),
    #[error("no selected duty covers {0}")]
    UncoveredTrip(TripId),
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schedule has {found} rows but there are {expected} trips")]
    Length { expected: usize, found: usize },
    #[error("row {row}: missing duty id")]
    MissingDuty { row: usize },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
