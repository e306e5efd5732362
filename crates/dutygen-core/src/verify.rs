use std::fmt;

use serde::Serialize;

use crate::config::SolverConfig;
use crate::error::ScheduleError;
use crate::export::{DutyId, Schedule};
use crate::rules::RuleViolation;
use crate::trip::{Minutes, Trip, TripTable};

/// A rule broken by one duty of a schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyViolation {
    pub duty: DutyId,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    Rule(RuleViolation),
    VehicleChanges { changes: usize, allowed: usize },
}

impl fmt::Display for DutyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::Rule(rule) => write!(f, "duty {}: {}", self.duty, rule),
            ViolationKind::VehicleChanges { changes, allowed } => write!(
                f,
                "duty {}: {} vehicle changes, at most {} allowed",
                self.duty, changes, allowed
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub duty_count: usize,
    /// Sum of duty spans
    pub total_time: Minutes,
    /// Penalties for duties starting or ending away from a depot
    pub penalties: Minutes,
    #[serde(serialize_with = "serialize_violations")]
    pub violations: Vec<DutyViolation>,
}

impl VerificationReport {
    pub fn is_acceptable(&self) -> bool {
        self.violations.is_empty()
    }

    /// Secondary objective: total duty time plus penalties
    pub fn objective(&self) -> Minutes {
        self.total_time + self.penalties
    }
}

fn serialize_violations<S: serde::Serializer>(
    violations: &[DutyViolation],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(violations.iter().map(|v| v.to_string()))
}

/// Re-check every duty of `schedule` against the duty rules, independently of
/// how the schedule was produced
pub fn verify(
    trips: &TripTable,
    schedule: &Schedule,
    config: &SolverConfig,
) -> Result<VerificationReport, ScheduleError> {
    if schedule.len() != trips.len() {
        return Err(ScheduleError::Length {
            expected: trips.len(),
            found: schedule.len(),
        });
    }

    let mut report = VerificationReport {
        duty_count: schedule.duty_count(),
        total_time: 0,
        penalties: 0,
        violations: Vec::new(),
    };

    for (index, members) in schedule.duties().into_iter().enumerate() {
        let duty = DutyId(index);
        let mut sequence: Vec<&Trip> = members.iter().map(|&t| trips.get(t)).collect();
        sequence.sort_by_key(|t| (t.start, t.end, t.id));
        let (Some(first), Some(last)) = (sequence.first(), sequence.last()) else {
            continue;
        };

        report.total_time += last.end - first.start;
        if !config.is_depot(first.origin) {
            report.penalties += config.changeover_penalty;
        }
        if !config.is_depot(last.destination) {
            report.penalties += config.changeover_penalty;
        }

        report.violations.extend(
            config
                .rules
                .check_sequence(&sequence)
                .into_iter()
                .map(|rule| DutyViolation { duty, kind: ViolationKind::Rule(rule) }),
        );

        let changes = vehicle_changes(trips, &sequence);
        if changes > config.rules.max_vehicle_changes {
            report.violations.push(DutyViolation {
                duty,
                kind: ViolationKind::VehicleChanges {
                    changes,
                    allowed: config.rules.max_vehicle_changes,
                },
            });
        }
    }

    Ok(report)
}

/// Changeovers along a time-ordered duty.
///
/// Switching to another vehicle is one. Staying on a vehicle counts too when
/// the vehicle drove a trip of another duty in between, since the driver had
/// to get off and back on.
fn vehicle_changes(trips: &TripTable, sequence: &[&Trip]) -> usize {
    sequence
        .windows(2)
        .filter(|pair| pair[0].vehicle != pair[1].vehicle || trips.next_on_vehicle(pair[0].id) != Some(pair[1].id))
        .count()
}
