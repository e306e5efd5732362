use std::fmt;

use serde::{Deserialize, Serialize};

use crate::trip::{Minutes, Trip, TripId};

/// Legality limits of a single duty.
///
/// A gap of at least `min_break` between consecutive trips is a break. The
/// trips between two breaks form a driving block. Every block after the first
/// break must fit in `max_continuous_driving`, measured from the start of its
/// first trip to the end of each of its trips. The opening block is bounded
/// only by `max_span`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutyRules {
    /// Longest duty, first trip start to last trip end
    pub max_span: Minutes,
    /// Shortest idle gap that counts as a break
    pub min_break: Minutes,
    /// Longest driving block after a break
    pub max_continuous_driving: Minutes,
    /// Vehicle changes allowed within one duty
    pub max_vehicle_changes: usize,
}

impl Default for DutyRules {
    fn default() -> Self {
        Self {
            max_span: 9 * 60,
            min_break: 30,
            max_continuous_driving: 4 * 60,
            max_vehicle_changes: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// Consecutive trips do not meet at the same terminal
    LocationMismatch { from: TripId, to: TripId },
    /// A trip starts before the previous one ends
    Overlap { from: TripId, to: TripId },
    SpanExceeded { span: Minutes },
    /// Driving since the last break exceeded the limit at the end of `trip`
    ContinuousDriving { trip: TripId, driving: Minutes },
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleViolation::LocationMismatch { from, to } => {
                write!(f, "{} does not end where {} starts", from, to)
            }
            RuleViolation::Overlap { from, to } => {
                write!(f, "{} starts before {} ends", to, from)
            }
            RuleViolation::SpanExceeded { span } => write!(f, "duty spans {} minutes", span),
            RuleViolation::ContinuousDriving { trip, driving } => {
                write!(f, "{} minutes without a break at the end of {}", driving, trip)
            }
        }
    }
}

impl DutyRules {
    pub fn is_break(&self, gap: Minutes) -> bool {
        gap >= self.min_break
    }

    /// Check a duty whose trips are given in driving order
    pub fn check_sequence(&self, trips: &[&Trip]) -> Vec<RuleViolation> {
        let mut violations = Vec::new();
        let (Some(first), Some(last)) = (trips.first(), trips.last()) else {
            return violations;
        };

        let span = last.end - first.start;
        if span > self.max_span {
            violations.push(RuleViolation::SpanExceeded { span });
        }

        // Start of the current block once a break has been taken
        let mut block_start: Option<Minutes> = None;
        for pair in trips.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if prev.destination != next.origin {
                violations.push(RuleViolation::LocationMismatch { from: prev.id, to: next.id });
            }
            if next.start < prev.end {
                violations.push(RuleViolation::Overlap { from: prev.id, to: next.id });
            }
            if self.is_break(next.start - prev.end) {
                block_start = Some(next.start);
            }
            if let Some(start) = block_start {
                let driving = next.end - start;
                if driving > self.max_continuous_driving {
                    violations.push(RuleViolation::ContinuousDriving { trip: next.id, driving });
                }
            }
        }

        violations
    }
}
