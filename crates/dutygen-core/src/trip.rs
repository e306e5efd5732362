use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GraphConstructionError;

/// Minutes since midnight of the service day. Values past 1440 continue overnight.
pub type Minutes = i64;

/// Terminal code of a trip end point
pub type Location = u32;

/// Dense trip index; equals the trip's input row (0-based, header excluded)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TripId(pub usize);

/// Dense vehicle index, assigned in order of first appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub usize);

impl TripId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl VehicleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trip#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ServiceTrip,
    DepotPullIn,
    DepotPullOut,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::ServiceTrip => "service_trip",
            EventKind::DepotPullIn => "depot_pull_in",
            EventKind::DepotPullOut => "depot_pull_out",
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service_trip" => Ok(EventKind::ServiceTrip),
            "depot_pull_in" => Ok(EventKind::DepotPullIn),
            "depot_pull_out" => Ok(EventKind::DepotPullOut),
            other => Err(format!("unknown event kind: {}", other)),
        }
    }
}

/// One input row before vehicle names are interned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRecord {
    pub reference: String,
    pub vehicle: String,
    pub kind: EventKind,
    pub start: Minutes,
    pub end: Minutes,
    pub origin: Location,
    pub destination: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub reference: String,
    pub vehicle: VehicleId,
    pub kind: EventKind,
    pub start: Minutes,
    pub end: Minutes,
    pub origin: Location,
    pub destination: Location,
}

impl Trip {
    pub fn duration(&self) -> Minutes {
        self.end - self.start
    }

    /// A driver finishing `self` can take over `next`: same terminal, no overlap
    pub fn can_precede(&self, next: &Trip) -> bool {
        self.destination == next.origin && self.end <= next.start
    }
}

/// All trips of a run plus the vehicle lookups derived from them.
///
/// Built once and passed by reference into every later stage.
#[derive(Debug, Clone, Default)]
pub struct TripTable {
    trips: Vec<Trip>,
    vehicle_names: Vec<String>,
    /// Trips of each vehicle in input order
    by_vehicle: Vec<Vec<TripId>>,
    /// Position of each trip inside its vehicle's list
    position: Vec<usize>,
}

impl TripTable {
    /// Intern vehicles and validate timing. Rows must be in non-decreasing start
    /// order within each vehicle.
    pub fn new(records: Vec<TripRecord>) -> Result<Self, GraphConstructionError> {
        let mut table = TripTable::default();
        let mut vehicle_ids: HashMap<String, VehicleId> = HashMap::new();

        for (row, record) in records.into_iter().enumerate() {
            if record.end < record.start {
                return Err(GraphConstructionError::EndBeforeStart {
                    row: row + 1,
                    start: record.start,
                    end: record.end,
                });
            }

            let vehicle = match vehicle_ids.get(&record.vehicle) {
                Some(&v) => v,
                None => {
                    let v = VehicleId(table.vehicle_names.len());
                    table.vehicle_names.push(record.vehicle.clone());
                    table.by_vehicle.push(Vec::new());
                    vehicle_ids.insert(record.vehicle.clone(), v);
                    v
                }
            };

            let id = TripId(table.trips.len());
            let previous = table.by_vehicle[vehicle.index()].last().copied();
            if let Some(prev) = previous {
                if table.trips[prev.index()].start > record.start {
                    return Err(GraphConstructionError::OutOfOrder {
                        row: row + 1,
                        vehicle: record.vehicle,
                    });
                }
            }

            table.position.push(table.by_vehicle[vehicle.index()].len());
            table.by_vehicle[vehicle.index()].push(id);
            table.trips.push(Trip {
                id,
                reference: record.reference,
                vehicle,
                kind: record.kind,
                start: record.start,
                end: record.end,
                origin: record.origin,
                destination: record.destination,
            });
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn get(&self, id: TripId) -> &Trip {
        &self.trips[id.index()]
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicle_names.len()
    }

    pub fn vehicle_name(&self, vehicle: VehicleId) -> &str {
        &self.vehicle_names[vehicle.index()]
    }

    pub fn vehicle_trips(&self, vehicle: VehicleId) -> &[TripId] {
        &self.by_vehicle[vehicle.index()]
    }

    /// The trip driven by the same vehicle right after `id`
    pub fn next_on_vehicle(&self, id: TripId) -> Option<TripId> {
        let trip = self.get(id);
        self.by_vehicle[trip.vehicle.index()]
            .get(self.position[id.index()] + 1)
            .copied()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// `(vehicle, start, end, origin, destination)`
    pub fn table(rows: &[(&str, Minutes, Minutes, Location, Location)]) -> TripTable {
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, &(vehicle, start, end, origin, destination))| TripRecord {
                reference: format!("r{}", i),
                vehicle: vehicle.to_string(),
                kind: EventKind::ServiceTrip,
                start,
                end,
                origin,
                destination,
            })
            .collect();
        TripTable::new(records).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::table;
    use super::*;

    #[test]
    fn test_vehicles_interned_in_order() {
        let t = table(&[("b", 0, 10, 1, 2), ("a", 5, 15, 3, 4), ("b", 10, 20, 2, 1)]);

        assert_eq!(t.vehicle_count(), 2);
        assert_eq!(t.vehicle_name(VehicleId(0)), "b");
        assert_eq!(t.vehicle_trips(VehicleId(0)), &[TripId(0), TripId(2)]);
        assert_eq!(t.next_on_vehicle(TripId(0)), Some(TripId(2)));
        assert_eq!(t.next_on_vehicle(TripId(2)), None);
        assert_eq!(t.next_on_vehicle(TripId(1)), None);
    }

    #[test]
    fn test_can_precede() {
        let t = table(&[("a", 0, 300, 1, 1), ("a", 305, 400, 2, 1), ("b", 300, 310, 1, 3)]);
        let (a, b, c) = (t.get(TripId(0)), t.get(TripId(1)), t.get(TripId(2)));

        assert!(!a.can_precede(b), "location mismatch");
        assert!(a.can_precede(c), "zero gap at same terminal");
        assert!(!c.can_precede(a));
    }

    #[test]
    fn test_out_of_order_rejected() {
        let records = vec![
            TripRecord {
                reference: "x".into(),
                vehicle: "a".into(),
                kind: EventKind::ServiceTrip,
                start: 100,
                end: 120,
                origin: 1,
                destination: 2,
            },
            TripRecord {
                reference: "y".into(),
                vehicle: "a".into(),
                kind: EventKind::ServiceTrip,
                start: 50,
                end: 60,
                origin: 2,
                destination: 1,
            },
        ];

        let err = TripTable::new(records).unwrap_err();
        assert!(matches!(err, GraphConstructionError::OutOfOrder { row: 2, .. }));
    }

    #[test]
    fn test_event_kind_parse() {
        assert_eq!("depot_pull_out".parse::<EventKind>(), Ok(EventKind::DepotPullOut));
        assert!("lunch".parse::<EventKind>().is_err());
    }
}
