use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, Writer};

use crate::error::ScheduleError;
use crate::trip::TripId;

const HEADER: &str = "Duty id";

/// Dense duty index; written 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DutyId(pub usize);

impl fmt::Display for DutyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// One duty per input trip row, in row order.
///
/// Duty ids are dense and numbered by first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schedule {
    duties: Vec<DutyId>,
    count: usize,
}

impl Schedule {
    /// Renumber arbitrary per-row duty keys by first appearance
    pub fn from_assignment<K: Eq + std::hash::Hash + Clone>(assignment: &[K]) -> Self {
        let mut ids: HashMap<K, DutyId> = HashMap::new();
        let duties = assignment
            .iter()
            .map(|key| {
                let next = DutyId(ids.len());
                *ids.entry(key.clone()).or_insert(next)
            })
            .collect();
        Self {
            duties,
            count: ids.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.duties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.duties.is_empty()
    }

    pub fn duty_count(&self) -> usize {
        self.count
    }

    pub fn duty_of(&self, trip: TripId) -> DutyId {
        self.duties[trip.index()]
    }

    /// Trips of every duty in row order, indexed by [`DutyId`]
    pub fn duties(&self) -> Vec<Vec<TripId>> {
        let mut duties = vec![Vec::new(); self.count];
        for (row, duty) in self.duties.iter().enumerate() {
            duties[duty.0].push(TripId(row));
        }
        duties
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ScheduleError> {
        let mut wtr = Writer::from_writer(writer);
        wtr.write_record([HEADER])?;
        for duty in &self.duties {
            wtr.write_record([duty.to_string()])?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<(), ScheduleError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.write_csv(file)
    }

    /// Read one duty key per row; a leading `Duty id` row is skipped.
    /// `expected` is the number of trips the schedule must cover.
    pub fn read_csv<R: Read>(reader: R, expected: usize) -> Result<Self, ScheduleError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut keys = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let key = record.get(0).map(str::trim).unwrap_or("");
            if row == 0 && key == HEADER {
                continue;
            }
            if key.is_empty() {
                return Err(ScheduleError::MissingDuty { row: row + 1 });
            }
            keys.push(key.to_string());
        }

        if keys.len() != expected {
            return Err(ScheduleError::Length {
                expected,
                found: keys.len(),
            });
        }
        Ok(Self::from_assignment(&keys))
    }

    pub fn read_csv_path(path: impl AsRef<Path>, expected: usize) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ScheduleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::read_csv(file, expected)
    }
}
