use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::GraphConstructionError;
use crate::trip::{EventKind, Location, Minutes, TripRecord, TripTable};

const FIELDS: usize = 9;

/// Parse `H:MM` or `H:MM:SS` into minutes. Hours past 23 continue into the
/// next day; seconds are dropped.
pub fn parse_clock(value: &str) -> Option<Minutes> {
    let mut parts = value.trim().split(':');
    let hours: Minutes = parts.next()?.parse().ok()?;
    let minutes: Minutes = parts.next()?.parse().ok()?;
    if let Some(seconds) = parts.next() {
        let seconds: Minutes = seconds.parse().ok()?;
        if !(0..60).contains(&seconds) {
            return None;
        }
    }
    if parts.next().is_some() || hours < 0 || !(0..60).contains(&minutes) {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Read the trip CSV: a header row, then nine fields per trip
/// (reference, vehicle, event kind, start, end, start location, start label,
/// end location, end label)
pub fn read_trips<R: Read>(reader: R) -> Result<TripTable, GraphConstructionError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        records.push(parse_record(index + 1, &record?)?);
    }
    debug!(rows = records.len(), "trip rows read");
    TripTable::new(records)
}

pub fn read_trips_path(path: impl AsRef<Path>) -> Result<TripTable, GraphConstructionError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| GraphConstructionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_trips(file)
}

fn parse_record(row: usize, record: &StringRecord) -> Result<TripRecord, GraphConstructionError> {
    if record.len() != FIELDS {
        return Err(GraphConstructionError::Arity {
            row,
            found: record.len(),
        });
    }

    let time = |index: usize, field: &'static str| {
        parse_clock(&record[index]).ok_or_else(|| GraphConstructionError::Time {
            row,
            field,
            value: record[index].to_string(),
        })
    };
    let location = |index: usize, field: &'static str| {
        record[index]
            .parse::<Location>()
            .map_err(|_| GraphConstructionError::Location {
                row,
                field,
                value: record[index].to_string(),
            })
    };

    let kind = record[2]
        .parse::<EventKind>()
        .map_err(|_| GraphConstructionError::EventKind {
            row,
            value: record[2].to_string(),
        })?;

    Ok(TripRecord {
        reference: record[0].to_string(),
        vehicle: record[1].to_string(),
        kind,
        start: time(3, "start")?,
        end: time(4, "end")?,
        origin: location(5, "start")?,
        destination: location(7, "end")?,
    })
}
