//! Code for reading time series CSV files.
use super::input_err_msg;
use crate::error::PipelineError;
use crate::time_series::{ProfileKind, TimeSeriesProfile, TimeSeriesSet};
use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use log::debug;
use std::path::Path;

/// Time stamp formats accepted in the first column
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a time stamp in one of the [`TIMESTAMP_FORMATS`]
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .with_context(|| format!("Invalid time stamp: {s}"))
}

/// Read profiles from a CSV file.
///
/// The first column holds time stamps and each further column is a named series. Only the columns
/// named in `kinds` are read; others are ignored.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
/// * `kinds` - The columns to read and the kind of profile each contains
pub fn read_time_series(
    file_path: &Path,
    kinds: &IndexMap<String, ProfileKind>,
) -> Result<TimeSeriesSet> {
    read_time_series_internal(file_path, kinds).with_context(|| input_err_msg(file_path))
}

fn read_time_series_internal(
    file_path: &Path,
    kinds: &IndexMap<String, ProfileKind>,
) -> Result<TimeSeriesSet> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;
    let headers = reader.headers()?.clone();
    ensure!(headers.len() > 1, "Time series file must have at least two columns");

    // Map each wanted column to its position in the file
    let mut columns = Vec::with_capacity(kinds.len());
    for (name, kind) in kinds {
        let Some(position) = headers.iter().position(|header| header == name.as_str()) else {
            bail!(PipelineError::missing("time series column", name.clone()));
        };
        ensure!(position > 0, "Column {name} holds time stamps");
        columns.push((position, name, *kind));
    }
    for header in headers.iter().skip(1) {
        if !kinds.contains_key(header) {
            debug!("Ignoring unused time series column {header}");
        }
    }

    let mut index = Vec::new();
    let mut values = vec![Vec::new(); columns.len()];
    for record in reader.records() {
        let record = record?;
        index.push(parse_timestamp(&record[0])?);
        for ((position, name, _), column) in columns.iter().zip(values.iter_mut()) {
            let raw = &record[*position];
            let value = raw
                .parse::<f64>()
                .with_context(|| format!("Invalid value in column {name}: {raw}"))?;
            column.push(value);
        }
    }
    ensure!(!index.is_empty(), "Time series file cannot be empty");

    let profiles = columns
        .into_iter()
        .zip(values)
        .map(|((_, name, kind), values)| {
            TimeSeriesProfile::new(name, kind, index.clone(), values)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TimeSeriesSet::from_profiles(profiles)?)
}
