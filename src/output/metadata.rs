//! Code for writing metadata to file
use crate::optimisation::Solution;
use anyhow::Result;
use chrono::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<ResultsMetadata>,
}

/// Information about the model run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the model which was run
    model_path: &'a Path,
    /// The date and time on which the run started
    datetime: String,
}

impl<'a> RunMetadata<'a> {
    fn new(model_path: &'a Path) -> Self {
        let dt = Local::now();
        Self {
            model_path,
            datetime: dt.to_rfc2822(),
        }
    }
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            is_debug: cfg!(debug_assertions),
        }
    }
}

/// Headline figures from the optimisation
#[derive(Serialize)]
struct ResultsMetadata {
    /// Total annualised system cost
    objective: f64,
    /// Total emissions in tonnes of CO2
    emissions: f64,
}

impl From<&Solution> for ResultsMetadata {
    fn from(solution: &Solution) -> Self {
        Self {
            objective: solution.objective.value(),
            emissions: solution.emissions.value(),
        }
    }
}

/// Write metadata to the specified output path in TOML format.
///
/// Headline results are included if the model was solved.
pub fn write_metadata(
    output_path: &Path,
    model_path: &Path,
    solution: Option<&Solution>,
) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata::new(model_path),
        program: ProgramMetadata::default(),
        results: solution.map(ResultsMetadata::from),
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_metadata() {
        let dir = tempdir().unwrap();
        write_metadata(dir.path(), Path::new("demos/simple"), None).unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        let value: toml::Table = toml::from_str(&contents).unwrap();
        assert_eq!(value["program"]["name"].as_str(), Some("powerplan"));
        assert_eq!(value["run"]["model_path"].as_str(), Some("demos/simple"));
        assert!(!value.contains_key("results"));
    }
}
