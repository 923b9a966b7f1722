//! Writers for the collected records
//!
//! The sweep hands over a flat list of opaque records plus the root region's
//! match count. This module renders them as a JSON document and a CSV table
//! and checks the count.

pub mod csv;
pub mod json;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::SweepError;
use crate::models::PoiRecord;

pub use self::csv::{StationRow, write_csv};
pub use self::json::write_json;

/// Which files to write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    #[default]
    Both,
}

impl OutputFormat {
    fn writes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    fn writes_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }
}

/// Whether the collected records match the root region's count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completeness {
    Complete { count: u64 },
    Short { collected: u64, expected: u64 },
    Excess { collected: u64, expected: u64 },
    /// The root query failed, so there is nothing to compare against
    Unknown { collected: u64 },
}

/// Compare the number of records with the root total and log the outcome
pub fn verify_completeness(records: &[PoiRecord], root_total: Option<u64>) -> Completeness {
    let collected = records.len() as u64;
    let completeness = match root_total {
        None => Completeness::Unknown { collected },
        Some(expected) if collected == expected => Completeness::Complete { count: collected },
        Some(expected) if collected < expected => Completeness::Short {
            collected,
            expected,
        },
        Some(expected) => Completeness::Excess {
            collected,
            expected,
        },
    };

    match completeness {
        Completeness::Complete { count } => info!("All {count} records collected"),
        Completeness::Short {
            collected,
            expected,
        } => warn!(
            "Collected {collected} of {expected} records, {} missing",
            expected - collected
        ),
        Completeness::Excess {
            collected,
            expected,
        } => warn!("Collected {collected} records but the API reported {expected}"),
        Completeness::Unknown { collected } => {
            warn!("Collected {collected} records; root total unknown")
        }
    }

    completeness
}

/// `basename` with `.{extension}` appended, keeping any dots already in it
fn output_path(basename: &Path, extension: &str) -> PathBuf {
    let mut name = basename.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Write the records next to `basename` in the requested formats.
///
/// Missing parent directories are created. Returns the written paths.
pub fn write_outputs(
    records: &[PoiRecord],
    basename: &Path,
    format: OutputFormat,
) -> crate::Result<Vec<PathBuf>> {
    if basename.file_name().is_none() {
        return Err(SweepError::output(format!(
            "output basename {} does not name a file",
            basename.display()
        )));
    }

    if let Some(parent) = basename.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut written = Vec::new();

    if format.writes_json() {
        let path = output_path(basename, "json");
        write_json(records, &path)?;
        info!("JSON output created: {}", path.display());
        written.push(path);
    }

    if format.writes_csv() {
        let path = output_path(basename, "csv");
        let rows = write_csv(records, &path)?;
        info!("CSV output created: {} ({rows} rows)", path.display());
        written.push(path);
    }

    Ok(written)
}
