//! Charging station table
//!
//! One row per station with the columns
//! `id,name,entry_lat,entry_lon,lat,lon,kws,types,currentTypes`. Connector
//! columns hold `|`-separated lists. Fields containing commas, quotes or line
//! breaks are quoted RFC 4180 style, so readers that split lines on bare
//! commas will misread such rows.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::models::PoiRecord;

pub const HEADER: &str = "id,name,entry_lat,entry_lon,lat,lon,kws,types,currentTypes";

/// Flattened view of one charging station record
#[derive(Debug, Clone, PartialEq)]
pub struct StationRow {
    pub id: String,
    pub name: String,
    pub entry_lat: String,
    pub entry_lon: String,
    pub lat: String,
    pub lon: String,
    pub kws: Vec<String>,
    pub types: Vec<String>,
    pub current_types: Vec<String>,
}

impl StationRow {
    /// Flatten a record. Records without an id or a position yield `None`.
    pub fn from_record(record: &PoiRecord) -> Option<Self> {
        let json = record.as_json();

        let id = scalar_text(json.get("id")?)?;
        let name = json
            .pointer("/poi/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let (lat, lon) = position(json.get("position")?)?;

        let (entry_lat, entry_lon) = match main_entry_point(json) {
            Some(entry) => entry,
            None => {
                warn!("Error with entry points of: {name}, using station position");
                (lat.clone(), lon.clone())
            }
        };

        let mut row = StationRow {
            id,
            name,
            entry_lat,
            entry_lon,
            lat,
            lon,
            kws: Vec::new(),
            types: Vec::new(),
            current_types: Vec::new(),
        };

        let connectors = json
            .pointer("/chargingPark/connectors")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for connector in connectors {
            let power = connector.get("ratedPowerKW").and_then(scalar_text);
            let kind = connector.get("connectorType").and_then(scalar_text);
            let current = connector.get("currentType").and_then(scalar_text);
            if let (Some(power), Some(kind), Some(current)) = (power, kind, current) {
                row.kws.push(power);
                row.types.push(kind);
                row.current_types.push(current);
            }
        }

        Some(row)
    }

    /// Render as one CSV line without the trailing newline
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        [
            escape(&self.id),
            escape(&self.name),
            escape(&self.entry_lat),
            escape(&self.entry_lon),
            escape(&self.lat),
            escape(&self.lon),
            escape(&self.kws.join("|")),
            escape(&self.types.join("|")),
            escape(&self.current_types.join("|")),
        ]
        .join(",")
    }
}

/// Write the station table. Returns the number of data rows written.
pub fn write_csv(records: &[PoiRecord], path: &Path) -> crate::Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{HEADER}")?;

    let mut rows = 0;
    for record in records {
        match StationRow::from_record(record) {
            Some(row) => {
                writeln!(writer, "{}", row.to_csv_line())?;
                rows += 1;
            }
            None => warn!(
                "Skipping record without id or position: {}",
                record.id().unwrap_or("<no id>")
            ),
        }
    }

    writer.flush()?;
    Ok(rows)
}

fn main_entry_point(json: &Value) -> Option<(String, String)> {
    json.get("entryPoints")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some("main"))
        .and_then(|entry| position(entry.get("position")?))
}

fn position(value: &Value) -> Option<(String, String)> {
    let lat = value.get("lat").filter(|v| v.is_number())?;
    let lon = value.get("lon").filter(|v| v.is_number())?;
    Some((lat.to_string(), lon.to_string()))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
