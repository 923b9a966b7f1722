use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::models::PoiRecord;

#[derive(Serialize)]
struct ResultsDocument<'a> {
    results: &'a [PoiRecord],
}

/// Write `{"results": [...]}`, pretty-printed
pub fn write_json(records: &[PoiRecord], path: &Path) -> crate::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &ResultsDocument { results: records })?;
    writer.flush()?;
    Ok(())
}
