//! Reading and writing the serialized subject collection.

use std::fs;
use std::path::Path;

use handbook_requisites::SubjectRecord;
use tracing::debug;

use crate::acquisition::HarvestResult;

/// Write `records` as a pretty-printed JSON array. The file is written next
/// to its destination and renamed into place.
pub fn write_records(path: &Path, records: &[SubjectRecord]) -> HarvestResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), records = records.len(), "wrote subject records");
    Ok(())
}

pub fn read_records(path: &Path) -> HarvestResult<Vec<SubjectRecord>> {
    let content = fs::read_to_string(path)?;
    let records: Vec<SubjectRecord> = serde_json::from_str(&content)?;
    debug!(path = %path.display(), records = records.len(), "read subject records");
    Ok(records)
}
