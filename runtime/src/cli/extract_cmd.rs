//! `handbook extract`: re-run constraint extraction over saved records.

use std::path::Path;

use anyhow::{Context, Result};
use handbook_requisites::{extract_constraints, SubjectRecord};
use tracing::info;

use crate::cli::output::{self, Styled};
use crate::sink;

/// Run the extract command. Writes back to `input` unless `out` is given.
pub async fn run(input: &Path, out: Option<&Path>) -> Result<()> {
    let mut records = sink::read_records(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let changed = reextract(&mut records);
    let dest = out.unwrap_or(input);
    sink::write_records(dest, &records)
        .with_context(|| format!("failed to write {}", dest.display()))?;

    info!(records = records.len(), changed, "re-extracted constraints");

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "records": records.len(),
            "changed": changed,
            "output": dest.display().to_string(),
        }));
    } else if !output::is_quiet() {
        eprintln!(
            "  {} Re-extracted {} records ({} changed) into {}",
            Styled::new().ok_sym(),
            records.len(),
            changed,
            dest.display()
        );
    }
    Ok(())
}

/// Replace every record's constraints with a fresh extraction from its stored
/// sections. Returns how many records changed.
pub fn reextract(records: &mut [SubjectRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        let constraints = extract_constraints(&record.code, &record.sections);
        if constraints != record.constraints {
            changed += 1;
            record.constraints = constraints;
        }
    }
    changed
}
