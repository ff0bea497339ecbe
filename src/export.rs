//! CSV export with a widening column set.
//!
//! The register gives each firm a different number of activity entries, so
//! the sheet's columns are the union across all collected records: `Company`,
//! `Conditions` (present when any row succeeded), then numbered
//! `Regulated Activity i` / `Effective Date i` / `Withdrawn Date i` triplets
//! up to the widest row. Cells a record does not fill stay empty.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::Writer;
use tracing::info;

use crate::record::CompanyRecord;

pub fn write_csv(records: &[CompanyRecord], path: &Path) -> Result<()> {
    let max_activities = records
        .iter()
        .map(CompanyRecord::activity_count)
        .max()
        .unwrap_or(0);
    let any_success = records.iter().any(|r| !r.is_failure());

    let mut writer = Writer::from_path(path)
        .with_context(|| format!("failed to create output file: {}", path.display()))?;

    let mut header = vec!["Company".to_string()];
    if any_success {
        header.push("Conditions".to_string());
        for i in 1..=max_activities {
            header.push(format!("Regulated Activity {i}"));
            header.push(format!("Effective Date {i}"));
            header.push(format!("Withdrawn Date {i}"));
        }
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![record.name().to_string()];
        match record {
            CompanyRecord::Success {
                conditions,
                activities,
                ..
            } => {
                row.push(conditions.clone());
                for i in 0..max_activities {
                    match activities.get(i) {
                        Some(a) => {
                            row.push(a.activity.clone());
                            row.push(a.effective_date.clone().unwrap_or_default());
                            row.push(a.withdrawn_date.clone().unwrap_or_default());
                        }
                        None => row.extend(std::iter::repeat(String::new()).take(3)),
                    }
                }
            }
            CompanyRecord::Failure { .. } => {
                row.extend(std::iter::repeat(String::new()).take(header.len() - 1));
            }
        }
        writer.write_record(&row)?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write output file: {}", path.display()))?;
    info!("wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Partial-artifact path: same directory, `partial_` prefix on the file name.
pub fn partial_path(output: &Path) -> PathBuf {
    let file_name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("partial_{file_name}"))
}
