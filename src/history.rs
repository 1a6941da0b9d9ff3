//! Summaries over completed rounds for the history screen and CSV export.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use itertools::Itertools;
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::error::Result;
use crate::session::SessionRecord;

/// Total beads counted per dhikr, largest first
pub fn totals_by_dhikr(records: &[SessionRecord]) -> Vec<(String, u64)> {
    records
        .iter()
        .map(|r| (r.dhikr.as_str(), r.count as u64))
        .into_grouping_map()
        .sum()
        .into_iter()
        .map(|(dhikr, total)| (dhikr.to_string(), total))
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}

/// Number of rounds completed per local calendar day, oldest first
pub fn rounds_per_day(records: &[SessionRecord]) -> Vec<(NaiveDate, usize)> {
    records
        .iter()
        .map(|r| r.completed_at.date_naive())
        .counts()
        .into_iter()
        .sorted()
        .collect()
}

/// "3 minutes ago" style label. Future timestamps from clock skew read as "now".
pub fn ago(completed_at: DateTime<Local>, now: DateTime<Local>) -> String {
    let elapsed = (now - completed_at).to_std().unwrap_or_default();
    HumanTime::from(elapsed).to_text_en(Accuracy::Rough, Tense::Past)
}

/// Write records as CSV, newest first as stored
pub fn export_csv<W: Write>(records: &[SessionRecord], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(["id", "dhikr", "count", "target", "completed_at"])?;
    for r in records {
        wtr.write_record([
            r.id.as_str(),
            r.dhikr.as_str(),
            &r.count.to_string(),
            &r.target.to_string(),
            &r.completed_at.to_rfc3339(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv_file<P: AsRef<Path>>(records: &[SessionRecord], path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    export_csv(records, File::create(path)?)
}
