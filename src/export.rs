//! CSV export of stored applications.

use std::io::Write;

use chrono::NaiveDate;

use crate::application::{Application, Field};
use crate::error::Result;

const HEADERS: [&str; 9] = [
    "Name",
    "Email",
    "University",
    "Year",
    "Position",
    "Skills",
    "Experience",
    "Motivation",
    "Submitted At",
];

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Writes `applications` as CSV: one header row, then one row per
/// application. Every field is quoted; embedded quotes are doubled.
///
/// # Errors
///
/// Returns [`RecruitError::Io`](crate::RecruitError::Io) if writing fails.
pub fn export_csv<W: Write>(applications: &[Application], mut writer: W) -> Result<()> {
    let header: Vec<String> = HEADERS.iter().map(|h| quote(h)).collect();
    writeln!(writer, "{}", header.join(","))?;

    for application in applications {
        let mut row: Vec<String> = Field::ALL
            .iter()
            .map(|f| quote(application.record.get(*f)))
            .collect();
        row.push(quote(&application.created_at.to_rfc3339()));
        writeln!(writer, "{}", row.join(","))?;
    }

    writer.flush()?;
    Ok(())
}

/// Default export file name for `date`: `applications-YYYY-MM-DD.csv`.
pub fn default_export_file_name(date: NaiveDate) -> String {
    format!("applications-{}.csv", date.format("%Y-%m-%d"))
}
