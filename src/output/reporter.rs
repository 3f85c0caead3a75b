use super::*;
use crate::stats::{UserStats, FLATTENED_HEADER};
use anyhow::{Context, Result};
use std::fs;
use tracing::info;

pub struct Reporter {
    format: OutputFormat,
    output_path: String,
    include_no_activities: bool,
}

impl Reporter {
    /// `output_path` is written as given, see [`add_file_extension`] for
    /// building one from a stem.
    pub fn new(format: OutputFormat, output_path: &str, include_no_activities: bool) -> Self {
        Self {
            format,
            output_path: output_path.to_string(),
            include_no_activities,
        }
    }

    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// Users that belong in the report, in report order.
    pub fn select<'a>(&self, users: &'a [UserStats]) -> Vec<&'a UserStats> {
        let mut selected: Vec<_> = users
            .iter()
            .filter(|user| user.needs_output(self.include_no_activities))
            .collect();
        selected.sort_by(|a, b| a.cmp_report(b));
        selected
    }

    pub fn render(&self, users: &[UserStats]) -> Result<String> {
        let selected = self.select(users);
        match self.format {
            OutputFormat::Csv => render_csv(&selected),
            OutputFormat::Json => render_json(&selected),
        }
    }

    /// Renders the whole report before touching the file, so a failed run
    /// never leaves a partial report behind. Returns the number of users
    /// written.
    pub fn write_report(&self, users: &[UserStats]) -> Result<usize> {
        let content = self.render(users)?;
        fs::write(&self.output_path, content)
            .with_context(|| format!("Failed to write report to {}", self.output_path))?;

        let written = self.select(users).len();
        info!("Stats of {} users written to {}", written, self.output_path);
        Ok(written)
    }
}

fn render_csv(users: &[&UserStats]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(FLATTENED_HEADER)?;
    for user in users {
        writer.serialize(user.flatten()?)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV report: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

fn render_json(users: &[&UserStats]) -> Result<String> {
    let records = users
        .iter()
        .map(|user| user.serialize())
        .collect::<Result<Vec<_>, _>>()?;
    // Going through `Value` sorts the keys of every object.
    let value = serde_json::to_value(records)?;
    Ok(serde_json::to_string_pretty(&value)?)
}
