use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod output;
mod remote;
mod stats;
mod team;

#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::output::{add_file_extension, OutputFormat, Reporter};
use crate::remote::{DateRange, ZanataClient};
use crate::stats::{ScopeFilter, StatsCollector};
use crate::team::LanguageTeam;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML file of the language teams and their members
    user_yaml: PathBuf,

    /// Start date (YYYY-MM-DD). Defaults to the configured window before today
    #[arg(short, long)]
    start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD). Defaults to today
    #[arg(short, long)]
    end_date: Option<NaiveDate>,

    /// Output file, used as given. Defaults to zanata_stats_output.{csv,json}
    #[arg(short, long)]
    output_file: Option<String>,

    /// Project(s), comma-separated. Otherwise all projects are processed
    #[arg(short, long, value_delimiter = ',')]
    project: Option<Vec<String>>,

    /// Version(s), comma-separated. Otherwise all available versions are processed
    #[arg(short, long, value_delimiter = ',')]
    target_version: Option<Vec<String>>,

    /// Language code(s) like zh-CN or ja, comma-separated. Otherwise all languages are processed
    #[arg(short, long, value_delimiter = ',')]
    lang: Option<Vec<String>>,

    /// User(s), comma-separated. Otherwise all users are processed
    #[arg(short, long, value_delimiter = ',')]
    user: Option<Vec<String>>,

    /// Also output users without any activity
    #[arg(long)]
    include_no_activities: bool,

    /// Output file format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file (toml, yaml or json)
    #[arg(long, env = "CONTRIBSTATS_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn period(&self, window_days: i64) -> Result<DateRange> {
        let today = Local::now().date_naive();
        let end = self.end_date.unwrap_or(today);
        let start = self
            .start_date
            .unwrap_or_else(|| today - Duration::days(window_days));
        DateRange::new(start, end)
    }

    /// Version ids use `-` where branch names use `/` (`stable/ocata`).
    fn scope_filter(&self) -> ScopeFilter {
        ScopeFilter {
            projects: self.project.clone(),
            versions: self
                .target_version
                .as_ref()
                .map(|versions| versions.iter().map(|v| v.replace('/', "-")).collect()),
            users: self.user.clone(),
        }
    }

    /// The explicit output file, or `stem` plus the format's extension.
    fn output_file(&self, stem: &str, format: OutputFormat) -> String {
        match &self.output_file {
            Some(path) => path.clone(),
            None => add_file_extension(stem, format),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    println!(
        "{}",
        "contribstats - Translation Contributor Statistics"
            .bright_cyan()
            .bold()
    );

    let config = Config::load(cli.config.as_deref())?;
    let period = cli.period(config.report.window_days)?;

    let teams = LanguageTeam::from_yaml_file(&cli.user_yaml, cli.lang.as_deref())
        .context("Failed to load language teams")?;
    info!("Loaded {} language teams", teams.len());
    for team in &teams {
        debug!(
            "{} ({}): {} translators, {} reviewers, {} coordinators",
            team.language_code,
            team.language,
            team.translators.len(),
            team.reviewers.len(),
            team.coordinators.len()
        );
    }

    let client = ZanataClient::new(&config.api)?;
    let collector = StatsCollector::new(&client, period);
    let users = collector.collect(&teams, &cli.scope_filter()).await?;

    let format = cli
        .format
        .unwrap_or_else(|| OutputFormat::from(config.report.default_format.as_str()));
    let output_file = cli.output_file(&config.report.output_stem, format);
    let reporter = Reporter::new(format, &output_file, cli.include_no_activities);
    reporter.write_report(&users)?;

    println!(
        "\n{} {}",
        "Stats has been written to".bright_green().bold(),
        reporter.output_path().bright_white()
    );

    Ok(())
}
