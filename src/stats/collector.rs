use super::UserStats;
use crate::remote::{DateRange, StatsSource};
use crate::team::LanguageTeam;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Restricts which projects, versions and users are queried. `None` means
/// no restriction.
#[derive(Debug, Clone, Default)]
pub struct ScopeFilter {
    pub projects: Option<Vec<String>>,
    pub versions: Option<Vec<String>>,
    pub users: Option<Vec<String>>,
}

impl ScopeFilter {
    fn accepts_version(&self, version: &str) -> bool {
        self.versions
            .as_ref()
            .map_or(true, |versions| versions.iter().any(|v| v == version))
    }

    fn accepts_user(&self, user_id: &str) -> bool {
        self.users
            .as_ref()
            .map_or(true, |users| users.iter().any(|u| u == user_id))
    }
}

pub struct StatsCollector<'a, S> {
    source: &'a S,
    period: DateRange,
}

impl<'a, S: StatsSource> StatsCollector<'a, S> {
    pub fn new(source: &'a S, period: DateRange) -> Self {
        Self { source, period }
    }

    /// One empty aggregate per translator of every team.
    pub fn seed_users(teams: &[LanguageTeam]) -> Vec<UserStats> {
        teams
            .iter()
            .flat_map(|team| {
                team.translators
                    .iter()
                    .map(move |user_id| UserStats::new(user_id, &team.language_code))
            })
            .collect()
    }

    /// Queries every selected scope for every selected user, one request at a
    /// time. The first failure aborts collection.
    pub async fn collect(
        &self,
        teams: &[LanguageTeam],
        filter: &ScopeFilter,
    ) -> Result<Vec<UserStats>> {
        info!(
            "Getting contributor statistics from {} to {}",
            self.period.start, self.period.end
        );

        let mut users = Self::seed_users(teams);

        let projects = match &filter.projects {
            Some(projects) => projects.clone(),
            None => self
                .source
                .list_projects()
                .await
                .context("Failed to list projects")?,
        };
        info!("Processing {} projects for {} users", projects.len(), users.len());

        for project_id in &projects {
            let versions: Vec<String> = self
                .source
                .list_versions(project_id)
                .await
                .with_context(|| format!("Failed to list versions of {}", project_id))?
                .into_iter()
                .filter(|version| filter.accepts_version(version))
                .collect();
            debug!("{}: {} versions selected", project_id, versions.len());

            let selected = users
                .iter()
                .filter(|user| filter.accepts_user(user.user_id()))
                .count();
            let pb = ProgressBar::new((versions.len() * selected) as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("=>-"),
            );
            pb.set_message(project_id.clone());

            for version in &versions {
                for user in users
                    .iter_mut()
                    .filter(|user| filter.accepts_user(user.user_id()))
                {
                    debug!(
                        "Getting {} {} for user {} {}",
                        project_id,
                        version,
                        user.user_id(),
                        user.lang()
                    );
                    let payload = self
                        .source
                        .fetch_scope_stats(project_id, version, user.user_id(), &self.period)
                        .await
                        .with_context(|| {
                            format!(
                                "Failed to fetch stats of {} for {}/{}",
                                user.user_id(),
                                project_id,
                                version
                            )
                        })?;
                    debug!("Got: {}", payload);

                    user.merge_scope_stats(&payload, project_id, version)
                        .with_context(|| {
                            format!(
                                "Unexpected stats payload for {} in {}/{}",
                                user.user_id(),
                                project_id,
                                version
                            )
                        })?;
                    debug!("Recorded: {:?}", user.scope(project_id, version));
                    pb.inc(1);
                }
            }

            pb.finish_and_clear();
        }

        for user in &mut users {
            user.compute_total().with_context(|| {
                format!("Failed to sum up stats of {} ({})", user.user_id(), user.lang())
            })?;
            if let Some(total) = user.total() {
                debug!(
                    "{} ({}): {} scopes recorded, translation total {:?}, review total {:?}",
                    user.user_id(),
                    user.lang(),
                    user.scope_count(),
                    total.translation_stats.total(),
                    total.review_stats.total()
                );
            }
        }

        let active = users.iter().filter(|u| u.needs_output(false)).count();
        info!(
            "Collected statistics for {} users ({} with activity)",
            users.len(),
            active
        );

        Ok(users)
    }
}
