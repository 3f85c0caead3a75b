use super::*;
use crate::config::ApiConfig;
use regex::Regex;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

const DEFAULT_USER_AGENT: &str = concat!("contribstats/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ProjectSummary {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProjectDetail {
    #[serde(default)]
    iterations: Vec<Iteration>,
}

#[derive(Debug, Deserialize)]
struct Iteration {
    id: String,
}

/// REST client for a Zanata-compatible translation platform.
pub struct ZanataClient {
    http: reqwest::Client,
    base_url: String,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
    version_pattern: Regex,
}

impl ZanataClient {
    pub fn new(api: &ApiConfig) -> Result<Self, FetchError> {
        let version_pattern = Regex::new(&api.version_pattern).map_err(|e| {
            FetchError::Configuration(format!(
                "invalid version pattern {:?}: {}",
                api.version_pattern, e
            ))
        })?;
        let http = reqwest::Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| FetchError::Configuration(e.to_string()))?;

        debug!("Using translation platform API at {}", api.base_url);

        Ok(Self {
            http,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            user_agents: api.user_agents.clone(),
            next_agent: AtomicUsize::new(0),
            version_pattern,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Round-robin over the configured user agents.
    fn next_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return DEFAULT_USER_AGENT;
        }
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        &self.user_agents[index]
    }

    fn is_valid_version(&self, version: &str) -> bool {
        self.version_pattern.is_match(version)
    }

    async fn read_uri(&self, uri: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(uri)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, self.next_user_agent())
            .send()
            .await
            .map_err(|source| {
                warn!("Error \"{}\" while reading uri {}", source, uri);
                FetchError::Transport {
                    uri: uri.to_string(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Reading uri {} returned HTTP {}", uri, status);
            return Err(FetchError::Status {
                uri: uri.to_string(),
                status,
            });
        }

        response.text().await.map_err(|source| FetchError::Transport {
            uri: uri.to_string(),
            source,
        })
    }

    async fn read_json<T: DeserializeOwned>(&self, uri: &str) -> Result<T, FetchError> {
        let body = self.read_uri(uri).await?;
        decode_json(uri, &body)
    }
}

fn decode_json<T: DeserializeOwned>(uri: &str, body: &str) -> Result<T, FetchError> {
    serde_json::from_str(body).map_err(|source| {
        warn!("Error \"{}\" parsing json from uri {}", source, uri);
        FetchError::Decode {
            uri: uri.to_string(),
            source,
        }
    })
}

fn contributor_stats_path(
    project_id: &str,
    version_id: &str,
    user_id: &str,
    period: &DateRange,
) -> String {
    format!(
        "stats/project/{}/version/{}/contributor/{}/{}",
        project_id, version_id, user_id, period
    )
}

impl StatsSource for ZanataClient {
    async fn list_projects(&self) -> Result<Vec<String>, FetchError> {
        let uri = self.endpoint("projects");
        debug!("Reading projects from {}", uri);
        let projects: Vec<ProjectSummary> = self.read_json(&uri).await?;
        Ok(projects.into_iter().map(|p| p.id).collect())
    }

    async fn list_versions(&self, project_id: &str) -> Result<Vec<String>, FetchError> {
        let uri = self.endpoint(&format!("projects/p/{}", project_id));
        debug!("Reading iterations for project {}", project_id);
        let project: ProjectDetail = self.read_json(&uri).await?;
        Ok(project
            .iterations
            .into_iter()
            .map(|iteration| iteration.id)
            .filter(|id| self.is_valid_version(id))
            .collect())
    }

    async fn fetch_scope_stats(
        &self,
        project_id: &str,
        version_id: &str,
        user_id: &str,
        period: &DateRange,
    ) -> Result<Value, FetchError> {
        let uri = self.endpoint(&contributor_stats_path(
            project_id, version_id, user_id, period,
        ));
        self.read_json(&uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::load_test_data;
    use rstest::rstest;

    fn client_with_agents(agents: &[&str]) -> ZanataClient {
        let api = ApiConfig {
            base_url: "http://localhost:22222/rest/".to_string(),
            user_agents: agents.iter().map(|a| a.to_string()).collect(),
            ..ApiConfig::default()
        };
        ZanataClient::new(&api).unwrap()
    }

    #[test]
    fn endpoint_joins_base_url_once() {
        let client = client_with_agents(&[]);
        assert_eq!(client.endpoint("projects"), "http://localhost:22222/rest/projects");
    }

    #[test]
    fn user_agents_rotate() {
        let client = client_with_agents(&["agent-1", "agent-2"]);
        let seen: Vec<_> = (0..3).map(|_| client.next_user_agent().to_string()).collect();
        assert_eq!(seen, vec!["agent-1", "agent-2", "agent-1"]);
    }

    #[test]
    fn user_agent_falls_back_to_crate_name() {
        let client = client_with_agents(&[]);
        assert!(client.next_user_agent().starts_with("contribstats/"));
    }

    #[test]
    fn invalid_version_pattern_is_configuration_error() {
        let api = ApiConfig {
            version_pattern: "(".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            ZanataClient::new(&api),
            Err(FetchError::Configuration(_))
        ));
    }

    #[test]
    fn decode_projects() {
        let projects: Vec<ProjectSummary> =
            decode_json("projects", &load_test_data("projects.json")).unwrap();
        let ids: Vec<_> = projects.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["aodh", "api-site", "barbican"]);
    }

    #[test]
    fn decode_project_versions_keeps_valid_versions() {
        let client = client_with_agents(&[]);
        let project: ProjectDetail =
            decode_json("projects/p/aodh", &load_test_data("project_versions.json")).unwrap();
        let versions: Vec<_> = project
            .iterations
            .into_iter()
            .map(|i| i.id)
            .filter(|id| client.is_valid_version(id))
            .collect();
        assert_eq!(versions, vec!["master", "stable-liberty", "stable-newton"]);
    }

    #[test]
    fn project_without_iterations_has_no_versions() {
        let project: ProjectDetail = decode_json("projects/p/empty", "{\"id\": \"empty\"}").unwrap();
        assert!(project.iterations.is_empty());
    }

    #[test]
    fn decode_error_carries_uri() {
        let err = decode_json::<Value>("stats/x", "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode { ref uri, .. } if uri == "stats/x"));
    }

    #[rstest]
    #[case("master", true)]
    #[case("master-ocata", true)]
    #[case("stable-pike", true)]
    #[case("stable-pike-2", false)]
    #[case("feature-x", false)]
    fn version_pattern(#[case] version: &str, #[case] valid: bool) {
        assert_eq!(client_with_agents(&[]).is_valid_version(version), valid);
    }

    #[test]
    fn contributor_stats_path_includes_period() {
        let period = DateRange::new(
            "2017-01-01".parse().unwrap(),
            "2017-06-30".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(
            contributor_stats_path("nova", "master", "amotoki", &period),
            "stats/project/nova/version/master/contributor/amotoki/2017-01-01..2017-06-30"
        );
    }
}
