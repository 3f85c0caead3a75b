use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to read language team file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid language team file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("language {} not found in {}", .missing.join(", "), .path.display())]
    UnknownLanguages { missing: Vec<String>, path: PathBuf },
}

/// Platform user ids that contain only digits are read as numbers by YAML
/// unless quoted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MemberId {
    Name(String),
    Number(u64),
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberId::Name(name) => f.write_str(name),
            MemberId::Number(number) => write!(f, "{}", number),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TeamEntry {
    language: String,
    #[serde(default)]
    translators: Option<Vec<MemberId>>,
    #[serde(default)]
    reviewers: Option<Vec<MemberId>>,
    #[serde(default)]
    coordinators: Option<Vec<MemberId>>,
}

fn member_ids(members: Option<Vec<MemberId>>) -> Vec<String> {
    members
        .unwrap_or_default()
        .iter()
        .map(MemberId::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTeam {
    pub language_code: String,
    pub language: String,
    pub translators: Vec<String>,
    pub reviewers: Vec<String>,
    pub coordinators: Vec<String>,
}

impl LanguageTeam {
    /// Loads the teams of `path`, restricted to `lang_filter` when given.
    pub fn from_yaml_file(
        path: &Path,
        lang_filter: Option<&[String]>,
    ) -> Result<Vec<Self>, RosterError> {
        debug!("Process list of language team from {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, lang_filter).map_err(|err| match err {
            RosterError::UnknownLanguages { missing, .. } => RosterError::UnknownLanguages {
                missing,
                path: path.to_path_buf(),
            },
            other => other,
        })
    }

    fn parse(yaml: &str, lang_filter: Option<&[String]>) -> Result<Vec<Self>, RosterError> {
        let entries: BTreeMap<String, TeamEntry> = serde_yaml::from_str(yaml)?;

        let lang_filter = lang_filter.filter(|langs| !langs.is_empty());
        if let Some(langs) = lang_filter {
            let missing: Vec<String> = langs
                .iter()
                .filter(|lang| !entries.contains_key(*lang))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(RosterError::UnknownLanguages {
                    missing,
                    path: PathBuf::new(),
                });
            }
        }

        Ok(entries
            .into_iter()
            .filter(|(code, _)| lang_filter.map_or(true, |langs| langs.contains(code)))
            .map(|(language_code, entry)| Self {
                language_code,
                language: entry.language,
                translators: member_ids(entry.translators),
                reviewers: member_ids(entry.reviewers),
                coordinators: member_ids(entry.coordinators),
            })
            .collect())
    }
}
