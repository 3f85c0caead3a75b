use super::StatsError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Contributor statistics as returned by the
/// `stats/project/{p}/version/{v}/contributor/{user}/{range}` endpoint.
///
/// ```json
/// {
///     "username": "amotoki",
///     "contributions": [
///         {
///             "locale": "ja",
///             "translation-stats": {"translated": 7360, "needReview": 0, "approved": 152, "rejected": 0},
///             "review-stats": {"approved": 220, "rejected": 0}
///         }
///     ]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ContributorStats {
    pub contributions: Vec<Contribution>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contribution {
    pub locale: String,
    #[serde(rename = "translation-stats", default)]
    pub translation_stats: Option<BTreeMap<String, u64>>,
    #[serde(rename = "review-stats", default)]
    pub review_stats: Option<BTreeMap<String, u64>>,
}

impl ContributorStats {
    pub fn from_value(value: &Value) -> Result<Self, StatsError> {
        Self::deserialize(value).map_err(StatsError::MalformedPayload)
    }

    /// First contribution entry recorded for `lang`, if any.
    pub fn for_locale(&self, lang: &str) -> Option<&Contribution> {
        self.contributions.iter().find(|c| c.locale == lang)
    }
}

impl FromStr for ContributorStats {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(StatsError::MalformedPayload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_groups_default_to_none() {
        let stats = ContributorStats::from_value(&json!({
            "username": "user-a",
            "contributions": [{"locale": "ja"}]
        }))
        .unwrap();

        let ja = stats.for_locale("ja").unwrap();
        assert!(ja.translation_stats.is_none());
        assert!(ja.review_stats.is_none());
        assert!(stats.for_locale("de").is_none());
    }

    #[test]
    fn missing_contributions_is_malformed() {
        let err = ContributorStats::from_value(&json!({"username": "user-a"})).unwrap_err();
        assert!(matches!(err, StatsError::MalformedPayload(_)));
    }

    #[test]
    fn negative_counter_is_malformed() {
        let err = "{\"contributions\": [{\"locale\": \"ja\", \"review-stats\": {\"approved\": -1}}]}"
            .parse::<ContributorStats>()
            .unwrap_err();
        assert!(matches!(err, StatsError::MalformedPayload(_)));
    }
}
