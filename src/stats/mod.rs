use serde::{Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub mod collector;
pub mod payload;

pub use collector::{ScopeFilter, StatsCollector};
pub use payload::ContributorStats;

/// Counters reported for translation activity.
pub const TRANSLATION_COUNTERS: [&str; 4] = ["translated", "needReview", "approved", "rejected"];

/// Counters reported for review activity.
pub const REVIEW_COUNTERS: [&str; 2] = ["approved", "rejected"];

const TOTAL_KEY: &str = "total";

/// Column titles of [`FlatRow`], in order.
pub const FLATTENED_HEADER: [&str; 10] = [
    "user_id",
    "lang",
    "translation-total",
    "translated",
    "needReview",
    "approved",
    "rejected",
    "review-total",
    "review-approved",
    "review-rejected",
];

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("malformed contributor stats payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),
    #[error("counter {counter} exceeds the u64 range")]
    CounterOverflow { counter: String },
}

/// One group of activity counters (translation or review).
///
/// An empty group means no activity of that kind was recorded. It is not the
/// same thing as a group whose counters are all zero: the latter reports a
/// `total` of zero, the former reports nothing.
///
/// Every counter and the derived total fit in a `u64`; additions that would
/// exceed it fail with [`StatsError::CounterOverflow`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatGroup {
    counters: BTreeMap<String, u64>,
    total: u64,
}

impl StatGroup {
    /// Builds a group from raw counters. A `total` coming from the wire is
    /// dropped, it is always derived from the sibling counters.
    pub fn from_counters(raw: &BTreeMap<String, u64>) -> Result<Self, StatsError> {
        let mut group = Self::default();
        for (key, value) in raw.iter().filter(|(key, _)| key.as_str() != TOTAL_KEY) {
            group.add(key, *value)?;
        }
        Ok(group)
    }

    fn zeroed(keys: &[&str]) -> Self {
        let counters = keys.iter().map(|key| (key.to_string(), 0)).collect();
        Self { counters, total: 0 }
    }

    fn add(&mut self, key: &str, value: u64) -> Result<(), StatsError> {
        let counter = self.counters.entry(key.to_string()).or_insert(0);
        let Some(sum) = counter.checked_add(value) else {
            return Err(StatsError::CounterOverflow {
                counter: key.to_string(),
            });
        };
        let Some(total) = self.total.checked_add(value) else {
            return Err(StatsError::CounterOverflow {
                counter: TOTAL_KEY.to_string(),
            });
        };
        *counter = sum;
        self.total = total;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Sum of all counters, `None` when the group is empty.
    pub fn total(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.total)
        }
    }

    /// Counter lookup; `"total"` resolves to the derived total.
    pub fn get(&self, key: &str) -> Option<u64> {
        if key == TOTAL_KEY {
            self.total()
        } else {
            self.counters.get(key).copied()
        }
    }

    pub fn get_or_zero(&self, key: &str) -> u64 {
        self.get(key).unwrap_or(0)
    }

    /// Adds every counter of `other` into this group, keys unknown to this
    /// group included.
    fn accumulate(&mut self, other: &StatGroup) -> Result<(), StatsError> {
        for (key, value) in &other.counters {
            self.add(key, *value)?;
        }
        Ok(())
    }

    /// Counters plus the derived `total`; empty stays empty.
    pub fn to_map(&self) -> BTreeMap<String, u64> {
        let mut map = self.counters.clone();
        if let Some(total) = self.total() {
            map.insert(TOTAL_KEY.to_string(), total);
        }
        map
    }
}

impl Serialize for StatGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Activity of one user for one language within one (project, version) scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeStats {
    #[serde(rename = "translation-stats")]
    pub translation_stats: StatGroup,
    #[serde(rename = "review-stats")]
    pub review_stats: StatGroup,
}

impl ScopeStats {
    pub fn has_activity(&self) -> bool {
        !self.translation_stats.is_empty() || !self.review_stats.is_empty()
    }
}

/// Fixed-column report row, see [`FLATTENED_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRow {
    pub user_id: String,
    pub lang: String,
    pub translation_total: u64,
    pub translated: u64,
    pub need_review: u64,
    pub approved: u64,
    pub rejected: u64,
    pub review_total: u64,
    pub review_approved: u64,
    pub review_rejected: u64,
}

/// Structured report record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub user_id: String,
    pub lang: String,
    #[serde(rename = "translation-stats")]
    pub translation_stats: StatGroup,
    #[serde(rename = "review-stats")]
    pub review_stats: StatGroup,
}

/// Contribution statistics of one user in one language, keyed by project and
/// then version.
#[derive(Debug, Clone)]
pub struct UserStats {
    user_id: String,
    lang: String,
    scopes: BTreeMap<String, BTreeMap<String, ScopeStats>>,
    total: Option<ScopeStats>,
}

impl UserStats {
    pub fn new(user_id: impl ToString, lang: impl ToString) -> Self {
        Self {
            user_id: user_id.to_string(),
            lang: lang.to_string(),
            scopes: BTreeMap::new(),
            total: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn scope(&self, project_id: &str, version_id: &str) -> Option<&ScopeStats> {
        self.scopes.get(project_id)?.get(version_id)
    }

    /// Number of (project, version) scopes recorded so far.
    pub fn scope_count(&self) -> usize {
        self.scopes.values().map(BTreeMap::len).sum()
    }

    fn iter_scopes(&self) -> impl Iterator<Item = &ScopeStats> {
        self.scopes.values().flat_map(BTreeMap::values)
    }

    /// Rolled-up totals, `None` until [`UserStats::compute_total`] runs.
    pub fn total(&self) -> Option<&ScopeStats> {
        self.total.as_ref()
    }

    /// Merges a raw contributor stats payload into the given scope.
    pub fn merge_scope_stats(
        &mut self,
        payload: &Value,
        project_id: &str,
        version_id: &str,
    ) -> Result<(), StatsError> {
        let stats = ContributorStats::from_value(payload)?;
        self.merge_contributions(&stats, project_id, version_id)
    }

    /// Records the entry matching this user's language under the scope,
    /// replacing whatever was there. Without a matching entry the scope is
    /// left alone.
    pub fn merge_contributions(
        &mut self,
        stats: &ContributorStats,
        project_id: &str,
        version_id: &str,
    ) -> Result<(), StatsError> {
        let Some(contribution) = stats.for_locale(&self.lang) else {
            return Ok(());
        };

        let scope = ScopeStats {
            translation_stats: contribution
                .translation_stats
                .as_ref()
                .map(StatGroup::from_counters)
                .transpose()?
                .unwrap_or_default(),
            review_stats: contribution
                .review_stats
                .as_ref()
                .map(StatGroup::from_counters)
                .transpose()?
                .unwrap_or_default(),
        };

        self.scopes
            .entry(project_id.to_string())
            .or_default()
            .insert(version_id.to_string(), scope);
        Ok(())
    }

    /// Sums every recorded scope into a fresh total without storing it.
    pub fn rollup(&self) -> Result<ScopeStats, StatsError> {
        let mut translation: Option<StatGroup> = None;
        let mut review: Option<StatGroup> = None;

        for scope in self.iter_scopes() {
            if !scope.translation_stats.is_empty() {
                translation
                    .get_or_insert_with(|| StatGroup::zeroed(&TRANSLATION_COUNTERS))
                    .accumulate(&scope.translation_stats)?;
            }
            if !scope.review_stats.is_empty() {
                review
                    .get_or_insert_with(|| StatGroup::zeroed(&REVIEW_COUNTERS))
                    .accumulate(&scope.review_stats)?;
            }
        }

        Ok(ScopeStats {
            translation_stats: translation.unwrap_or_default(),
            review_stats: review.unwrap_or_default(),
        })
    }

    /// Recomputes the rolled-up totals from the current scopes. On overflow
    /// the previously stored totals are kept.
    pub fn compute_total(&mut self) -> Result<(), StatsError> {
        self.total = Some(self.rollup()?);
        Ok(())
    }

    /// Stored totals, or a fresh rollup when none were computed yet.
    fn totals(&self) -> Result<ScopeStats, StatsError> {
        match &self.total {
            Some(total) => Ok(total.clone()),
            None => self.rollup(),
        }
    }

    /// Whether this user belongs in the report. Only per-scope activity
    /// counts, an empty rollup does not.
    pub fn needs_output(&self, include_no_activities: bool) -> bool {
        include_no_activities || self.iter_scopes().any(ScopeStats::has_activity)
    }

    /// Report order: language first, then user id.
    pub fn cmp_report(&self, other: &Self) -> Ordering {
        self.lang
            .cmp(&other.lang)
            .then_with(|| self.user_id.cmp(&other.user_id))
    }

    pub fn flatten(&self) -> Result<FlatRow, StatsError> {
        let ScopeStats {
            translation_stats: translation,
            review_stats: review,
        } = self.totals()?;

        Ok(FlatRow {
            user_id: self.user_id.clone(),
            lang: self.lang.clone(),
            translation_total: translation.get_or_zero(TOTAL_KEY),
            translated: translation.get_or_zero("translated"),
            need_review: translation.get_or_zero("needReview"),
            approved: translation.get_or_zero("approved"),
            rejected: translation.get_or_zero("rejected"),
            review_total: review.get_or_zero(TOTAL_KEY),
            review_approved: review.get_or_zero("approved"),
            review_rejected: review.get_or_zero("rejected"),
        })
    }

    pub fn serialize(&self) -> Result<UserRecord, StatsError> {
        let totals = self.totals()?;
        Ok(UserRecord {
            user_id: self.user_id.clone(),
            lang: self.lang.clone(),
            translation_stats: totals.translation_stats,
            review_stats: totals.review_stats,
        })
    }
}
