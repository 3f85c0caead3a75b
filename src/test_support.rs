use serde_json::Value;
use std::fs;
use std::path::PathBuf;

pub fn test_data_path(filename: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(filename)
}

pub fn load_test_data(filename: &str) -> String {
    fs::read_to_string(test_data_path(filename)).unwrap()
}

pub fn load_test_json(filename: &str) -> Value {
    serde_json::from_str(&load_test_data(filename)).unwrap()
}

#[derive(Debug, Clone, Copy)]
pub enum StatsKind {
    Both,
    TranslationsOnly,
    ReviewOnly,
    Nothing,
}

/// Contributor stats payload of the given shape, attributed to `lang`.
pub fn zanata_stats(kind: StatsKind, lang: &str) -> Value {
    let filename = match kind {
        StatsKind::Both => "user_stats_translations_and_reviews.json",
        StatsKind::TranslationsOnly => "user_stats_translations_only.json",
        StatsKind::ReviewOnly => "user_stats_review_only.json",
        StatsKind::Nothing => "user_stats_no_contributions.json",
    };
    let mut data = load_test_json(filename);
    if let Some(first) = data["contributions"]
        .as_array_mut()
        .and_then(|entries| entries.first_mut())
    {
        first["locale"] = Value::from(lang);
    }
    data
}
