use serde::{Deserialize, Serialize};

pub mod reporter;

pub use reporter::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Csv,
        }
    }
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => ".csv",
            OutputFormat::Json => ".json",
        }
    }
}

pub fn add_file_extension(path: &str, format: OutputFormat) -> String {
    let extension = format.extension();

    if path.ends_with(extension) {
        path.to_string()
    } else {
        format!("{}{}", path, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("report", OutputFormat::Csv, "report.csv")]
    #[case("report.csv", OutputFormat::Csv, "report.csv")]
    #[case("report.csv", OutputFormat::Json, "report.csv.json")]
    #[case("out/stats.json", OutputFormat::Json, "out/stats.json")]
    fn file_extension_is_appended_once(
        #[case] path: &str,
        #[case] format: OutputFormat,
        #[case] expected: &str,
    ) {
        assert_eq!(add_file_extension(path, format), expected);
    }

    #[test]
    fn unknown_format_falls_back_to_csv() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("xml"), OutputFormat::Csv);
    }
}
