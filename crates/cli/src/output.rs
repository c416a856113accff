//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use storefront_e2e::{Scenario, ScenarioResult, SuiteResult};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("ℹ️  {}", message);
}

/// Catalogue entry as listed by `storefront list`
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioRow {
    pub key: String,
    pub suite: String,
    pub title: String,
    pub tags: Vec<String>,
    pub bootstrap: String,
}

impl From<&Scenario> for ScenarioRow {
    fn from(scenario: &Scenario) -> Self {
        Self {
            key: scenario.key(),
            suite: scenario.suite.to_string(),
            title: scenario.title.to_string(),
            tags: scenario.tags.iter().map(|t| t.to_string()).collect(),
            bootstrap: match scenario.bootstrap {
                storefront_e2e::Bootstrap::ClearPage => "clear-page".to_string(),
                storefront_e2e::Bootstrap::Fresh(seed) => format!("fresh ({:?})", seed),
            },
        }
    }
}

impl TableDisplay for ScenarioRow {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Suite", "Title", "Tags", "Bootstrap"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.suite.clone(),
            self.title.clone(),
            self.tags.join(", "),
            self.bootstrap.clone(),
        ]
    }
}

impl TableDisplay for ScenarioResult {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Suite", "Status", "Duration", "Error"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.suite.to_string(),
            status_label(self.success),
            format!("{} ms", self.duration_ms),
            self.error.clone().unwrap_or_default(),
        ]
    }
}

fn status_label(success: bool) -> String {
    if success {
        "✓ Passed".green().to_string()
    } else {
        "✗ Failed".red().to_string()
    }
}

/// Print per-scenario results followed by a one-line summary
pub fn print_suite(results: &SuiteResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(results).unwrap_or_default());
        }
        OutputFormat::Table | OutputFormat::Plain => {
            print_list(&results.results, format);
            println!();
            let summary = format!(
                "{} passed, {} failed of {} ({} ms)",
                results.passed, results.failed, results.total, results.duration_ms
            );
            if results.success() {
                print_success(&summary);
            } else {
                print_error(&summary);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_row_matches_headers() {
        let scenario = storefront_e2e::catalogue().remove(0);
        let row = ScenarioRow::from(&scenario);
        assert_eq!(row.row().len(), ScenarioRow::headers().len());
        assert_eq!(row.key, "age-verification/showAgeVerificationWithMailChimp");
        assert_eq!(row.suite, "sanity");
    }

    #[test]
    fn test_clear_page_bootstrap_label() {
        let scenario = storefront_e2e::catalogue()
            .into_iter()
            .find(|s| s.id == "validLogin")
            .unwrap();
        assert_eq!(ScenarioRow::from(&scenario).bootstrap, "clear-page");
    }
}
