//! Default configuration file generation.
//!
//! The default file lists every setting with its default value and an aligned
//! comment describing the accepted range.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;

/// Create a default config file, optionally pre-filled with coordinates.
///
/// Without coordinates the observer keys are left out; the location then comes
/// from the command line or the last remembered place.
pub fn create_default_config(path: &Path, coords: Option<(f64, f64)>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let mut builder = ConfigBuilder::new().add_section("Observer");
    if let Some((lat, lon)) = coords {
        builder = builder
            .add_setting("latitude", &format!("{lat:.6}"), "Geographic latitude (-90 to 90)")
            .add_setting(
                "longitude",
                &format!("{lon:.6}"),
                "Geographic longitude (-180 to 180)",
            );
    }

    let content = builder
        .add_setting(
            "elevation",
            &format!("{DEFAULT_ELEVATION:.1}"),
            "Metres above sea level, sent to the service",
        )
        .add_setting(
            "body",
            &format!("\"{DEFAULT_BODY}\""),
            "Body to track: \"moon\" or \"sun\"",
        )
        .add_section("Sources")
        .add_setting(
            "primary_source",
            &format!("\"{DEFAULT_PRIMARY_SOURCE}\""),
            "Preferred source: \"almanac\" or \"service\"",
        )
        .add_setting(
            "secondary_source",
            "\"service\"",
            "Fallback source: \"almanac\", \"service\" or \"none\"",
        )
        .add_setting(
            "service_url",
            &format!("\"{DEFAULT_SERVICE_URL}\""),
            "Base URL of the ephemeris service",
        )
        .add_setting(
            "service_timeout",
            &DEFAULT_SERVICE_TIMEOUT.to_string(),
            &format!(
                "Service request timeout in seconds ({MINIMUM_SERVICE_TIMEOUT}-{MAXIMUM_SERVICE_TIMEOUT})"
            ),
        )
        .add_setting(
            "rise_search_days",
            &DEFAULT_RISE_SEARCH_DAYS.to_string(),
            &format!("Days searched for the next rise (1-{MAXIMUM_RISE_SEARCH_DAYS})"),
        )
        .add_section("Refresh")
        .add_setting(
            "snapshot_interval",
            &DEFAULT_SNAPSHOT_INTERVAL.to_string(),
            &format!(
                "Position refresh in seconds ({MINIMUM_REFRESH_INTERVAL}-{MAXIMUM_REFRESH_INTERVAL})"
            ),
        )
        .add_setting(
            "twilight_interval",
            &DEFAULT_TWILIGHT_INTERVAL.to_string(),
            "Twilight refresh in seconds",
        )
        .add_setting(
            "events_interval",
            &DEFAULT_EVENTS_INTERVAL.to_string(),
            "Rise/set refresh in seconds",
        )
        .add_table("twilight_weights")
        .add_setting("dark", &format_weight(DEFAULT_WEIGHT_DARK), "Display width of night")
        .add_setting(
            "astronomical",
            &format_weight(DEFAULT_WEIGHT_ASTRONOMICAL),
            "Display width of astronomical twilight",
        )
        .add_setting(
            "nautical",
            &format_weight(DEFAULT_WEIGHT_NAUTICAL),
            "Display width of nautical twilight",
        )
        .add_setting(
            "civil",
            &format_weight(DEFAULT_WEIGHT_CIVIL),
            "Display width of civil twilight",
        )
        .add_setting(
            "day",
            &format_weight(DEFAULT_WEIGHT_DAY),
            &format!("Display width of daylight (0-{MAXIMUM_TWILIGHT_WEIGHT})"),
        )
        .build();

    fs::write(path, content).context("Failed to write default config file")?;
    Ok(())
}

fn format_weight(weight: f64) -> String {
    format!("{weight:.1}")
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Table(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// A comment-only section header; keys stay at the top level.
    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    /// A real TOML table; every following key belongs to it.
    fn add_table(mut self, name: &str) -> Self {
        self.entries.push(ConfigEntry::Table(format!("[{name}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // One space between the longest setting and its comment
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        for entry in self.entries {
            match entry {
                ConfigEntry::Section(header) | ConfigEntry::Table(header) => {
                    if !result.is_empty() {
                        result.push(String::new());
                    }
                    result.push(header);
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.push(String::new());
        result.join("\n")
    }
}
