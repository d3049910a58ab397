//! Configuration validation functionality.
//!
//! Rejects values that are out of range or cannot be interpreted, so the rest
//! of the program can rely on the accessor defaults.

use anyhow::{Context, Result};

use super::Config;
use crate::common::constants::*;
use crate::events::{BodyKind, SourceKind};

/// Validate every configured key.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(lat) = config.latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {})", lat);
    }

    if let Some(lon) = config.longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        anyhow::bail!(
            "longitude must be between -180 and 180 degrees (got {})",
            lon
        );
    }

    if config.latitude.is_some() != config.longitude.is_some() {
        anyhow::bail!("latitude and longitude must be set together");
    }

    if let Some(elevation) = config.elevation
        && !(MINIMUM_ELEVATION..=MAXIMUM_ELEVATION).contains(&elevation)
    {
        anyhow::bail!(
            "elevation must be between {} and {} metres (got {})",
            MINIMUM_ELEVATION,
            MAXIMUM_ELEVATION,
            elevation
        );
    }

    if let Some(tz) = &config.timezone {
        crate::geo::parse_timezone(tz).context("Invalid timezone")?;
    }

    if let Some(body) = &config.body {
        body.parse::<BodyKind>().context("Invalid body")?;
    }

    if let Some(primary) = &config.primary_source {
        primary
            .parse::<SourceKind>()
            .context("Invalid primary_source")?;
    }

    if let Some(secondary) = &config.secondary_source
        && !secondary.trim().eq_ignore_ascii_case("none")
    {
        let secondary = secondary
            .parse::<SourceKind>()
            .context("Invalid secondary_source")?;
        if secondary == config.primary_source() {
            anyhow::bail!(
                "secondary_source must differ from primary_source (both are \"{secondary}\")"
            );
        }
    }

    if let Some(url) = &config.service_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        anyhow::bail!("service_url must start with http:// or https:// (got \"{url}\")");
    }

    if let Some(timeout) = config.service_timeout
        && !(MINIMUM_SERVICE_TIMEOUT..=MAXIMUM_SERVICE_TIMEOUT).contains(&timeout)
    {
        anyhow::bail!(
            "service_timeout ({} s) must be between {} and {} seconds",
            timeout,
            MINIMUM_SERVICE_TIMEOUT,
            MAXIMUM_SERVICE_TIMEOUT
        );
    }

    if let Some(days) = config.rise_search_days
        && !(1..=MAXIMUM_RISE_SEARCH_DAYS).contains(&days)
    {
        anyhow::bail!(
            "rise_search_days ({}) must be between 1 and {}",
            days,
            MAXIMUM_RISE_SEARCH_DAYS
        );
    }

    for (name, value) in [
        ("snapshot_interval", config.snapshot_interval),
        ("twilight_interval", config.twilight_interval),
        ("events_interval", config.events_interval),
    ] {
        if let Some(seconds) = value
            && !(MINIMUM_REFRESH_INTERVAL..=MAXIMUM_REFRESH_INTERVAL).contains(&seconds)
        {
            anyhow::bail!(
                "{} ({} s) must be between {} and {} seconds",
                name,
                seconds,
                MINIMUM_REFRESH_INTERVAL,
                MAXIMUM_REFRESH_INTERVAL
            );
        }
    }

    validate_twilight_weights(config)
}

fn validate_twilight_weights(config: &Config) -> Result<()> {
    let Some(table) = &config.twilight_weights else {
        return Ok(());
    };

    for (name, value) in [
        ("dark", table.dark),
        ("astronomical", table.astronomical),
        ("nautical", table.nautical),
        ("civil", table.civil),
        ("day", table.day),
    ] {
        if let Some(weight) = value
            && !(weight.is_finite() && (0.0..=MAXIMUM_TWILIGHT_WEIGHT).contains(&weight))
        {
            anyhow::bail!(
                "twilight_weights.{} ({}) must be between 0 and {}",
                name,
                weight,
                MAXIMUM_TWILIGHT_WEIGHT
            );
        }
    }

    let weights = config.phase_weights();
    if [
        weights.dark,
        weights.astronomical,
        weights.nautical,
        weights.civil,
        weights.day,
    ]
    .iter()
    .all(|w| *w == 0.0)
    {
        anyhow::bail!("twilight_weights cannot all be zero");
    }

    Ok(())
}
