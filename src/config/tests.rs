use super::validation::validate_config;
use super::*;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

fn located_config() -> Config {
    Config {
        latitude: Some(36.8529),
        longitude: Some(-75.978),
        timezone: Some("America/New_York".to_string()),
        ..Config::default()
    }
}

#[test]
#[serial]
fn test_config_load_default_creation() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("skyarc").join("skyarc.toml");

    // Save and restore XDG_CONFIG_HOME
    let original = std::env::var("XDG_CONFIG_HOME").ok();
    unsafe {
        std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
    }

    let result = Config::load();

    unsafe {
        match original {
            Some(val) => std::env::set_var("XDG_CONFIG_HOME", val),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    let config = result.unwrap();
    assert!(config_path.exists());
    assert_eq!(config.body(), BodyKind::Moon);
    assert_eq!(
        config.sources(),
        vec![SourceKind::Almanac, SourceKind::Service]
    );
    assert_eq!(config.coordinates().unwrap(), None);
}

#[test]
fn test_default_file_parses_back_to_defaults() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("skyarc.toml");
    create_default_config(&path, Some((36.8529, -75.978))).unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.latitude, Some(36.8529));
    assert_eq!(config.longitude, Some(-75.978));
    assert_eq!(config.service_url(), DEFAULT_SERVICE_URL);
    assert_eq!(config.rise_search_days(), DEFAULT_RISE_SEARCH_DAYS);
    assert_eq!(config.phase_weights(), PhaseWeights::default());
    assert_eq!(config.snapshot_interval(), DEFAULT_SNAPSHOT_INTERVAL);
}

#[test]
fn test_partial_weights_table_keeps_other_defaults() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("skyarc.toml");
    fs::write(
        &path,
        "body = \"sun\"\nprimary_source = \"service\"\n\n[twilight_weights]\ncivil = 5.0\n",
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.body(), BodyKind::Sun);
    assert_eq!(config.primary_source(), SourceKind::Service);
    assert_eq!(config.secondary_source(), Some(SourceKind::Almanac));
    let weights = config.phase_weights();
    assert_eq!(weights.civil, 5.0);
    assert_eq!(weights.dark, DEFAULT_WEIGHT_DARK);
}

#[test]
fn test_missing_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("absent.toml");
    assert!(load_from_path(&path).is_err());
}

#[test]
fn test_unparseable_file_is_an_error() {
    let temp_dir = tempdir().unwrap();
    let path = temp_dir.path().join("skyarc.toml");
    fs::write(&path, "latitude = \"north\"\n").unwrap();
    let err = load_from_path(&path).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse"));
}

#[test]
fn test_config_validation_basic() {
    assert!(validate_config(&Config::default()).is_ok());
    assert!(validate_config(&located_config()).is_ok());
}

#[test]
fn test_coordinate_validation() {
    let mut config = located_config();
    config.latitude = Some(91.0);
    assert!(validate_config(&config).is_err());

    let mut config = located_config();
    config.longitude = Some(-180.5);
    assert!(validate_config(&config).is_err());

    let mut config = located_config();
    config.longitude = None;
    assert!(validate_config(&config).is_err());
    assert!(config.coordinates().is_err());
}

#[test]
fn test_elevation_validation() {
    let mut config = located_config();
    assert_eq!(config.elevation(), DEFAULT_ELEVATION);

    config.elevation = Some(2_350.0);
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.elevation(), 2_350.0);

    config.elevation = Some(MAXIMUM_ELEVATION + 1.0);
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_name_validation() {
    let mut config = located_config();
    config.timezone = Some("Atlantis/Capital".to_string());
    assert!(validate_config(&config).is_err());

    let mut config = located_config();
    config.body = Some("jupiter".to_string());
    assert!(validate_config(&config).is_err());

    let mut config = located_config();
    config.primary_source = Some("oracle".to_string());
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_secondary_source_rules() {
    let mut config = Config::default();
    config.secondary_source = Some("almanac".to_string());
    assert!(validate_config(&config).is_err());

    config.secondary_source = Some("None".to_string());
    assert!(validate_config(&config).is_ok());
    assert_eq!(config.secondary_source(), None);
    assert_eq!(config.sources(), vec![SourceKind::Almanac]);

    config.primary_source = Some("external".to_string());
    config.secondary_source = Some("internal".to_string());
    assert!(validate_config(&config).is_ok());
    assert_eq!(
        config.sources(),
        vec![SourceKind::Service, SourceKind::Almanac]
    );
}

#[test]
fn test_range_validation() {
    let mut config = Config::default();
    config.service_timeout = Some(MAXIMUM_SERVICE_TIMEOUT + 1);
    assert!(validate_config(&config).is_err());

    let mut config = Config::default();
    config.rise_search_days = Some(0);
    assert!(validate_config(&config).is_err());
    config.rise_search_days = Some(MAXIMUM_RISE_SEARCH_DAYS);
    assert!(validate_config(&config).is_ok());

    let mut config = Config::default();
    config.snapshot_interval = Some(MINIMUM_REFRESH_INTERVAL - 1);
    assert!(validate_config(&config).is_err());

    let mut config = Config::default();
    config.service_url = Some("127.0.0.1:8000".to_string());
    assert!(validate_config(&config).is_err());
}

#[test]
fn test_weight_validation() {
    let mut config = Config::default();
    config.twilight_weights = Some(TwilightWeightsConfig {
        civil: Some(-1.0),
        ..Default::default()
    });
    assert!(validate_config(&config).is_err());

    config.twilight_weights = Some(TwilightWeightsConfig {
        dark: Some(0.0),
        astronomical: Some(0.0),
        nautical: Some(0.0),
        civil: Some(0.0),
        day: Some(0.0),
    });
    assert!(validate_config(&config).is_err());
}
