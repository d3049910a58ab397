use chrono::{TimeZone, Utc};
use skyarc::config::{Config, load_from_path};
use skyarc::engine::{CycleState, Engine, Observer};
use skyarc::events::{BodyKind, Coordinates, HorizonState, SourceIssue, SourceKind};
use skyarc::logger::Log;
use skyarc::twilight::TwilightPhase;
use std::fs;
use tempfile::tempdir;

fn london() -> Observer {
    Observer {
        coords: Coordinates::new(51.5074, -0.1278).unwrap(),
        tz: chrono_tz::Europe::London,
        label: "London".to_string(),
    }
}

fn config_from(toml: &str) -> Config {
    let dir = tempdir().unwrap();
    let path = dir.path().join("skyarc.toml");
    fs::write(&path, toml).unwrap();
    load_from_path(&path).unwrap()
}

#[test]
fn test_almanac_only_engine_from_config_file() {
    Log::set_enabled(false);
    let config = config_from(
        r#"
latitude = 51.5074
longitude = -0.1278
body = "sun"
secondary_source = "none"
"#,
    );
    assert_eq!(config.sources(), vec![SourceKind::Almanac]);

    let engine = Engine::from_config(&config, london(), config.body()).unwrap();
    // 22:00 BST, after sunset
    let now = Utc.with_ymd_and_hms(2025, 7, 1, 21, 0, 0).unwrap();
    let result = engine.evaluate(now);

    let view = result.view(SourceKind::Almanac).unwrap();
    assert_eq!(view.horizon, Some(HorizonState::Below));
    let (rise, set) = (view.rise.unwrap(), view.set.unwrap());
    assert!(set <= now, "set {set} should be the most recent one");
    assert!(rise > now, "rise {rise} should be the next one");
    assert!(rise - now < chrono::Duration::hours(12));

    let cycle = CycleState::from_view(view, now);
    assert!(cycle.position > 0.75 && cycle.position < 1.0);
    assert!(cycle.height < 0.0);
}

#[test]
fn test_identical_inputs_serialize_identically() {
    Log::set_enabled(false);
    let config = config_from("secondary_source = \"none\"\nbody = \"moon\"\n");
    let engine = Engine::from_config(&config, london(), BodyKind::Moon).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 15, 3, 30, 0).unwrap();

    let first = serde_json::to_string(&engine.evaluate(now)).unwrap();
    let second = serde_json::to_string(&engine.evaluate(now)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unreachable_service_degrades_to_almanac() {
    Log::set_enabled(false);
    let config = config_from(
        r#"
body = "sun"
primary_source = "service"
secondary_source = "almanac"
service_url = "http://127.0.0.1:9"
service_timeout = 2
"#,
    );
    let engine = Engine::from_config(&config, london(), BodyKind::Sun).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
    let result = engine.evaluate(now);

    let service = result.view(SourceKind::Service).unwrap();
    assert!(matches!(service.issue, Some(SourceIssue::ProviderUnavailable(_))));
    assert!(service.rise.is_none() && service.set.is_none());

    let almanac = result.view(SourceKind::Almanac).unwrap();
    assert!(almanac.issue.is_none());
    assert_eq!(almanac.horizon, Some(HorizonState::Above));
    assert!(almanac.rise.is_some() && almanac.set.is_some());

    // The merged view skips the failed preferred source entirely
    let merged = result.merged().unwrap();
    assert_eq!(merged.source, SourceKind::Almanac);
    assert_eq!(merged.rise, almanac.rise);

    let twilight = engine.twilight(now).unwrap();
    assert_eq!(twilight.source, SourceKind::Almanac);
    assert_eq!(twilight.current_phase, Some(TwilightPhase::Day));
}
