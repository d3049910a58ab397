//! Application-wide constants and defaults.

// # Refresh cadences (seconds)
pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 60;
pub const DEFAULT_TWILIGHT_INTERVAL: u64 = 600;
pub const DEFAULT_EVENTS_INTERVAL: u64 = 1800;

pub const MINIMUM_REFRESH_INTERVAL: u64 = 10;
pub const MAXIMUM_REFRESH_INTERVAL: u64 = 86_400;

// # Sources
pub const DEFAULT_PRIMARY_SOURCE: &str = "almanac";
pub const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_ELEVATION: f64 = 0.0; // metres above sea level
pub const MINIMUM_ELEVATION: f64 = -500.0;
pub const MAXIMUM_ELEVATION: f64 = 9_000.0;

pub const DEFAULT_SERVICE_TIMEOUT: u64 = 10; // seconds
pub const MINIMUM_SERVICE_TIMEOUT: u64 = 1;
pub const MAXIMUM_SERVICE_TIMEOUT: u64 = 120;

// # Reconciliation
/// Days searched forward for the next rise while the body is below the horizon.
pub const DEFAULT_RISE_SEARCH_DAYS: u32 = 1;
pub const MAXIMUM_RISE_SEARCH_DAYS: u32 = 14;

// # Default body when the config does not name one
pub const DEFAULT_BODY: &str = "moon";

// # Twilight weights (visual width multipliers, not durations)
pub const DEFAULT_WEIGHT_DARK: f64 = 1.0;
pub const DEFAULT_WEIGHT_ASTRONOMICAL: f64 = 2.0;
pub const DEFAULT_WEIGHT_NAUTICAL: f64 = 2.0;
pub const DEFAULT_WEIGHT_CIVIL: f64 = 2.0;
pub const DEFAULT_WEIGHT_DAY: f64 = 1.0;
pub const MAXIMUM_TWILIGHT_WEIGHT: f64 = 100.0;

// # Almanac geometry (degrees)
/// Apparent altitude of the upper limb at rise/set: refraction plus semi-diameter.
pub const HORIZON_ALTITUDE: f64 = -50.0 / 60.0;
pub const CIVIL_TWILIGHT_ALTITUDE: f64 = -6.0;
pub const NAUTICAL_TWILIGHT_ALTITUDE: f64 = -12.0;
pub const ASTRONOMICAL_TWILIGHT_ALTITUDE: f64 = -18.0;

// # Almanac search (seconds)
pub const SEARCH_STEP_SECONDS: i64 = 600;
pub const SEARCH_EPSILON_SECONDS: i64 = 1;

// # Place store
pub const LAST_PLACE_KEY: &str = "last_place";

// # Exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
