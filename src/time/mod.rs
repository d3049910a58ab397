//! Time handling: the clock abstraction and timezone-bound calendar days.
//!
//! - [`source`]: where "now" comes from (system clock or a pinned instant)
//! - [`local_date`]: calendar-date keys bound to an IANA timezone and the
//!   day-boundary arithmetic built on them

pub mod local_date;
pub mod source;

pub use local_date::{LocalDate, add_local_days, resolve_local};
pub use source::{FixedTimeSource, RealTimeSource, TimeSource};
