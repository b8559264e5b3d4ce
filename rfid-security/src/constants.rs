//! Protocol security constants

/// Payload prefix that identifies a handshake request
pub const HANDSHAKE_INIT: &str = "HDSHK_INIT";

/// Separator between the claimed hash and the counter triple in a handshake tag
pub const HANDSHAKE_TAG_SEPARATOR: char = '&';

/// Separator between the fields of a counter triple
pub const COUNTER_SEPARATOR: char = ':';

/// Sentinel tag sent instead of a hash when the counter space is exhausted
pub const REHANDSHAKE: &str = "REHANDSHAKE";

/// Handshake secret used when none is configured
pub const DEFAULT_HANDSHAKE_SECRET: &str = "default_handshake_key";

/// Operational secret used when none is configured
pub const DEFAULT_OPERATIONAL_SECRET: &str = "default_secret_key";

/// Range the host draws the initial counter from
pub const INIT_RANGE: std::ops::RangeInclusive<u32> = 1..=1000;

/// Range the host draws the counter step from
pub const STEP_RANGE: std::ops::RangeInclusive<u32> = 1..=25;

/// Range the host draws the counter limit from
pub const LIMIT_RANGE: std::ops::RangeInclusive<u32> = 4000..=9000;
