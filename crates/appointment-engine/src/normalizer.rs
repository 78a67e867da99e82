//! Time zone normalization between wall-clock values and absolute instants.
//!
//! Two zones matter to the engine: the **business zone**, whose clock defines
//! opening hours, and the **operator zone**, the zone of the machine the user
//! is typing into. Both are passed in explicitly; nothing here reads the host
//! clock or a global zone setting.
//!
//! # Functions
//!
//! - [`to_instant`] — wall-clock + zone → UTC instant
//! - [`to_wall_clock`] — UTC instant + zone → wall-clock
//! - [`convert`] — wall-clock in one zone → wall-clock in another
//!
//! # DST transitions
//!
//! A wall-clock time repeated by a fall-back transition resolves to the
//! earlier of its two instants. A wall-clock time skipped by a spring-forward
//! transition is read with the offset in force before the gap, which moves it
//! forward by the gap length (02:30 on a US spring-forward day becomes 03:30).

use chrono::{Duration, LocalResult, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::model::{Instant, WallClock};

/// Zone whose clock defines business hours unless configured otherwise.
pub const DEFAULT_BUSINESS_ZONE: Tz = chrono_tz::America::New_York;

/// Resolve a wall-clock value in `zone` to an absolute instant.
pub fn to_instant(wall: WallClock, zone: Tz) -> Instant {
    let naive = wall.naive();
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => {
            debug!(%wall, zone = %zone, "ambiguous wall-clock time, using earlier offset");
            earliest.with_timezone(&Utc)
        }
        LocalResult::None => {
            // Offsets never change twice within a day, so a day earlier is
            // safely on the far side of the gap.
            let before = zone.offset_from_utc_datetime(&(naive - Duration::days(1)));
            let offset_secs = i64::from(before.fix().local_minus_utc());
            warn!(%wall, zone = %zone, "wall-clock time falls in a DST gap, shifting forward");
            Utc.from_utc_datetime(&(naive - Duration::seconds(offset_secs)))
        }
    }
}

/// Render an instant as wall-clock time in `zone`.
pub fn to_wall_clock(instant: Instant, zone: Tz) -> WallClock {
    WallClock::from_naive(instant.with_timezone(&zone).naive_local())
}

/// Re-express a wall-clock value from one zone in another.
pub fn convert(wall: WallClock, from: Tz, to: Tz) -> WallClock {
    to_wall_clock(to_instant(wall, from), to)
}

/// Parse an IANA timezone string into `Tz`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidTimezone`] for names the tz database does not know.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{s}'")))
}

/// The business/operator zone pair, fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    business: Tz,
    operator: Tz,
}

impl TimeNormalizer {
    pub fn new(business: Tz, operator: Tz) -> Self {
        Self { business, operator }
    }

    /// Build from IANA names, e.g. `("America/New_York", "Europe/London")`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] if either name is unknown.
    pub fn from_names(business: &str, operator: &str) -> Result<Self> {
        Ok(Self::new(parse_timezone(business)?, parse_timezone(operator)?))
    }

    pub fn business_zone(&self) -> Tz {
        self.business
    }

    pub fn operator_zone(&self) -> Tz {
        self.operator
    }

    /// An operator-entered wall-clock value as an instant.
    pub fn operator_instant(&self, wall: WallClock) -> Instant {
        to_instant(wall, self.operator)
    }

    pub fn operator_wall(&self, instant: Instant) -> WallClock {
        to_wall_clock(instant, self.operator)
    }

    pub fn business_wall(&self, instant: Instant) -> WallClock {
        to_wall_clock(instant, self.business)
    }

    pub fn operator_to_business(&self, wall: WallClock) -> WallClock {
        convert(wall, self.operator, self.business)
    }

    pub fn business_to_operator(&self, wall: WallClock) -> WallClock {
        convert(wall, self.business, self.operator)
    }
}
