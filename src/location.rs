//! Geographic locations and simulated moments.
//!
//! A [`GeoLocation`] pairs latitude/longitude with an IANA timezone so that a
//! wall-clock moment can be mapped to the correct UTC instant across
//! daylight-saving transitions.
use anyhow::{Context, Result, bail};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::error::Error;
use std::fmt;

/// Indicates that a location's coordinates lie outside the physical range.
#[derive(Debug, Clone)]
pub struct InvalidLocation {
    message: String,
}

impl InvalidLocation {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for InvalidLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid location: {}", self.message)
    }
}

impl Error for InvalidLocation {}

/// A fixed geographic location. Configured once per model, immutable.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoLocation {
    /// Latitude in decimal degrees, positive north.
    pub latitude: f64,
    /// Longitude in decimal degrees, positive east.
    pub longitude: f64,
    /// IANA timezone identifier (e.g. `Europe/Amsterdam`).
    pub timezone: Tz,
}

impl GeoLocation {
    /// Create a location, rejecting out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Result<Self, InvalidLocation> {
        let location = Self {
            latitude,
            longitude,
            timezone,
        };
        location.validate()?;
        Ok(location)
    }

    /// Check that the coordinates lie within the physical range.
    pub fn validate(&self) -> Result<(), InvalidLocation> {
        if !self.latitude.is_finite() || self.latitude.abs() > 90.0 {
            return Err(InvalidLocation::new(format!(
                "latitude {} is outside the range -90 to 90",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || self.longitude.abs() > 180.0 {
            return Err(InvalidLocation::new(format!(
                "longitude {} is outside the range -180 to 180",
                self.longitude
            )));
        }

        Ok(())
    }
}

/// A calendar date with a decimal hour of day in [0, 24).
///
/// Fractional hours are minutes and seconds (16.9 is 16:54). Produced by the
/// schedule (or an interactive front end); the engine only reads it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedMoment {
    /// The calendar date in the model's local timezone.
    pub date: NaiveDate,
    /// Decimal hour of day, 0 inclusive to 24 exclusive.
    pub hour: f64,
}

impl SimulatedMoment {
    /// Resolve this wall-clock moment to a UTC instant in `timezone`.
    ///
    /// Daylight-saving shifts are applied by the timezone database, so the
    /// same decimal hour maps to different UTC instants across the year. An
    /// ambiguous local time (clocks rolled back) resolves to its first
    /// occurrence; a non-existent one (clocks rolled forward) is an error.
    pub fn to_utc(&self, timezone: Tz) -> Result<DateTime<Utc>> {
        if !(0.0..24.0).contains(&self.hour) {
            bail!("Hour of day {} is outside the range [0, 24)", self.hour);
        }

        let seconds = (self.hour * 3600.0).round().min(86399.0) as u32;
        let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
            .context("Could not convert decimal hour to a time of day")?;
        let local = self.date.and_time(time);

        let resolved = match timezone.from_local_datetime(&local) {
            LocalResult::Single(instant) => instant,
            LocalResult::Ambiguous(first, _) => first,
            LocalResult::None => bail!(
                "Local time {local} does not exist in timezone {timezone} (daylight-saving gap)"
            ),
        };

        Ok(resolved.with_timezone(&Utc))
    }
}
