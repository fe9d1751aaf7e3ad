//! Solar position calculation.
//!
//! Derives the sun's direction in the sky from a simulated moment and a
//! geographic location, via the classic declination / hour-angle ephemeris
//! (Spencer series for declination and the equation of time, NOAA-style
//! hour angle). Accuracy is well under a degree, which is ample for shading
//! work.
//!
//! # Azimuth convention
//!
//! [`SunVector::azimuth`] is NOT the astronomical azimuth. The astronomical
//! value (0° = north, clockwise) is remapped by +180° modulo 360 so that 0°
//! points along the scene's reference axis, which faces due south: 0° =
//! south, 90° = west, 180° = north, 270° = east. This is a presentation
//! convention fixed here once; consumers must use it as-is rather than
//! re-derive it.
use crate::location::{GeoLocation, SimulatedMoment};
use anyhow::Result;
use chrono::{Datelike, Timelike};
use glam::DVec3;
use std::f64::consts::PI;

/// Distance at which the sun is modelled as a point light, in meters.
///
/// Large enough that rays from any two points of the scene toward the sun
/// are effectively parallel.
pub const SUN_DISTANCE: f64 = 1.0e6;

/// The sun's direction for one moment and location.
///
/// Derived value: recomputed whenever the moment or location changes, never
/// mutated directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunVector {
    /// Remapped azimuth in degrees, [0, 360). See the module docs for the
    /// convention.
    pub azimuth: f64,
    /// Display elevation in degrees, clamped to a minimum of 0.
    pub elevation: f64,
    /// Signed altitude in degrees, retained for the daylight test.
    raw_altitude: f64,
}

impl SunVector {
    /// Whether the sun is above the horizon.
    ///
    /// Uses the raw signed altitude, independent of the clamped display
    /// elevation.
    pub fn is_daylight(&self) -> bool {
        self.raw_altitude > 0.0
    }

    /// The raw signed altitude in degrees (negative below the horizon).
    pub fn raw_altitude(&self) -> f64 {
        self.raw_altitude
    }

    /// Unit vector pointing from the scene toward the sun.
    ///
    /// Uses the raw altitude, so a below-horizon sun points below the
    /// horizontal plane.
    pub fn direction(&self) -> DVec3 {
        // Undo the presentation remap to recover the astronomical azimuth
        let azimuth = (self.azimuth + 180.0).to_radians();
        let altitude = self.raw_altitude.to_radians();
        DVec3::new(
            azimuth.sin() * altitude.cos(),
            azimuth.cos() * altitude.cos(),
            altitude.sin(),
        )
    }

    /// The sun modelled as a point at a fixed large distance.
    pub fn world_position(&self) -> DVec3 {
        self.direction() * SUN_DISTANCE
    }
}

/// Calculate the sun's position for the given moment and location.
///
/// Pure function of its inputs: the moment is resolved to UTC through the
/// location's IANA timezone (daylight-saving aware), then run through the
/// declination / hour-angle formulas. Out-of-range coordinates fail fast
/// rather than produce nonsense angles.
pub fn sun_position(moment: &SimulatedMoment, location: &GeoLocation) -> Result<SunVector> {
    location.validate()?;
    let utc = moment.to_utc(location.timezone)?;

    let day_of_year = utc.ordinal() as f64;
    let utc_hour =
        utc.hour() as f64 + utc.minute() as f64 / 60.0 + utc.second() as f64 / 3600.0;

    // Fractional year in radians (Spencer 1971)
    let gamma = 2.0 * PI / 365.0 * (day_of_year - 1.0 + (utc_hour - 12.0) / 24.0);

    // Solar declination, radians
    let declination = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
        - 0.006758 * (2.0 * gamma).cos()
        + 0.000907 * (2.0 * gamma).sin()
        - 0.002697 * (3.0 * gamma).cos()
        + 0.00148 * (3.0 * gamma).sin();

    // Equation of time, minutes
    let equation_of_time = 229.18
        * (0.000075 + 0.001868 * gamma.cos()
            - 0.032077 * gamma.sin()
            - 0.014615 * (2.0 * gamma).cos()
            - 0.040849 * (2.0 * gamma).sin());

    // True solar time in minutes, then the hour angle: 0 at solar noon,
    // negative in the morning, positive in the afternoon
    let solar_time = utc_hour * 60.0 + equation_of_time + 4.0 * location.longitude;
    let mut hour_angle_deg = (solar_time / 4.0 - 180.0).rem_euclid(360.0);
    if hour_angle_deg > 180.0 {
        hour_angle_deg -= 360.0;
    }
    let hour_angle = hour_angle_deg.to_radians();

    let latitude = location.latitude.to_radians();
    let sin_altitude = latitude.sin() * declination.sin()
        + latitude.cos() * declination.cos() * hour_angle.cos();
    let altitude = sin_altitude.clamp(-1.0, 1.0).asin();

    // Astronomical azimuth from north, clockwise; the acos branch is
    // disambiguated with the hour angle's sign. The denominator vanishes
    // with the sun at the zenith or the observer at a pole
    let denominator = altitude.cos() * latitude.cos();
    let cos_azimuth = if denominator.abs() > 1e-9 {
        (declination.sin() - sin_altitude * latitude.sin()) / denominator
    } else {
        0.0
    };
    let azimuth_from_north = cos_azimuth.clamp(-1.0, 1.0).acos().to_degrees();
    let astronomical_azimuth = if hour_angle_deg > 0.0 {
        360.0 - azimuth_from_north
    } else {
        azimuth_from_north
    };

    let raw_altitude = altitude.to_degrees();

    Ok(SunVector {
        azimuth: (astronomical_azimuth + 180.0).rem_euclid(360.0),
        elevation: raw_altitude.max(0.0),
        raw_altitude,
    })
}
