//! Code for simulation models.
//!
//! A model directory holds `model.toml` (location, schedule and scene
//! parameters, represented by [`ModelParameters`]) alongside the CSV tables
//! read by the [`crate::input`] module. Everything is validated eagerly at
//! load time; nothing is discovered mid-run.
use crate::input::{input_err_msg, read_toml};
use crate::layout::{Layout, LayoutID, LayoutMap};
use crate::location::{GeoLocation, SimulatedMoment};
use crate::panel::PanelMap;
use crate::scene::Occluder;
use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

/// Default number of ticks between occlusion sampling passes
fn default_sampling_interval() -> u64 {
    1
}

/// Represents the contents of the entire model file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelParameters {
    /// Where the modelled rooftop is.
    pub location: GeoLocation,
    /// The time range the simulation steps through.
    pub schedule: Schedule,
    /// Scene parameters.
    pub scene: SceneParameters,
}

/// The simulated time range: a span of dates with a daily span of hours.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Schedule {
    /// First simulated date (inclusive).
    pub start_date: NaiveDate,
    /// Last simulated date (inclusive).
    pub end_date: NaiveDate,
    /// First simulated hour of each day (inclusive), decimal.
    pub hour_start: f64,
    /// End of the simulated hours of each day (exclusive), decimal.
    pub hour_end: f64,
    /// Step between simulated moments, in decimal hours.
    pub hour_step: f64,
    /// Number of ticks between occlusion sampling passes.
    ///
    /// Ray queries dominate the cost of a tick, so shade is re-sampled only
    /// every N ticks; in between, cells keep their last intensity.
    #[serde(default = "default_sampling_interval")]
    pub sampling_interval: u64,
}

impl Schedule {
    /// The simulated moments of the schedule, in order.
    pub fn moments(&self) -> Vec<SimulatedMoment> {
        let mut moments = Vec::new();
        let mut date = self.start_date;
        while date <= self.end_date {
            let mut hour = self.hour_start;
            while hour < self.hour_end {
                moments.push(SimulatedMoment { date, hour });
                hour += self.hour_step;
            }
            let Some(next) = date.succ_opt() else {
                break;
            };
            date = next;
        }

        moments
    }
}

/// Scene parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneParameters {
    /// The layout preset to simulate.
    pub layout: LayoutID,
}

/// Check that the `schedule` section is valid
fn check_schedule(schedule: &Schedule) -> Result<()> {
    ensure!(
        schedule.start_date <= schedule.end_date,
        "`start_date` must not be after `end_date`"
    );
    ensure!(
        (0.0..24.0).contains(&schedule.hour_start),
        "`hour_start` must be in the range [0, 24)"
    );
    ensure!(
        schedule.hour_end > schedule.hour_start && schedule.hour_end <= 24.0,
        "`hour_end` must be greater than `hour_start` and at most 24"
    );
    ensure!(
        schedule.hour_step.is_finite() && schedule.hour_step > 0.0,
        "`hour_step` must be a positive number"
    );
    ensure!(
        schedule.sampling_interval >= 1,
        "`sampling_interval` cannot be zero"
    );

    Ok(())
}

impl ModelParameters {
    /// Read the model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error
    /// if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let params: ModelParameters = read_toml(&file_path)?;
        params
            .validate()
            .with_context(|| input_err_msg(&file_path))?;

        Ok(params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        self.location.validate()?;
        check_schedule(&self.schedule)?;

        Ok(())
    }
}

/// A complete model: parameters plus the tables read from the model
/// directory.
#[derive(Debug, Clone)]
pub struct Model {
    /// The contents of `model.toml`.
    pub parameters: ModelParameters,
    /// Available panel models.
    pub panels: PanelMap,
    /// Static scene occluders (chimneys, parapets, the house body).
    pub occluders: Vec<Occluder>,
    /// Available layout presets.
    pub layouts: LayoutMap,
}

impl Model {
    /// The layout preset selected in `model.toml`.
    pub fn active_layout(&self) -> Result<&Layout> {
        self.layouts
            .get(&self.parameters.scene.layout)
            .with_context(|| format!("Unknown layout {}", self.parameters.scene.layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn valid_schedule() -> Schedule {
        Schedule {
            start_date: NaiveDate::from_ymd_opt(2024, 8, 11).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 8, 12).unwrap(),
            hour_start: 6.0,
            hour_end: 22.0,
            hour_step: 0.5,
            sampling_interval: 4,
        }
    }

    #[test]
    fn test_moments_cover_dates_and_hours() {
        let schedule = valid_schedule();
        let moments = schedule.moments();
        // 32 half-hour steps per day over two days
        assert_eq!(moments.len(), 64);
        assert_eq!(moments[0].date, schedule.start_date);
        assert_eq!(moments[0].hour, 6.0);
        assert_eq!(moments.last().unwrap().date, schedule.end_date);
        assert!(moments.iter().all(|m| m.hour < schedule.hour_end));
    }

    #[test]
    fn test_check_schedule_rejects_reversed_dates() {
        let mut schedule = valid_schedule();
        schedule.end_date = NaiveDate::from_ymd_opt(2024, 8, 10).unwrap();
        assert_error!(
            check_schedule(&schedule),
            "`start_date` must not be after `end_date`"
        );
    }

    #[test]
    fn test_check_schedule_rejects_bad_hours() {
        let mut schedule = valid_schedule();
        schedule.hour_start = 24.0;
        assert!(check_schedule(&schedule).is_err());

        let mut schedule = valid_schedule();
        schedule.hour_end = schedule.hour_start;
        assert!(check_schedule(&schedule).is_err());

        let mut schedule = valid_schedule();
        schedule.hour_step = 0.0;
        assert!(check_schedule(&schedule).is_err());
    }

    #[test]
    fn test_check_schedule_rejects_zero_sampling_interval() {
        let mut schedule = valid_schedule();
        schedule.sampling_interval = 0;
        assert_error!(
            check_schedule(&schedule),
            "`sampling_interval` cannot be zero"
        );
    }

    #[test]
    fn test_from_path_reads_and_validates() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "[location]
latitude = 51.9553
longitude = 5.2256
timezone = \"Europe/Amsterdam\"

[schedule]
start_date = \"2024-08-11\"
end_date = \"2024-08-11\"
hour_start = 6.0
hour_end = 22.0
hour_step = 0.5

[scene]
layout = \"current\""
            )
            .unwrap();
        }

        let params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.scene.layout, "current".into());
        // The sampling interval falls back to its default
        assert_eq!(params.schedule.sampling_interval, 1);
    }

    #[test]
    fn test_from_path_rejects_invalid_location() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "[location]
latitude = 95.0
longitude = 5.2256
timezone = \"Europe/Amsterdam\"

[schedule]
start_date = \"2024-08-11\"
end_date = \"2024-08-11\"
hour_start = 6.0
hour_end = 22.0
hour_step = 0.5

[scene]
layout = \"current\""
            )
            .unwrap();
        }

        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempdir().unwrap();
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }
}
