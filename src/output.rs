//! The module responsible for writing output data to disk.
use crate::layout::{ConnectorPlacement, InstallationID, PanelPlacement, SolarCell};
use crate::location::SimulatedMoment;
use crate::shadow::CellShade;
use crate::sun::SunVector;
use anyhow::{Context, Result, bail, ensure};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "solshade_results";

/// The output file name for the sun track
const SUN_POSITIONS_FILE_NAME: &str = "sun_positions.csv";

/// The output file name for per-cell shade results
const CELL_SHADE_FILE_NAME: &str = "cell_shade.csv";

/// The output file name for panel placements
const PANEL_PLACEMENTS_FILE_NAME: &str = "panel_placements.csv";

/// The output file name for connector placements
const CONNECTOR_PLACEMENTS_FILE_NAME: &str = "connector_placements.csv";

/// Get the default output directory for the model at the specified path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for a model run.
///
/// # Returns
///
/// Whether an existing directory was replaced
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let existed = output_dir.is_dir();
    if existed {
        if !overwrite {
            bail!(
                "Output directory {} already exists. Pass --overwrite to replace it.",
                output_dir.display()
            );
        }
        fs::remove_dir_all(output_dir)?;
    }
    fs::create_dir_all(output_dir)?;

    Ok(existed)
}

/// Represents a row in the sun positions CSV file
#[derive(Serialize, Debug, PartialEq)]
struct SunPositionRow {
    date: NaiveDate,
    hour: f64,
    azimuth: f64,
    elevation: f64,
    is_daylight: bool,
}

/// Represents a row in the cell shade CSV file
#[derive(Serialize, Debug, PartialEq)]
struct CellShadeRow {
    date: NaiveDate,
    hour: f64,
    installation: InstallationID,
    panel_row: usize,
    panel_column: usize,
    cell_row: u32,
    cell_column: u32,
    string: u32,
    intensity: f64,
    bucket: String,
    color: String,
    opacity: f64,
}

/// Represents a row in the panel placements CSV file
#[derive(Serialize, Debug, PartialEq)]
struct PanelPlacementRow {
    installation: InstallationID,
    row: usize,
    column: usize,
    center_x: f64,
    center_y: f64,
    center_z: f64,
    rotation_x: f64,
    rotation_y: f64,
    rotation_z: f64,
}

/// Represents a row in the connector placements CSV file
#[derive(Serialize, Debug, PartialEq)]
struct ConnectorPlacementRow {
    installation: InstallationID,
    row: usize,
    side: String,
    length: f64,
    center_x: f64,
    center_y: f64,
    center_z: f64,
    rotation_x: f64,
    rotation_y: f64,
    rotation_z: f64,
}

/// Write the placements consumed by the renderer to CSV files.
///
/// Positions are centers in meters; rotations are Euler angles in radians.
pub fn write_placements(
    output_dir: &Path,
    panels: &[PanelPlacement],
    connectors: &[ConnectorPlacement],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_dir.join(PANEL_PLACEMENTS_FILE_NAME))?;
    for placement in panels {
        writer.serialize(PanelPlacementRow {
            installation: placement.installation.clone(),
            row: placement.row,
            column: placement.column,
            center_x: placement.center.x,
            center_y: placement.center.y,
            center_z: placement.center.z,
            rotation_x: placement.rotation.x,
            rotation_y: placement.rotation.y,
            rotation_z: placement.rotation.z,
        })?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_path(output_dir.join(CONNECTOR_PLACEMENTS_FILE_NAME))?;
    for placement in connectors {
        writer.serialize(ConnectorPlacementRow {
            installation: placement.installation.clone(),
            row: placement.row,
            side: placement.side.to_string(),
            length: placement.length,
            center_x: placement.center.x,
            center_y: placement.center.y,
            center_z: placement.center.z,
            rotation_x: placement.rotation.x,
            rotation_y: placement.rotation.y,
            rotation_z: placement.rotation.z,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// The open CSV writers for a simulation run.
pub struct OutputWriters {
    sun: csv::Writer<File>,
    cells: csv::Writer<File>,
}

impl OutputWriters {
    /// Open the output files in the given directory.
    pub fn create(output_dir: &Path) -> Result<Self> {
        Ok(Self {
            sun: csv::Writer::from_path(output_dir.join(SUN_POSITIONS_FILE_NAME))?,
            cells: csv::Writer::from_path(output_dir.join(CELL_SHADE_FILE_NAME))?,
        })
    }

    /// Append the sun's position for one moment.
    pub fn write_sun(&mut self, moment: &SimulatedMoment, sun: &SunVector) -> Result<()> {
        self.sun.serialize(SunPositionRow {
            date: moment.date,
            hour: moment.hour,
            azimuth: sun.azimuth,
            elevation: sun.elevation,
            is_daylight: sun.is_daylight(),
        })?;

        Ok(())
    }

    /// Append every cell's shade for one moment.
    pub fn write_cells(
        &mut self,
        moment: &SimulatedMoment,
        cells: &[SolarCell],
        shades: &[CellShade],
    ) -> Result<()> {
        ensure!(
            cells.len() == shades.len(),
            "Cell and shade counts do not match"
        );

        for (cell, shade) in cells.iter().zip(shades) {
            self.cells.serialize(CellShadeRow {
                date: moment.date,
                hour: moment.hour,
                installation: cell.installation.clone(),
                panel_row: cell.panel_row,
                panel_column: cell.panel_column,
                cell_row: cell.cell_row,
                cell_column: cell.cell_column,
                string: cell.string_index,
                intensity: shade.intensity,
                bucket: shade.bucket.to_string(),
                color: shade.bucket.color().to_string(),
                opacity: shade.bucket.opacity(),
            })?;
        }

        Ok(())
    }

    /// Flush both writers.
    pub fn flush(&mut self) -> Result<()> {
        self.sun.flush()?;
        self.cells.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // A second run without --overwrite refuses to clobber the results
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
    }

    #[test]
    fn test_get_output_dir() {
        let dir = tempdir().unwrap();
        let model_dir = dir.path().join("rooftop");
        fs::create_dir(&model_dir).unwrap();

        let output_dir = get_output_dir(&model_dir).unwrap();
        assert!(output_dir.ends_with("rooftop"));
        assert!(output_dir.starts_with(OUTPUT_DIRECTORY_ROOT));
    }
}
