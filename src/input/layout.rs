//! Code for reading rooftop layouts from CSV files.
//!
//! A layout preset is assembled from three tables: `layouts.csv` names the
//! presets, `installations.csv` anchors each panel run and its platform
//! parameters, and `rows.csv` lists the rows of every run with their
//! connector lengths.
use super::*;
use crate::id::IDCollection;
use anyhow::{Context, Result, ensure};
use crate::layout::{
    Installation, InstallationID, Layout, LayoutMap, PlatformSpec, RowConfiguration,
};
use crate::panel::{Orientation, PanelMap};
use glam::DVec3;
use itertools::Itertools;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const LAYOUTS_FILE_NAME: &str = "layouts.csv";
const INSTALLATIONS_FILE_NAME: &str = "installations.csv";
const ROWS_FILE_NAME: &str = "rows.csv";

/// A row of `layouts.csv`.
#[derive(Debug, PartialEq, Deserialize)]
struct LayoutRecord {
    id: String,
    description: String,
}

/// A row of `installations.csv`.
#[derive(Debug, PartialEq, Deserialize)]
struct InstallationRecord {
    layout_id: String,
    id: InstallationID,
    panel_id: String,
    position_x: f64,
    position_y: f64,
    position_z: f64,
    rotation_degrees: f64,
    tilt_degrees: f64,
    platform_length: f64,
    platform_thickness: f64,
    mount_offset: f64,
    orientation: Orientation,
}

/// A row of `rows.csv`. An empty `connector_length` marks a sub-run tail.
#[derive(Debug, PartialEq, Deserialize)]
struct RowRecord {
    installation_id: String,
    row: usize,
    columns: u32,
    connector_length: Option<f64>,
}

/// Reads layout presets from the model directory's CSV files.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `panels` - Panel specifications, for checking references
///
/// # Returns
///
/// A map of layouts keyed by ID, or an error. References between the three
/// files (and to panel IDs) are checked here; geometric validity is checked
/// separately by laying each layout out.
pub fn read_layouts(model_dir: &Path, panels: &PanelMap) -> Result<LayoutMap> {
    let layouts_path = model_dir.join(LAYOUTS_FILE_NAME);
    let installations_path = model_dir.join(INSTALLATIONS_FILE_NAME);
    let rows_path = model_dir.join(ROWS_FILE_NAME);

    let layout_records: Vec<LayoutRecord> = read_vec_from_csv(&layouts_path)?;
    let installation_records: Vec<InstallationRecord> = read_vec_from_csv(&installations_path)?;
    let row_records: Vec<RowRecord> = read_vec_from_csv(&rows_path)?;

    let mut layouts = LayoutMap::new();
    for record in layout_records {
        ensure!(
            !layouts.contains_key(record.id.as_str()),
            "{}: Duplicate layout ID {}",
            input_err_msg(&layouts_path),
            record.id
        );
        layouts.insert(
            record.id.clone().into(),
            Layout {
                id: record.id.into(),
                description: record.description,
                installations: Vec::new(),
            },
        );
    }

    // Group row configurations by installation, ordered by row index
    let mut rows_by_installation: HashMap<String, Vec<RowRecord>> = HashMap::new();
    for record in row_records {
        rows_by_installation
            .entry(record.installation_id.clone())
            .or_default()
            .push(record);
    }

    for record in installation_records {
        let layout_id = layouts
            .get_id_by_str(&record.layout_id)
            .with_context(|| input_err_msg(&installations_path))?;
        let panel_id = panels
            .get_id_by_str(&record.panel_id)
            .with_context(|| input_err_msg(&installations_path))?;

        let row_records = rows_by_installation
            .remove(record.id.0.as_ref())
            .with_context(|| {
                format!(
                    "{}: No rows defined for installation {}",
                    input_err_msg(&rows_path),
                    record.id
                )
            })?;
        let rows = collect_rows(&record.id, row_records)
            .with_context(|| input_err_msg(&rows_path))?;

        let platform = PlatformSpec {
            tilt_degrees: record.tilt_degrees,
            length: record.platform_length,
            thickness: record.platform_thickness,
            mount_offset: record.mount_offset,
            orientation: record.orientation,
        };
        platform
            .validate()
            .with_context(|| {
                format!(
                    "{}: Installation {}",
                    input_err_msg(&installations_path),
                    record.id
                )
            })?;

        layouts
            .get_mut(layout_id.0.as_ref())
            .unwrap()
            .installations
            .push(Installation {
                id: record.id,
                panel: panel_id,
                platform,
                rows,
                position: DVec3::new(record.position_x, record.position_y, record.position_z),
                rotation_degrees: record.rotation_degrees,
            });
    }

    ensure!(
        rows_by_installation.is_empty(),
        "{}: Rows defined for unknown installation(s): {}",
        input_err_msg(&rows_path),
        rows_by_installation.keys().sorted().join(", ")
    );
    for layout in layouts.values() {
        ensure!(
            !layout.installations.is_empty(),
            "{}: Layout {} has no installations",
            input_err_msg(&installations_path),
            layout.id
        );
    }

    Ok(layouts)
}

/// Order an installation's row records and check the indices are 0-based
/// and contiguous.
fn collect_rows(
    installation: &InstallationID,
    mut records: Vec<RowRecord>,
) -> Result<Vec<RowConfiguration>> {
    records.sort_by_key(|record| record.row);
    for (expected, record) in records.iter().enumerate() {
        ensure!(
            record.row == expected,
            "Installation {installation}: row indices must be unique and contiguous from 0 \
             (found {} where {expected} was expected)",
            record.row
        );
    }

    Ok(records
        .into_iter()
        .map(|record| RowConfiguration {
            columns: record.columns,
            connector_length: record.connector_length,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::panel::PanelSpec;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn create_file(dir_path: &Path, name: &str, contents: &str) {
        let mut file = File::create(dir_path.join(name)).unwrap();
        writeln!(file, "{contents}").unwrap();
    }

    fn create_layout_files(dir_path: &Path) {
        create_file(
            dir_path,
            LAYOUTS_FILE_NAME,
            "id,description
current,Current configuration
sw-reposition,Panels moved to the south-west roof",
        );
        create_file(
            dir_path,
            INSTALLATIONS_FILE_NAME,
            "layout_id,id,panel_id,position_x,position_y,position_z,rotation_degrees,\
tilt_degrees,platform_length,platform_thickness,mount_offset,orientation
current,main-roof,mono-420,0.0,0.0,0.0,0.0,13.0,1.2,0.04,0.05,landscape
sw-reposition,sw-roof,mono-420,-4.0,2.0,0.0,45.0,13.0,1.2,0.04,0.05,portrait",
        );
        create_file(
            dir_path,
            ROWS_FILE_NAME,
            "installation_id,row,columns,connector_length
main-roof,0,3,2.0
main-roof,1,3,
sw-roof,0,2,2.4
sw-roof,1,2,",
        );
    }

    fn panels() -> PanelMap {
        let spec = PanelSpec {
            id: "mono-420".into(),
            length: 1.722,
            width: 1.134,
            thickness: 0.030,
            cell_columns: 18,
            cell_rows: 6,
            strings: 3,
        };
        PanelMap::from([(spec.id.clone(), spec.into())])
    }

    #[test]
    fn test_read_layouts() {
        let dir = tempdir().unwrap();
        create_layout_files(dir.path());

        let layouts = read_layouts(dir.path(), &panels()).unwrap();
        assert_eq!(layouts.len(), 2);

        let current = &layouts["current"];
        assert_eq!(current.installations.len(), 1);
        let installation = &current.installations[0];
        assert_eq!(installation.id, "main-roof".into());
        assert_eq!(installation.rows.len(), 2);
        assert_eq!(installation.rows[0].connector_length, Some(2.0));
        // The blank connector field marks the tail of the run
        assert_eq!(installation.rows[1].connector_length, None);
        assert_eq!(installation.platform.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_read_layouts_rejects_unknown_panel() {
        let dir = tempdir().unwrap();
        create_layout_files(dir.path());

        let empty = PanelMap::new();
        assert!(read_layouts(dir.path(), &empty).is_err());
    }

    #[test]
    fn test_read_layouts_rejects_unknown_layout_reference() {
        let dir = tempdir().unwrap();
        create_layout_files(dir.path());
        create_file(
            dir.path(),
            LAYOUTS_FILE_NAME,
            "id,description
current,Current configuration",
        );

        // sw-roof now references a layout that no longer exists
        assert!(read_layouts(dir.path(), &panels()).is_err());
    }

    #[test]
    fn test_read_layouts_rejects_missing_rows() {
        let dir = tempdir().unwrap();
        create_layout_files(dir.path());
        create_file(
            dir.path(),
            ROWS_FILE_NAME,
            "installation_id,row,columns,connector_length
main-roof,0,3,2.0",
        );

        let err = read_layouts(dir.path(), &panels()).unwrap_err();
        assert!(format!("{err:#}").contains("No rows defined"));
    }

    #[test]
    fn test_collect_rows_rejects_gaps() {
        let records = vec![
            RowRecord {
                installation_id: "main-roof".to_string(),
                row: 0,
                columns: 3,
                connector_length: Some(2.0),
            },
            RowRecord {
                installation_id: "main-roof".to_string(),
                row: 2,
                columns: 3,
                connector_length: None,
            },
        ];
        assert_error!(
            collect_rows(&"main-roof".into(), records),
            "Installation main-roof: row indices must be unique and contiguous from 0 \
             (found 2 where 1 was expected)"
        );
    }
}
