//! Code for reading panel specifications from CSV files.
use super::*;
use crate::panel::{PanelMap, PanelSpec};
use anyhow::{Context, Result, ensure};
use std::path::Path;

const PANELS_FILE_NAME: &str = "panels.csv";

/// Reads panel specifications from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of validated panel specifications keyed by panel ID, or an error
pub fn read_panels(model_dir: &Path) -> Result<PanelMap> {
    let file_path = model_dir.join(PANELS_FILE_NAME);
    let specs: Vec<PanelSpec> = read_vec_from_csv(&file_path)?;

    let mut panels = PanelMap::new();
    for spec in specs {
        spec.validate().with_context(|| input_err_msg(&file_path))?;
        ensure!(
            !panels.contains_key(&spec.id),
            "{}: Duplicate panel ID {}",
            input_err_msg(&file_path),
            spec.id
        );
        panels.insert(spec.id.clone(), spec.into());
    }

    Ok(panels)
}
