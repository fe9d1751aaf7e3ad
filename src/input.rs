//! Common routines for handling input data.
//!
//! A model directory contains `model.toml` plus the CSV tables for panels,
//! occluders and layouts. All files are read and validated up front by
//! [`load_model`]; structural errors surface here with file context, never
//! mid-simulation.
pub mod layout;
pub mod occluder;
pub mod panel;

use crate::layout::layout_installation;
use crate::model::{Model, ModelParameters};
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Generate the standard error message prefix for a bad input file
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let contents = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    toml::from_str(&contents).with_context(|| input_err_msg(file_path))
}

/// Read a series of type `T`s from a CSV file into a `Vec<T>`.
///
/// # Arguments
///
/// * `file_path`: Path to the CSV file
pub fn read_vec_from_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path).with_context(|| input_err_msg(file_path))?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let record: T = result.with_context(|| input_err_msg(file_path))?;
        vec.push(record);
    }
    ensure!(!vec.is_empty(), "{}: CSV file cannot be empty", input_err_msg(file_path));

    Ok(vec)
}

/// Read a model from the specified directory, validating it eagerly.
///
/// Every layout is laid out once here so that configuration errors (zero
/// columns, a connector shorter than the panel footprint) surface at load
/// time. Only the active layout's failure blocks the run; an invalid
/// inactive layout is reported as a warning and simply cannot be selected.
pub fn load_model(model_dir: &Path) -> Result<Model> {
    let parameters = ModelParameters::from_path(model_dir)?;
    let panels = panel::read_panels(model_dir)?;
    let occluders = occluder::read_occluders(model_dir)?;
    let layouts = layout::read_layouts(model_dir, &panels)?;

    ensure!(
        layouts.contains_key(&parameters.scene.layout),
        "model.toml selects unknown layout {}",
        parameters.scene.layout
    );

    for layout_def in layouts.values() {
        for installation in &layout_def.installations {
            let spec = &panels[&installation.panel];
            match layout_installation(installation, spec) {
                Ok(_) => {}
                Err(err) if layout_def.id == parameters.scene.layout => {
                    return Err(err)
                        .with_context(|| format!("Layout {} cannot be selected", layout_def.id));
                }
                Err(err) => {
                    warn!("Layout {} is invalid and cannot be selected: {err}", layout_def.id);
                }
            }
        }
    }

    Ok(Model {
        parameters,
        panels,
        occluders,
        layouts,
    })
}
