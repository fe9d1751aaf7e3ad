//! Code for reading scene occluders from CSV files.
use super::*;
use crate::geometry::Aabb;
use crate::scene::{Occluder, OccluderID};
use anyhow::{Result, ensure};
use glam::DVec3;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const OCCLUDERS_FILE_NAME: &str = "occluders.csv";

/// A row of `occluders.csv`: an axis-aligned box given by center and size.
#[derive(Debug, PartialEq, Deserialize)]
struct OccluderRecord {
    id: OccluderID,
    center_x: f64,
    center_y: f64,
    center_z: f64,
    size_x: f64,
    size_y: f64,
    size_z: f64,
}

/// Reads scene occluders from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The occluder boxes of the static scene, or an error
pub fn read_occluders(model_dir: &Path) -> Result<Vec<Occluder>> {
    let file_path = model_dir.join(OCCLUDERS_FILE_NAME);
    let records: Vec<OccluderRecord> = read_vec_from_csv(&file_path)?;

    let mut seen = HashSet::new();
    let mut occluders = Vec::with_capacity(records.len());
    for record in records {
        for (name, value) in [
            ("size_x", record.size_x),
            ("size_y", record.size_y),
            ("size_z", record.size_z),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{}: Occluder {}: {name} must be a positive number",
                input_err_msg(&file_path),
                record.id
            );
        }
        ensure!(
            seen.insert(record.id.clone()),
            "{}: Duplicate occluder ID {}",
            input_err_msg(&file_path),
            record.id
        );

        occluders.push(Occluder {
            id: record.id,
            bounds: Aabb::from_center_size(
                DVec3::new(record.center_x, record.center_y, record.center_z),
                DVec3::new(record.size_x, record.size_y, record.size_z),
            ),
        });
    }

    Ok(occluders)
}
