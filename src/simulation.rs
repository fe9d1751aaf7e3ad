//! Functionality for running the shading simulation.
//!
//! One run steps through the model's schedule of simulated moments. Each
//! tick derives the sun's position, re-samples every cell's occlusion when
//! the scheduler says so, and appends the results to the output CSV files.
//! Within a tick every cell sees the same sun direction and the same scene,
//! and sampling never feeds on its own output.
use crate::layout::{ConnectorPlacement, PanelPlacement, SolarCell, layout_installation};
use crate::model::Model;
use crate::output::{OutputWriters, write_placements};
use crate::panel::OrientedPanel;
use crate::scene::{Occluder, SceneIndex};
use crate::shadow::{CellShade, SamplingScheduler, sample_cells};
use crate::sun::sun_position;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// The geometry of one run, built once before the time loop.
struct PreparedScene {
    panels: Vec<PanelPlacement>,
    connectors: Vec<ConnectorPlacement>,
    cells: Vec<SolarCell>,
    scene: SceneIndex,
}

/// Lay out the active layout and assemble the occluder index.
///
/// The index contains the model's static occluders plus every placed panel,
/// so rows shade one another.
fn prepare_scene(model: &Model) -> Result<PreparedScene> {
    let layout = model.active_layout()?;

    let mut occluders = model.occluders.clone();
    let mut panels = Vec::new();
    let mut connectors = Vec::new();
    let mut cells = Vec::new();

    for installation in &layout.installations {
        let spec = model
            .panels
            .get(&installation.panel)
            .with_context(|| format!("Unknown panel {}", installation.panel))?;
        let oriented = OrientedPanel::new(spec, installation.platform.orientation);
        let laid_out = layout_installation(installation, spec)?;

        for placement in &laid_out.panels {
            occluders.push(Occluder::from_panel(placement, spec, &oriented));
            cells.extend(crate::layout::solar_cells(placement, spec, &oriented));
        }
        panels.extend(laid_out.panels);
        connectors.extend(laid_out.connectors);
    }

    Ok(PreparedScene {
        panels,
        connectors,
        cells,
        scene: SceneIndex::new(occluders),
    })
}

/// Run a simulation of the given model, writing results to `output_path`.
pub fn run(model: &Model, output_path: &Path) -> Result<()> {
    let layout = model.active_layout()?;
    info!("Simulating layout {} ({})", layout.id, layout.description);

    let prepared = prepare_scene(model)?;
    info!(
        "{} panels, {} cells, {} occluders in the scene",
        prepared.panels.len(),
        prepared.cells.len(),
        prepared.scene.len()
    );

    write_placements(output_path, &prepared.panels, &prepared.connectors)?;

    let schedule = &model.parameters.schedule;
    let scheduler = SamplingScheduler::new(schedule.sampling_interval)?;
    let moments = schedule.moments();
    info!(
        "Simulating {} moments, re-sampling shade every {} tick(s)",
        moments.len(),
        schedule.sampling_interval
    );

    let mut writers = OutputWriters::create(output_path)?;
    let mut shades = vec![CellShade::unshaded(); prepared.cells.len()];
    let mut intensity_sum = 0.0;
    let mut fully_shaded_cell_ticks = 0u64;
    let mut daylight_ticks = 0u64;

    for (tick, moment) in moments.iter().enumerate() {
        let sun = sun_position(moment, &model.parameters.location)?;
        if scheduler.is_due(tick as u64) {
            sample_cells(&prepared.cells, &sun, &prepared.scene, &mut shades);
        }

        writers.write_sun(moment, &sun)?;
        writers.write_cells(moment, &prepared.cells, &shades)?;

        if sun.is_daylight() {
            daylight_ticks += 1;
            intensity_sum += shades.iter().map(|shade| shade.intensity).sum::<f64>();
            fully_shaded_cell_ticks +=
                shades.iter().filter(|shade| shade.intensity >= 1.0).count() as u64;
        }
    }
    writers.flush()?;

    if daylight_ticks > 0 && !prepared.cells.is_empty() {
        let cell_ticks = daylight_ticks as f64 * prepared.cells.len() as f64;
        let fully_shaded_hours =
            fully_shaded_cell_ticks as f64 / prepared.cells.len() as f64 * schedule.hour_step;
        info!(
            "Mean shade intensity over {daylight_ticks} daylight tick(s): {:.1} %",
            intensity_sum / cell_ticks * 100.0
        );
        info!("Fully shaded for {fully_shaded_hours:.1} cell-averaged hour(s)");
    } else {
        info!("No daylight in the simulated schedule");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::model;
    use rstest::rstest;

    #[rstest]
    fn test_prepare_scene_counts(model: Model) {
        let prepared = prepare_scene(&model).unwrap();
        // The fixture's active layout has 2 rows of 3 panels
        assert_eq!(prepared.panels.len(), 6);
        // One connector pair after the first row
        assert_eq!(prepared.connectors.len(), 2);
        // Panels register as occluders alongside the static scene
        assert_eq!(
            prepared.scene.len(),
            model.occluders.len() + prepared.panels.len()
        );
        let cells_per_panel = 18 * 6;
        assert_eq!(prepared.cells.len(), 6 * cells_per_panel);
    }

    #[rstest]
    fn test_run_writes_outputs(model: Model) {
        let output_dir = tempfile::tempdir().unwrap();
        run(&model, output_dir.path()).unwrap();

        for name in [
            "sun_positions.csv",
            "cell_shade.csv",
            "panel_placements.csv",
            "connector_placements.csv",
        ] {
            assert!(
                output_dir.path().join(name).is_file(),
                "{name} should have been written"
            );
        }
    }
}
