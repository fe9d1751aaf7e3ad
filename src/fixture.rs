//! Fixtures for tests
use crate::geometry::Aabb;
use crate::layout::{
    Installation, Layout, LayoutMap, PlatformSpec, RowConfiguration, layout_installation,
    solar_cells,
};
use crate::location::{GeoLocation, SimulatedMoment};
use crate::model::{Model, ModelParameters, SceneParameters, Schedule};
use crate::panel::{Orientation, OrientedPanel, PanelMap, PanelSpec};
use crate::scene::{Occluder, SceneIndex};
use crate::sun::{SunVector, sun_position};
use chrono::NaiveDate;
use glam::DVec3;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn culemborg() -> GeoLocation {
    GeoLocation::new(51.9553, 5.2256, "Europe/Amsterdam".parse().unwrap()).unwrap()
}

#[fixture]
pub fn panel_spec() -> PanelSpec {
    PanelSpec {
        id: "mono-420".into(),
        length: 1.722,
        width: 1.134,
        thickness: 0.030,
        cell_columns: 18,
        cell_rows: 6,
        strings: 3,
    }
}

#[fixture]
pub fn platform() -> PlatformSpec {
    PlatformSpec {
        tilt_degrees: 25.0,
        length: 1.2,
        thickness: 0.04,
        mount_offset: 0.05,
        orientation: Orientation::Landscape,
    }
}

#[fixture]
pub fn installation(platform: PlatformSpec) -> Installation {
    Installation {
        id: "main-roof".into(),
        panel: "mono-420".into(),
        platform,
        rows: vec![
            RowConfiguration {
                columns: 3,
                connector_length: Some(2.0),
            },
            RowConfiguration {
                columns: 3,
                connector_length: None,
            },
        ],
        position: DVec3::ZERO,
        rotation_degrees: 0.0,
    }
}

/// A daylight sun over Culemborg (noon in mid-August).
#[fixture]
pub fn noon_sun(culemborg: GeoLocation) -> SunVector {
    let moment = SimulatedMoment {
        date: NaiveDate::from_ymd_opt(2024, 8, 11).unwrap(),
        hour: 13.0,
    };
    sun_position(&moment, &culemborg).unwrap()
}

/// One laid-out cell under a daylight sun with an empty scene.
#[fixture]
pub fn open_cell_scene(
    installation: Installation,
    panel_spec: PanelSpec,
    noon_sun: SunVector,
) -> (crate::layout::SolarCell, SunVector, SceneIndex) {
    let oriented = OrientedPanel::new(&panel_spec, installation.platform.orientation);
    let laid_out = layout_installation(&installation, &panel_spec).unwrap();
    let cell = solar_cells(&laid_out.panels[0], &panel_spec, &oriented)
        .into_iter()
        .next()
        .unwrap();

    (cell, noon_sun, SceneIndex::default())
}

/// The same cell with a large box fully surrounding all five sample points.
#[fixture]
pub fn occluded_cell_scene(
    open_cell_scene: (crate::layout::SolarCell, SunVector, SceneIndex),
) -> (crate::layout::SolarCell, SunVector, SceneIndex) {
    let (cell, sun, _) = open_cell_scene;
    // Comfortably larger than the blocker-extent filter and the
    // self-intersection epsilon
    let enclosure = Occluder {
        id: "enclosure".into(),
        bounds: Aabb::from_center_size(cell.center, DVec3::splat(10.0)),
    };

    let scene = SceneIndex::new(vec![enclosure]);
    (cell, sun, scene)
}

#[fixture]
pub fn model(
    culemborg: GeoLocation,
    panel_spec: PanelSpec,
    installation: Installation,
) -> Model {
    let panels = PanelMap::from([(panel_spec.id.clone(), panel_spec.into())]);
    let layout = Layout {
        id: "current".into(),
        description: "Current configuration".to_string(),
        installations: vec![installation],
    };
    let layouts = LayoutMap::from([(layout.id.clone(), layout)]);

    Model {
        parameters: ModelParameters {
            location: culemborg,
            schedule: Schedule {
                start_date: NaiveDate::from_ymd_opt(2024, 8, 11).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2024, 8, 11).unwrap(),
                hour_start: 10.0,
                hour_end: 14.0,
                hour_step: 1.0,
                sampling_interval: 2,
            },
            scene: SceneParameters {
                layout: "current".into(),
            },
        },
        panels,
        occluders: vec![Occluder {
            id: "chimney".into(),
            bounds: Aabb::from_center_size(DVec3::new(2.0, -1.5, 3.0), DVec3::new(0.6, 0.6, 2.4)),
        }],
        layouts,
    }
}
