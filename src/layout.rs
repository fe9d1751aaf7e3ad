//! The panel-array layout engine.
//!
//! Places tilted panel rows, columns and inter-row connectors from the
//! physical parameters of an installation. Offsets accumulate in edge
//! coordinates along the installation's local axes (x along the rows, y in
//! the row-advance direction, z up) and are converted once through
//! [`crate::geometry::edge_to_center_point`] into the center/rotation
//! placements the renderer consumes.
use crate::geometry::edge_to_center_point;
use crate::id::define_id_type;
use crate::panel::{Orientation, OrientedPanel, PanelID, PanelSpec};
use crate::scene::{OccluderID, panel_occluder_id};
use glam::{DQuat, DVec3};
use serde::Deserialize;
use std::error::Error;
use std::fmt;

define_id_type! {LayoutID}
define_id_type! {InstallationID}

/// A map of layouts, keyed by ID
pub type LayoutMap = indexmap::IndexMap<LayoutID, Layout>;

/// An error produced while laying out an installation.
///
/// Always identifies the installation and, where one is at fault, the row,
/// so an invalid configuration can be reported precisely instead of
/// rendering overlapping geometry.
#[derive(Debug, Clone)]
pub struct LayoutError {
    message: String,
}

impl LayoutError {
    /// Create an error for the installation as a whole.
    pub fn new(installation: &InstallationID, message: String) -> Self {
        Self {
            message: format!("Installation {installation}: {message}"),
        }
    }

    /// Create an error identifying the offending row.
    pub fn for_row(installation: &InstallationID, row: usize, message: String) -> Self {
        Self {
            message: format!("Installation {installation}, row {row}: {message}"),
        }
    }
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for LayoutError {}

/// Mounting-platform parameters shared by every panel of an installation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlatformSpec {
    /// Tilt angle in degrees, strictly between 0 and 90.
    pub tilt_degrees: f64,
    /// Length of the platform base in meters.
    pub length: f64,
    /// Thickness of the platform base in meters.
    pub thickness: f64,
    /// Height of the panel's leading edge above the mounting plane.
    pub mount_offset: f64,
    /// How the panel sits on the platform.
    pub orientation: Orientation,
}

impl PlatformSpec {
    /// Check the specification after reading it from file.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.tilt_degrees.is_finite() && self.tilt_degrees > 0.0 && self.tilt_degrees < 90.0,
            "Tilt angle must be strictly between 0 and 90 degrees (got {})",
            self.tilt_degrees
        );
        anyhow::ensure!(
            self.length.is_finite() && self.length > 0.0,
            "Platform length must be a positive number"
        );
        anyhow::ensure!(
            self.thickness.is_finite() && self.thickness > 0.0,
            "Platform thickness must be a positive number"
        );
        anyhow::ensure!(
            self.mount_offset.is_finite() && self.mount_offset >= 0.0,
            "Panel mount offset cannot be negative"
        );

        Ok(())
    }
}

/// One row of a panel run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RowConfiguration {
    /// Number of panel columns in the row.
    pub columns: u32,
    /// Center-to-center pitch to the next row, in meters.
    ///
    /// `None` marks the tail of a sub-run: the next row (if any) starts
    /// directly at this row's trailing edge.
    pub connector_length: Option<f64>,
}

/// A physically contiguous string of panel rows anchored to the roof.
#[derive(Debug, Clone, PartialEq)]
pub struct Installation {
    /// Unique ID for the installation
    pub id: InstallationID,
    /// The panel model mounted on every platform.
    pub panel: PanelID,
    /// The platform carrying each panel.
    pub platform: PlatformSpec,
    /// The rows of the run, in placement order.
    pub rows: Vec<RowConfiguration>,
    /// World position of the installation's reference corner, in meters.
    pub position: DVec3,
    /// Rotation of the installation about the vertical axis, in degrees.
    pub rotation_degrees: f64,
}

/// A named rooftop configuration preset: an ordered set of installations.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Unique ID for the layout
    pub id: LayoutID,
    /// Free-text description shown when listing layouts.
    pub description: String,
    /// The installations making up the preset.
    pub installations: Vec<Installation>,
}

/// Which end of its row a connector rail sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectorSide {
    /// The row end at the installation's reference edge.
    Left,
    /// The opposite row end.
    Right,
}

/// World placement of one panel, consumed by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPlacement {
    /// The installation the panel belongs to.
    pub installation: InstallationID,
    /// Row index within the installation.
    pub row: usize,
    /// Column index within the row.
    pub column: usize,
    /// Center of the panel in world space, meters.
    pub center: DVec3,
    /// Euler rotation in radians: tilt about the row axis in `x`, yaw about
    /// the vertical axis in `z`. Yaw is applied after tilt.
    pub rotation: DVec3,
}

impl PanelPlacement {
    /// The placement rotation as a quaternion (yaw after tilt).
    pub fn rotation_quat(&self) -> DQuat {
        DQuat::from_rotation_z(self.rotation.z) * DQuat::from_rotation_x(self.rotation.x)
    }
}

/// World placement of one inter-row connector rail.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectorPlacement {
    /// The installation the connector belongs to.
    pub installation: InstallationID,
    /// The row whose trailing edge the connector leaves from.
    pub row: usize,
    /// Which end of the row the rail sits on.
    pub side: ConnectorSide,
    /// Center of the rail in world space, meters.
    pub center: DVec3,
    /// Euler rotation in radians (yaw only; rails lie flat).
    pub rotation: DVec3,
    /// Length of the rail: the air gap it spans, in meters.
    pub length: f64,
}

/// The placements produced by laying out one installation.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallationLayout {
    /// One placement per panel.
    pub panels: Vec<PanelPlacement>,
    /// Two rail placements per row with a connector.
    pub connectors: Vec<ConnectorPlacement>,
}

/// Footprint of a tilted panel on the mounting plane: `W·cos(β)`.
pub fn projected_depth(tilt_axis_dimension: f64, tilt_radians: f64) -> f64 {
    tilt_axis_dimension * tilt_radians.cos()
}

/// Height of a tilted panel's rear edge above its leading edge: `W·sin(β)`.
pub fn rear_edge_rise(tilt_axis_dimension: f64, tilt_radians: f64) -> f64 {
    tilt_axis_dimension * tilt_radians.sin()
}

/// Lay out every panel and connector of an installation.
///
/// Pure function: identical inputs give identical placements. Row `i`'s
/// leading edge sits at the cumulative offset of all prior rows (the
/// center-to-center pitch where a connector follows the row, otherwise just
/// the projected depth). A zero-column row or a connector shorter than the
/// panel's own footprint is a [`LayoutError`] naming the row; overlapping
/// geometry is never produced silently.
pub fn layout_installation(
    installation: &Installation,
    panel: &PanelSpec,
) -> Result<InstallationLayout, LayoutError> {
    let platform = &installation.platform;
    if !(platform.tilt_degrees > 0.0 && platform.tilt_degrees < 90.0) {
        return Err(LayoutError::new(
            &installation.id,
            format!(
                "tilt angle {} degrees is outside the open interval (0, 90)",
                platform.tilt_degrees
            ),
        ));
    }

    let oriented = OrientedPanel::new(panel, platform.orientation);
    let tilt = platform.tilt_degrees.to_radians();
    let depth = projected_depth(oriented.across, tilt);
    let rise = rear_edge_rise(oriented.across, tilt);
    let yaw = installation.rotation_degrees.to_radians();
    let world = DQuat::from_rotation_z(yaw);

    let mut panels = Vec::new();
    let mut connectors = Vec::new();
    let mut row_edge = 0.0;

    for (row_index, row) in installation.rows.iter().enumerate() {
        if row.columns == 0 {
            return Err(LayoutError::for_row(
                &installation.id,
                row_index,
                "row has zero columns".into(),
            ));
        }

        // Validate the air gap before emitting any geometry for the row
        let air_gap = match row.connector_length {
            Some(pitch) => {
                let gap = pitch - depth;
                if gap < 0.0 {
                    return Err(LayoutError::for_row(
                        &installation.id,
                        row_index,
                        format!(
                            "connector length {pitch} m is shorter than the \
                             projected panel depth {depth:.3} m"
                        ),
                    ));
                }
                Some(gap)
            }
            None => None,
        };

        for column in 0..row.columns as usize {
            let edge = DVec3::new(
                column as f64 * oriented.along,
                row_edge,
                platform.mount_offset,
            );
            let local_center =
                edge_to_center_point(edge, DVec3::new(oriented.along, depth, rise));
            panels.push(PanelPlacement {
                installation: installation.id.clone(),
                row: row_index,
                column,
                center: installation.position + world * local_center,
                rotation: DVec3::new(tilt, 0.0, yaw),
            });
        }

        if let Some(gap) = air_gap {
            let row_width = row.columns as f64 * oriented.along;
            for (side, x) in [(ConnectorSide::Left, 0.0), (ConnectorSide::Right, row_width)] {
                let edge = DVec3::new(x, row_edge + depth, 0.0);
                // The rail has no modelled width; only the gap span is
                // converted to a center coordinate
                let local_center = edge_to_center_point(edge, DVec3::new(0.0, gap, platform.thickness));
                connectors.push(ConnectorPlacement {
                    installation: installation.id.clone(),
                    row: row_index,
                    side,
                    center: installation.position + world * local_center,
                    rotation: DVec3::new(0.0, 0.0, yaw),
                    length: gap,
                });
            }
        }

        // Advance to the next row's leading edge
        row_edge += match row.connector_length {
            Some(pitch) => pitch,
            None => depth,
        };
    }

    Ok(InstallationLayout { panels, connectors })
}

/// A single solar cell of a placed panel.
///
/// Carries the world-space geometry the shadow engine samples, plus the
/// indices used to label results.
#[derive(Debug, Clone, PartialEq)]
pub struct SolarCell {
    /// The installation the cell's panel belongs to.
    pub installation: InstallationID,
    /// Row index of the panel within the installation.
    pub panel_row: usize,
    /// Column index of the panel within its row.
    pub panel_column: usize,
    /// Cell index along the row axis.
    pub cell_column: u32,
    /// Cell index along the tilt axis.
    pub cell_row: u32,
    /// The electrical string the cell belongs to (presentation only).
    pub string_index: u32,
    /// The scene ID of the cell's own panel mesh, excluded from blocking.
    pub panel_ref: OccluderID,
    /// World-space center of the cell.
    pub center: DVec3,
    /// Unit vector along the row axis.
    pub axis_along: DVec3,
    /// Unit vector along the tilt axis (points up-slope).
    pub axis_across: DVec3,
    /// Half extent along the row axis, meters.
    pub half_along: f64,
    /// Half extent along the tilt axis, meters.
    pub half_across: f64,
}

impl SolarCell {
    /// The five sample points for visibility testing: the center plus the
    /// four corners, with the near and far corner pairs at opposite offsets
    /// along the tilt axis so the rays diverge meaningfully.
    ///
    /// Recomputed from the current world transform on every call, never
    /// cached across sampling passes.
    pub fn sample_points(&self) -> [DVec3; 5] {
        let along = self.axis_along * self.half_along;
        let across = self.axis_across * self.half_across;
        [
            self.center,
            self.center - along - across,
            self.center + along - across,
            self.center - along + across,
            self.center + along + across,
        ]
    }
}

/// Subdivide a placed panel into its solar cells.
pub fn solar_cells(
    placement: &PanelPlacement,
    panel: &PanelSpec,
    oriented: &OrientedPanel,
) -> Vec<SolarCell> {
    let rotation = placement.rotation_quat();
    let axis_along = rotation * DVec3::X;
    let axis_across = rotation * DVec3::Y;
    let cell_along = oriented.along / oriented.cells_along as f64;
    let cell_across = oriented.across / oriented.cells_across as f64;
    let panel_ref = panel_occluder_id(placement);

    let mut cells = Vec::with_capacity((oriented.cells_along * oriented.cells_across) as usize);
    for cell_row in 0..oriented.cells_across {
        for cell_column in 0..oriented.cells_along {
            // Cell center in panel-local coordinates, relative to the
            // panel's own center
            let u = crate::geometry::edge_to_center(cell_column as f64 * cell_along, cell_along)
                - oriented.along / 2.0;
            let v = crate::geometry::edge_to_center(cell_row as f64 * cell_across, cell_across)
                - oriented.across / 2.0;
            cells.push(SolarCell {
                installation: placement.installation.clone(),
                panel_row: placement.row,
                panel_column: placement.column,
                cell_column,
                cell_row,
                string_index: oriented.string_index(panel, cell_row),
                panel_ref: panel_ref.clone(),
                center: placement.center + axis_along * u + axis_across * v,
                axis_along,
                axis_across,
                half_along: cell_along / 2.0,
                half_across: cell_across / 2.0,
            });
        }
    }

    cells
}
