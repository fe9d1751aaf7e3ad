//! Panel model specifications and cell-grid subdivision.
use crate::id::define_id_type;
use anyhow::{Result, ensure};
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::rc::Rc;

define_id_type! {PanelID}

/// A map of panel specifications, keyed by ID
pub type PanelMap = indexmap::IndexMap<PanelID, Rc<PanelSpec>>;

/// How a panel sits on its platform.
///
/// The orientation decides which physical dimension lies along the row and,
/// with it, which dimension is tilted (see [`OrientedPanel`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum)]
pub enum Orientation {
    /// Long side along the row; the short side is the tilt axis.
    #[string = "landscape"]
    Landscape,
    /// Short side along the row; the long side is the tilt axis.
    #[string = "portrait"]
    Portrait,
}

/// Static specification of one panel model, read from `panels.csv`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelSpec {
    /// Unique ID for the panel model
    pub id: PanelID,
    /// Long-side length in meters.
    pub length: f64,
    /// Short-side width in meters.
    pub width: f64,
    /// Panel thickness in meters.
    pub thickness: f64,
    /// Number of cell columns along the long side.
    pub cell_columns: u32,
    /// Number of cell rows across the short side.
    pub cell_rows: u32,
    /// Number of internal electrical strings.
    pub strings: u32,
}

impl PanelSpec {
    /// Check the specification after reading it from file.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("length", self.length),
            ("width", self.width),
            ("thickness", self.thickness),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "Panel {}: {name} must be a positive number",
                self.id
            );
        }
        ensure!(
            self.length >= self.width,
            "Panel {}: length must be the long side",
            self.id
        );
        ensure!(
            self.cell_columns > 0 && self.cell_rows > 0,
            "Panel {}: cell counts must be greater than zero",
            self.id
        );
        ensure!(
            self.strings > 0,
            "Panel {}: string count must be greater than zero",
            self.id
        );

        Ok(())
    }
}

/// A panel's dimensions and cell counts resolved for an orientation.
///
/// `across` is the dimension along the tilt axis: the short side in
/// landscape, the long side in portrait. The cell grid swaps with the
/// dimensions so cells keep their physical aspect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedPanel {
    /// Dimension along the row, in meters.
    pub along: f64,
    /// Dimension along the tilt axis, in meters.
    pub across: f64,
    /// Cell count along the row.
    pub cells_along: u32,
    /// Cell count along the tilt axis.
    pub cells_across: u32,
}

impl OrientedPanel {
    /// Resolve `spec` for the given orientation.
    pub fn new(spec: &PanelSpec, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Landscape => Self {
                along: spec.length,
                across: spec.width,
                cells_along: spec.cell_columns,
                cells_across: spec.cell_rows,
            },
            Orientation::Portrait => Self {
                along: spec.width,
                across: spec.length,
                cells_along: spec.cell_rows,
                cells_across: spec.cell_columns,
            },
        }
    }

    /// The electrical string a cell belongs to. Presentation grouping only.
    pub fn string_index(&self, spec: &PanelSpec, cell_across: u32) -> u32 {
        (cell_across * spec.strings / self.cells_across).min(spec.strings - 1)
    }
}
