use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{rotate_offset, Cell, Direction, Rotation};

/// Identifier of a pin within its part type.
pub type PinId = u32;

/// A directional connection point on a piece's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub id: PinId,
    pub direction: Direction,
    /// Local cell offset from the part's top-left anchor.
    pub offset: Cell,
}

/// A catalog-declared legal entry->exit traversal inside one piece.
/// Transitions are directional; symmetric travel needs two entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub entry: PinId,
    pub exit: PinId,
    pub length: f64,
}

/// A catalog template describing a rotatable piece: its footprint,
/// pins, and legal internal transitions. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartType {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Explicit cell mask for non-rectangular pieces. `None` means the
    /// full `width` x `height` rectangle.
    pub cells: Option<Vec<Cell>>,
    pub pins: Vec<Pin>,
    pub transitions: Vec<Transition>,
}

impl PartType {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            cells: None,
            pins: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn with_pin(mut self, id: PinId, direction: Direction, offset: Cell) -> Self {
        self.pins.push(Pin {
            id,
            direction,
            offset,
        });
        self
    }

    pub fn with_transition(mut self, entry: PinId, exit: PinId, length: f64) -> Self {
        self.transitions.push(Transition {
            entry,
            exit,
            length,
        });
        self
    }

    pub fn with_cells(mut self, cells: Vec<Cell>) -> Self {
        self.cells = Some(cells);
        self
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    /// The unrotated cells this part covers, anchor-relative.
    pub fn local_cells(&self) -> Vec<Cell> {
        match &self.cells {
            Some(mask) => mask.clone(),
            None => {
                let mut cells = Vec::with_capacity((self.width * self.height) as usize);
                for y in 0..self.height as i32 {
                    for x in 0..self.width as i32 {
                        cells.push(Cell::new(x, y));
                    }
                }
                cells
            }
        }
    }

    /// World cells covered by an instance of this part at `position`
    /// with `rotation`.
    pub fn footprint(&self, position: Cell, rotation: Rotation) -> Vec<Cell> {
        self.local_cells()
            .into_iter()
            .map(|c| position + rotate_offset(c, rotation, self.width, self.height))
            .collect()
    }

    fn in_box(&self, c: Cell) -> bool {
        c.x >= 0 && c.y >= 0 && c.x < self.width as i32 && c.y < self.height as i32
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.width == 0 || self.height == 0 {
            return Err(CatalogError::EmptyPart {
                part: self.name.clone(),
            });
        }
        let mut seen = HashSet::new();
        for pin in &self.pins {
            if !seen.insert(pin.id) {
                return Err(CatalogError::DuplicatePin {
                    part: self.name.clone(),
                    pin: pin.id,
                });
            }
            if !self.in_box(pin.offset) {
                return Err(CatalogError::PinOutOfBounds {
                    part: self.name.clone(),
                    pin: pin.id,
                });
            }
        }
        if let Some(mask) = &self.cells {
            if mask.is_empty() {
                return Err(CatalogError::EmptyPart {
                    part: self.name.clone(),
                });
            }
            for &cell in mask {
                if !self.in_box(cell) {
                    return Err(CatalogError::MaskCellOutOfBounds {
                        part: self.name.clone(),
                        cell,
                    });
                }
            }
        }
        for t in &self.transitions {
            for pin in [t.entry, t.exit] {
                if self.pin(pin).is_none() {
                    return Err(CatalogError::UnknownTransitionPin {
                        part: self.name.clone(),
                        pin,
                    });
                }
            }
            if t.length < 0.0 {
                return Err(CatalogError::NegativeTransitionLength {
                    part: self.name.clone(),
                    entry: t.entry,
                    exit: t.exit,
                });
            }
        }
        Ok(())
    }
}

/// Catalog loading / validation failure.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("part '{part}' has an empty footprint")]
    EmptyPart { part: String },
    #[error("part '{part}' declares pin {pin} more than once")]
    DuplicatePin { part: String, pin: PinId },
    #[error("part '{part}' pin {pin} lies outside the footprint box")]
    PinOutOfBounds { part: String, pin: PinId },
    #[error("part '{part}' mask cell {cell:?} lies outside the footprint box")]
    MaskCellOutOfBounds { part: String, cell: Cell },
    #[error("part '{part}' transition references undeclared pin {pin}")]
    UnknownTransitionPin { part: String, pin: PinId },
    #[error("part '{part}' transition {entry}->{exit} has negative length")]
    NegativeTransitionLength {
        part: String,
        entry: PinId,
        exit: PinId,
    },
    #[error("catalog already contains a part named '{0}'")]
    DuplicatePart(String),
}

/// The part-type catalog, keyed by part name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    parts: HashMap<String, PartType>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a part. Rejects duplicates and malformed parts.
    pub fn add_part(&mut self, part: PartType) -> Result<(), CatalogError> {
        part.validate()?;
        if self.parts.contains_key(&part.name) {
            return Err(CatalogError::DuplicatePart(part.name));
        }
        self.parts.insert(part.name.clone(), part);
        Ok(())
    }

    pub fn part(&self, name: &str) -> Option<&PartType> {
        self.parts.get(name)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn all_parts(&self) -> impl Iterator<Item = &PartType> {
        self.parts.values()
    }
}
