use std::collections::HashMap;

use log::warn;

use crate::catalog::{Catalog, PartType};
use crate::geometry::Cell;
use crate::layout::{InstanceId, PlacedInstance};

/// Tracks which placed instance currently owns each grid cell.
///
/// Overlapping placements are not rejected: the most recently recorded
/// instance wins the cell, and the overwrite is logged. Callers that
/// want stricter policy can check `occupant` before placing.
#[derive(Debug, Clone, Default)]
pub struct GridOccupancy {
    cells: HashMap<Cell, InstanceId>,
    /// The footprint recorded for each instance, so a later update or
    /// removal clears exactly the cells it previously claimed.
    footprints: HashMap<InstanceId, Vec<Cell>>,
}

impl GridOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or re-record) an instance's footprint. Any previously
    /// recorded footprint for the same instance is cleared first.
    pub fn add_or_update(&mut self, instance: &PlacedInstance, part: &PartType) {
        self.remove(instance.id);
        let footprint = part.footprint(instance.position, instance.rotation);
        for &cell in &footprint {
            if let Some(prev) = self.cells.insert(cell, instance.id) {
                if prev != instance.id {
                    warn!(
                        "cell ({}, {}) claimed by instance {} was overwritten by instance {}",
                        cell.x, cell.y, prev, instance.id
                    );
                }
            }
        }
        self.footprints.insert(instance.id, footprint);
    }

    /// Clear the cells recorded for an instance. Only cells still mapped
    /// to this exact instance are released, so removing a stale instance
    /// never evicts a cell a newer instance has since claimed.
    pub fn remove(&mut self, id: InstanceId) {
        if let Some(footprint) = self.footprints.remove(&id) {
            for cell in footprint {
                if self.cells.get(&cell) == Some(&id) {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// Clear everything and re-record each instance in list order, so
    /// later entries win any overlap tie. Instances whose part name is
    /// unknown are skipped and stay inert.
    pub fn rebuild_all(&mut self, instances: &[PlacedInstance], catalog: &Catalog) {
        self.cells.clear();
        self.footprints.clear();
        for instance in instances {
            match catalog.part(&instance.part) {
                Some(part) => self.add_or_update(instance, part),
                None => warn!(
                    "instance {} references unknown part type '{}', skipping",
                    instance.id, instance.part
                ),
            }
        }
    }

    pub fn occupant(&self, cell: Cell) -> Option<InstanceId> {
        self.cells.get(&cell).copied()
    }

    pub fn footprint(&self, id: InstanceId) -> Option<&[Cell]> {
        self.footprints.get(&id).map(|f| f.as_slice())
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
