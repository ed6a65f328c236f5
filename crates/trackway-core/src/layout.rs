use log::warn;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::geometry::{Cell, Rotation};
use crate::occupancy::GridOccupancy;

/// Unique identifier of a placed instance within its layout.
pub type InstanceId = u64;

/// A concrete occurrence of a catalog part on the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedInstance {
    pub id: InstanceId,
    /// Catalog part name. An unknown name leaves the instance inert:
    /// no occupied cells, no graph nodes.
    pub part: String,
    /// Top-left cell of the (rotated) footprint.
    pub position: Cell,
    pub rotation: Rotation,
}

/// The placement state of one board: the instance list, the id sequence
/// that mints instance ids, and the derived cell occupancy.
///
/// Every mutation recomputes the touched instance's footprint in full;
/// there is no incremental patching.
#[derive(Debug, Serialize, Deserialize)]
pub struct Layout {
    pub id: Uuid,
    pub name: String,
    instances: Vec<PlacedInstance>,
    next_instance_id: InstanceId,
    #[serde(skip)]
    occupancy: GridOccupancy,
}

impl Layout {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            instances: Vec::new(),
            next_instance_id: 0,
            occupancy: GridOccupancy::new(),
        }
    }

    // ── Editing operations ───────────────────────────────────────────

    /// Place a new instance and return its id. A part name the catalog
    /// does not know is accepted but the instance stays inert.
    pub fn place(
        &mut self,
        catalog: &Catalog,
        part: &str,
        position: Cell,
        rotation: Rotation,
    ) -> InstanceId {
        let id = self.next_instance_id;
        self.next_instance_id += 1;
        let instance = PlacedInstance {
            id,
            part: part.to_string(),
            position,
            rotation,
        };
        match catalog.part(part) {
            Some(part_type) => self.occupancy.add_or_update(&instance, part_type),
            None => warn!(
                "instance {} references unknown part type '{}', placing inert",
                id, part
            ),
        }
        self.instances.push(instance);
        id
    }

    /// Move an instance to a new position. Returns false if the id is
    /// unknown.
    pub fn move_to(&mut self, catalog: &Catalog, id: InstanceId, position: Cell) -> bool {
        self.mutate(catalog, id, |instance| instance.position = position)
    }

    /// Rotate an instance in place. Returns false if the id is unknown.
    pub fn rotate_to(&mut self, catalog: &Catalog, id: InstanceId, rotation: Rotation) -> bool {
        self.mutate(catalog, id, |instance| instance.rotation = rotation)
    }

    fn mutate<F: FnOnce(&mut PlacedInstance)>(
        &mut self,
        catalog: &Catalog,
        id: InstanceId,
        apply: F,
    ) -> bool {
        let Some(instance) = self.instances.iter_mut().find(|i| i.id == id) else {
            return false;
        };
        apply(instance);
        match catalog.part(&instance.part) {
            Some(part_type) => self.occupancy.add_or_update(instance, part_type),
            None => self.occupancy.remove(id),
        }
        true
    }

    /// Remove an instance and release its cells.
    pub fn remove(&mut self, id: InstanceId) -> Option<PlacedInstance> {
        let index = self.instances.iter().position(|i| i.id == id)?;
        self.occupancy.remove(id);
        Some(self.instances.remove(index))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn instance(&self, id: InstanceId) -> Option<&PlacedInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    pub fn instances(&self) -> &[PlacedInstance] {
        &self.instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn occupant(&self, cell: Cell) -> Option<InstanceId> {
        self.occupancy.occupant(cell)
    }

    pub fn occupancy(&self) -> &GridOccupancy {
        &self.occupancy
    }

    /// Rebuild the whole occupancy map from the instance list. Later
    /// list entries win overlap ties.
    pub fn rebuild_occupancy(&mut self, catalog: &Catalog) {
        self.occupancy.rebuild_all(&self.instances, catalog);
    }

    // ── Serialization ────────────────────────────────────────────────

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Restore a layout from JSON. Occupancy is derived state and is
    /// rebuilt against the given catalog rather than deserialized.
    pub fn from_json(json: &str, catalog: &Catalog) -> Result<Self, serde_json::Error> {
        let mut layout: Layout = serde_json::from_str(json)?;
        layout.rebuild_occupancy(catalog);
        Ok(layout)
    }
}
