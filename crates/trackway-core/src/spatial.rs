use rstar::{RTree, RTreeObject, AABB};

use crate::catalog::Catalog;
use crate::geometry::Cell;
use crate::layout::{InstanceId, PlacedInstance};

/// Axis-aligned cell bounds of one instance's footprint, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellBounds {
    pub min: Cell,
    pub max: Cell,
}

impl CellBounds {
    pub fn from_cells(cells: &[Cell]) -> Option<Self> {
        let first = *cells.first()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for c in &cells[1..] {
            bounds.min.x = bounds.min.x.min(c.x);
            bounds.min.y = bounds.min.y.min(c.y);
            bounds.max.x = bounds.max.x.max(c.x);
            bounds.max.y = bounds.max.y.max(c.y);
        }
        Some(bounds)
    }
}

/// An entry in the spatial index, referencing an instance by id.
#[derive(Debug, Clone)]
pub struct SpatialEntry {
    pub instance: InstanceId,
    pub bounds: CellBounds,
}

impl RTreeObject for SpatialEntry {
    type Envelope = AABB<[i32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min.x, self.bounds.min.y],
            [self.bounds.max.x, self.bounds.max.y],
        )
    }
}

/// R-tree over instance footprint bounds, for editor hit-testing and
/// viewport culling. This is a broad phase: masked pieces answer with
/// their bounding box, the exact per-cell answer is `GridOccupancy`.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<SpatialEntry>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-build the index from the current placement. Instances with
    /// unknown part types carry no footprint and are left out.
    pub fn build(instances: &[PlacedInstance], catalog: &Catalog) -> Self {
        let entries: Vec<SpatialEntry> = instances
            .iter()
            .filter_map(|instance| {
                let part = catalog.part(&instance.part)?;
                let footprint = part.footprint(instance.position, instance.rotation);
                Some(SpatialEntry {
                    instance: instance.id,
                    bounds: CellBounds::from_cells(&footprint)?,
                })
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn insert(&mut self, entry: SpatialEntry) {
        self.tree.insert(entry);
    }

    /// All entries whose bounds contain the given cell.
    pub fn query_cell(&self, cell: Cell) -> Vec<&SpatialEntry> {
        let point = AABB::from_point([cell.x, cell.y]);
        self.tree.locate_in_envelope_intersecting(&point).collect()
    }

    /// All entries intersecting the given cell region.
    pub fn query_region(&self, region: &CellBounds) -> Vec<&SpatialEntry> {
        let envelope = AABB::from_corners(
            [region.min.x, region.min.y],
            [region.max.x, region.max.y],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
