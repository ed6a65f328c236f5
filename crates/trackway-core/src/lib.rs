//! # Trackway Core
//!
//! Catalog data model, rotation geometry, placement layout with grid
//! occupancy, world-space pin resolution, and a spatial index for
//! editor queries.
//!
//! This crate is the placement side of the Trackway routing engine;
//! graph construction and path search live in `trackway-route`.

pub mod geometry;
pub mod catalog;
pub mod layout;
pub mod occupancy;
pub mod resolve;
pub mod spatial;

pub use catalog::{Catalog, CatalogError, PartType, Pin, PinId, Transition};
pub use geometry::{rotate_offset, Cell, Direction, Rotation};
pub use layout::{InstanceId, Layout, PlacedInstance};
pub use occupancy::GridOccupancy;
pub use resolve::{resolve_layout, resolve_pins, ExternalLink, PinRef, ResolvedPin, Resolution};
pub use spatial::{CellBounds, SpatialEntry, SpatialIndex};
