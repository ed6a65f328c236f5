use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, PartType, PinId};
use crate::geometry::{rotate_offset, Cell, Direction};
use crate::layout::{InstanceId, PlacedInstance};
use crate::occupancy::GridOccupancy;

/// Identifies one pin of one placed instance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PinRef {
    pub instance: InstanceId,
    pub pin: PinId,
}

impl PinRef {
    pub fn new(instance: InstanceId, pin: PinId) -> Self {
        Self { instance, pin }
    }
}

/// A pin placed into world coordinates: where it sits, which way it
/// faces after rotation, and which cell it points into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPin {
    pub instance: InstanceId,
    pub pin: PinId,
    /// World cell the pin sits on.
    pub cell: Cell,
    /// World-facing direction after rotation.
    pub direction: Direction,
    /// The adjacent cell the pin points into.
    pub neighbor: Cell,
}

/// A discovered physical alignment between two pins of adjacent
/// instances. Travel is legal in both directions at equal cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub a: PinRef,
    pub b: PinRef,
    pub cost: f64,
}

/// The full connectivity picture for one placement snapshot: every
/// resolved pin plus every symmetric pin alignment, reported once each.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub pins: Vec<ResolvedPin>,
    pub links: Vec<ExternalLink>,
}

/// Place an instance's pins into world coordinates.
pub fn resolve_pins(instance: &PlacedInstance, part: &PartType) -> Vec<ResolvedPin> {
    part.pins
        .iter()
        .map(|pin| {
            let cell = instance.position
                + rotate_offset(pin.offset, instance.rotation, part.width, part.height);
            let direction = pin.direction.rotated(instance.rotation);
            ResolvedPin {
                instance: instance.id,
                pin: pin.id,
                cell,
                direction,
                neighbor: cell + direction.step(),
            }
        })
        .collect()
}

/// Resolve every pin of every instance and discover external links.
///
/// Two pins link when each one's computed neighbor cell is the other's
/// world cell and their world directions are opposite. Unmatched pins
/// stay dangling, which is a legitimate open track end. Instances with
/// unknown part types are skipped with a warning.
pub fn resolve_layout(
    instances: &[PlacedInstance],
    catalog: &Catalog,
    occupancy: &GridOccupancy,
) -> Resolution {
    let mut by_instance: HashMap<InstanceId, Vec<ResolvedPin>> = HashMap::new();
    for instance in instances {
        match catalog.part(&instance.part) {
            Some(part) => {
                by_instance.insert(instance.id, resolve_pins(instance, part));
            }
            None => warn!(
                "instance {} references unknown part type '{}', skipping resolution",
                instance.id, instance.part
            ),
        }
    }

    let mut pins = Vec::new();
    let mut links = Vec::new();
    for instance in instances {
        let Some(own) = by_instance.get(&instance.id) else {
            continue;
        };
        for p in own {
            pins.push(*p);
            let Some(neighbor_id) = occupancy.occupant(p.neighbor) else {
                continue;
            };
            let Some(neighbor_pins) = by_instance.get(&neighbor_id) else {
                continue;
            };
            let back = neighbor_pins
                .iter()
                .find(|q| q.neighbor == p.cell && q.direction == p.direction.opposite());
            let Some(q) = back else {
                continue;
            };
            let p_key = PinRef::new(p.instance, p.pin);
            let q_key = PinRef::new(q.instance, q.pin);
            // Each symmetric pair is found from both sides; keep the
            // ordered one so it is reported once.
            if p_key < q_key {
                links.push(ExternalLink {
                    a: p_key,
                    b: q_key,
                    cost: p.cell.distance_to(&q.cell),
                });
            }
        }
    }
    Resolution { pins, links }
}
