use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toydrive_common::EntityId;

use crate::controls::DriveControls;
use crate::tuning::VehicleTuning;
use crate::vehicle::{Vehicle, VehicleSpec};

/// An event record produced by every mutation to the world.
///
/// Replaying the log into a fresh world with the same tuning reproduces the
/// exact vehicle states, since stepping is a pure function of the controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Vehicle was built from the given spec.
    Spawned { id: EntityId, spec: VehicleSpec },
    /// Vehicle was removed.
    Despawned { id: EntityId },
    /// Player control moved to another vehicle.
    PlayerChanged { id: EntityId },
    /// Simulation advanced one frame with the player's controls.
    Stepped { tick: u64, controls: DriveControls },
}

/// The authoritative driving state: every vehicle plus which one the player drives.
///
/// Uses BTreeMap so stepping and hashing visit vehicles in the same order on
/// every platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveWorld {
    vehicles: BTreeMap<EntityId, Vehicle>,
    player: Option<EntityId>,
    tuning: VehicleTuning,
    tick: u64,
    /// Append-only event log of all mutations.
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl DriveWorld {
    /// Create an empty world with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty world with the given tuning.
    pub fn with_tuning(tuning: VehicleTuning) -> Self {
        Self {
            tuning,
            ..Default::default()
        }
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tuning(&self) -> &VehicleTuning {
        &self.tuning
    }

    /// Number of vehicles in the world.
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Read-only access to all vehicles, in id order.
    pub fn vehicles(&self) -> &BTreeMap<EntityId, Vehicle> {
        &self.vehicles
    }

    pub fn get(&self, id: EntityId) -> Option<&Vehicle> {
        self.vehicles.get(&id)
    }

    /// Id of the vehicle that receives controls.
    pub fn player_id(&self) -> Option<EntityId> {
        self.player
    }

    /// The vehicle that receives controls.
    pub fn player(&self) -> Option<&Vehicle> {
        self.player.and_then(|id| self.vehicles.get(&id))
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Build a vehicle from `spec`. The first vehicle spawned becomes the player.
    pub fn spawn(&mut self, spec: VehicleSpec) -> EntityId {
        let id = EntityId::new();
        self.spawn_with_id(id, spec);
        id
    }

    /// Build a vehicle with a specific id (used for replay).
    pub fn spawn_with_id(&mut self, id: EntityId, spec: VehicleSpec) {
        self.vehicles.insert(id, Vehicle::spawn_with_id(id, &spec));
        self.event_log.push(WorldEvent::Spawned { id, spec });
        if self.player.is_none() {
            self.player = Some(id);
        }
        tracing::debug!(vehicle = %id.short(), "spawned vehicle");
    }

    /// Remove a vehicle. Removing the player leaves the world without one.
    pub fn despawn(&mut self, id: EntityId) -> Option<Vehicle> {
        let removed = self.vehicles.remove(&id);
        if removed.is_some() {
            if self.player == Some(id) {
                self.player = None;
            }
            self.event_log.push(WorldEvent::Despawned { id });
        }
        removed
    }

    /// Hand the controls to another vehicle. Returns false for unknown ids.
    pub fn set_player(&mut self, id: EntityId) -> bool {
        if !self.vehicles.contains_key(&id) {
            return false;
        }
        self.player = Some(id);
        self.event_log.push(WorldEvent::PlayerChanged { id });
        true
    }

    /// Advance every vehicle by one frame.
    ///
    /// The player's vehicle gets `controls`; every other vehicle coasts. Wheel
    /// spin is derived right after the kinematic update.
    pub fn step(&mut self, controls: DriveControls) {
        self.tick += 1;
        self.advance(controls);
        self.event_log.push(WorldEvent::Stepped {
            tick: self.tick,
            controls,
        });
    }

    fn advance(&mut self, controls: DriveControls) {
        for (id, vehicle) in &mut self.vehicles {
            let input = if self.player == Some(*id) {
                controls
            } else {
                DriveControls::IDLE
            };
            vehicle.step(&input, &self.tuning);
            vehicle.spin_wheels(&self.tuning);
        }
    }

    /// Reconstruct world state from a sequence of events (for replay).
    pub fn replay(tuning: VehicleTuning, events: &[WorldEvent]) -> Self {
        let mut world = Self::with_tuning(tuning);
        for event in events {
            match event {
                WorldEvent::Spawned { id, spec } => {
                    world.vehicles.insert(*id, Vehicle::spawn_with_id(*id, spec));
                    if world.player.is_none() {
                        world.player = Some(*id);
                    }
                }
                WorldEvent::Despawned { id } => {
                    world.vehicles.remove(id);
                    if world.player == Some(*id) {
                        world.player = None;
                    }
                }
                WorldEvent::PlayerChanged { id } => {
                    world.player = Some(*id);
                }
                WorldEvent::Stepped { tick, controls } => {
                    world.tick = *tick;
                    world.advance(*controls);
                }
            }
        }
        world
    }

    /// Compute a deterministic hash of the world state for comparison.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        if let Some(player) = self.player {
            mix(&mut h, player.0.as_bytes());
        }
        for (id, v) in &self.vehicles {
            mix(&mut h, id.0.as_bytes());
            for value in [
                v.position.x,
                v.position.y,
                v.position.z,
                v.heading,
                v.velocity,
                v.angular_velocity,
            ] {
                mix(&mut h, &value.to_le_bytes());
            }
            for wheel in &v.wheels {
                mix(&mut h, &wheel.spin.to_le_bytes());
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORWARD: DriveControls = DriveControls {
        forward: true,
        ..DriveControls::IDLE
    };

    fn with_left(c: DriveControls) -> DriveControls {
        DriveControls {
            turn_left: true,
            ..c
        }
    }

    fn with_right(c: DriveControls) -> DriveControls {
        DriveControls {
            turn_right: true,
            ..c
        }
    }

    fn drive(world: &mut DriveWorld, controls: DriveControls, frames: usize) {
        for _ in 0..frames {
            world.step(controls);
        }
    }

    #[test]
    fn world_starts_empty() {
        let w = DriveWorld::new();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.vehicle_count(), 0);
        assert!(w.player().is_none());
    }

    #[test]
    fn first_spawn_becomes_player() {
        let mut w = DriveWorld::new();
        let a = w.spawn(VehicleSpec::default());
        let b = w.spawn(VehicleSpec {
            position: [5.0, 0.0],
            ..VehicleSpec::default()
        });
        assert_eq!(w.player_id(), Some(a));
        assert!(w.set_player(b));
        assert_eq!(w.player_id(), Some(b));
        assert!(!w.set_player(EntityId::new()));
    }

    #[test]
    fn only_player_receives_controls() {
        let mut w = DriveWorld::new();
        let player = w.spawn(VehicleSpec::default());
        let parked = w.spawn(VehicleSpec {
            position: [10.0, 0.0],
            ..VehicleSpec::default()
        });
        drive(&mut w, FORWARD, 30);
        assert!(w.get(player).unwrap().velocity > 0.0);
        assert!(w.get(player).unwrap().wheels[0].spin < 0.0);
        let p = w.get(parked).unwrap();
        assert_eq!(p.velocity, 0.0);
        assert_eq!(p.wheels[0].spin, 0.0);
    }

    #[test]
    fn despawning_player_clears_it() {
        let mut w = DriveWorld::new();
        let id = w.spawn(VehicleSpec::default());
        assert!(w.despawn(id).is_some());
        assert!(w.player().is_none());
        assert!(w.despawn(id).is_none());
        // Stepping an empty world is harmless.
        w.step(DriveControls::IDLE);
        assert_eq!(w.tick(), 1);
    }

    #[test]
    fn events_are_recorded() {
        let mut w = DriveWorld::new();
        let id = w.spawn(VehicleSpec::default());
        w.step(DriveControls::IDLE);
        w.despawn(id);
        assert_eq!(w.events().len(), 3);
        let drained = w.drain_events();
        assert_eq!(drained.len(), 3);
        assert!(w.events().is_empty());
    }

    #[test]
    fn replay_equivalence() {
        let mut world = DriveWorld::new();
        world.spawn(VehicleSpec::default());
        world.spawn(VehicleSpec {
            position: [-6.0, 2.0],
            heading: 1.0,
            ..VehicleSpec::default()
        });
        drive(&mut world, FORWARD, 40);
        drive(&mut world, with_left(FORWARD), 25);
        let drift = DriveControls {
            handbrake: true,
            ..with_right(FORWARD)
        };
        drive(&mut world, drift, 25);
        let back = DriveControls {
            reverse: true,
            ..DriveControls::IDLE
        };
        drive(&mut world, back, 10);
        drive(&mut world, DriveControls::IDLE, 60);

        let events = world.events().to_vec();
        let replayed = DriveWorld::replay(*world.tuning(), &events);

        assert_eq!(replayed.tick(), world.tick());
        assert_eq!(replayed.vehicle_count(), world.vehicle_count());
        assert_eq!(replayed.player(), world.player());
        assert_eq!(world.state_hash(), replayed.state_hash());
    }

    #[test]
    fn different_inputs_diverge() {
        let mut a = DriveWorld::new();
        let id = a.spawn(VehicleSpec::default());
        let mut b = DriveWorld::new();
        b.spawn_with_id(id, VehicleSpec::default());
        drive(&mut a, with_left(FORWARD), 30);
        drive(&mut b, with_right(FORWARD), 30);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn replay_with_other_tuning_diverges() {
        let mut world = DriveWorld::new();
        world.spawn(VehicleSpec::default());
        drive(&mut world, FORWARD, 20);
        let slow = VehicleTuning {
            acceleration: 0.001,
            ..VehicleTuning::default()
        };
        let replayed = DriveWorld::replay(slow, world.events());
        assert_ne!(world.state_hash(), replayed.state_hash());
    }
}
