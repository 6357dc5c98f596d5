// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor simulator for demo/testing
//!
//! Stands in for a pair of ultrasonic sensors at a store entrance. Events
//! are biased by how full the store is: an empty store only sees entries,
//! a nearly full one mostly sees exits.

use anyhow::Result;
use async_trait::async_trait;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::{Device, EventSource, EventType, ObservedEvent};
use crate::config::{GroupSizeMode, SimulationConfig};

/// Above this fill ratio exits are favoured
const CROWDED_RATIO: f64 = 0.9;
/// Below this fill ratio entries are favoured
const QUIET_RATIO: f64 = 0.2;

const CROWDED_EXIT_PERCENT: u32 = 70;
const QUIET_ENTRY_PERCENT: u32 = 80;
const NORMAL_ENTRY_PERCENT: u32 = 60;

/// Non-finite chances count as never
fn probability(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Simulates entry/exit/disconnection events
pub struct OccupancySimulator {
    rng: ChaCha8Rng,
    event_probability: f64,
    disconnection_probability: f64,
    group_size: GroupSizeMode,
}

impl OccupancySimulator {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            rng,
            event_probability: probability(config.event_probability),
            disconnection_probability: probability(config.disconnection_probability),
            group_size: config.group_size,
        }
    }

    /// Roll the next event for a store with `occupancy` people inside
    pub fn next_event(&mut self, occupancy: u32, capacity: u32) -> Option<ObservedEvent> {
        if self.rng.gen_bool(self.disconnection_probability) {
            return Some(ObservedEvent {
                event_type: EventType::Disconnection,
                people_count: 0,
            });
        }

        if !self.rng.gen_bool(self.event_probability) {
            return None;
        }

        let event_type = self.decide_direction(occupancy, capacity);
        let group = self.group_size();

        match event_type {
            EventType::Exit if occupancy == 0 => None,
            EventType::Exit => Some(ObservedEvent {
                event_type,
                people_count: group.min(occupancy),
            }),
            _ => Some(ObservedEvent {
                event_type,
                people_count: group,
            }),
        }
    }

    fn decide_direction(&mut self, occupancy: u32, capacity: u32) -> EventType {
        if occupancy == 0 {
            return EventType::Entry;
        }

        let ratio = if capacity == 0 {
            1.0
        } else {
            occupancy as f64 / capacity as f64
        };

        let roll = self.rng.gen_range(0..100u32);

        if ratio > CROWDED_RATIO {
            if roll < CROWDED_EXIT_PERCENT {
                EventType::Exit
            } else {
                EventType::Entry
            }
        } else if ratio < QUIET_RATIO {
            if roll < QUIET_ENTRY_PERCENT {
                EventType::Entry
            } else {
                EventType::Exit
            }
        } else if roll < NORMAL_ENTRY_PERCENT {
            EventType::Entry
        } else {
            EventType::Exit
        }
    }

    fn group_size(&mut self) -> u32 {
        match self.group_size {
            GroupSizeMode::Single => 1,
            // 40% alone, 30% couples, 20% small groups, 10% 4-6 people
            GroupSizeMode::Realistic => match self.rng.gen_range(0..100u32) {
                0..=39 => 1,
                40..=69 => 2,
                70..=89 => 3,
                _ => self.rng.gen_range(4..=6),
            },
        }
    }
}

#[async_trait]
impl EventSource for OccupancySimulator {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn poll(&mut self, device: &Device, occupancy: u32) -> Result<Option<ObservedEvent>> {
        Ok(self.next_event(occupancy, device.capacity))
    }
}

/// Random simulated MAC address, e.g. `3A:0F:B2:7C:11:E4`
pub fn generate_mac_address() -> String {
    let bytes: [u8; 6] = rand::thread_rng().gen();
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(seed: u64) -> SimulationConfig {
        SimulationConfig {
            seed: Some(seed),
            disconnection_probability: 0.0,
            event_probability: 1.0,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_nan_probabilities_never_fire() {
        let mut sim = OccupancySimulator::new(&SimulationConfig {
            seed: Some(1),
            event_probability: f64::NAN,
            disconnection_probability: f64::INFINITY,
            ..SimulationConfig::default()
        });
        for _ in 0..100 {
            assert!(sim.next_event(5, 100).is_none());
        }
    }

    #[test]
    fn test_empty_store_only_sees_entries() {
        let mut sim = OccupancySimulator::new(&config(7));
        for _ in 0..500 {
            let event = sim.next_event(0, 100).unwrap();
            assert_eq!(event.event_type, EventType::Entry);
            assert_eq!(event.people_count, 1);
        }
    }

    #[test]
    fn test_exits_never_exceed_occupancy() {
        let mut sim = OccupancySimulator::new(&SimulationConfig {
            group_size: GroupSizeMode::Realistic,
            ..config(11)
        });
        for occupancy in 1..20 {
            for _ in 0..50 {
                if let Some(event) = sim.next_event(occupancy, 20) {
                    if event.event_type == EventType::Exit {
                        assert!(event.people_count >= 1);
                        assert!(event.people_count <= occupancy);
                    }
                }
            }
        }
    }

    #[test]
    fn test_crowded_store_favours_exits() {
        let mut sim = OccupancySimulator::new(&config(3));
        let exits = (0..2000)
            .filter_map(|_| sim.next_event(95, 100))
            .filter(|e| e.event_type == EventType::Exit)
            .count();
        // Expected around 70%
        assert!(exits > 1200 && exits < 1600, "exits = {}", exits);
    }

    #[test]
    fn test_quiet_store_favours_entries() {
        let mut sim = OccupancySimulator::new(&config(5));
        let entries = (0..2000)
            .filter_map(|_| sim.next_event(5, 100))
            .filter(|e| e.event_type == EventType::Entry)
            .count();
        // Expected around 80%
        assert!(entries > 1450 && entries < 1750, "entries = {}", entries);
    }

    #[test]
    fn test_realistic_group_sizes_stay_in_range() {
        let mut sim = OccupancySimulator::new(&SimulationConfig {
            group_size: GroupSizeMode::Realistic,
            ..config(9)
        });
        for _ in 0..1000 {
            let event = sim.next_event(0, 100).unwrap();
            assert!((1..=6).contains(&event.people_count));
        }
    }

    #[test]
    fn test_disconnections_carry_no_people() {
        let mut sim = OccupancySimulator::new(&SimulationConfig {
            disconnection_probability: 1.0,
            ..config(1)
        });
        let event = sim.next_event(10, 100).unwrap();
        assert_eq!(event.event_type, EventType::Disconnection);
        assert_eq!(event.people_count, 0);
    }

    #[test]
    fn test_no_activity_when_probability_is_zero() {
        let mut sim = OccupancySimulator::new(&SimulationConfig {
            event_probability: 0.0,
            ..config(1)
        });
        assert!((0..100).all(|_| sim.next_event(10, 100).is_none()));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = OccupancySimulator::new(&config(42));
        let mut b = OccupancySimulator::new(&config(42));
        for occupancy in 0..50 {
            assert_eq!(a.next_event(occupancy, 60), b.next_event(occupancy, 60));
        }
    }

    #[test]
    fn test_mac_address_format() {
        let mac = generate_mac_address();
        assert_eq!(mac.len(), 17);
        assert_eq!(mac.split(':').count(), 6);
        assert!(mac.split(':').all(|part| {
            part.len() == 2
                && part
                    .chars()
                    .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase())
        }));
    }
}
