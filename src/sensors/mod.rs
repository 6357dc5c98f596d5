// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

//! Sensor module - device types, event sources and the simulation loop

mod manager;
mod simulator;
mod traits;

pub use manager::{SimulationService, TickReport};
pub use simulator::{generate_mac_address, OccupancySimulator};
pub use traits::*;
