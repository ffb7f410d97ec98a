// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device-Specific Drivers
//!
//! Drivers sit above a transport trait and below the tasks. They never touch the MCU directly;
//! the board layer in `hw` supplies the transports.
//!
//! ## Existing drivers
//!
//! - [`tmc2130`] – Trinamic TMC2130 stepper driver, 40-bit SPI register access

pub mod tmc2130;

pub use tmc2130::{RegisterAccess, Tmc2130};
