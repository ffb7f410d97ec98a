// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # OT-3 Motion Firmware
//!
//! CAN-bus motion control for single-axis stepper nodes, written in Rust. The protocol and
//! motion layers are plain `no_std` code that builds and tests on the host; the `firmware`
//! feature adds the STM32H7 board layer and the binary.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`can`] | Arbitration ids, DLC codec, message catalog, parser, dispatcher, CAN writer |
//! | [`queue`] | Bounded task queues |
//! | [`motion`] | Move groups, motion controller, step pulse generator |
//! | [`tasks`] | Move group, motion controller, motor driver and status reporter tasks |
//! | [`drivers`] | Device-level drivers (TMC2130) |
//! | [`node`] | Assembly root tying queues, tasks and the pulse generator together |
//! | `hw` | MCU-level wrappers around CAN, SPI, GPIO and the step timer (`firmware` only) |
//!
//! ## Getting Started
//!
//! Run the host tests:
//!
//! ```bash
//! cargo test
//! ```
//!
//! Flash the board:
//!
//! ```bash
//! cargo run --release --features firmware --target thumbv7em-none-eabihf
//! ```
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(test), no_std)]

mod logging;

pub mod can;
pub mod drivers;
pub mod motion;
pub mod node;
pub mod queue;
pub mod tasks;

#[cfg(feature = "firmware")]
pub mod hw;

pub use node::{MotorNode, NodeParts, NodeResources};
