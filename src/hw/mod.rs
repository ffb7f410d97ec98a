// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! STM32H7 board layer.

pub mod can;
pub mod encoder;
pub mod pins;
pub mod spi;
pub mod stepper;
pub mod timer;

pub use can::FdCanBus;
pub use encoder::Encoder;
pub use pins::{BoardPins, GpioClocks};
pub use spi::{ChipSelect, SpiBus, Tmc2130Spi};
pub use stepper::{EnablePin, StepperPins};
pub use timer::StepTimer;
