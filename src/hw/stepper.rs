// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! GPIO implementations of the motion layer's hardware seams.

use stm32h7xx_hal::gpio::{Input, Output, Pin, PushPull};

use super::encoder::Encoder;
use crate::motion::controller::MotorEnable;
use crate::motion::pulse::StepperHardware;

/// Step/direction lines, home switch and optional encoder for one axis.
pub struct StepperPins {
    step: Pin<'D', 12, Output<PushPull>>,
    dir: Pin<'D', 13, Output<PushPull>>,
    limit: Pin<'A', 2, Input>,
    encoder: Option<Encoder>,
}

impl StepperPins {
    pub fn new(
        step: Pin<'D', 12, Output<PushPull>>,
        dir: Pin<'D', 13, Output<PushPull>>,
        limit: Pin<'A', 2, Input>,
        encoder: Option<Encoder>,
    ) -> Self {
        Self {
            step,
            dir,
            limit,
            encoder,
        }
    }
}

impl StepperHardware for StepperPins {
    #[inline]
    fn step(&mut self) {
        self.step.set_high();
    }

    #[inline]
    fn unstep(&mut self) {
        self.step.set_low();
    }

    #[inline]
    fn positive_direction(&mut self) {
        self.dir.set_high();
    }

    #[inline]
    fn negative_direction(&mut self) {
        self.dir.set_low();
    }

    /// The switch pulls the line to ground when pressed.
    #[inline]
    fn check_limit_switch(&mut self) -> bool {
        self.limit.is_low()
    }

    fn encoder_position(&mut self) -> Option<i32> {
        self.encoder.as_mut().map(Encoder::position)
    }
}

/// Active-low driver enable line.
pub struct EnablePin {
    pin: Pin<'A', 3, Output<PushPull>>,
}

impl EnablePin {
    /// Wrap the pin and leave the driver disabled.
    pub fn new(mut pin: Pin<'A', 3, Output<PushPull>>) -> Self {
        pin.set_high();
        Self { pin }
    }
}

impl MotorEnable for EnablePin {
    fn enable(&mut self) {
        self.pin.set_low();
    }

    fn disable(&mut self) {
        self.pin.set_high();
    }
}
