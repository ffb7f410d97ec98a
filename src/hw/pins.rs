// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for an STM32H743 single-axis motor node.

use stm32h7xx_hal::{
    gpio::{Alternate, Input, Output, Pin, PushPull, Speed},
    pac,
    prelude::*,
    rcc::rec,
};

/// All board pins. Construct this once at startup using:
///
/// ```ignore
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOD, dp.GPIOE, &ccdr.peripheral);
/// ```
pub struct BoardPins {
    pub spi4: Spi4Pins,
    pub stepper: StepperIo,
    pub encoder: EncoderPins,
    pub fdcan1: FdCan1Pins,
}

/// SPI4 SCK/MISO/MOSI and the TMC2130 chip select
pub struct Spi4Pins {
    pub sck: Pin<'E', 12, Alternate<5>>,
    pub miso: Pin<'E', 13, Alternate<5>>,
    pub mosi: Pin<'E', 14, Alternate<5>>,
    pub cs: Pin<'E', 4, Output<PushPull>>,
}

/// Step/direction interface to the driver, plus its enable line and the home switch
pub struct StepperIo {
    pub step: Pin<'D', 12, Output<PushPull>>,
    pub dir: Pin<'D', 13, Output<PushPull>>,
    pub enable: Pin<'A', 3, Output<PushPull>>,
    pub limit: Pin<'A', 2, Input>,
}

/// TIM3 quadrature encoder inputs
pub struct EncoderPins {
    pub tim3_ch1: Pin<'A', 6, Alternate<2>>,
    pub tim3_ch2: Pin<'A', 7, Alternate<2>>,
}

/// FDCAN1 bus pins
pub struct FdCan1Pins {
    pub tx: Pin<'A', 12, Alternate<9>>,
    pub rx: Pin<'A', 11, Alternate<9>>,
}

/// GPIO bank clocks the board uses.
pub struct GpioClocks {
    pub gpioa: rec::Gpioa,
    pub gpiod: rec::Gpiod,
    pub gpioe: rec::Gpioe,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(gpioa: pac::GPIOA, gpiod: pac::GPIOD, gpioe: pac::GPIOE, clocks: GpioClocks) -> Self {
        let gpioa = gpioa.split(clocks.gpioa);
        let gpiod = gpiod.split(clocks.gpiod);
        let gpioe = gpioe.split(clocks.gpioe);

        Self {
            spi4: Spi4Pins {
                sck: gpioe.pe12.into_alternate(),
                miso: gpioe.pe13.into_alternate(),
                mosi: gpioe.pe14.into_alternate(),
                cs: gpioe.pe4.into_push_pull_output(),
            },

            stepper: StepperIo {
                step: gpiod.pd12.into_push_pull_output(),
                dir: gpiod.pd13.into_push_pull_output(),
                enable: gpioa.pa3.into_push_pull_output(),
                limit: gpioa.pa2.into_pull_up_input(),
            },

            encoder: EncoderPins {
                tim3_ch1: gpioa.pa6.into_alternate(),
                tim3_ch2: gpioa.pa7.into_alternate(),
            },

            fdcan1: FdCan1Pins {
                tx: gpioa.pa12.into_alternate().speed(Speed::VeryHigh),
                rx: gpioa.pa11.into_alternate().speed(Speed::VeryHigh),
            },
        }
    }
}
