// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Quadrature encoder on TIM3 in encoder mode.
//!
//! TIM3 is only 16 bits wide, so [`Encoder::position`] folds each reading into a 32-bit count.
//! Call it at least once per half counter range of travel.

use stm32h7xx_hal::pac;
use stm32h7xx_hal::rcc::{rec, ResetEnable};

pub struct Encoder {
    tim: pac::TIM3,
    last: u16,
    position: i32,
}

impl Encoder {
    /// Configure TIM3 as a quadrature encoder with full 16-bit range.
    pub fn tim3(tim3: pac::TIM3, prec: rec::Tim3) -> Self {
        prec.enable().reset();

        let tim = tim3;

        // Disable counter while configuring
        tim.cr1.modify(|_, w| w.cen().clear_bit());

        tim.arr.write(|w| unsafe { w.bits(0xFFFF) });

        // Encoder mode 3: count on both TI1 and TI2
        tim.smcr.modify(|_, w| unsafe { w.sms().bits(0b011) });
        // CC1 on TI1, CC2 on TI2.
        tim.ccmr1_input()
            .modify(|_, w| unsafe { w.cc1s().bits(0b01).cc2s().bits(0b01) });
        tim.ccer.modify(|_, w| {
            w.cc1p()
                .clear_bit()
                .cc2p()
                .clear_bit()
                .cc1e()
                .set_bit()
                .cc2e()
                .set_bit()
        });

        tim.cnt.write(|w| unsafe { w.bits(0) });
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self {
            tim,
            last: 0,
            position: 0,
        }
    }

    /// Read the raw 16-bit counter value.
    #[inline]
    pub fn raw(&self) -> u16 {
        self.tim.cnt.read().cnt().bits()
    }

    /// Signed count since the last reset.
    pub fn position(&mut self) -> i32 {
        let raw = self.raw();
        let delta = raw.wrapping_sub(self.last) as i16;
        self.last = raw;
        self.position = self.position.wrapping_add(i32::from(delta));
        self.position
    }

    pub fn reset(&mut self) {
        self.tim.cnt.write(|w| unsafe { w.bits(0) });
        self.last = 0;
        self.position = 0;
    }

    /// Consume the wrapper and return the underlying timer peripheral.
    #[inline]
    pub fn free(self) -> pac::TIM3 {
        self.tim
    }
}
