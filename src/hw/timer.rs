// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Periodic step interrupt on TIM2.
//!
//! The update interrupt fires at the pulse generator's tick rate. Its handler must call
//! [`StepTimer::clear_interrupt`] before stepping, or the interrupt retriggers immediately.

use stm32h7xx_hal::pac;
use stm32h7xx_hal::rcc::{rec, ResetEnable};

pub struct StepTimer {
    tim: pac::TIM2,
}

impl StepTimer {
    /// Configure TIM2 to raise an update interrupt `tick_hz` times per second.
    ///
    /// * `prec` – the TIM2 clock gate, from the frozen RCC
    /// * `timer_clock_hz` – the APB1 timer kernel clock feeding TIM2
    pub fn tim2(tim2: pac::TIM2, prec: rec::Tim2, timer_clock_hz: u32, tick_hz: u32) -> Self {
        prec.enable().reset();

        let tim = tim2;

        tim.cr1.modify(|_, w| w.cen().clear_bit());

        let reload = (timer_clock_hz / tick_hz.max(1)).saturating_sub(1);
        tim.psc.write(|w| w.psc().bits(0));
        tim.arr.write(|w| unsafe { w.bits(reload) });
        tim.cnt.write(|w| unsafe { w.bits(0) });

        // Latch the prescaler and reload now, without raising an interrupt.
        tim.cr1.modify(|_, w| w.urs().set_bit());
        tim.egr.write(|w| w.ug().set_bit());
        tim.sr.modify(|_, w| w.uif().clear_bit());

        tim.dier.modify(|_, w| w.uie().set_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());

        Self { tim }
    }

    /// Acknowledge the update interrupt.
    #[inline]
    pub fn clear_interrupt(&mut self) {
        self.tim.sr.modify(|_, w| w.uif().clear_bit());
    }

    pub fn stop(&mut self) {
        self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        self.tim.dier.modify(|_, w| w.uie().clear_bit());
    }
}
