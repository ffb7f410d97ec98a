// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! TMC2130 stepper driver register access.
//!
//! The chip speaks 40-bit SPI datagrams: one address byte (bit 7 set for writes) followed by 32
//! data bits, MSB first. Reads are pipelined, so a read datagram returns the data requested by the
//! datagram before it. [`RegisterAccess`] hides the transport; the board provides the SPI
//! implementation and tests provide a register file.

use core::f32::consts::SQRT_2;

// Register addresses
pub mod reg {
    pub const GCONF: u8 = 0x00;
    pub const GSTAT: u8 = 0x01;
    pub const IOIN: u8 = 0x04;
    pub const IHOLD_IRUN: u8 = 0x10;
    pub const TPOWERDOWN: u8 = 0x11;
    pub const TSTEP: u8 = 0x12;
    pub const TPWMTHRS: u8 = 0x13;
    pub const TCOOLTHRS: u8 = 0x14;
    pub const THIGH: u8 = 0x15;
    pub const XDIRECT: u8 = 0x2D;
    pub const VDCMIN: u8 = 0x33;
    /// First of the eight microstep table words, 0x60..=0x67.
    pub const MSLUT0: u8 = 0x60;
    pub const MSLUTSEL: u8 = 0x68;
    pub const MSLUTSTART: u8 = 0x69;
    pub const MSCNT: u8 = 0x6A;
    pub const MSCURACT: u8 = 0x6B;
    pub const CHOPCONF: u8 = 0x6C;
    pub const COOLCONF: u8 = 0x6D;
    pub const DCCTRL: u8 = 0x6E;
    pub const DRVSTATUS: u8 = 0x6F;
    pub const PWMCONF: u8 = 0x70;
    pub const PWMSCALE: u8 = 0x71;
    pub const ENCM_CTRL: u8 = 0x72;
    pub const LOST_STEPS: u8 = 0x73;
}

/// Bit 7 of the address byte selects a write.
pub const WRITE_BIT: u8 = 0x80;

/// `true` if `addr` names a register the chip implements.
pub fn is_valid_address(addr: u8) -> bool {
    use self::reg::*;
    matches!(
        addr,
        GCONF
            | GSTAT
            | IOIN
            | IHOLD_IRUN
            | TPOWERDOWN
            | TSTEP
            | TPWMTHRS
            | TCOOLTHRS
            | THIGH
            | XDIRECT
            | VDCMIN
            | MSLUT0..=MSCURACT
            | CHOPCONF
            | COOLCONF
            | DCCTRL
            | DRVSTATUS
            | PWMCONF
            | PWMSCALE
            | ENCM_CTRL
            | LOST_STEPS
    )
}

/// Build the 5-byte datagram for one access.
#[inline]
pub fn encode_datagram(addr: u8, data: u32, write: bool) -> [u8; 5] {
    let addr = if write { addr | WRITE_BIT } else { addr & !WRITE_BIT };
    let d = data.to_be_bytes();
    [addr, d[0], d[1], d[2], d[3]]
}

/// Split a received datagram into the status byte and data word.
#[inline]
pub fn decode_datagram(buf: [u8; 5]) -> (u8, u32) {
    (buf[0], u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]))
}

/// Raw register transport.
pub trait RegisterAccess {
    type Error;

    fn write_register(&mut self, addr: u8, data: u32) -> Result<(), Self::Error>;

    fn read_register(&mut self, addr: u8) -> Result<u32, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Address is not in the register map.
    InvalidRegister(u8),
    Transport(E),
}

/// Sense resistor and full-scale voltage, for converting currents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrentConfig {
    /// Ohms.
    pub r_sense: f32,
    /// Volts.
    pub v_sf: f32,
}

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            r_sense: 0.1,
            v_sf: 0.325,
        }
    }
}

/// IHOLD_IRUN register fields. Currents are on the chip's 0..=31 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentControl {
    pub hold_current: u8,
    pub run_current: u8,
    pub hold_current_delay: u8,
}

impl CurrentControl {
    pub const fn to_bits(self) -> u32 {
        (self.hold_current as u32 & 0x1F)
            | (self.run_current as u32 & 0x1F) << 8
            | (self.hold_current_delay as u32 & 0xF) << 16
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self {
            hold_current: (bits & 0x1F) as u8,
            run_current: (bits >> 8 & 0x1F) as u8,
            hold_current_delay: (bits >> 16 & 0xF) as u8,
        }
    }
}

/// TMC2130 bound to a register transport.
pub struct Tmc2130<R> {
    bus: R,
    current_config: CurrentConfig,
    current_control: CurrentControl,
}

impl<R: RegisterAccess> Tmc2130<R> {
    pub fn new(bus: R, current_config: CurrentConfig, current_control: CurrentControl) -> Self {
        Self {
            bus,
            current_config,
            current_control,
        }
    }

    pub fn free(self) -> R {
        self.bus
    }

    pub fn bus(&self) -> &R {
        &self.bus
    }

    pub fn write(&mut self, addr: u8, data: u32) -> Result<(), Error<R::Error>> {
        if !is_valid_address(addr) {
            return Err(Error::InvalidRegister(addr));
        }
        self.bus.write_register(addr, data).map_err(Error::Transport)?;
        if addr == reg::IHOLD_IRUN {
            self.current_control = CurrentControl::from_bits(data);
        }
        Ok(())
    }

    pub fn read(&mut self, addr: u8) -> Result<u32, Error<R::Error>> {
        if !is_valid_address(addr) {
            return Err(Error::InvalidRegister(addr));
        }
        self.bus.read_register(addr).map_err(Error::Transport)
    }

    /// Convert a current in amps, `q16.16`, to the 0..=31 IHOLD/IRUN scale.
    pub fn convert_current(&self, current: u32) -> u8 {
        const SMALL_R: f32 = 0.02;
        let scale = SQRT_2 * 32.0 * (self.current_config.r_sense + SMALL_R) / self.current_config.v_sf;
        let fixed = (scale * (1u32 << 16) as f32) as u64;
        if fixed == 0 {
            return 31;
        }
        if current as u64 >= (32u64 << 32) / fixed {
            return 31;
        }
        let value = ((fixed * current as u64) >> 32) as u32;
        value.saturating_sub(1) as u8
    }

    /// Push the tracked IHOLD_IRUN fields to the chip, e.g. after power-up.
    pub fn write_current_control(&mut self) -> Result<(), Error<R::Error>> {
        self.write(reg::IHOLD_IRUN, self.current_control.to_bits())
    }

    /// Update hold and run currents. A zero keeps the present setting.
    pub fn set_currents(&mut self, hold: u32, run: u32) -> Result<(), Error<R::Error>> {
        let mut control = self.current_control;
        if hold != 0 {
            control.hold_current = self.convert_current(hold);
        }
        if run != 0 {
            control.run_current = self.convert_current(run);
        }
        self.write(reg::IHOLD_IRUN, control.to_bits())
    }

    pub fn current_control(&self) -> CurrentControl {
        self.current_control
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Register file standing in for the chip.
    struct Registers {
        regs: [u32; 0x80],
        fail: bool,
    }

    impl Default for Registers {
        fn default() -> Self {
            Self {
                regs: [0; 0x80],
                fail: false,
            }
        }
    }

    impl RegisterAccess for Registers {
        type Error = ();

        fn write_register(&mut self, addr: u8, data: u32) -> Result<(), ()> {
            if self.fail {
                return Err(());
            }
            self.regs[addr as usize] = data;
            Ok(())
        }

        fn read_register(&mut self, addr: u8) -> Result<u32, ()> {
            if self.fail {
                return Err(());
            }
            Ok(self.regs[addr as usize])
        }
    }

    fn driver() -> Tmc2130<Registers> {
        Tmc2130::new(Registers::default(), CurrentConfig::default(), CurrentControl::default())
    }

    #[test]
    fn address_table() {
        for addr in [0x00, 0x01, 0x04, 0x10, 0x11, 0x12, 0x2D, 0x60, 0x67, 0x6B, 0x6C, 0x73] {
            assert!(is_valid_address(addr), "{addr:#x}");
        }
        for addr in [0x02, 0x03, 0x05, 0x16, 0x2C, 0x34, 0x5F, 0x74, 0x80, 0xFF] {
            assert!(!is_valid_address(addr), "{addr:#x}");
        }
    }

    #[test]
    fn datagram_layout() {
        assert_eq!(
            encode_datagram(reg::CHOPCONF, 0x0001_00C3, true),
            [0xEC, 0x00, 0x01, 0x00, 0xC3]
        );
        assert_eq!(encode_datagram(reg::DRVSTATUS, 0xFFFF_FFFF, false)[0], 0x6F);
        assert_eq!(decode_datagram([0x01, 0x12, 0x34, 0x56, 0x78]), (0x01, 0x1234_5678));
    }

    #[test]
    fn invalid_register_is_not_touched() {
        let mut d = driver();
        assert_eq!(d.write(0x02, 5), Err(Error::InvalidRegister(0x02)));
        assert_eq!(d.read(0x7F), Err(Error::InvalidRegister(0x7F)));
        assert!(d.bus().regs.iter().all(|r| *r == 0));

        d.write(reg::TPOWERDOWN, 20).unwrap();
        assert_eq!(d.read(reg::TPOWERDOWN), Ok(20));
    }

    #[test]
    fn transport_errors_propagate() {
        let mut d = Tmc2130::new(
            Registers {
                fail: true,
                ..Default::default()
            },
            CurrentConfig::default(),
            CurrentControl::default(),
        );
        assert_eq!(d.read(reg::GCONF), Err(Error::Transport(())));
    }

    #[test]
    fn current_scale() {
        let d = driver();
        assert_eq!(d.convert_current(1 << 16), 15);
        assert_eq!(d.convert_current(1 << 15), 7);
        assert_eq!(d.convert_current(200_000), 31);
        assert_eq!(d.convert_current(0), 0);
    }

    #[test]
    fn ihold_irun_packing() {
        let c = CurrentControl {
            hold_current: 7,
            run_current: 15,
            hold_current_delay: 6,
        };
        assert_eq!(c.to_bits(), 0x0006_0F07);
        assert_eq!(CurrentControl::from_bits(0x0006_0F07), c);
    }

    #[test]
    fn currents_keep_zero_fields() {
        let mut d = Tmc2130::new(
            Registers::default(),
            CurrentConfig::default(),
            CurrentControl {
                hold_current: 2,
                run_current: 3,
                hold_current_delay: 7,
            },
        );
        d.set_currents(0, 1 << 16).unwrap();
        assert_eq!(d.bus().regs[reg::IHOLD_IRUN as usize], 0x0007_0F02);
        assert_eq!(d.current_control().run_current, 15);
    }
}
