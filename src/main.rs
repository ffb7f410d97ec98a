// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use core::cell::RefCell;
use core::num::{NonZeroU16, NonZeroU8};

use cortex_m::interrupt::Mutex;
use cortex_m_rt::entry;
use fdcan::config::NominalBitTiming;
use panic_halt as _;

use hal::{
    can::CanExt,
    pac::{self, interrupt},
    prelude::*,
    rcc::rec,
    spi,
};
use stm32h7xx_hal as hal;

use ot3_motion::can::NodeId;
use ot3_motion::drivers::tmc2130::{CurrentConfig, CurrentControl};
use ot3_motion::drivers::Tmc2130;
use ot3_motion::hw::{
    BoardPins, ChipSelect, EnablePin, Encoder, FdCanBus, GpioClocks, SpiBus, StepTimer, StepperPins,
    Tmc2130Spi,
};
use ot3_motion::motion::{
    LinearMotionConfig, MechanicalConfig, MotionConstraints, NodeConfig,
};
use ot3_motion::node::NodePulseGenerator;
use ot3_motion::{MotorNode, NodeParts, NodeResources};

/// Pulse generator tick rate (5 µs period).
const STEP_TICK_HZ: u32 = 200_000;

/// FDCAN kernel clock, taken from PLL1 Q.
const FDCAN_KERNEL_HZ: u32 = 32_000_000;

static PULSE: Mutex<RefCell<Option<(StepTimer, NodePulseGenerator<'static, StepperPins>)>>> =
    Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    // Peripherals
    let dp = pac::Peripherals::take().unwrap();
    let mut cp = cortex_m::Peripherals::take().unwrap();

    // Clocks
    let pwrcfg = dp.PWR.constrain().freeze();
    let ccdr = dp
        .RCC
        .constrain()
        .sys_ck(400.MHz())
        .pll1_q_ck(FDCAN_KERNEL_HZ.Hz())
        .freeze(pwrcfg, &dp.SYSCFG);

    let pins = BoardPins::new(
        dp.GPIOA,
        dp.GPIOD,
        dp.GPIOE,
        GpioClocks {
            gpioa: ccdr.peripheral.GPIOA,
            gpiod: ccdr.peripheral.GPIOD,
            gpioe: ccdr.peripheral.GPIOE,
        },
    );

    // FDCAN1: 500 kbit/s nominal, 16 time quanta per bit at 32 MHz
    let fdcan_prec = ccdr.peripheral.FDCAN.kernel_clk_mux(rec::FdcanClkSel::Pll1Q);
    let timing = NominalBitTiming {
        prescaler: NonZeroU16::new(4).unwrap(),
        seg1: NonZeroU8::new(13).unwrap(),
        seg2: NonZeroU8::new(2).unwrap(),
        sync_jump_width: NonZeroU8::new(1).unwrap(),
    };
    let fdcan1 = dp.FDCAN1.fdcan(pins.fdcan1.tx, pins.fdcan1.rx, fdcan_prec);
    let mut setup = FdCanBus::new(fdcan1, timing);

    // SPI4 (TMC2130 runs SPI mode 3)
    let spi4 = dp.SPI4.spi(
        (pins.spi4.sck, pins.spi4.miso, pins.spi4.mosi),
        spi::MODE_3,
        1.MHz(),
        ccdr.peripheral.SPI4,
        &ccdr.clocks,
    );
    let transport = Tmc2130Spi::new(SpiBus::new(spi4), ChipSelect::active_low(pins.spi4.cs));
    let mut driver = Tmc2130::new(
        transport,
        CurrentConfig::default(),
        CurrentControl {
            hold_current: 2,
            run_current: 16,
            hold_current_delay: 7,
        },
    );
    driver.write_current_control().unwrap();

    // Axis
    let stepper = StepperPins::new(
        pins.stepper.step,
        pins.stepper.dir,
        pins.stepper.limit,
        Some(Encoder::tim3(dp.TIM3, ccdr.peripheral.TIM3)),
    );
    let parts = NodeParts {
        config: NodeConfig {
            version: 1,
            ..NodeConfig::new(NodeId::HeadL)
        },
        axis: LinearMotionConfig {
            mech_config: MechanicalConfig::LeadScrew {
                lead_screw_pitch: 12.0,
            },
            steps_per_rev: 200.0,
            microstep: 16.0,
            gear_reduction_ratio: 1.0,
        },
        constraints: MotionConstraints::default(),
        motor: EnablePin::new(pins.stepper.enable),
        driver,
        stepper,
    };

    let resources = cortex_m::singleton!(: NodeResources = NodeResources::new()).unwrap();
    let (mut node, pulse) = MotorNode::new(resources, parts);
    // Without node filters the node still sees every frame and drops the ones not addressed to it.
    if node.setup_filters(&mut setup).is_err() {
        setup.accept_all();
    }
    let mut bus = setup.start();

    // Step timer
    let timer = StepTimer::tim2(
        dp.TIM2,
        ccdr.peripheral.TIM2,
        ccdr.clocks.timx_ker_ck().raw(),
        STEP_TICK_HZ,
    );
    cortex_m::interrupt::free(|cs| PULSE.borrow(cs).replace(Some((timer, pulse))));
    unsafe {
        cp.NVIC.set_priority(pac::Interrupt::TIM2, 0);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM2);
    }

    loop {
        if let Some(frame) = bus.receive() {
            node.handle_frame(frame.id, &frame.data);
        }
        node.poll(&mut bus);
    }
}

#[interrupt]
fn TIM2() {
    cortex_m::interrupt::free(|cs| {
        if let Some((timer, pulse)) = PULSE.borrow(cs).borrow_mut().as_mut() {
            timer.clear_interrupt();
            pulse.run_interrupt();
        }
    });
}
