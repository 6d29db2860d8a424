//! motorsys - Motor Controller Firmware
//!
//! Drives unipolar steppers and DC motors from an RP2040 and exposes them on
//! a UART console. Each stepper channel runs a step timer task and a deferred
//! actuation task; DC channels are driven synchronously from the console.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use motorsys_core::{MotorDevice, MotorError, PwmBinding, SharedBus};
use motorsys_drivers::{BankDc, BankStepper, DcBank, DcMotor, StepperBank, UnipolarStepper};
use motorsys_hal::PinAllocator;
use motorsys_protocol::MotorClass;

use crate::bus::BoardBus;
use crate::channels::{
    BoardHandle, BoardMutex, SharedBoard, StepperChannel, PAN_TIMER, STEPPER_TIMER, TILT_TIMER,
};
use crate::tasks::console::MAX_MOTORS;
use crate::timer::SignalTimer;

mod boards;
mod bus;
mod channels;
mod tasks;
mod timer;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Channels per stepper bank
const STEPPER_BANK_SIZE: usize = 2;

/// Channels per DC bank
const DC_BANK_SIZE: usize = 2;

type Stepper = UnipolarStepper<BoardMutex, BoardHandle, &'static SignalTimer>;
type Steppers = StepperBank<'static, BoardMutex, BoardBus, &'static SignalTimer, STEPPER_BANK_SIZE>;
type BankedStepper =
    BankStepper<'static, 'static, BoardMutex, BoardBus, &'static SignalTimer, STEPPER_BANK_SIZE>;
type Dc = DcMotor<BoardMutex, BoardHandle>;
type Wheels = DcBank<'static, BoardMutex, BoardBus, DC_BANK_SIZE>;
type Wheel = BankDc<'static, 'static, BoardMutex, BoardBus, DC_BANK_SIZE>;

// UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Peripherals and motors (must live forever for task references)
static BOARD: StaticCell<SharedBoard> = StaticCell::new();
static STEPPER: StaticCell<Stepper> = StaticCell::new();
static STEPPER_BANK: StaticCell<Steppers> = StaticCell::new();
static PAN: StaticCell<BankedStepper> = StaticCell::new();
static TILT: StaticCell<BankedStepper> = StaticCell::new();
static DC: StaticCell<Dc> = StaticCell::new();
static DC_BANK: StaticCell<Wheels> = StaticCell::new();
static WHEEL_RIGHT: StaticCell<Wheel> = StaticCell::new();
static WHEEL_LEFT: StaticCell<Wheel> = StaticCell::new();

/// What setup hands to the tasks
struct Motors {
    class: MotorClass<'static, MAX_MOTORS>,
    steppers: [(&'static str, &'static StepperChannel); 3],
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("motorsys firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Motor outputs start low; the drivers write standby again on creation
    let mut board = BoardBus::new();
    let outputs = [
        (2, Output::new(p.PIN_2, Level::Low)),
        (3, Output::new(p.PIN_3, Level::Low)),
        (4, Output::new(p.PIN_4, Level::Low)),
        (5, Output::new(p.PIN_5, Level::Low)),
        (6, Output::new(p.PIN_6, Level::Low)),
        (7, Output::new(p.PIN_7, Level::Low)),
        (8, Output::new(p.PIN_8, Level::Low)),
        (9, Output::new(p.PIN_9, Level::Low)),
        (10, Output::new(p.PIN_10, Level::Low)),
        (11, Output::new(p.PIN_11, Level::Low)),
        (12, Output::new(p.PIN_12, Level::Low)),
        (13, Output::new(p.PIN_13, Level::Low)),
        (14, Output::new(p.PIN_14, Level::Low)),
        (15, Output::new(p.PIN_15, Level::Low)),
        (16, Output::new(p.PIN_16, Level::Low)),
        (17, Output::new(p.PIN_17, Level::Low)),
        (19, Output::new(p.PIN_19, Level::Low)),
        (20, Output::new(p.PIN_20, Level::Low)),
        (21, Output::new(p.PIN_21, Level::Low)),
    ];
    for (id, out) in outputs {
        board.attach_pin(id, out);
    }

    let mut pwm_config = PwmConfig::default();
    pwm_config.top = boards::PWM_TOP;
    pwm_config.compare_a = 0;
    let (wheel_right_pwm, _) = Pwm::new_output_a(p.PWM_SLICE1, p.PIN_18, pwm_config.clone()).split();
    let (shared_pwm, _) = Pwm::new_output_a(p.PWM_SLICE3, p.PIN_22, pwm_config).split();
    board.attach_pwm(boards::WHEEL_RIGHT_PWM, wheel_right_pwm);
    board.attach_pwm(boards::SHARED_PWM, shared_pwm);
    info!("{} motor pins attached", board.pin_count());

    let board: &'static SharedBoard = BOARD.init(Mutex::new(RefCell::new(board)));

    let motors = match setup_motors(board) {
        Ok(motors) => motors,
        Err(e) => {
            error!("Motor setup failed: {}", e);
            loop {
                embassy_time::Timer::after_secs(60).await;
            }
        }
    };
    info!("{} motors registered", motors.class.len());

    // Setup UART for the console
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = boards::CONSOLE_BAUD;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized for console");

    // Spawn tasks
    for (name, channel) in motors.steppers {
        unwrap!(spawner.spawn(tasks::step_timer_task(name, channel)));
        unwrap!(spawner.spawn(tasks::actuation_task(name, channel)));
    }
    unwrap!(spawner.spawn(tasks::console_task(rx, tx, motors.class)));

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Create every motor on the board and register it with the motor class
fn setup_motors(board: &'static SharedBoard) -> Result<Motors, MotorError> {
    let mut pins = PinAllocator::new();
    let mut class = MotorClass::new();

    let stepper: &'static Stepper = STEPPER.init(UnipolarStepper::new(
        &boards::stepper()?,
        SharedBus::new(board),
        &STEPPER_TIMER,
        &mut pins,
    )?);

    let bank = STEPPER_BANK.init(StepperBank::new(board));
    bank.add_channel(&boards::pan()?, &PAN_TIMER, &mut pins)?;
    bank.add_channel(&boards::tilt()?, &TILT_TIMER, &mut pins)?;
    let bank: &'static Steppers = bank;
    let pan: &'static BankedStepper = PAN.init(bank.device("pan")?);
    let tilt: &'static BankedStepper = TILT.init(bank.device("tilt")?);

    let dc: &'static Dc = DC.init(DcMotor::new(&boards::dc()?, SharedBus::new(board), &mut pins)?);

    let wheels = DC_BANK.init(DcBank::new(board, Some(PwmBinding::new(boards::SHARED_PWM))));
    wheels.add_channel(&boards::wheel_right()?, &mut pins)?;
    wheels.add_channel(&boards::wheel_left()?, &mut pins)?;
    let wheels: &'static Wheels = wheels;
    let wheel_right: &'static Wheel = WHEEL_RIGHT.init(wheels.device("wheel-right")?);
    let wheel_left: &'static Wheel = WHEEL_LEFT.init(wheels.device("wheel-left")?);

    for device in [
        stepper as &dyn MotorDevice,
        pan,
        tilt,
        dc,
        wheel_right,
        wheel_left,
    ] {
        if let Err(e) = class.register(device) {
            warn!("{}: not registered: {}", device.name(), e);
        }
    }
    debug!("{} pins claimed", pins.claimed_count());

    Ok(Motors {
        class,
        steppers: [
            ("stepper", stepper.channel()),
            ("pan", bank.lookup("pan")?),
            ("tilt", bank.lookup("tilt")?),
        ],
    })
}
