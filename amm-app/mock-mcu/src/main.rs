use amm_core::utils::{
    BoardConfig, DriveLayout, SystemCommand, SystemController,
    controllers::DriveBinding,
};
use clap::{Parser, ValueEnum};
use core::cell::RefCell;
use embedded_hal::i2c::{ErrorType, I2c, Operation};
use static_cell::StaticCell;
use std::convert::Infallible;
use std::io::BufRead;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// First LED (channel) register of the PCA9685.
const LED0_ON_L: u8 = 0x06;

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    TwoWheel,
    FourWheel,
    Mecanum,
}

impl From<Layout> for DriveLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::TwoWheel => DriveLayout::TwoWheel,
            Layout::FourWheel => DriveLayout::FourWheelDifferential,
            Layout::Mecanum => DriveLayout::FourWheelMecanum,
        }
    }
}

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// JSON board configuration file
    #[clap(long)]
    config: Option<PathBuf>,
    /// PCA9685 I2C address, decimal or 0x-prefixed hex
    #[clap(long, value_parser = parse_address)]
    address: Option<u8>,
    /// drive layout
    #[clap(long, value_enum, default_value = "two-wheel")]
    layout: Layout,
    /// drive the wheels with continuous servos on S1.. instead of motors on M1..
    #[clap(long)]
    servo_wheels: bool,
    /// JSON commands; read one per line from stdin when none are given
    commands: Vec<String>,
}

fn parse_address(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid I2C address {s:?}: {e}"))
}

/// I2C bus that logs every transfer instead of touching hardware.
struct LoggingI2c;

impl ErrorType for LoggingI2c {
    type Error = Infallible;
}

impl I2c for LoggingI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => log_write(address, *bytes),
                Operation::Read(buf) => {
                    buf.fill(0);
                    debug!("I2C 0x{:02X} read {} bytes", address, buf.len());
                }
            }
        }
        Ok(())
    }
}

fn log_write(
    address: u8,
    bytes: &[u8],
) {
    match bytes {
        [reg, on_l, on_h, off_l, off_h] if *reg >= LED0_ON_L => {
            let channel = (reg - LED0_ON_L) / 4;
            let on = u16::from_le_bytes([*on_l, *on_h]);
            let off = u16::from_le_bytes([*off_l, *off_h]);
            info!(channel, on, off, "PWM 0x{:02X}", address);
        }
        _ => debug!("I2C 0x{:02X} <- {:02X?}", address, bytes),
    }
}

fn load_config(opts: &Opts) -> Result<BoardConfig, Box<dyn std::error::Error>> {
    let mut config = match &opts.config {
        Some(path) => serde_json::from_slice(&std::fs::read(path)?)?,
        None => BoardConfig::default(),
    };
    if let Some(address) = opts.address {
        config.address = address;
    }
    Ok(config)
}

fn run_command(
    ctrl: &mut SystemController<'_, LoggingI2c>,
    line: &str,
) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    match SystemCommand::from_json(line.as_bytes()) {
        Ok(cmd) => match ctrl.execute(cmd) {
            Ok(Some(power)) => info!(?power, "drive command applied"),
            Ok(None) => info!("actuator command applied"),
            Err(e) => error!("command failed: {:?}", e),
        },
        Err(error) => error!(?error, "error deserializing SystemCommand"),
    }
}

static I2C_BUS: StaticCell<RefCell<LoggingI2c>> = StaticCell::new();

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opts = Opts::parse();
    let config = load_config(&opts)?;
    let i2c_bus = I2C_BUS.init(RefCell::new(LoggingI2c));

    let layout = DriveLayout::from(opts.layout);
    let binding = if opts.servo_wheels {
        DriveBinding::continuous_servos(layout, config.calibration)
    } else {
        DriveBinding::motors(layout)
    };

    let mut ctrl = SystemController::new(i2c_bus, config);
    if ctrl.board.is_none() {
        warn!("running without a PWM board");
    }
    ctrl.bind_drive(binding);

    if opts.commands.is_empty() {
        info!("reading commands from stdin");
        for line in std::io::stdin().lock().lines() {
            run_command(&mut ctrl, &line?);
        }
    } else {
        for line in &opts.commands {
            run_command(&mut ctrl, line);
        }
    }
    Ok(())
}
