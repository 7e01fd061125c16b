use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ble_controller::config::{self, ControllerConfig};
use ble_controller::connection::ConnectionStatus;
use ble_controller::descriptor;
use ble_controller::hid::keymap::usb;
use ble_controller::hid::{hat, mouse_button};
use ble_controller::report;
use ble_controller::transport::{PeerAddress, RecordingTransport};
use ble_controller::BleController;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// BLE HID controller tooling
#[derive(Parser, Debug)]
#[command(name = "ble-controller")]
#[command(version, about = "Inspect and exercise BLE HID controller configurations", long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a configuration and print its report descriptor
    Descriptor {
        /// JSON configuration file (defaults when omitted)
        #[arg(short = 'c', long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print one annotated line per item instead of hex
        #[arg(long)]
        annotate: bool,
    },

    /// Print the byte layout of the gamepad report
    Layout {
        #[arg(short = 'c', long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Drive a controller against an in-memory transport and log every report
    Simulate {
        #[arg(short = 'c', long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Text to type on the keyboard
        #[arg(long, default_value = "Hello!")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    init_logging(args.log_level, args.verbose);

    match args.command {
        Command::Descriptor { config, annotate } => {
            let config = load_config(config.as_deref()).await?;
            print_descriptor(&config, annotate)
        }
        Command::Layout { config } => {
            let config = load_config(config.as_deref()).await?;
            print_layout(&config);
            Ok(())
        }
        Command::Simulate { config, text } => {
            let config = load_config(config.as_deref()).await?;
            simulate(config, &text).await
        }
    }
}

fn init_logging(level: LogLevel, verbose_count: u8) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let filter = match effective_level {
        LogLevel::Error => "ble_controller=error",
        LogLevel::Warn => "ble_controller=warn",
        LogLevel::Info => "ble_controller=info",
        LogLevel::Verbose => "ble_controller=debug,warn",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "ble_controller=trace,debug",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<ControllerConfig> {
    match path {
        Some(path) => config::load_from_file(path)
            .await
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(ControllerConfig::default()),
    }
}

fn print_descriptor(config: &ControllerConfig, annotate: bool) -> anyhow::Result<()> {
    let descriptor = descriptor::compile(config).context("failed to compile descriptor")?;

    if annotate {
        let mut depth = 0usize;
        for item in descriptor.items() {
            if item.name() == "End Collection" {
                depth = depth.saturating_sub(1);
            }
            println!("{}{}", "  ".repeat(depth), item.annotate());
            if item.name() == "Collection" {
                depth += 1;
            }
        }
        println!("// {} bytes", descriptor.len());
    } else {
        println!("{}", descriptor);
    }
    Ok(())
}

fn print_layout(config: &ControllerConfig) {
    let gamepad = &config.gamepad;
    println!(
        "gamepad report id {}: {} bytes",
        gamepad.report_id,
        report::gamepad_report_size(gamepad)
    );
    for field in report::gamepad_layout(gamepad) {
        println!("  {:>3} +{:<2} {}", field.offset, field.len, field.name);
    }
    println!(
        "keyboard report id {}: {} bytes",
        config.keyboard.report_id,
        report::KEYBOARD_REPORT_LEN
    );
    println!(
        "mouse report id {}: {} bytes",
        config.mouse.report_id,
        report::MOUSE_REPORT_LEN
    );
}

async fn simulate(config: ControllerConfig, text: &str) -> anyhow::Result<()> {
    let status = Arc::new(ConnectionStatus::new());
    let transport = Arc::new(RecordingTransport::new(status.clone()));
    let controller = BleController::new(config, transport.clone(), status)
        .context("invalid controller configuration")?;
    controller.start().await?;

    let host: PeerAddress = "c0:ff:ee:00:00:01".parse()?;
    transport.connect_peer(host);

    if controller.config().profiles.gamepad {
        controller.press(1).await?;
        controller.set_left_thumb(16384, -16384).await?;
        if controller.config().gamepad.hat_switch_count > 0 {
            controller.set_hat(0, hat::UP_RIGHT).await?;
        }
        controller.release(1).await?;
    }
    if controller.config().profiles.keyboard {
        controller.keyboard_print(text).await;
        controller.keyboard_write(usb::KEY_ENTER).await;
    }
    if controller.config().profiles.mouse {
        controller.mouse_move(10, -10).await;
        controller.mouse_scroll(-1).await;
        controller.mouse_click(mouse_button::LEFT).await;
    }

    for transmission in transport.take_transmissions() {
        let hex = transmission
            .bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(report_id = transmission.report_id, "{}", hex);
    }

    // Pair with a second host while the first keeps reconnecting once
    transport.set_sticky_peer(host, 1);
    let pairing = controller.enter_pairing_mode(CancellationToken::new(), Some(Duration::from_secs(1)));
    let newcomer = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        transport.connect_peer(PeerAddress([0xC0, 0xFF, 0xEE, 0, 0, 2]));
    };
    let (paired, ()) = tokio::join!(pairing, newcomer);
    tracing::info!("Paired with {}", paired?);

    Ok(())
}
