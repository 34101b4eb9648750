use clap::{Parser, Subcommand};
use lightctl::config::{ConfigLoader, LogFormat, LoggingConfig};
use lightctl::hex::{hex_dump, parse_hex};
use lightctl::logging::{FileLog, SharedLog, TracingLog};
use lightctl::port::SystemBackend;
use lightctl::{AppResult, Config, PortManager};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Talk to light-control devices over serial ports.",
    long_about = "Opens serial ports through the lightctl port manager, sends hex payloads with device pacing, and polls for replies inside a short receive window. Every event is logged to stderr and, when configured, to rotating log files."
)]
struct Args {
    /// Configuration file to use instead of the standard search path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List serial ports present on this machine.
    Ports {
        /// Print JSON instead of one name per line.
        #[arg(long)]
        json: bool,
    },
    /// Send a hex payload such as "01 02 ff".
    Send {
        port: String,
        payload: String,
        #[arg(short, long)]
        baud: Option<u32>,
        /// Poll for a reply after sending.
        #[arg(short, long)]
        listen: bool,
    },
    /// Poll a port for incoming bytes.
    Recv {
        port: String,
        #[arg(short, long)]
        baud: Option<u32>,
        /// Number of receive windows.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
    },
    /// Print the effective configuration.
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?.into_config(),
        None => match ConfigLoader::load() {
            Ok(loader) => loader.into_config(),
            Err(e) => {
                eprintln!("Warning: Failed to load config, using defaults: {}", e);
                ConfigLoader::with_defaults().into_config()
            }
        },
    };

    init_tracing(&config.logging);
    run(args.command, &config)?;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str().to_ascii_lowercase()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Rotating files when a log directory is configured, `tracing` otherwise.
fn event_sink(logging: &LoggingConfig) -> SharedLog {
    if let Some(file_config) = logging.file_log() {
        match FileLog::open(file_config) {
            Ok(log) => return Arc::new(log),
            Err(e) => tracing::warn!("File logging disabled: {}", e),
        }
    }
    Arc::new(TracingLog)
}

fn build_manager(config: &Config) -> PortManager {
    let manager = PortManager::new(Arc::new(SystemBackend), event_sink(&config.logging))
        .with_timing(config.serial.timing());
    match &config.serial.device_prefix {
        Some(prefix) => manager.with_device_prefix(prefix.clone()),
        None => manager,
    }
}

fn run(command: Command, config: &Config) -> AppResult<()> {
    match command {
        Command::Ports { json } => list_ports(json),
        Command::Send {
            port,
            payload,
            baud,
            listen,
        } => {
            let data = parse_hex(&payload)?;
            let manager = build_manager(config);
            let port = config.serial.resolve_port(&port);
            let handle = manager.open_port(&port, baud.unwrap_or(config.serial.default_baud))?;

            let sent = manager.send(handle, &data);
            let reply = match (&sent, listen) {
                (Ok(()), true) => Some(manager.receive_vec(handle)),
                _ => None,
            };
            manager.close_port(handle);

            sent?;
            println!("sent {} bytes", data.len());
            if let Some(reply) = reply {
                print_frame(&reply?);
            }
            Ok(())
        }
        Command::Recv { port, baud, count } => {
            let manager = build_manager(config);
            let port = config.serial.resolve_port(&port);
            let handle = manager.open_port(&port, baud.unwrap_or(config.serial.default_baud))?;

            let mut buf = Vec::new();
            let mut outcome = Ok(());
            for _ in 0..count {
                match manager.receive(handle, &mut buf) {
                    Ok(_) => print_frame(&buf),
                    Err(e) => {
                        outcome = Err(e.into());
                        break;
                    }
                }
            }
            manager.close_port(handle);
            outcome
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }
}

fn print_frame(data: &[u8]) {
    if data.is_empty() {
        println!("(timeout)");
    } else {
        println!("{}", hex_dump(data));
    }
}

fn list_ports(json: bool) -> AppResult<()> {
    let ports = serialport::available_ports()?;
    if json {
        let entries: Vec<_> = ports
            .iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.port_name,
                    "type": format!("{:?}", p.port_type),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for p in ports {
            println!("{}", p.port_name);
        }
    }
    Ok(())
}
