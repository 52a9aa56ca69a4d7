use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs;

use crate::domain::canal::protocol::PortSide;

// Define where to store logs
const LOG_DIR: &str = "logs";

fn log_file_name(port: PortSide) -> &'static str {
    match port {
        PortSide::Origin => "origin_port.log",
        PortSide::Destination => "destination_port.log",
    }
}

/// Initializes the global logger of one port process.
///
/// Log level is controlled by the `RUST_LOG` environment variable and
/// defaults to `info`. Lines go to stderr and to `logs/<port>_port.log`;
/// stdout is never used since it may carry the canal link.
pub fn init(port: PortSide) {
    if let Err(e) = fs::create_dir_all(LOG_DIR) {
        eprintln!("Failed to create log directory at '{}': {}", LOG_DIR, e);
    }

    let log_file_path = format!("{}/{}", LOG_DIR, log_file_name(port));

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let log_level_filter = log_level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::BrightBlack);

    let console_config = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!("[{} {}] {}", Local::now().format("%H:%M:%S"), colors.color(record.level()), message))
        })
        .chain(std::io::stderr());

    let mut dispatch = Dispatch::new().level(log_level_filter).level_for("serde", LevelFilter::Warn).chain(console_config);

    match fern::log_file(&log_file_path) {
        Ok(file) => {
            let file_config = Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("[{} {} {}] {}", Local::now().format("%H:%M:%S"), record.level(), record.target(), message))
                })
                .chain(file);
            dispatch = dispatch.chain(file_config);
        }
        Err(e) => eprintln!("Failed to open log file '{}': {}", log_file_path, e),
    }

    dispatch.apply().unwrap_or_else(|e| {
        eprintln!("Failed to apply logger configuration: {}", e);
    });

    log::debug!("{}: logging to stderr and '{}'", port, log_file_path);
}
