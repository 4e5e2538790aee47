use env_logger::{Builder, WriteStyle};
use log::{info, warn, LevelFilter};
use std::fs::OpenOptions;
use std::path::Path;

/// Maps the number of `-v` flags onto a level filter
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialize the logging system.
///
/// `RUST_LOG` still applies on top of the verbosity level. When `log_file` is
/// given, records are appended there instead of stderr.
pub fn initialize_logging(
    verbosity: u8,
    log_file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Builder::new();
    builder
        .filter_level(level_for_verbosity(verbosity))
        .parse_default_env()
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Auto);

    if let Some(path) = log_file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.try_init()?;

    info!("Logging system initialized");
    Ok(())
}

/// Helper function to format sensitive data for logging
pub fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Masks the local part of an email, keeping the domain readable
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", format_sensitive(local), domain),
        None => format_sensitive(email),
    }
}

/// Structured logging for authentication events. Never pass passwords, codes or tokens.
pub fn log_auth_event(event_type: &str, email: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Auth event: type={}, email={}, success=true, timestamp={}, details={:?}",
            event_type,
            mask_email(email),
            timestamp,
            details
        );
    } else {
        warn!(
            "Auth event: type={}, email={}, success=false, timestamp={}, details={:?}",
            event_type,
            mask_email(email),
            timestamp,
            details
        );
    }
}

/// Structured logging for session changes (sign-out, token writes)
pub fn log_session_event(event_type: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Session event: type={}, success=true, timestamp={}, details={:?}",
            event_type, timestamp, details
        );
    } else {
        warn!(
            "Session event: type={}, success=false, timestamp={}, details={:?}",
            event_type, timestamp, details
        );
    }
}
