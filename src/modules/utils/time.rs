use std::time::Instant;

/// Format duration in seconds to human readable string
pub fn format_duration(seconds: u64) -> String {
    match seconds {
        1 => "1 second".to_string(),
        s if s < 60 => format!("{} seconds", s),
        s if s < 3600 => format!("{}m {:02}s", s / 60, s % 60),
        s => format!("{}h {:02}m", s / 3600, (s % 3600) / 60),
    }
}

/// Whole seconds elapsed since `mark`, advancing `mark` by exactly that amount
/// so the fractional remainder carries over to the next call
pub fn take_elapsed_seconds(mark: &mut Instant) -> u64 {
    let elapsed = mark.elapsed().as_secs();
    if elapsed > 0 {
        *mark += std::time::Duration::from_secs(elapsed);
    }
    elapsed
}
