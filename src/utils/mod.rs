//! Common utilities and helpers

use std::time::Duration;

pub mod logging;
pub mod path;

/// Human-readable length such as `1h 02m 05s`, `3m 07.5s` or `42.0s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m) = (secs / 3600, secs % 3600 / 60);
    let frac = (secs % 60) as f64 + f64::from(duration.subsec_millis()) / 1000.0;
    match (h, m) {
        (0, 0) => format!("{:.1}s", frac),
        (0, m) => format!("{}m {:04.1}s", m, frac),
        (h, m) => format!("{}h {:02}m {:02}s", h, m, secs % 60),
    }
}

/// Binary-prefixed size, e.g. `1.5 MiB`
pub fn format_file_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if size < 1024 {
        return format!("{} B", size);
    }
    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
