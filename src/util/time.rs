/// Get the current time in seconds since the UNIX epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn current_time_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Get the current time in seconds since the UNIX epoch
#[cfg(target_arch = "wasm32")]
pub fn current_time_secs() -> f64 {
    web_sys::window()
        .and_then(|window| window.performance())
        .map(|perf| (perf.time_origin() + perf.now()) / 1000.0)
        .unwrap_or(0.0)
}

/// Get a timestamp in whole seconds since the UNIX epoch
pub fn timestamp_secs() -> i64 {
    current_time_secs() as i64
}

/// Format an elapsed duration using its coarsest nonzero unit plus one finer
/// subdivision, e.g. `"2h 5m"` or `"45s"`.
pub fn format_elapsed(seconds: i64) -> String {
    let seconds = seconds.unsigned_abs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{days}d {}h", hours % 24)
    } else if hours > 0 {
        format!("{hours}h {}m", minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m {}s", seconds % 60)
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed_units() {
        assert_eq!(format_elapsed(0), "0s");
        assert_eq!(format_elapsed(45), "45s");
        assert_eq!(format_elapsed(125), "2m 5s");
        assert_eq!(format_elapsed(2 * 3600 + 5 * 60 + 9), "2h 5m");
        assert_eq!(format_elapsed(3 * 86_400 + 7 * 3600), "3d 7h");
        assert_eq!(format_elapsed(-60), "1m 0s");
    }
}
