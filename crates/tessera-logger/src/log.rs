use crate::severity::LogSeverity;
use crate::systime::now;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable holding the minimum severity that gets printed.
pub const LOG_LEVEL_ENV: &str = "TESSERA_LOG";

static MIN_SEVERITY: Lazy<AtomicU8> = Lazy::new(|| {
    let initial = std::env::var(LOG_LEVEL_ENV)
        .ok()
        .and_then(|value| value.parse::<LogSeverity>().ok())
        .unwrap_or(LogSeverity::Info);
    AtomicU8::new(initial as u8)
});

/// Prints `msg` as `[SEVERITY] <local time> <msg>` unless it is below the minimum severity.
pub fn log(msg: String, log_severity: LogSeverity) {
    if log_severity < min_severity() {
        return;
    }
    println!("[{}] {} {}", log_severity, now(), msg);
}

pub fn min_severity() -> LogSeverity {
    LogSeverity::from_u8(MIN_SEVERITY.load(Ordering::Relaxed))
}

pub fn set_min_severity(log_severity: LogSeverity) {
    MIN_SEVERITY.store(log_severity as u8, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_min_severity() {
        let previous = min_severity();
        set_min_severity(LogSeverity::Error);
        assert_eq!(min_severity(), LogSeverity::Error);
        // Filtered, must not panic.
        log("dropped".to_string(), LogSeverity::Debug);
        set_min_severity(LogSeverity::Debug);
        assert_eq!(min_severity(), LogSeverity::Debug);
        log("printed".to_string(), LogSeverity::Debug);

        set_min_severity(previous);
        assert_eq!(min_severity(), previous);
    }
}
