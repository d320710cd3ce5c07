use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::DurationError;

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("duration regex is valid")
});

/// Parses `1h30m15s`, `25m` or `90s` style durations. Whole seconds only.
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let input = input.trim();
    let caps = PATTERN
        .captures(input)
        .ok_or_else(|| DurationError::Format(input.to_string()))?;

    let component = |idx: usize| -> Result<u64, DurationError> {
        caps.get(idx).map_or(Ok(0), |m| {
            m.as_str()
                .parse()
                .map_err(|_| DurationError::Overflow(input.to_string()))
        })
    };

    let hours = component(1)?;
    let minutes = component(2)?;
    let seconds = component(3)?;

    let total_secs = hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(|| DurationError::Overflow(input.to_string()))?;

    if total_secs == 0 {
        return Err(DurationError::Zero);
    }

    Ok(Duration::from_secs(total_secs))
}

/// `m:ss` below an hour, `h:mm:ss` above. Sub-second parts are dropped.
pub fn format_hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;

    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
