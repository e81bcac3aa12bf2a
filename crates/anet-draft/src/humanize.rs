//! Relative time phrasing for user messages

use std::time::Duration;

/// Phrase a duration the way relative times are shown to users
///
/// `30s` is "a few seconds", `60s` "a minute", `120s` "2 minutes".
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn humanize(duration: Duration) -> String {
    let seconds = duration.as_secs_f64().round();
    let minutes = (seconds / 60.0).round();
    let hours = (minutes / 60.0).round();
    let days = (hours / 24.0).round();
    let months = (days / 30.0).round();
    let years = (days / 365.0).round();

    if seconds < 45.0 {
        "a few seconds".to_string()
    } else if seconds < 90.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes as u64)
    } else if minutes < 90.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours as u64)
    } else if hours < 36.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days as u64)
    } else if days < 45.0 {
        "a month".to_string()
    } else if days < 320.0 {
        format!("{} months", months as u64)
    } else if days < 548.0 {
        "a year".to_string()
    } else {
        format!("{} years", years as u64)
    }
}
