use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format an instant the way submissions are stamped, e.g. `17/10/2026 2:05:09 pm IST`.
pub fn format_submitted_at(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%-d/%-m/%Y %-I:%M:%S %P %Z").to_string()
}
