use chrono::{DateTime, Utc};

/// shortest representation of a float that parses back to the same value
pub(crate) fn format_float(value: f64) -> String {
    if value.is_finite() {
        let mut buffer = ryu::Buffer::new();
        let text = buffer.format(value);
        text.strip_suffix(".0").unwrap_or(text).to_string()
    } else {
        value.to_string()
    }
}

/// the current UTC time in `ctime` layout, e.g. `Thu Jan  1 00:00:00 1970`
pub(crate) fn current_date() -> String {
    format_date(Utc::now())
}

pub(crate) fn format_date(time: DateTime<Utc>) -> String {
    time.format("%a %b %e %H:%M:%S %Y").to_string()
}
