use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Date formats accepted in the date column, tried in order
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y年%m月%d日"];

/// Parse time string in HH:MM format
pub fn parse_time(time_str: &str) -> Option<(u32, u32)> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some((hour, minute))
}

/// Normalize a time string to the HH:MM format
///
/// Accepts `9`, `9.30`, `9,30`, `9:30` and `09:30:00`. Anything else is
/// returned trimmed but otherwise untouched.
pub fn normalize_time(time_str: &str) -> String {
    // Remove any extra whitespace
    let time_str = time_str.trim();

    // Replace commas with periods
    let time_str = time_str.replace(',', ".");

    if time_str.contains(':') {
        if let Some((hour, minute)) = parse_time(&time_str) {
            return format!("{:02}:{:02}", hour, minute);
        }
        // Seconds are dropped, the webhook timestamp appends its own
        if let Ok(time) = NaiveTime::parse_from_str(&time_str, "%H:%M:%S") {
            return time.format("%H:%M").to_string();
        }
    } else if time_str.contains('.') {
        // Time has a period (e.g., "8.30")
        let parts: Vec<&str> = time_str.split('.').collect();
        if parts.len() == 2 {
            if let (Ok(hours), Ok(minutes)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                if hours < 24 && minutes < 60 {
                    return format!("{:02}:{:02}", hours, minutes);
                }
            }
        }
    } else if let Ok(hours) = time_str.parse::<u32>() {
        // Just a number (e.g., "8"), assume it's hours
        if hours < 24 {
            return format!("{:02}:00", hours);
        }
    }

    // If all parsing fails, return the original string
    time_str
}

/// Normalize a date string to the YYYY-MM-DD format
///
/// A trailing midnight time (as written by spreadsheet exports) is dropped.
/// Unrecognised input is returned trimmed.
pub fn normalize_date(date_str: &str) -> String {
    let date_str = date_str.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
            return date.format("%Y-%m-%d").to_string();
        }
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(date_str, format) {
            if datetime.time().num_seconds_from_midnight() == 0 {
                return datetime.date().format("%Y-%m-%d").to_string();
            }
        }
    }

    date_str.to_string()
}

/// Render a spreadsheet timestamp the way a person would type it
///
/// Pure times become `HH:MM`, midnight datetimes become `YYYY-MM-DD`,
/// everything else `YYYY-MM-DD HH:MM`.
pub fn render_datetime(datetime: NaiveDateTime, time_only: bool) -> String {
    if time_only {
        datetime.time().format("%H:%M").to_string()
    } else if datetime.time().num_seconds_from_midnight() == 0 {
        datetime.date().format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M").to_string()
    }
}
