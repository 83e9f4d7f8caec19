use jiff::{Timestamp, tz::TimeZone};

const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// `2024/02/10 12:00`
    Short,
    /// `Sat 10 February 2024 12:00:00`
    Long,
}

impl DateStyle {
    fn pattern(&self) -> &'static str {
        match self {
            DateStyle::Short => "%Y/%m/%d %H:%M",
            DateStyle::Long => "%a %d %B %Y %H:%M:%S",
        }
    }
}

/// Human readable size in binary units, `0 B` for zero.
pub fn format_size(bytes: u64, decimals: u8) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = UNITS[0];
    for u in UNITS {
        unit = u;
        if size < 1024.0 || u == "PiB" {
            break;
        }
        size /= 1024.0;
    }
    format!("{size:.prec$} {unit}", prec = decimals as usize)
}

/// Epoch seconds as local time. Zero means "no date" and gives an empty string.
pub fn format_date(epoch: i64, style: DateStyle) -> String {
    format_date_in(epoch, style, TimeZone::system())
}

pub fn format_date_in(epoch: i64, style: DateStyle, tz: TimeZone) -> String {
    if epoch == 0 {
        return String::new();
    }
    match Timestamp::from_second(epoch) {
        Ok(ts) => ts.to_zoned(tz).strftime(style.pattern()).to_string(),
        Err(e) => {
            log::debug!("Date {epoch} out of range: {e}");
            String::new()
        }
    }
}

/// Parse a pacman size string like `12.50 MiB` back to bytes.
pub fn parse_size(value: &str) -> Option<u64> {
    let (num, unit) = value.trim().split_once(' ')?;
    let num: f64 = num.replace(',', ".").parse().ok()?;
    let power = UNITS.iter().position(|u| *u == unit.trim())?;
    Some((num * 1024f64.powi(power as i32)).round() as u64)
}

/// Parse a pacman date printed under `LC_TIME=C` (`Sat Feb 10 12:00:00 2024`)
/// as local time, returning epoch seconds.
pub fn parse_date(value: &str) -> Option<i64> {
    parse_date_in(value, TimeZone::system())
}

pub fn parse_date_in(value: &str, tz: TimeZone) -> Option<i64> {
    let time = match jiff::fmt::strtime::parse("%a %b %e %H:%M:%S %Y", value.trim()) {
        Ok(time) => time,
        Err(e) => {
            log::debug!("Could not parse '{value}': {e}");
            return None;
        }
    };
    let zoned = time.to_datetime().ok()?.to_zoned(tz).ok()?;
    Some(zoned.timestamp().as_second())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0, 1), "0 B");
        assert_eq!(format_size(0, 3), "0 B");
        assert_eq!(format_size(1, 1), "1.0 B");
        assert_eq!(format_size(1023, 1), "1023.0 B");
        assert_eq!(format_size(1024, 1), "1.0 KiB");
        assert_eq!(format_size(1536, 2), "1.50 KiB");
        assert_eq!(format_size(5 * 1024 * 1024, 1), "5.0 MiB");
        assert_eq!(format_size(3 * 1024u64.pow(6), 0), "3072 PiB");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(0, DateStyle::Short), "");
        assert_eq!(format_date(0, DateStyle::Long), "");
        //2024-02-10 12:34:56 UTC
        let epoch = 1707568496;
        assert_eq!(
            format_date_in(epoch, DateStyle::Short, TimeZone::UTC),
            "2024/02/10 12:34"
        );
        assert_eq!(
            format_date_in(epoch, DateStyle::Long, TimeZone::UTC),
            "Sat 10 February 2024 12:34:56"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_size("1.50 KiB"), Some(1536));
        assert_eq!(parse_size("0.00 B"), Some(0));
        assert_eq!(parse_size("2,00 MiB"), Some(2 * 1024 * 1024));
        assert_eq!(parse_size("lots"), None);

        assert_eq!(
            parse_date_in("Sat Feb 10 12:34:56 2024", TimeZone::UTC),
            Some(1707568496)
        );
        assert_eq!(parse_date_in("yesterday", TimeZone::UTC), None);
    }
}
