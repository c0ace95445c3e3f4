//! Publish dates without timezone complexity.
//!
//! Front matter carries either a plain `YYYY-MM-DD` date or a full
//! RFC3339 UTC timestamp (`YYYY-MM-DDTHH:MM:SSZ`). Everything is UTC;
//! ordering is the derived lexicographic field order.

use anyhow::{Result, bail};

/// UTC publish date, optionally with a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self { year, month, day, hour, minute, second }
    }

    pub const fn from_ymd(year: u16, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Parse `"YYYY-MM-DD"` or `"YYYY-MM-DDTHH:MM:SSZ"`.
    ///
    /// Returns `None` for anything else, including calendar-invalid
    /// dates like Feb 30.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if !s.is_ascii() {
            return None;
        }

        let (date, time) = match s.len() {
            10 => (s, None),
            20 => {
                let (date, rest) = s.split_at(10);
                let time = rest.strip_prefix('T')?.strip_suffix('Z')?;
                (date, Some(time))
            }
            _ => return None,
        };

        let [year, month, day] = parse_fields(date, '-', 4)?;
        let (hour, minute, second) = match time {
            Some(t) => {
                let [h, m, sec] = parse_fields(t, ':', 2)?;
                (h as u8, m as u8, sec as u8)
            }
            None => (0, 0, 0),
        };

        let dt = Self::new(year, month as u8, day as u8, hour, minute, second);
        dt.validate().ok()?;
        Some(dt)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.month) {
            bail!("month is invalid: {}", self.month);
        }
        let max_day = days_in_month(self.year, self.month);
        if self.day == 0 || self.day > max_day {
            bail!("day is invalid: {}", self.day);
        }
        if self.hour > 23 {
            bail!("hour is invalid: {}", self.hour);
        }
        if self.minute > 59 {
            bail!("minute is invalid: {}", self.minute);
        }
        if self.second > 59 {
            bail!("second is invalid: {}", self.second);
        }
        Ok(())
    }

    /// `"YYYY-MM-DD"`, as shown in listings and the sitemap.
    pub fn to_ymd(self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// RFC2822 format for RSS `pubDate`.
    pub fn to_rfc2822(self) -> String {
        const WEEKDAYS: [&str; 7] = ["Sat", "Sun", "Mon", "Tue", "Wed", "Thu", "Fri"];
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];

        format!(
            "{}, {:02} {} {:04} {:02}:{:02}:{:02} GMT",
            WEEKDAYS[self.weekday_index()],
            self.day,
            MONTHS[(self.month - 1) as usize],
            self.year,
            self.hour,
            self.minute,
            self.second
        )
    }

    // Zeller's congruence; index 0 = Saturday.
    fn weekday_index(&self) -> usize {
        let (y, m) = if self.month < 3 {
            (self.year as i32 - 1, self.month as i32 + 12)
        } else {
            (self.year as i32, self.month as i32)
        };
        let d = self.day as i32;
        ((d + (13 * (m + 1)) / 5 + y + y / 4 - y / 100 + y / 400) % 7) as usize
    }
}

/// Split `"AAAA-BB-CC"`-shaped input on `sep` into three numeric fields.
/// The first field must be `first_width` digits (4 for the date triple,
/// 2 for the time triple), the rest must be 2.
fn parse_fields(s: &str, sep: char, first_width: usize) -> Option<[u16; 3]> {
    let mut parts = s.split(sep);
    let first = parts.next()?;
    let second = parts.next()?;
    let third = parts.next()?;
    if parts.next().is_some() || first.len() != first_width || second.len() != 2 || third.len() != 2
    {
        return None;
    }
    if !s.bytes().all(|b| b.is_ascii_digit() || b == sep as u8) {
        return None;
    }
    Some([
        first.parse().ok()?,
        second.parse().ok()?,
        third.parse().ok()?,
    ])
}

fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_date() {
        let dt = DateTimeUtc::parse("2021-08-09").unwrap();
        assert_eq!(dt, DateTimeUtc::from_ymd(2021, 8, 9));
    }

    #[test]
    fn parse_rfc3339_utc() {
        let dt = DateTimeUtc::parse("2021-08-09T14:30:45Z").unwrap();
        assert_eq!(dt, DateTimeUtc::new(2021, 8, 9, 14, 30, 45));
    }

    #[test]
    fn parse_trims_whitespace() {
        assert!(DateTimeUtc::parse(" 2021-08-09 ").is_some());
    }

    #[test]
    fn parse_rejects_garbage() {
        for s in ["", "yesterday", "2021-8-9", "2021/08/09", "2021-08-09T14:30:45", "2021-08-09 14:30"] {
            assert!(DateTimeUtc::parse(s).is_none(), "accepted {s:?}");
        }
    }

    #[test]
    fn parse_rejects_calendar_invalid() {
        assert!(DateTimeUtc::parse("2021-02-30").is_none());
        assert!(DateTimeUtc::parse("2021-13-01").is_none());
        assert!(DateTimeUtc::parse("2021-04-31").is_none());
        assert!(DateTimeUtc::parse("2021-08-09T24:00:00Z").is_none());
    }

    #[test]
    fn leap_years() {
        assert!(DateTimeUtc::parse("2024-02-29").is_some());
        assert!(DateTimeUtc::parse("2000-02-29").is_some());
        assert!(DateTimeUtc::parse("2023-02-29").is_none());
        assert!(DateTimeUtc::parse("1900-02-29").is_none());
    }

    #[test]
    fn ordering_is_chronological() {
        let a = DateTimeUtc::from_ymd(2021, 8, 9);
        let b = DateTimeUtc::from_ymd(2021, 9, 1);
        let c = DateTimeUtc::new(2021, 9, 1, 12, 0, 0);
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn ymd_roundtrip() {
        assert_eq!(DateTimeUtc::from_ymd(2021, 8, 9).to_ymd(), "2021-08-09");
    }

    #[test]
    fn rfc2822_known_date() {
        // 2021-08-09 was a Monday
        let dt = DateTimeUtc::from_ymd(2021, 8, 9);
        assert_eq!(dt.to_rfc2822(), "Mon, 09 Aug 2021 00:00:00 GMT");
    }

    #[test]
    fn rfc2822_with_time() {
        let dt = DateTimeUtc::new(2024, 1, 15, 10, 30, 45);
        let s = dt.to_rfc2822();
        assert!(s.contains("15 Jan 2024 10:30:45 GMT"), "{s}");
    }
}
