//! Canonical text printers, the inverse of the scalar casters in
//! `cast::scalar`. `cast(format(v)) == v` is relied on by round-trip tests.

use chrono::{NaiveDate, TimeZone, Utc};

use crate::value::Interval;

pub fn format_date(days: i32) -> String {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let date = epoch + chrono::Duration::days(days as i64);
    date.format("%Y-%m-%d").to_string()
}

pub fn format_timestamp(micros: i64) -> String {
    let secs = micros.div_euclid(1_000_000);
    let rem_micros = micros.rem_euclid(1_000_000);
    let dt = Utc.timestamp_opt(secs, (rem_micros * 1000) as u32).single();
    match dt {
        Some(dt) if rem_micros == 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => {
            let frac = format!("{:06}", rem_micros);
            let frac = frac.trim_end_matches('0');
            format!("{} {}.{}", dt.format("%Y-%m-%d"), dt.format("%H:%M:%S"), frac)
        }
        None => format!("{micros}"),
    }
}

pub fn format_interval(iv: &Interval) -> String {
    let mut parts = Vec::new();
    let years = iv.months / 12;
    let months = iv.months % 12;
    if years != 0 {
        parts.push(format!("{} year{}", years, plural(years)));
    }
    if months != 0 {
        parts.push(format!("{} month{}", months, plural(months)));
    }
    if iv.days != 0 {
        parts.push(format!("{} day{}", iv.days, plural(iv.days)));
    }
    if iv.micros != 0 {
        let hours = iv.micros / 3_600_000_000;
        let rem = iv.micros % 3_600_000_000;
        let mins = rem / 60_000_000;
        let rem = rem % 60_000_000;
        let secs = rem as f64 / 1_000_000.0;
        if hours != 0 {
            parts.push(format!("{} hour{}", hours, plural(hours)));
        }
        if mins != 0 {
            parts.push(format!("{} minute{}", mins, plural(mins)));
        }
        if secs != 0.0 {
            parts.push(format!("{secs} second{}", plural(secs as i64)));
        }
    }
    if parts.is_empty() {
        "00:00:00".to_string()
    } else {
        parts.join(" ")
    }
}

fn plural(n: i64) -> &'static str {
    if n.abs() == 1 {
        ""
    } else {
        "s"
    }
}

pub fn format_blob(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if b.is_ascii_graphic() || b == b' ' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{b:02X}"));
        }
    }
    out
}

pub fn format_uuid(u: &uuid::Uuid) -> String {
    u.to_string()
}
