use crate::{Error, Result};
use std::fmt::Write;
use time::{
    Date, PrimitiveDateTime, Time,
    format_description::BorrowedFormatItem,
    macros::{format_description, time},
};

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const TIMES: [&[BorrowedFormatItem<'static>]; 3] = [
    format_description!("[hour]:[minute]:[second].[subsecond]"),
    format_description!("[hour]:[minute]:[second]"),
    format_description!("[hour]:[minute]"),
];

/// Renders a date as `Y-m-d`.
pub fn date_format(value: &Date) -> String {
    let mut out = String::with_capacity(10);
    write_date(&mut out, value);
    out
}

/// Renders a timestamp as `Y-m-d H:i:s`, fractional seconds only when present.
pub fn date_time_format(value: &PrimitiveDateTime) -> String {
    let mut out = String::with_capacity(19);
    write_date(&mut out, &value.date());
    out.push(' ');
    write_time(&mut out, &value.time());
    out
}

pub fn time_format(value: &Time) -> String {
    let mut out = String::with_capacity(8);
    write_time(&mut out, value);
    out
}

pub(crate) fn write_date(out: &mut String, value: &Date) {
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}",
        value.year(),
        value.month() as u8,
        value.day()
    );
}

pub(crate) fn write_time(out: &mut String, value: &Time) {
    let _ = write!(
        out,
        "{:02}:{:02}:{:02}",
        value.hour(),
        value.minute(),
        value.second()
    );
    let nanos = value.nanosecond();
    if nanos != 0 {
        let fraction = format!("{:09}", nanos);
        let _ = write!(out, ".{}", fraction.trim_end_matches('0'));
    }
}

pub fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value.trim(), DATE)
        .map_err(|e| Error::Decode(format!("Cannot parse `{}` as a date: {}", value, e)))
}

pub fn parse_time(value: &str) -> Result<Time> {
    let trimmed = value.trim();
    TIMES
        .iter()
        .find_map(|format| Time::parse(trimmed, format).ok())
        .ok_or_else(|| Error::Decode(format!("Cannot parse `{}` as a time", value)))
}

/// Accepts both `Y-m-d H:i:s` and the ISO `T` separator. A bare date is
/// read as midnight.
pub fn parse_date_time(value: &str) -> Result<PrimitiveDateTime> {
    let trimmed = value.trim();
    let Some(split) = trimmed.find([' ', 'T']) else {
        return Ok(PrimitiveDateTime::new(parse_date(trimmed)?, time!(00:00)));
    };
    let (date, time) = trimmed.split_at(split);
    Ok(PrimitiveDateTime::new(
        parse_date(date)?,
        parse_time(&time[1..])?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn formats() {
        assert_eq!(date_format(&date!(2024 - 02 - 09)), "2024-02-09");
        assert_eq!(
            date_time_format(&datetime!(2024-02-09 07:05:03)),
            "2024-02-09 07:05:03"
        );
        assert_eq!(
            date_time_format(&datetime!(2024-02-09 07:05:03.25)),
            "2024-02-09 07:05:03.25"
        );
    }

    #[test]
    fn parses() {
        assert_eq!(parse_date("1999-12-31").unwrap(), date!(1999 - 12 - 31));
        assert_eq!(
            parse_date_time("1999-12-31 23:59:58").unwrap(),
            datetime!(1999-12-31 23:59:58)
        );
        assert_eq!(
            parse_date_time("1999-12-31T23:59:58.5").unwrap(),
            datetime!(1999-12-31 23:59:58.5)
        );
        assert_eq!(
            parse_date_time("1999-12-31").unwrap(),
            datetime!(1999-12-31 00:00)
        );
        assert!(parse_date("31/12/1999").is_err());
        assert!(parse_time("25:00").is_err());
    }
}
