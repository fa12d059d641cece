/*
 * Copyright (c) 2021. Aberic - All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * http://www.apache.org/licenses/LICENSE-2.0
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Parses the three HTTP date formats (RFC 1123, RFC 850, asctime) into
//! seconds since the Unix epoch, and formats the outbound form (always
//! RFC 1123).
//!
//! The epoch arithmetic only recognizes leap years via `year % 4 == 0`,
//! which is wrong outside 1970..=2099 (it would also flag 1900 and 2100 as
//! leap). The admitted range is exactly that window.

use chrono::{DateTime, Utc};

const DAYS_IN_YEAR_PER_MONTH: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
const DAYS_PER_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const EPOCH_START_YEAR: i64 = 1970;

fn is_leap_year(year: i64) -> bool {
    year % 4 == 0
}

fn day_of_the_year(day: u32, month: u32, year: i64) -> u32 {
    let mut days = DAYS_IN_YEAR_PER_MONTH[(month - 1) as usize] + (day - 1);
    if month > 2 && is_leap_year(year) {
        days += 1;
    }
    days
}

fn is_valid_epoch_date(day: u32, month: u32, year: i64) -> bool {
    if year < 1970 || year > 2099 {
        return false;
    }
    if month < 1 || month > 12 {
        return false;
    }
    if day < 1 {
        return false;
    }
    let mut max_day = DAYS_PER_MONTH[(month - 1) as usize];
    if month == 2 && is_leap_year(year) {
        max_day += 1;
    }
    day <= max_day
}

/// Converts a calendar date plus second-of-day into epoch seconds, or `-1`
/// if the date is out of the admitted range or `second_of_day >= 86400`.
fn seconds_since_epoch(second_of_day: i64, day: u32, month: u32, year: i64) -> i64 {
    if !is_valid_epoch_date(day, month, year) || second_of_day >= 86400 {
        return -1;
    }
    let year_since_epoch = year - EPOCH_START_YEAR;
    let days_due_to_leapyears = (year_since_epoch + 1) / 4;
    let days_since_epoch =
        year_since_epoch * 365 + days_due_to_leapyears + day_of_the_year(day, month, year) as i64;
    days_since_epoch * 86400 + second_of_day
}

const MONTHS: [&str; 12] =
    ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

fn month_from_name(name: &str) -> Option<u32> {
    MONTHS.iter().position(|m| m.eq_ignore_ascii_case(name)).map(|i| (i + 1) as u32)
}

fn parse_time(s: &str) -> Option<i64> {
    let mut parts = s.splitn(3, ':');
    let h: i64 = parts.next()?.parse().ok()?;
    let m: i64 = parts.next()?.parse().ok()?;
    let sec: i64 = parts.next()?.parse().ok()?;
    if !(0..24).contains(&h) || !(0..60).contains(&m) || !(0..60).contains(&sec) {
        return None;
    }
    Some(h * 3600 + m * 60 + sec)
}

/// Parses an RFC 1123 date: `Sun, 06 Nov 1994 08:49:37 GMT`.
fn parse_rfc1123(s: &str) -> Option<i64> {
    let rest = s.splitn(2, ',').nth(1)?.trim();
    let mut it = rest.split_whitespace();
    let day: u32 = it.next()?.parse().ok()?;
    let month = month_from_name(it.next()?)?;
    let year: i64 = it.next()?.parse().ok()?;
    let time = it.next()?;
    let gmt = it.next()?;
    if !gmt.eq_ignore_ascii_case("GMT") {
        return None;
    }
    let second_of_day = parse_time(time)?;
    let r = seconds_since_epoch(second_of_day, day, month, year);
    if r < 0 { None } else { Some(r) }
}

/// Parses an RFC 850 date: `Sunday, 06-Nov-94 08:49:37 GMT`.
fn parse_rfc850(s: &str) -> Option<i64> {
    let rest = s.splitn(2, ',').nth(1)?.trim();
    let mut it = rest.split_whitespace();
    let date_part = it.next()?;
    let time = it.next()?;
    let gmt = it.next()?;
    if !gmt.eq_ignore_ascii_case("GMT") {
        return None;
    }
    let mut date_fields = date_part.splitn(3, '-');
    let day: u32 = date_fields.next()?.parse().ok()?;
    let month = month_from_name(date_fields.next()?)?;
    let yy: i64 = date_fields.next()?.parse().ok()?;
    let year = 1900 + yy;
    let second_of_day = parse_time(time)?;
    let r = seconds_since_epoch(second_of_day, day, month, year);
    if r < 0 { None } else { Some(r) }
}

/// Parses an asctime date: `Sun Nov  6 08:49:37 1994` (note the
/// double space before single-digit days).
fn parse_asctime(s: &str) -> Option<i64> {
    let mut it = s.split_whitespace();
    let _weekday = it.next()?;
    let month = month_from_name(it.next()?)?;
    let day: u32 = it.next()?.parse().ok()?;
    let time = it.next()?;
    let year: i64 = it.next()?.parse().ok()?;
    let second_of_day = parse_time(time)?;
    let r = seconds_since_epoch(second_of_day, day, month, year);
    if r < 0 { None } else { Some(r) }
}

/// Parses any of the three recognized HTTP date formats, dispatching on the
/// shape of the first token. Returns `None` (the caller treats this as "no
/// Date header understood") on anything malformed.
pub fn parse_http_date(s: &str) -> Option<i64> {
    let s = s.trim();
    let first_token = s.split_whitespace().next()?;
    if first_token.ends_with(',') && first_token.len() > 4 {
        // Long weekday name ("Sunday,") => RFC 850.
        parse_rfc850(s)
    } else if first_token.ends_with(',') {
        // Short weekday name ("Sun,") => RFC 1123.
        parse_rfc1123(s)
    } else {
        // No comma at all => asctime.
        parse_asctime(s)
    }
}

/// Formats `epoch_seconds` as an RFC 1123 `Date` header value.
pub fn format_http_date(epoch_seconds: i64) -> String {
    let dt: DateTime<Utc> = DateTime::from_timestamp(epoch_seconds, 0).unwrap_or_else(|| DateTime::from_timestamp(0, 0).unwrap());
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod date_test {
    use super::*;

    #[test]
    fn all_three_formats_agree() {
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(784111777));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(784111777));
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), Some(784111777));
    }

    #[test]
    fn rejects_out_of_range_year() {
        assert_eq!(parse_http_date("Mon, 06 Nov 2100 08:49:37 GMT"), None);
        assert_eq!(parse_http_date("Mon, 06 Nov 1969 08:49:37 GMT"), None);
    }

    #[test]
    fn rejects_bad_time() {
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 24:00:00 GMT"), None);
    }

    #[test]
    fn format_round_trips_through_rfc1123() {
        let formatted = format_http_date(784111777);
        assert_eq!(parse_http_date(&formatted), Some(784111777));
    }
}
