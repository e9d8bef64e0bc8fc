//! Calendar handling for time axes.
//!
//! Output files always use a 365 day (`noleap`) calendar with monthly values stamped in the
//! middle of the month and bounds that span the whole month.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::{convert::TryFrom, fmt, str::FromStr};
use strum_macros::{EnumString, IntoStaticStr};

use crate::errors::FluxCfErr;

/// Units of the time coordinate written to output files.
pub const TIME_UNITS: &str = "days since 1850-01-01";

/// Reference date for `TIME_UNITS`.
pub const TIME_EPOCH: NoLeapDate = NoLeapDate {
    year: 1850,
    month: 1,
    day: 1,
};

/// Day of the month used to stamp monthly values.
const MID_MONTH_DAY: u32 = 15;

const DAYS_PER_YEAR: i64 = 365;
// About 300,000 years, past the range of chrono dates.
const MAX_OFFSET_SECONDS: f64 = 1.0e13;
const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
const DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Calendars found in the `calendar` attribute of CF time coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr)]
pub enum Calendar {
    /// Mixed Julian/Gregorian, treated as proleptic Gregorian.
    #[strum(
        to_string = "standard",
        serialize = "gregorian",
        serialize = "proleptic_gregorian"
    )]
    Standard,
    /// Every year has 365 days.
    #[strum(to_string = "noleap", serialize = "365_day")]
    NoLeap,
}

impl Calendar {
    /// The calendar named by a `calendar` attribute, `standard` when there is none.
    pub fn from_attribute(attr: Option<&str>) -> Result<Self, FluxCfErr> {
        match attr {
            None => Ok(Calendar::Standard),
            Some(name) => Calendar::from_str(&name.trim().to_lowercase()).map_err(|_| {
                FluxCfErr::CalendarReconstruction(format!("unsupported calendar: {}", name))
            }),
        }
    }
}

/// A date on the 365 day calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoLeapDate {
    year: i32,
    month: u32,
    day: u32,
}

impl NoLeapDate {
    /// Create a new date, checking that it exists in a year without leap days.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, FluxCfErr> {
        if month < 1 || month > 12 {
            return Err(FluxCfErr::CalendarReconstruction(format!(
                "month out of range: {}-{}-{}",
                year, month, day
            )));
        }

        if day < 1 || day > DAYS_IN_MONTH[month as usize - 1] {
            return Err(FluxCfErr::CalendarReconstruction(format!(
                "day out of range for a noleap calendar: {}-{}-{}",
                year, month, day
            )));
        }

        Ok(NoLeapDate { year, month, day })
    }

    /// The year.
    pub fn year(self) -> i32 {
        self.year
    }

    /// The month, 1 through 12.
    pub fn month(self) -> u32 {
        self.month
    }

    /// The day of the month.
    pub fn day(self) -> u32 {
        self.day
    }

    /// The timestamp used for a monthly value in this date's month.
    pub fn mid_month(self) -> Self {
        NoLeapDate {
            day: MID_MONTH_DAY,
            ..self
        }
    }

    /// First day of this date's month.
    pub fn first_of_month(self) -> Self {
        NoLeapDate { day: 1, ..self }
    }

    /// First day of the following month, rolling December over into January.
    pub fn first_of_next_month(self) -> Self {
        if self.month == 12 {
            NoLeapDate {
                year: self.year + 1,
                month: 1,
                day: 1,
            }
        } else {
            NoLeapDate {
                year: self.year,
                month: self.month + 1,
                day: 1,
            }
        }
    }

    /// Whole days from `epoch` to this date, negative if this date is earlier.
    pub fn days_since(self, epoch: NoLeapDate) -> i64 {
        self.ordinal() - epoch.ordinal()
    }

    /// The date `days` after `epoch`, or an error if the year falls outside the `i32` range.
    pub fn from_days_since(epoch: NoLeapDate, days: i64) -> Result<Self, FluxCfErr> {
        let out_of_range = || {
            FluxCfErr::CalendarReconstruction(format!("{} days after {} is out of range", days, epoch))
        };

        let ordinal = epoch.ordinal().checked_add(days).ok_or_else(out_of_range)?;
        let year = i32::try_from(ordinal.div_euclid(DAYS_PER_YEAR)).map_err(|_| out_of_range())?;
        let day_of_year = ordinal.rem_euclid(DAYS_PER_YEAR);

        let month_idx = DAYS_BEFORE_MONTH
            .iter()
            .rposition(|&before| before <= day_of_year)
            .unwrap_or(0);

        Ok(NoLeapDate {
            year,
            month: month_idx as u32 + 1,
            day: (day_of_year - DAYS_BEFORE_MONTH[month_idx]) as u32 + 1,
        })
    }

    fn ordinal(self) -> i64 {
        i64::from(self.year) * DAYS_PER_YEAR
            + DAYS_BEFORE_MONTH[self.month as usize - 1]
            + i64::from(self.day)
            - 1
    }
}

impl From<NaiveDate> for NoLeapDate {
    /// Keeps the month of the date, February 29th becomes February 28th.
    fn from(date: NaiveDate) -> Self {
        let month = date.month();
        let day = date.day().min(DAYS_IN_MONTH[month as usize - 1]);

        NoLeapDate {
            year: date.year(),
            month,
            day,
        }
    }
}

impl fmt::Display for NoLeapDate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Turn a (year, month, day) triple into a date. A missing day is the first of the month.
pub fn date_from_triple(year: i32, month: u32, day: Option<u32>) -> Result<NaiveDate, FluxCfErr> {
    let day = day.unwrap_or(1);

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        FluxCfErr::CalendarReconstruction(format!("invalid date: {}-{}-{}", year, month, day))
    })
}

/// The step size part of CF time units, e.g. the `days` in `days since 2001-01-01`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString)]
enum TimeStepUnit {
    #[strum(serialize = "days", serialize = "day", serialize = "d")]
    Days,
    #[strum(
        serialize = "hours",
        serialize = "hour",
        serialize = "hrs",
        serialize = "hr",
        serialize = "h"
    )]
    Hours,
    #[strum(
        serialize = "minutes",
        serialize = "minute",
        serialize = "mins",
        serialize = "min"
    )]
    Minutes,
    #[strum(
        serialize = "seconds",
        serialize = "second",
        serialize = "secs",
        serialize = "sec",
        serialize = "s"
    )]
    Seconds,
}

impl TimeStepUnit {
    fn seconds(self) -> f64 {
        match self {
            TimeStepUnit::Days => 86_400.0,
            TimeStepUnit::Hours => 3_600.0,
            TimeStepUnit::Minutes => 60.0,
            TimeStepUnit::Seconds => 1.0,
        }
    }
}

/// Parsed CF time units, `<unit> since <reference time>`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CfTimeUnits {
    step: TimeStepUnit,
    reference: NaiveDateTime,
}

impl CfTimeUnits {
    /// Parse a units attribute. Returns `None` if it does not look like CF time units.
    pub fn parse(units: &str) -> Option<Self> {
        let lower = units.trim().to_lowercase();
        let mut parts = lower.splitn(2, " since ");

        let step = TimeStepUnit::from_str(parts.next()?.trim()).ok()?;
        let reference = parse_reference_time(parts.next()?)?;

        Some(CfTimeUnits { step, reference })
    }

    /// Decode coordinate values into dates on the given calendar.
    pub fn decode(self, values: &[f64], calendar: Calendar) -> Result<Vec<NaiveDate>, FluxCfErr> {
        values
            .iter()
            .map(|&val| {
                if !val.is_finite() {
                    return Err(FluxCfErr::CalendarReconstruction(format!(
                        "non-finite time value: {}",
                        val
                    )));
                }

                let seconds = val * self.step.seconds();
                // Fill values such as 9.97e36 land here.
                if seconds.abs() > MAX_OFFSET_SECONDS {
                    return Err(FluxCfErr::CalendarReconstruction(format!(
                        "time value out of range: {}",
                        val
                    )));
                }

                match calendar {
                    Calendar::Standard => {
                        let offset = Duration::milliseconds((seconds * 1_000.0).round() as i64);
                        self.reference
                            .checked_add_signed(offset)
                            .map(|dt| dt.date())
                            .ok_or_else(|| {
                                FluxCfErr::CalendarReconstruction(format!(
                                    "time value out of range: {}",
                                    val
                                ))
                            })
                    }
                    Calendar::NoLeap => {
                        let reference = NoLeapDate::from(self.reference.date());
                        let seconds_into_day =
                            f64::from(self.reference.time().num_seconds_from_midnight());
                        let days = ((seconds + seconds_into_day) / 86_400.0).floor() as i64;
                        let date = NoLeapDate::from_days_since(reference, days)?;

                        date_from_triple(date.year(), date.month(), Some(date.day()))
                    }
                }
            })
            .collect()
    }
}

fn parse_reference_time(text: &str) -> Option<NaiveDateTime> {
    let text = text
        .trim()
        .trim_end_matches(" utc")
        .trim_end_matches('z')
        .replace('t', " ");
    let text = text.trim();

    const FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// A monthly time axis on the noleap calendar with bounds for each step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeAxis {
    stamps: Vec<NoLeapDate>,
    bounds: Vec<(NoLeapDate, NoLeapDate)>,
}

impl TimeAxis {
    /// Rebuild the axis from the dates of the input time steps. Only the year and month of each
    /// step are used, the order of the steps is kept.
    pub fn from_steps(steps: &[NaiveDate]) -> Self {
        let months: Vec<NoLeapDate> = steps.iter().map(|&step| NoLeapDate::from(step)).collect();

        let stamps = months.iter().map(|date| date.mid_month()).collect();
        let bounds = months
            .iter()
            .map(|date| (date.first_of_month(), date.first_of_next_month()))
            .collect();

        TimeAxis { stamps, bounds }
    }

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    /// True if there are no time steps.
    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Mid month timestamps.
    pub fn stamps(&self) -> &[NoLeapDate] {
        &self.stamps
    }

    /// The `[start, end)` interval of each step.
    pub fn bounds(&self) -> &[(NoLeapDate, NoLeapDate)] {
        &self.bounds
    }

    /// Timestamps as days since `TIME_EPOCH`.
    pub fn encoded_stamps(&self) -> Vec<f64> {
        self.stamps
            .iter()
            .map(|stamp| stamp.days_since(TIME_EPOCH) as f64)
            .collect()
    }

    /// Bounds as days since `TIME_EPOCH`, flattened row by row into `len() x 2` values.
    pub fn encoded_bounds(&self) -> Vec<f64> {
        self.bounds
            .iter()
            .flat_map(|(start, end)| {
                vec![
                    start.days_since(TIME_EPOCH) as f64,
                    end.days_since(TIME_EPOCH) as f64,
                ]
            })
            .collect()
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noleap(y: i32, m: u32, d: u32) -> NoLeapDate {
        NoLeapDate::new(y, m, d).unwrap()
    }

    #[test]
    fn test_noleap_validation() {
        assert!(NoLeapDate::new(2020, 2, 28).is_ok());
        assert!(NoLeapDate::new(2020, 2, 29).is_err());
        assert!(NoLeapDate::new(2020, 13, 1).is_err());
        assert!(NoLeapDate::new(2020, 0, 1).is_err());
        assert!(NoLeapDate::new(2020, 4, 31).is_err());
    }

    #[test]
    fn test_december_rolls_over() {
        let axis = TimeAxis::from_steps(&[ymd(2020, 12, 1)]);

        assert_eq!(axis.stamps(), &[noleap(2020, 12, 15)]);
        assert_eq!(axis.bounds(), &[(noleap(2020, 12, 1), noleap(2021, 1, 1))]);
    }

    #[test]
    fn test_bounds_contiguous() {
        let steps: Vec<NaiveDate> = (1..=12)
            .map(|m| ymd(2019, m, 1))
            .chain((1..=12).map(|m| ymd(2020, m, 1)))
            .collect();
        let axis = TimeAxis::from_steps(&steps);

        assert_eq!(axis.len(), steps.len());
        for pair in axis.bounds().windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
            assert!(pair[0].0 < pair[0].1);
        }

        let encoded = axis.encoded_stamps();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_mid_month_round_trip() {
        for year in &[1850, 1999, 2000, 2020, 2021] {
            for month in 1..=12 {
                let axis = TimeAxis::from_steps(&[ymd(*year, month, 3)]);
                let days = axis.encoded_stamps()[0] as i64;
                let back = NoLeapDate::from_days_since(TIME_EPOCH, days).unwrap();

                assert_eq!((back.year(), back.month(), back.day()), (*year, month, 15));
            }
        }
    }

    #[test]
    fn test_days_since() {
        assert_eq!(noleap(1850, 1, 1).days_since(TIME_EPOCH), 0);
        assert_eq!(noleap(1851, 1, 1).days_since(TIME_EPOCH), 365);
        assert_eq!(noleap(1850, 3, 1).days_since(TIME_EPOCH), 59);
        assert_eq!(noleap(1849, 12, 31).days_since(TIME_EPOCH), -1);
        assert_eq!(
            NoLeapDate::from_days_since(TIME_EPOCH, -1).unwrap(),
            noleap(1849, 12, 31)
        );
        assert!(NoLeapDate::from_days_since(TIME_EPOCH, i64::MAX).is_err());
        assert!(NoLeapDate::from_days_since(TIME_EPOCH, i64::MIN).is_err());
    }

    #[test]
    fn test_leap_day_keeps_month() {
        assert_eq!(NoLeapDate::from(ymd(2020, 2, 29)), noleap(2020, 2, 28));
    }

    #[test]
    fn test_date_from_triple() {
        assert_eq!(date_from_triple(2020, 12, Some(1)).unwrap(), ymd(2020, 12, 1));
        assert_eq!(date_from_triple(2020, 3, None).unwrap(), ymd(2020, 3, 1));
        assert!(date_from_triple(2021, 2, Some(29)).is_err());
        assert!(date_from_triple(2020, 13, Some(1)).is_err());
    }

    #[test]
    fn test_decode_standard() {
        let units = CfTimeUnits::parse("days since 2001-01-01").unwrap();
        let dates = units
            .decode(&[0.0, 31.0, 59.5, 365.0], Calendar::Standard)
            .unwrap();

        assert_eq!(
            dates,
            vec![ymd(2001, 1, 1), ymd(2001, 2, 1), ymd(2001, 3, 1), ymd(2002, 1, 1)]
        );

        let units = CfTimeUnits::parse("hours since 2000-02-28 00:00:00").unwrap();
        let dates = units.decode(&[24.0, 48.0], Calendar::Standard).unwrap();
        assert_eq!(dates, vec![ymd(2000, 2, 29), ymd(2000, 3, 1)]);
    }

    #[test]
    fn test_decode_noleap() {
        let units = CfTimeUnits::parse("days since 2000-02-28").unwrap();
        let dates = units.decode(&[1.0, 366.0], Calendar::NoLeap).unwrap();

        assert_eq!(dates, vec![ymd(2000, 3, 1), ymd(2001, 3, 1)]);
    }

    #[test]
    fn test_parse_units() {
        assert!(CfTimeUnits::parse("days since 1850-01-01").is_some());
        assert!(CfTimeUnits::parse("seconds since 1970-01-01T00:00:00Z").is_some());
        assert!(CfTimeUnits::parse("Hours Since 1900-01-01 00:00").is_some());
        assert!(CfTimeUnits::parse("g m-2 day-1").is_none());
        assert!(CfTimeUnits::parse("fortnights since 1850-01-01").is_none());
    }

    #[test]
    fn test_decode_rejects_nan() {
        let units = CfTimeUnits::parse("days since 1850-01-01").unwrap();
        assert!(units.decode(&[std::f64::NAN], Calendar::Standard).is_err());
    }

    #[test]
    fn test_decode_fill_value() {
        const DEFAULT_DOUBLE_FILL: f64 = 9.969209968386869e36;

        let units = CfTimeUnits::parse("days since 1850-01-01").unwrap();
        for &calendar in &[Calendar::Standard, Calendar::NoLeap] {
            for &val in &[DEFAULT_DOUBLE_FILL, -DEFAULT_DOUBLE_FILL, 1.0e12, std::f64::MAX] {
                match units.decode(&[0.0, val], calendar) {
                    Err(FluxCfErr::CalendarReconstruction(_)) => {}
                    other => panic!("unexpected result for {}: {:?}", val, other),
                }
            }
        }

        // Inside the offset limit but past the last date chrono can represent.
        let units = CfTimeUnits::parse("days since 1850-01-01").unwrap();
        assert!(units.decode(&[1.0e8], Calendar::Standard).is_err());
        assert!(units.decode(&[1.0e8], Calendar::NoLeap).is_err());
    }

    #[test]
    fn test_calendar_attribute() {
        assert_eq!(Calendar::from_attribute(None).unwrap(), Calendar::Standard);
        assert_eq!(
            Calendar::from_attribute(Some("gregorian")).unwrap(),
            Calendar::Standard
        );
        assert_eq!(
            Calendar::from_attribute(Some("365_day")).unwrap(),
            Calendar::NoLeap
        );
        assert!(Calendar::from_attribute(Some("360_day")).is_err());
    }
}
