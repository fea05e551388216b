//! Module containing functionality related to BSON datetimes.
//! For more information, see the documentation for the [`DateTime`] type.

use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use time::format_description::well_known::Rfc3339;

use crate::error::{Error, Result};

/// Struct representing a BSON datetime.
/// Note: BSON datetimes have millisecond precision.
///
/// The wire representation is a signed 64-bit count of milliseconds since the
/// Unix epoch. Conversions from sub-millisecond sources round to the nearest
/// millisecond rather than truncating.
#[derive(Eq, PartialEq, Ord, PartialOrd, Hash, Copy, Clone)]
pub struct DateTime(i64);

impl DateTime {
    /// The latest possible date that can be represented in BSON.
    pub const MAX: Self = Self::from_millis(i64::MAX);

    /// The earliest possible date that can be represented in BSON.
    pub const MIN: Self = Self::from_millis(i64::MIN);

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds since
    /// January 1, 1970 0:00:00 UTC (aka "UNIX timestamp").
    pub const fn from_millis(date: i64) -> Self {
        Self(date)
    }

    /// Returns a [`DateTime`] which corresponds to the current date and time.
    pub fn now() -> DateTime {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert the given [`SystemTime`] to a [`DateTime`].
    ///
    /// If the provided time is too far in the future or too far in the past to
    /// be represented by a BSON datetime, either [`DateTime::MAX`] or
    /// [`DateTime::MIN`] will be returned, whichever is closer.
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_millis()).map_or(Self::MAX, Self::from_millis),
            // handle SystemTime from before the Unix epoch
            Err(e) => {
                let millis = e.duration().as_millis();
                i64::try_from(millis)
                    .ok()
                    .and_then(i64::checked_neg)
                    .map_or(Self::MIN, Self::from_millis)
            }
        }
    }

    /// Makes a new [`DateTime`] from a count of seconds since the Unix epoch,
    /// rounding to the nearest millisecond.
    ///
    /// Returns an error if `secs` is not finite or is out of the BSON
    /// datetime range.
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        let millis = (secs * 1000.0).round();
        if !millis.is_finite() || millis < i64::MIN as f64 || millis >= i64::MAX as f64 {
            return Err(Error::invalid_argument(format!(
                "{secs} seconds is outside the BSON datetime range"
            )));
        }
        Ok(Self::from_millis(millis as i64))
    }

    /// Returns the number of non-leap-milliseconds since January 1, 1970 UTC.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// Returns the number of seconds since the Unix epoch as a float,
    /// millisecond-precise.
    pub fn timestamp_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Convert this [`DateTime`] to a [`SystemTime`].
    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            UNIX_EPOCH + Duration::from_millis(self.0 as u64)
        } else {
            UNIX_EPOCH - Duration::from_millis(self.0.unsigned_abs())
        }
    }

    pub(crate) fn to_time_private(self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::from_unix_timestamp_nanos(self.0 as i128 * 1_000_000).ok()
    }

    pub(crate) fn from_time_private(dt: time::OffsetDateTime) -> Self {
        let millis = dt.unix_timestamp_nanos() / 1_000_000;
        match millis.try_into() {
            Ok(ts) => Self::from_millis(ts),
            _ => {
                if millis > 0 {
                    Self::MAX
                } else {
                    Self::MIN
                }
            }
        }
    }

    /// Convert this [`DateTime`] to an RFC 3339 formatted string.
    ///
    /// Returns an error if the datetime is outside the range formattable by
    /// the `time` crate.
    pub fn try_to_rfc3339_string(self) -> Result<String> {
        let odt = self.to_time_private().ok_or_else(|| {
            Error::invalid_argument(format!(
                "BSON datetime {} ms is out of the RFC 3339 year range",
                self.0
            ))
        })?;
        odt.format(&Rfc3339)
            .map_err(|e| Error::invalid_argument(format!("failed to format datetime: {e}")))
    }

    /// Convert the given RFC 3339 formatted string to a [`DateTime`],
    /// truncating it to millisecond precision.
    pub fn parse_rfc3339_str(s: impl AsRef<str>) -> Result<Self> {
        let odt = time::OffsetDateTime::parse(s.as_ref(), &Rfc3339)
            .map_err(|e| Error::invalid_argument(format!("failed to parse datetime: {e}")))?;
        Ok(Self::from_time_private(odt))
    }
}

impl fmt::Debug for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut tup = f.debug_tuple("DateTime");
        match self.to_time_private() {
            Some(odt) => tup.field(&format_args!("{odt}")),
            None => tup.field(&self.0),
        };
        tup.finish()
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_time_private() {
            Some(odt) => write!(f, "{odt}"),
            None => write!(f, "DateTime({} ms)", self.0),
        }
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<DateTime> for SystemTime {
    fn from(dt: DateTime) -> Self {
        dt.to_system_time()
    }
}
