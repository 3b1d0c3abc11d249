//! Remote directory entries as produced by the listing parsers.

use chrono::offset::TimeZone;
use chrono::{DateTime, Datelike, NaiveDate, Utc};

use super::list::ListContext;
use super::types::{FtpError, Result};

/// Kind of a remote filesystem object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    File,
    Folder,
    Symlink,
}

/// One remote filesystem object, as described by a listing line or an
/// `MLST`/`MLSD` fact line.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    name: String,
    entry_type: EntryType,
    target: Option<String>,
    size: u64,
    time: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn new<S: Into<String>>(name: S, entry_type: EntryType) -> Entry {
        Entry {
            name: name.into(),
            entry_type,
            target: None,
            size: 0,
            time: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Folder
    }

    /// Link destination, only ever set for symlinks.
    pub fn target(&self) -> Option<&str> {
        self.target.as_ref().map(String::as_str)
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Modification time, when the listing dialect provides one.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.time
    }

    pub(crate) fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub(crate) fn set_type(&mut self, entry_type: EntryType) {
        self.entry_type = entry_type;
    }

    pub(crate) fn set_target<S: Into<String>>(&mut self, target: S) {
        self.target = Some(target.into());
    }

    pub(crate) fn set_mtime(&mut self, time: DateTime<Utc>) {
        self.time = Some(time);
    }

    /// Sets the byte count from its textual form. Negative or non-numeric
    /// values are rejected.
    pub fn set_size(&mut self, size: &str) -> Result<()> {
        self.size = size
            .parse::<u64>()
            .map_err(|_| FtpError::InvalidSize(size.to_owned()))?;
        Ok(())
    }

    /// Sets the time from an RFC3659 `modify` fact (`YYYYMMDDHHMMSS[.sss]`, UTC).
    pub fn set_modify_time(&mut self, value: &str) -> Result<()> {
        self.time = Some(parse_compact_time(value)?);
        Ok(())
    }

    /// Sets the time from the three date tokens of an `ls -l` style line.
    ///
    /// `<month> <day> <HH:MM>` carries no year: the current year of
    /// `ctx.now` is assumed, and the previous one is used instead when that
    /// would put the entry more than `ctx.future_threshold` past `now`.
    /// `<month> <day> <YYYY>` is taken as midnight of that day.
    pub fn set_time(&mut self, fields: &[&str], ctx: &ListContext) -> Result<()> {
        let invalid = || FtpError::InvalidTime(fields.join(" "));
        if fields.len() != 3 {
            return Err(invalid());
        }
        let month = parse_month(fields[0]).ok_or_else(invalid)?;
        let day = fields[1].parse::<u32>().map_err(|_| invalid())?;

        let time = if let Some(colon) = fields[2].find(':') {
            let hour = fields[2][..colon].parse::<u32>().map_err(|_| invalid())?;
            let minute = fields[2][colon + 1..].parse::<u32>().map_err(|_| invalid())?;
            let this_year = ctx.now.with_timezone(&ctx.location).year();
            let limit = ctx.now + ctx.future_threshold;
            // Feb 29 listed in a non-leap year can only be from an earlier year,
            // and a leap day past the limit stays put when last year had none.
            match ctx.local_time(this_year, month, day, hour, minute) {
                Some(time) if time <= limit => time,
                current => ctx
                    .local_time(this_year - 1, month, day, hour, minute)
                    .or(current)
                    .ok_or_else(invalid)?,
            }
        } else {
            if fields[2].len() != 4 {
                return Err(FtpError::InvalidTime(format!(
                    "invalid year format in time string: {}",
                    fields.join(" ")
                )));
            }
            let year = fields[2].parse::<i32>().map_err(|_| invalid())?;
            ctx.local_time(year, month, day, 0, 0).ok_or_else(invalid)?
        };
        self.time = Some(time);
        Ok(())
    }
}

/// Parses the `YYYYMMDDHHMMSS[.sss]` form used by `MDTM` replies and `modify`
/// facts. Fractional seconds are dropped.
pub(crate) fn parse_compact_time(value: &str) -> Result<DateTime<Utc>> {
    let invalid = || FtpError::InvalidTime(value.to_owned());
    let digits = match value.find('.') {
        Some(dot) => &value[..dot],
        None => value,
    };
    if digits.len() != 14 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let num = |from: usize, to: usize| digits[from..to].parse::<u32>().map_err(|_| invalid());
    let (year, month, day) = (num(0, 4)?, num(4, 6)?, num(6, 8)?);
    let (hour, minute, second) = (num(8, 10)?, num(10, 12)?, num(12, 14)?);
    let naive = NaiveDate::from_ymd_opt(year as i32, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)?;
    Ok(Utc.from_utc_datetime(&naive))
}

fn parse_month(token: &str) -> Option<u32> {
    let month = match token.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
