//! Directory listing parsers.
//!
//! Servers answer `LIST` in whatever format they like. Each supported
//! dialect is a plain function returning `None` when a line does not have
//! its shape; `parse_list_line` tries them in order and keeps the first hit.

use chrono::offset::{Offset, TimeZone};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

use super::entry::{Entry, EntryType};
use super::types::{FtpError, Result};

/// Default window, in days, a year-less listing date may lie in the future
/// before it is attributed to the previous year.
pub const DEFAULT_FUTURE_THRESHOLD_DAYS: i64 = 183;

/// What a listing line is interpreted against: the current time, the
/// server's timezone and the year-rollover window.
#[derive(Debug, Clone, Copy)]
pub struct ListContext {
    pub now: DateTime<Utc>,
    pub location: FixedOffset,
    pub future_threshold: Duration,
}

impl ListContext {
    /// UTC context with the default future threshold.
    pub fn new(now: DateTime<Utc>) -> ListContext {
        ListContext {
            now,
            location: Utc.fix(),
            future_threshold: Duration::days(DEFAULT_FUTURE_THRESHOLD_DAYS),
        }
    }

    pub(crate) fn local_time(
        &self,
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    ) -> Option<DateTime<Utc>> {
        let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
        self.from_local(&naive)
    }

    fn from_local(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        self.location
            .from_local_datetime(naive)
            .single()
            .map(|time| time.with_timezone(&Utc))
    }
}

type LineParser = fn(&str, &ListContext) -> Option<Entry>;

const LIST_LINE_PARSERS: [LineParser; 4] = [
    parse_rfc3659_list_line,
    parse_ls_list_line,
    parse_dir_list_line,
    parse_hosted_ftp_line,
];

// Both DIR timestamp layouts are 17 characters wide.
const DIR_TIME_WIDTH: usize = 17;
const DIR_TIME_FORMATS: [&str; 2] = ["%m-%d-%y  %I:%M%p", "%Y-%m-%d  %H:%M"];

/// Parses one line of a `LIST` or `MLSD` reply.
pub fn parse_list_line(line: &str, ctx: &ListContext) -> Result<Entry> {
    LIST_LINE_PARSERS
        .iter()
        .find_map(|parse| parse(line, ctx))
        .ok_or_else(|| FtpError::InvalidListLine(line.to_owned()))
}

/// Extracts the entry from the body of a `250` reply to `MLST`: the single
/// fact line is the one indented by a space.
pub fn parse_mlst_reply(message: &str, ctx: &ListContext) -> Result<Entry> {
    message
        .lines()
        .filter_map(|line| line.strip_prefix(' '))
        .find_map(|line| parse_rfc3659_list_line(line.trim_end(), ctx))
        .ok_or_else(|| FtpError::InvalidResponse(format!("Invalid MLST response: {}", message)))
}

/// Whitespace tokenizer for the `ls`-like dialects.
struct Scanner<'a> {
    line: &'a str,
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(line: &'a str) -> Scanner<'a> {
        Scanner { line, position: 0 }
    }

    /// Next space separated field, or `""` once the line is exhausted. The
    /// single space ending the field is consumed with it.
    fn next(&mut self) -> &'a str {
        let bytes = self.line.as_bytes();
        while self.position < bytes.len() && bytes[self.position] == b' ' {
            self.position += 1;
        }
        let start = self.position;
        while self.position < bytes.len() && bytes[self.position] != b' ' {
            self.position += 1;
        }
        let field = &self.line[start..self.position];
        if self.position < bytes.len() {
            self.position += 1;
        }
        field
    }

    /// Up to `count` fields; fewer when the line runs out.
    fn next_fields(&mut self, count: usize) -> Vec<&'a str> {
        let mut fields = Vec::with_capacity(count);
        for _ in 0..count {
            let field = self.next();
            if field.is_empty() {
                break;
            }
            fields.push(field);
        }
        fields
    }

    fn remaining(&self) -> &'a str {
        &self.line[self.position..]
    }
}

/// `type=file;size=1234;modify=20240105123456; name` (RFC 3659 facts).
fn parse_rfc3659_list_line(line: &str, _ctx: &ListContext) -> Option<Entry> {
    let semicolon = line.find(';')?;
    let space = line.find(' ')?;
    if semicolon > space {
        return None;
    }
    let name = &line[space + 1..];
    if name.is_empty() {
        return None;
    }

    let mut entry = Entry::new(name, EntryType::File);
    for fact in line[..space].trim_end_matches(';').split(';') {
        let eq = fact.find('=')?;
        if eq < 1 {
            return None;
        }
        let value = &fact[eq + 1..];
        match fact[..eq].to_ascii_lowercase().as_str() {
            "modify" => entry.set_modify_time(value).ok()?,
            "size" => entry.set_size(value).ok()?,
            "type" => match value.to_ascii_lowercase().as_str() {
                "dir" | "cdir" | "pdir" => entry.set_type(EntryType::Folder),
                "file" => entry.set_type(EntryType::File),
                _ => {}
            },
            _ => {}
        }
    }
    Some(entry)
}

/// Unix `ls -l` output:
/// `-rw-r--r--   1 owner group  1024 Jan  5 12:34 report.pdf`
fn parse_ls_list_line(line: &str, ctx: &ListContext) -> Option<Entry> {
    // Mode field is 10 characters, 11 with a trailing '+' ACL marker.
    let first_space = line.find(' ')?;
    if !(first_space == 10 || (first_space == 11 && line.as_bytes()[10] == b'+')) {
        return None;
    }

    let mut scanner = Scanner::new(line);
    let mut fields = scanner.next_fields(6);
    if fields.len() < 6 {
        return None;
    }

    // Some Windows servers print "folder 0" or "0 folder" instead of owner data.
    if fields[1] == "folder" && fields[2] == "0" {
        let mut entry = Entry::new(scanner.remaining(), EntryType::Folder);
        entry.set_time(&fields[3..6], ctx).ok()?;
        return finish_name(entry);
    }
    if fields[1] == "0" {
        let field = scanner.next();
        if field.is_empty() || fields[2] != "folder" {
            return None;
        }
        fields.push(field);
        let mut entry = Entry::new(scanner.remaining(), EntryType::Folder);
        entry.set_time(&fields[4..7], ctx).ok()?;
        return finish_name(entry);
    }

    fields.extend(scanner.next_fields(2));
    if fields.len() < 8 {
        return None;
    }

    let mut entry = Entry::new(scanner.remaining(), EntryType::File);
    match fields[0].as_bytes()[0] {
        b'-' => {}
        b'd' => entry.set_type(EntryType::Folder),
        b'l' => {
            entry.set_type(EntryType::Symlink);
            let name = entry.name().to_owned();
            if let Some(arrow) = name.find(" -> ").filter(|&i| i > 0) {
                entry.set_name(&name[..arrow]);
                entry.set_target(&name[arrow + 4..]);
            }
        }
        _ => return None,
    }
    entry.set_size(fields[4]).ok()?;
    entry.set_time(&fields[5..8], ctx).ok()?;
    finish_name(entry)
}

/// DOS/IIS `dir` output:
/// `04-27-00  09:09PM       <DIR>          licensed`
/// `2018-01-12  18:30                 589 readme.htm`
fn parse_dir_list_line(line: &str, ctx: &ListContext) -> Option<Entry> {
    if line.len() <= DIR_TIME_WIDTH {
        return None;
    }
    let stamp = line.get(..DIR_TIME_WIDTH)?;
    let naive = DIR_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(stamp, format).ok())?;

    let mut rest = line[DIR_TIME_WIDTH..].trim_start_matches(' ');
    let mut entry = Entry::new("", EntryType::File);
    entry.set_mtime(ctx.from_local(&naive)?);
    if let Some(after) = rest.strip_prefix("<DIR>") {
        entry.set_type(EntryType::Folder);
        rest = after;
    } else {
        let space = rest.find(' ')?;
        entry.set_size(&rest[..space]).ok()?;
        rest = &rest[space..];
    }
    entry.set_name(rest.trim_start_matches(' '));
    finish_name(entry)
}

/// hostedftp.com prints `ls -l` lines with a link count of 0:
/// `-r--------   0 user group     65222236 Feb 24 00:39 Week8.csv`
fn parse_hosted_ftp_line(line: &str, ctx: &ListContext) -> Option<Entry> {
    if line.find(' ')? != 10 {
        return None;
    }
    let mut scanner = Scanner::new(line);
    let fields = scanner.next_fields(2);
    if fields.len() < 2 || fields[1] != "0" {
        return None;
    }
    parse_ls_list_line(&format!("{} 1 {}", fields[0], scanner.remaining()), ctx)
}

/// Rejects empty names; a trailing '/' marks a folder.
fn finish_name(mut entry: Entry) -> Option<Entry> {
    if entry.name().ends_with('/') {
        let name = entry.name().trim_end_matches('/').to_owned();
        entry.set_name(name);
        entry.set_type(EntryType::Folder);
    }
    if entry.name().is_empty() {
        return None;
    }
    Some(entry)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> ListContext {
        ListContext::new(Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap())
    }

    fn parse(line: &str) -> Entry {
        parse_list_line(line, &ctx()).unwrap_or_else(|err| panic!("{}: {}", line, err))
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap())
    }

    #[test]
    fn scanner_splits_on_runs_of_spaces() {
        let mut scanner = Scanner::new("  a  bb c   rest of  line");
        assert_eq!(scanner.next_fields(3), vec!["a", "bb", "c"]);
        assert_eq!(scanner.remaining(), "  rest of  line");
        let mut scanner = Scanner::new("x y");
        assert_eq!(scanner.next_fields(4), vec!["x", "y"]);
        assert_eq!(scanner.next(), "");
    }

    #[test]
    fn rfc3659_file() {
        let entry = parse("type=file;size=1234; filename.txt");
        assert_eq!(entry.entry_type(), EntryType::File);
        assert_eq!(entry.size(), 1234);
        assert_eq!(entry.name(), "filename.txt");
        assert_eq!(entry.time(), None);
    }

    #[test]
    fn rfc3659_folders_and_modify() {
        let entry = parse("Type=cdir;Modify=20240105123456;UNIX.mode=0755; /pub");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.name(), "/pub");
        assert_eq!(entry.time(), Some(Utc.with_ymd_and_hms(2024, 1, 5, 12, 34, 56).unwrap()));

        let entry = parse("type=dir;modify=20231201000000.123; with space");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.name(), "with space");
        assert_eq!(parse("type=pdir; ..").entry_type(), EntryType::Folder);
    }

    #[test]
    fn rfc3659_rejects_bad_facts() {
        let ctx = ctx();
        assert!(parse_rfc3659_list_line("type=file;size=-3; a", &ctx).is_none());
        assert!(parse_rfc3659_list_line("type=file;=x; a", &ctx).is_none());
        assert!(parse_rfc3659_list_line("name with;semicolon after space", &ctx).is_none());
        assert!(parse_rfc3659_list_line("type=file;modify=yesterday; a", &ctx).is_none());
    }

    #[test]
    fn ls_file() {
        let entry = parse("-rw-r--r-- 1 owner group 1024 Jan  5 12:34 report.pdf");
        assert_eq!(entry.entry_type(), EntryType::File);
        assert_eq!(entry.size(), 1024);
        assert_eq!(entry.name(), "report.pdf");
        assert_eq!(entry.time(), at(2024, 1, 5, 12, 34));
    }

    #[test]
    fn ls_variants() {
        let entry = parse("dr-xr-xr-x   2 root     other        512 Apr  8  1994 etc");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.time(), at(1994, 4, 8, 0, 0));

        let entry = parse("lrwxrwxrwx   1 root     other          7 Jan 25 00:17 bin -> usr/bin");
        assert_eq!(entry.entry_type(), EntryType::Symlink);
        assert_eq!(entry.name(), "bin");
        assert_eq!(entry.target(), Some("usr/bin"));

        let entry = parse("-rw-r--r--+  1 owner    group         1024 Mar  1  2015 acl.txt");
        assert_eq!(entry.name(), "acl.txt");
        assert_eq!(entry.size(), 1024);

        let entry = parse("drwxr-xr-x    3 110      1002            3 Dec 02  2009 spaces   dir   name");
        assert_eq!(entry.name(), "spaces   dir   name");

        // Recent-looking date from last December
        let entry = parse("-rw-r--r--   1 u g 9 Dec 30 23:59 old.log");
        assert_eq!(entry.time(), at(2023, 12, 30, 23, 59));
    }

    #[test]
    fn ls_trailing_slash_forces_folder() {
        let entry = parse("-rw-r--r--   1 owner group 4096 Jan  5 12:34 photos/");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.name(), "photos");
    }

    #[test]
    fn ls_windows_folder_forms() {
        let entry = parse("drwxrwxrwx   folder        0 Aug 15 05:49 Plugins");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.name(), "Plugins");

        let entry = parse("drwxrwxrwx   0 folder      0 Aug 15 05:49 Documents");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.name(), "Documents");
    }

    #[test]
    fn ls_rejects_non_numeric_size_and_unknown_type() {
        let ctx = ctx();
        assert!(parse_ls_list_line("-rw-r--r-- 1 owner group big Jan  5 12:34 a", &ctx).is_none());
        assert!(parse_ls_list_line("xrw-r--r-- 1 owner group 1 Jan  5 12:34 a", &ctx).is_none());
        assert!(parse_ls_list_line("-rw-r--r-- 1 owner group 1 Jan  5 12:34 /", &ctx).is_none());
        assert!(parse_ls_list_line("-rw-r--r-- 1 owner group 1 Jan  5 12:34 ", &ctx).is_none());
    }

    #[test]
    fn dir_lines() {
        let entry = parse("04-27-00  09:09PM       <DIR>          licensed");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.name(), "licensed");
        assert_eq!(entry.time(), at(2000, 4, 27, 21, 9));

        let entry = parse("04-14-00  03:47AM                  589 readme.htm");
        assert_eq!(entry.entry_type(), EntryType::File);
        assert_eq!(entry.size(), 589);
        assert_eq!(entry.name(), "readme.htm");
        assert_eq!(entry.time(), at(2000, 4, 14, 3, 47));

        let entry = parse("2018-01-12  18:30       <DIR>          2018 backups");
        assert_eq!(entry.entry_type(), EntryType::Folder);
        assert_eq!(entry.name(), "2018 backups");
        assert_eq!(entry.time(), at(2018, 1, 12, 18, 30));
    }

    #[test]
    fn hosted_ftp_line() {
        let line = "-r--------   0 user group     65222236 Feb 24 00:39 Week8.csv";
        assert!(parse_ls_list_line(line, &ctx()).is_none());
        let entry = parse(line);
        assert_eq!(entry.entry_type(), EntryType::File);
        assert_eq!(entry.size(), 65222236);
        assert_eq!(entry.name(), "Week8.csv");
        assert_eq!(entry.time(), at(2024, 2, 24, 0, 39));
    }

    #[test]
    fn unknown_dialect_is_an_error() {
        for line in &["garbage", "total 12", "", "drwxr-xr-x 2 a b c"] {
            match parse_list_line(line, &ctx()) {
                Err(FtpError::InvalidListLine(l)) => assert_eq!(&l, line),
                other => panic!("{:?} parsed as {:?}", line, other),
            }
        }
    }

    #[test]
    fn mlst_reply_body() {
        let body = "Listing /pub/a.txt\n type=file;size=12;modify=20240105123456; /pub/a.txt\nEnd";
        let entry = parse_mlst_reply(body, &ctx()).unwrap();
        assert_eq!(entry.name(), "/pub/a.txt");
        assert_eq!(entry.size(), 12);
        assert!(parse_mlst_reply("no facts here\nEnd", &ctx()).is_err());
    }
}
