//! The set of valid values for FTP commands, and the crate error type.

use std::convert::From;
use std::error::Error;
use std::fmt;
use std::io;
use std::net::AddrParseError;

use super::status;

/// A shorthand for a Result whose error type is always an FtpError.
pub type Result<T> = ::std::result::Result<T, FtpError>;

/// `FtpError` is a library-global error type to describe the different kinds of
/// errors that might occur while using FTP.
#[derive(Debug)]
pub enum FtpError {
    /// Dial failure, read/write failure or unexpected end of the control stream.
    ConnectionError(io::Error),
    SecureError(String),
    /// The server reply could not be understood (bad reply code, PASV/EPSV body, ...).
    InvalidResponse(String),
    /// The server replied with a well formed status other than the one expected.
    UnexpectedResponse(Line),
    InvalidAddress(AddrParseError),
    /// No listing dialect recognised this line.
    InvalidListLine(String),
    InvalidTime(String),
    InvalidSize(String),
    /// The session was asked to do something its current state forbids.
    InvalidState(String),
    /// The server did not advertise the feature this operation needs.
    NotSupported(&'static str),
    /// Draining the reply owed for a closed data connection took too long.
    Timeout,
}

impl FtpError {
    /// The status code carried by an `UnexpectedResponse`, if any.
    pub fn status(&self) -> Option<u32> {
        match *self {
            FtpError::UnexpectedResponse(Line(code, _)) => Some(code),
            _ => None,
        }
    }
}

/// Text Format Control used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatControl {
    /// Default text format control (is NonPrint)
    Default,
    /// Non-print (not destined for printing)
    NonPrint,
    /// Telnet format control (\<CR\>, \<FF\>, etc.)
    Telnet,
    /// ASA (Fortran) Carriage Control
    Asa,
}

/// File Type used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileType {
    /// ASCII text (the argument is the text format control)
    Ascii(FormatControl),
    /// EBCDIC text (the argument is the text format control)
    Ebcdic(FormatControl),
    /// Image,
    Image,
    /// Binary (the synonym to Image)
    Binary,
    /// Local format (the argument is the number of bits in one byte on local machine)
    Local(u8),
}

/// `Line` contains a reply code and the text of a (possibly multi-line) reply.
///
/// For multi-line replies the text of every line is kept, joined with `\n`,
/// with the leading `code-`/`code ` markers removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line(pub u32, pub String);

impl fmt::Display for FormatControl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FormatControl::Default | FormatControl::NonPrint => f.write_str("N"),
            FormatControl::Telnet => f.write_str("T"),
            FormatControl::Asa => f.write_str("C"),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FileType::Ascii(ref fc) => write!(f, "A {}", fc),
            FileType::Ebcdic(ref fc) => write!(f, "E {}", fc),
            FileType::Image | FileType::Binary => f.write_str("I"),
            FileType::Local(ref bits) => write!(f, "L {}", bits),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.0, self.1)
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FtpError::ConnectionError(ref ioerr) => write!(f, "FTP ConnectionError: {}", ioerr),
            FtpError::SecureError(ref desc) => write!(f, "FTP SecureError: {}", desc),
            FtpError::InvalidResponse(ref desc) => write!(f, "FTP InvalidResponse: {}", desc),
            FtpError::UnexpectedResponse(ref line) => match status::status_text(line.0) {
                Some(text) if !text.is_empty() => {
                    write!(f, "FTP UnexpectedResponse: {} ({})", line, text)
                }
                _ => write!(f, "FTP UnexpectedResponse: {}", line),
            },
            FtpError::InvalidAddress(ref perr) => write!(f, "FTP InvalidAddress: {}", perr),
            FtpError::InvalidListLine(ref line) => write!(f, "FTP InvalidListLine: {:?}", line),
            FtpError::InvalidTime(ref desc) => write!(f, "FTP InvalidTime: {}", desc),
            FtpError::InvalidSize(ref desc) => write!(f, "FTP InvalidSize: {}", desc),
            FtpError::InvalidState(ref desc) => write!(f, "FTP InvalidState: {}", desc),
            FtpError::NotSupported(feature) => write!(f, "FTP NotSupported: {}", feature),
            FtpError::Timeout => f.write_str("FTP Timeout: no reply after closing data connection"),
        }
    }
}

impl Error for FtpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            FtpError::ConnectionError(ref ioerr) => Some(ioerr),
            FtpError::InvalidAddress(ref perr) => Some(perr),
            _ => None,
        }
    }
}

impl From<io::Error> for FtpError {
    fn from(err: io::Error) -> FtpError {
        FtpError::ConnectionError(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_type_renders_type_argument() {
        assert_eq!(FileType::Image.to_string(), "I");
        assert_eq!(FileType::Binary.to_string(), "I");
        assert_eq!(FileType::Ascii(FormatControl::Default).to_string(), "A N");
        assert_eq!(FileType::Ebcdic(FormatControl::Asa).to_string(), "E C");
        assert_eq!(FileType::Local(8).to_string(), "L 8");
    }

    #[test]
    fn unexpected_response_carries_status() {
        let err = FtpError::UnexpectedResponse(Line(550, "No such file".to_owned()));
        assert_eq!(err.status(), Some(550));
        assert_eq!(
            err.to_string(),
            "FTP UnexpectedResponse: 550 No such file (File unavailable.)"
        );
        assert_eq!(FtpError::Timeout.status(), None);
    }
}
