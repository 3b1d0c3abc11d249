//! FTP reply codes, as compared by the session, and their standard texts.

// 1xx: Positive Preliminary Reply
pub const INITIATING: u32 = 100;
pub const RESTART_MARKER: u32 = 110;
pub const READY_MINUTE: u32 = 120;
pub const ALREADY_OPEN: u32 = 125;
pub const ABOUT_TO_SEND: u32 = 150;

// 2xx: Positive Completion Reply
pub const COMMAND_OK: u32 = 200;
pub const COMMAND_NOT_IMPLEMENTED: u32 = 202;
pub const SYSTEM: u32 = 211;
pub const DIRECTORY: u32 = 212;
pub const FILE: u32 = 213;
pub const HELP: u32 = 214;
pub const NAME: u32 = 215;
pub const READY: u32 = 220;
pub const CLOSING: u32 = 221;
pub const DATA_CONNECTION_OPEN: u32 = 225;
pub const CLOSING_DATA_CONNECTION: u32 = 226;
pub const PASSIVE_MODE: u32 = 227;
pub const LONG_PASSIVE_MODE: u32 = 228;
pub const EXTENDED_PASSIVE_MODE: u32 = 229;
pub const LOGGED_IN: u32 = 230;
pub const LOGGED_OUT: u32 = 231;
pub const LOGOUT_ACK: u32 = 232;
pub const AUTH_OK: u32 = 234;
pub const REQUESTED_FILE_ACTION_OK: u32 = 250;
pub const PATH_CREATED: u32 = 257;

// 3xx: Positive intermediate Reply
pub const NEED_PASSWORD: u32 = 331;
pub const LOGIN_NEED_ACCOUNT: u32 = 332;
pub const REQUEST_FILE_PENDING: u32 = 350;

// 4xx: Transient Negative Completion Reply
pub const NOT_AVAILABLE: u32 = 421;
pub const CANNOT_OPEN_DATA_CONNECTION: u32 = 425;
pub const TRANSFER_ABORTED: u32 = 426;
pub const INVALID_CREDENTIALS: u32 = 430;
pub const HOST_UNAVAILABLE: u32 = 434;
pub const REQUEST_FILE_ACTION_IGNORED: u32 = 450;
pub const ACTION_ABORTED: u32 = 451;
pub const REQUESTED_ACTION_NOT_TAKEN: u32 = 452;

// 5xx: Permanent Negative Completion Reply
pub const BAD_COMMAND: u32 = 500;
pub const BAD_ARGUMENTS: u32 = 501;
pub const NOT_IMPLEMENTED: u32 = 502;
pub const BAD_SEQUENCE: u32 = 503;
pub const NOT_IMPLEMENTED_PARAMETER: u32 = 504;
pub const NOT_LOGGED_IN: u32 = 530;
pub const STORING_NEED_ACCOUNT: u32 = 532;
pub const FILE_UNAVAILABLE: u32 = 550;
pub const PAGE_TYPE_UNKNOWN: u32 = 551;
pub const EXCEEDED_STORAGE: u32 = 552;
pub const BAD_FILENAME: u32 = 553;

/// Returns the standard text for a reply code, or `None` when the code is
/// not one this client knows about.
pub fn status_text(code: u32) -> Option<&'static str> {
    let text = match code {
        INITIATING => "Initiating.",
        RESTART_MARKER => "Restart marker reply.",
        READY_MINUTE => "Service ready in nnn minutes.",
        ALREADY_OPEN => "Data connection already open; transfer starting.",
        ABOUT_TO_SEND => "File status okay; about to open data connection.",

        COMMAND_OK => "Command okay.",
        COMMAND_NOT_IMPLEMENTED => "Command not implemented, superfluous at this site.",
        SYSTEM => "System status, or system help reply.",
        DIRECTORY => "Directory status.",
        FILE => "File status.",
        HELP => "Help message.",
        NAME => "",
        READY => "Service ready for new user.",
        CLOSING => "Service closing control connection.",
        DATA_CONNECTION_OPEN => "Data connection open; no transfer in progress.",
        CLOSING_DATA_CONNECTION => "Closing data connection. Requested file action successful.",
        PASSIVE_MODE => "Entering Passive Mode.",
        LONG_PASSIVE_MODE => "Entering Long Passive Mode.",
        EXTENDED_PASSIVE_MODE => "Entering Extended Passive Mode.",
        LOGGED_IN => "User logged in, proceed.",
        LOGGED_OUT => "User logged out; service terminated.",
        LOGOUT_ACK => "Logout command noted, will complete when transfer done.",
        AUTH_OK => "AUTH command OK",
        REQUESTED_FILE_ACTION_OK => "Requested file action okay, completed.",
        PATH_CREATED => "Path created.",

        NEED_PASSWORD => "User name okay, need password.",
        LOGIN_NEED_ACCOUNT => "Need account for login.",
        REQUEST_FILE_PENDING => "Requested file action pending further information.",

        NOT_AVAILABLE => "Service not available, closing control connection.",
        CANNOT_OPEN_DATA_CONNECTION => "Can't open data connection.",
        TRANSFER_ABORTED => "Connection closed; transfer aborted.",
        INVALID_CREDENTIALS => "Invalid username or password.",
        HOST_UNAVAILABLE => "Requested host unavailable.",
        REQUEST_FILE_ACTION_IGNORED => "Requested file action not taken.",
        ACTION_ABORTED => "Requested action aborted. Local error in processing.",
        REQUESTED_ACTION_NOT_TAKEN => "Insufficient storage space in system.",

        BAD_COMMAND => "Command unrecognized.",
        BAD_ARGUMENTS => "Syntax error in parameters or arguments.",
        NOT_IMPLEMENTED => "Command not implemented.",
        BAD_SEQUENCE => "Bad sequence of commands.",
        NOT_IMPLEMENTED_PARAMETER => "Command not implemented for that parameter.",
        NOT_LOGGED_IN => "Not logged in.",
        STORING_NEED_ACCOUNT => "Need account for storing files.",
        FILE_UNAVAILABLE => "File unavailable.",
        PAGE_TYPE_UNKNOWN => "Page type unknown.",
        EXCEEDED_STORAGE => "Exceeded storage allocation.",
        BAD_FILENAME => "File name not allowed.",
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_codes_have_text() {
        assert_eq!(status_text(COMMAND_OK), Some("Command okay."));
        assert_eq!(status_text(EXTENDED_PASSIVE_MODE), Some("Entering Extended Passive Mode."));
        assert_eq!(status_text(NAME), Some(""));
    }

    #[test]
    fn unknown_codes_have_no_text() {
        assert_eq!(status_text(299), None);
        assert_eq!(status_text(0), None);
    }
}
