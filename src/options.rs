//! Settings fixed when a `ServerConn` is dialed.

use std::fmt;
use std::io::{self, Write};
use std::net::TcpStream;
use std::time::Duration;

use chrono::offset::{Offset, Utc};
use chrono::FixedOffset;
#[cfg(feature = "secure")]
use openssl::ssl::SslConnector;

use super::list::DEFAULT_FUTURE_THRESHOLD_DAYS;

/// Opens a TCP connection to `host:port`. Used for control and data
/// connections when supplied.
pub type DialFn = dyn Fn(&str) -> io::Result<TcpStream> + Send;

/// What to do when the server answers `PRET` with something other than a
/// completion reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PretPolicy {
    /// Log the reply and carry on with the transfer.
    Permissive,
    /// Abort the transfer with the server's reply.
    Strict,
}

impl Default for PretPolicy {
    fn default() -> PretPolicy {
        PretPolicy::Permissive
    }
}

/// Options for `ServerConn::dial`.
///
/// ```rust
/// use std::time::Duration;
/// use ftpwalk::DialOptions;
///
/// let options = DialOptions::new()
///     .timeout(Duration::from_secs(5))
///     .disable_epsv(true);
/// # let _ = options;
/// ```
pub struct DialOptions {
    pub(crate) timeout: Option<Duration>,
    pub(crate) shutdown_timeout: Option<Duration>,
    pub(crate) disable_epsv: bool,
    pub(crate) disable_utf8: bool,
    pub(crate) disable_mlsd: bool,
    pub(crate) writing_mdtm: bool,
    pub(crate) location: FixedOffset,
    pub(crate) future_threshold: chrono::Duration,
    pub(crate) pret_policy: PretPolicy,
    pub(crate) conn: Option<TcpStream>,
    pub(crate) dial_func: Option<Box<DialFn>>,
    pub(crate) debug_output: Option<Box<dyn Write + Send>>,
    #[cfg(feature = "secure")]
    pub(crate) tls_connector: Option<SslConnector>,
    #[cfg(feature = "secure")]
    pub(crate) explicit_tls: bool,
}

impl Default for DialOptions {
    fn default() -> DialOptions {
        DialOptions {
            timeout: None,
            shutdown_timeout: None,
            disable_epsv: false,
            disable_utf8: false,
            disable_mlsd: false,
            writing_mdtm: false,
            location: Utc.fix(),
            future_threshold: chrono::Duration::days(DEFAULT_FUTURE_THRESHOLD_DAYS),
            pret_policy: PretPolicy::default(),
            conn: None,
            dial_func: None,
            debug_output: None,
            #[cfg(feature = "secure")]
            tls_connector: None,
            #[cfg(feature = "secure")]
            explicit_tls: false,
        }
    }
}

impl DialOptions {
    pub fn new() -> DialOptions {
        DialOptions::default()
    }

    /// Connect timeout for the control and data connections.
    pub fn timeout(mut self, timeout: Duration) -> DialOptions {
        self.timeout = Some(timeout);
        self
    }

    /// How long to wait for the reply that follows the close of a data connection.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> DialOptions {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Never try `EPSV`, go straight to `PASV`.
    pub fn disable_epsv(mut self, disabled: bool) -> DialOptions {
        self.disable_epsv = disabled;
        self
    }

    /// Do not send `OPTS UTF8 ON` even if the server advertises `UTF8`.
    pub fn disable_utf8(mut self, disabled: bool) -> DialOptions {
        self.disable_utf8 = disabled;
        self
    }

    /// List with `LIST` even if the server advertises `MLST`.
    pub fn disable_mlsd(mut self, disabled: bool) -> DialOptions {
        self.disable_mlsd = disabled;
        self
    }

    /// Allow `MDTM <time> <path>` to set modification times when `MFMT` is missing.
    pub fn writing_mdtm(mut self, enabled: bool) -> DialOptions {
        self.writing_mdtm = enabled;
        self
    }

    /// Timezone the server prints `LIST` dates in.
    pub fn location(mut self, location: FixedOffset) -> DialOptions {
        self.location = location;
        self
    }

    /// How far in the future a year-less listing date may be before it is
    /// taken to belong to the previous year.
    pub fn future_threshold(mut self, threshold: chrono::Duration) -> DialOptions {
        self.future_threshold = threshold;
        self
    }

    pub fn pret_policy(mut self, policy: PretPolicy) -> DialOptions {
        self.pret_policy = policy;
        self
    }

    /// Use an already connected control stream instead of dialing.
    pub fn conn(mut self, conn: TcpStream) -> DialOptions {
        self.conn = Some(conn);
        self
    }

    pub fn dial_func<F>(mut self, dial: F) -> DialOptions
    where
        F: Fn(&str) -> io::Result<TcpStream> + Send + 'static,
    {
        self.dial_func = Some(Box::new(dial));
        self
    }

    /// Copy of every command sent and reply line received.
    pub fn debug_output<W: Write + Send + 'static>(mut self, output: W) -> DialOptions {
        self.debug_output = Some(Box::new(output));
        self
    }

    /// Implicit FTPS: the control connection is TLS from the first byte.
    /// Data connections are protected too.
    #[cfg(feature = "secure")]
    pub fn tls(mut self, connector: SslConnector) -> DialOptions {
        self.tls_connector = Some(connector);
        self.explicit_tls = false;
        self
    }

    /// Explicit FTPS: connect in clear text, then upgrade with `AUTH TLS`.
    #[cfg(feature = "secure")]
    pub fn explicit_tls(mut self, connector: SslConnector) -> DialOptions {
        self.tls_connector = Some(connector);
        self.explicit_tls = true;
        self
    }
}

impl fmt::Debug for DialOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut debug = f.debug_struct("DialOptions");
        debug
            .field("timeout", &self.timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("disable_epsv", &self.disable_epsv)
            .field("disable_utf8", &self.disable_utf8)
            .field("disable_mlsd", &self.disable_mlsd)
            .field("writing_mdtm", &self.writing_mdtm)
            .field("location", &self.location)
            .field("future_threshold", &self.future_threshold)
            .field("pret_policy", &self.pret_policy)
            .field("conn", &self.conn)
            .field("dial_func", &self.dial_func.is_some())
            .field("debug_output", &self.debug_output.is_some());
        #[cfg(feature = "secure")]
        debug
            .field("tls", &self.tls_connector.is_some())
            .field("explicit_tls", &self.explicit_tls);
        debug.finish()
    }
}
