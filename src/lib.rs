#![crate_name = "ftpwalk"]
#![crate_type = "lib"]

//! ftpwalk is an FTP client written in Rust.
//!
//! It drives the control connection, negotiates passive data connections
//! (`EPSV`, falling back to `PASV`), understands the common `LIST` dialects
//! as well as `MLSD`, and can walk a remote tree depth first.
//!
//! ### Usage
//!
//! Here is a basic usage example:
//!
//! ```rust,no_run
//! use ftpwalk::ServerConn;
//! let mut conn = ServerConn::connect("127.0.0.1:21").unwrap_or_else(|err|
//!     panic!("{}", err)
//! );
//! conn.login("anonymous", "anonymous").unwrap();
//! for entry in conn.list(Some("/pub")).unwrap() {
//!     println!("{:?} {} {}", entry.entry_type(), entry.size(), entry.name());
//! }
//! let _ = conn.quit();
//! ```
//!
//! ### FTPS
//!
//! With the `secure` feature, `DialOptions::explicit_tls` (`AUTH TLS`) and
//! `DialOptions::tls` (implicit TLS) take an openssl `SslConnector`; data
//! connections are then protected as well.

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[cfg(feature = "secure")]
pub extern crate openssl;

mod data_stream;
mod ftp;
mod options;
mod walker;
pub mod entry;
pub mod list;
pub mod status;
pub mod types;

pub use self::entry::{Entry, EntryType};
pub use self::ftp::{Response, ServerConn};
pub use self::options::{DialFn, DialOptions, PretPolicy};
pub use self::types::{FtpError, Result};
pub use self::walker::Walker;
