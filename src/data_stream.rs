#[cfg(feature = "secure")]
use openssl::ssl::{SslConnector, SslStream};

use std::{
    io::{Read, Result, Write},
    net::{Shutdown, TcpStream},
};

#[cfg(feature = "secure")]
use super::types::FtpError;

/// Data Stream used for communications, on the control channel and on
/// every data connection.
#[derive(Debug)]
pub enum DataStream {
    Tcp(TcpStream),
    #[cfg(feature = "secure")]
    Ssl(SslStream<TcpStream>),
}

#[cfg(feature = "secure")]
impl DataStream {
    /// Runs a TLS handshake over a plain stream. A stream that is already
    /// secured is returned unchanged.
    pub fn into_secure(self, connector: &SslConnector, domain: &str) -> ::std::result::Result<DataStream, FtpError> {
        match self {
            DataStream::Tcp(stream) => connector
                .connect(domain, stream)
                .map(DataStream::Ssl)
                .map_err(|e| FtpError::SecureError(e.to_string())),
            secured => Ok(secured),
        }
    }
}

impl DataStream {
    /// Returns a reference to the underlying TcpStream.
    pub fn get_ref(&self) -> &TcpStream {
        match *self {
            DataStream::Tcp(ref stream) => stream,
            #[cfg(feature = "secure")]
            DataStream::Ssl(ref stream) => stream.get_ref(),
        }
    }

    /// Closes the stream, sending a TLS close_notify first when secured.
    pub fn shutdown(self) -> Result<()> {
        match self {
            DataStream::Tcp(stream) => stream.shutdown(Shutdown::Both),
            #[cfg(feature = "secure")]
            DataStream::Ssl(mut stream) => {
                if let Err(err) = stream.shutdown() {
                    trace!("TLS shutdown failed: {}", err);
                }
                stream.get_ref().shutdown(Shutdown::Both)
            }
        }
    }
}

impl Read for DataStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match *self {
            DataStream::Tcp(ref mut stream) => stream.read(buf),
            #[cfg(feature = "secure")]
            DataStream::Ssl(ref mut stream) => stream.read(buf),
        }
    }
}

impl Write for DataStream {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match *self {
            DataStream::Tcp(ref mut stream) => stream.write(buf),
            #[cfg(feature = "secure")]
            DataStream::Ssl(ref mut stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> Result<()> {
        match *self {
            DataStream::Tcp(ref mut stream) => stream.flush(),
            #[cfg(feature = "secure")]
            DataStream::Ssl(ref mut stream) => stream.flush(),
        }
    }
}
