//! FTP module.

use std::collections::HashMap;
use std::io::{self, copy, BufRead, BufReader, Cursor, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::data_stream::DataStream;
use super::entry::{parse_compact_time, Entry};
use super::list::{parse_list_line, parse_mlst_reply, ListContext};
use super::options::{DialOptions, PretPolicy};
use super::status;
use super::types::{FileType, FtpError, Line, Result};
use super::walker::{join_path, Walker};

lazy_static! {
    // This regex extracts IP and Port details from PASV command response.
    // The regex looks for the pattern (h1,h2,h3,h4,p1,p2).
    static ref PORT_RE: Regex = Regex::new(r"\((\d+),(\d+),(\d+),(\d+),(\d+),(\d+)\)").unwrap();

    // This regex extracts modification time from MDTM command response.
    static ref MDTM_RE: Regex = Regex::new(r"\b(\d{14})\b").unwrap();

    // This regex extracts file size from SIZE command response.
    static ref SIZE_RE: Regex = Regex::new(r"(\d+)\s*$").unwrap();
}

/// A session with an FTP server. This owns the control connection; data
/// connections are handed out one at a time as `Response`s.
#[derive(Debug)]
pub struct ServerConn {
    reader: BufReader<DataStream>,
    host: String,
    options: DialOptions,
    features: HashMap<String, String>,
    mlst_supported: bool,
    mfmt_supported: bool,
    mdtm_supported: bool,
    mdtm_can_write: bool,
    use_pret: bool,
    skip_epsv: bool,
    data_pending: bool,
    reply_owed: bool,
}

impl ServerConn {
    /// Connects with default options.
    pub fn connect(addr: &str) -> Result<ServerConn> {
        ServerConn::dial(addr, DialOptions::default())
    }

    /// Connects to `addr` (`host:port`) and reads the server greeting. With
    /// explicit TLS configured the control connection is upgraded through
    /// `AUTH TLS` before returning. The session is not logged in yet.
    pub fn dial(addr: &str, mut options: DialOptions) -> Result<ServerConn> {
        let stream = match options.conn.take() {
            Some(conn) => conn,
            None => dial_tcp(&options, addr)?,
        };
        debug!("Established connection with {}", addr);

        let stream = DataStream::Tcp(stream);
        let host = host_of(addr);
        #[cfg(feature = "secure")]
        let stream = match options.tls_connector {
            Some(ref connector) if !options.explicit_tls => stream.into_secure(connector, &host)?,
            _ => stream,
        };

        let mut conn = ServerConn {
            reader: BufReader::new(stream),
            host,
            options,
            features: HashMap::new(),
            mlst_supported: false,
            mfmt_supported: false,
            mdtm_supported: false,
            mdtm_can_write: false,
            use_pret: false,
            skip_epsv: false,
            data_pending: false,
            reply_owed: false,
        };
        let Line(_, welcome) = conn.read_response(status::READY)?;
        debug!("Server READY; welcome: {}", welcome);

        #[cfg(feature = "secure")]
        {
            if conn.options.explicit_tls {
                conn = conn.into_secure()?;
            }
        }
        Ok(conn)
    }

    /// Asks the server to secure the control connection and runs the TLS
    /// handshake over it. Any reply but 234 fails the dial; dropping the
    /// session closes the socket.
    #[cfg(feature = "secure")]
    fn into_secure(mut self) -> Result<ServerConn> {
        let connector = match self.options.tls_connector {
            Some(ref connector) => connector.clone(),
            None => return Ok(self),
        };
        debug!("Initializing TLS auth");
        self.write_str("AUTH TLS")?;
        self.read_response(status::AUTH_OK)?;
        let stream = self.reader.into_inner().into_secure(&connector, &self.host)?;
        debug!("TLS OK");
        Ok(ServerConn {
            reader: BufReader::new(stream),
            ..self
        })
    }

    /// Returns a reference to the underlying control TcpStream.
    pub fn get_ref(&self) -> &TcpStream {
        self.reader.get_ref().get_ref()
    }

    /// The host name this session was dialed with.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Features advertised by `FEAT`, keyed by upper case name.
    pub fn features(&self) -> &HashMap<String, String> {
        &self.features
    }

    pub fn has_feature(&self, name: &str) -> bool {
        self.features.contains_key(&name.to_ascii_uppercase())
    }

    /// Log in to the FTP server, then negotiate the session: features,
    /// binary mode, UTF-8 and (with TLS) data channel protection.
    pub fn login(&mut self, user: &str, password: &str) -> Result<()> {
        debug!("Signing in as '{}'", user);
        self.write_str(format!("USER {}", user))?;
        let Line(code, _) = self.read_response_in(&[status::LOGGED_IN, status::NEED_PASSWORD])?;
        if code == status::NEED_PASSWORD {
            self.write_str(format!("PASS {}", password))?;
            self.read_response(status::LOGGED_IN)?;
        }
        debug!("Login OK");

        self.feat()?;
        self.mlst_supported = self.has_feature("MLST") && !self.options.disable_mlsd;
        self.use_pret = self.has_feature("PRET");
        self.mfmt_supported = self.has_feature("MFMT");
        self.mdtm_supported = self.has_feature("MDTM");
        self.mdtm_can_write = self.mdtm_supported && self.options.writing_mdtm;

        self.transfer_type(FileType::Binary)?;
        self.set_utf8()?;

        #[cfg(feature = "secure")]
        {
            if self.options.tls_connector.is_some() {
                // Set protection buffer size
                self.write_str("PBSZ 0")?;
                self.read_response(status::COMMAND_OK)?;
                // Change the level of data protection to Private
                self.write_str("PROT P")?;
                self.read_response(status::COMMAND_OK)?;
            }
        }
        Ok(())
    }

    /// Runs `FEAT`. A server that does not answer 211 simply has no
    /// optional features.
    fn feat(&mut self) -> Result<()> {
        self.write_str("FEAT")?;
        let Line(code, message) = self.read_response_any()?;
        if code != status::SYSTEM {
            debug!("FEAT not supported ({}), assuming no features", code);
            self.features.clear();
            return Ok(());
        }
        self.features = parse_features(&message);
        for (name, params) in &self.features {
            debug!("found supported feature: {} {}", name, params);
        }
        Ok(())
    }

    fn set_utf8(&mut self) -> Result<()> {
        if self.options.disable_utf8 || !self.has_feature("UTF8") {
            return Ok(());
        }
        self.write_str("OPTS UTF8 ON")?;
        // Servers that need no toggle answer with one of these.
        self.read_response_in(&[
            status::COMMAND_OK,
            status::BAD_ARGUMENTS,
            status::NOT_IMPLEMENTED_PARAMETER,
            status::COMMAND_NOT_IMPLEMENTED,
        ])
        .map(|_| ())
    }

    /// Change the current directory to the path specified.
    pub fn cwd(&mut self, path: &str) -> Result<()> {
        self.write_str(format!("CWD {}", path))?;
        self.read_response(status::REQUESTED_FILE_ACTION_OK).map(|_| ())
    }

    /// Move the current directory to the parent directory.
    pub fn cdup(&mut self) -> Result<()> {
        self.write_str("CDUP")?;
        self.read_response_in(&[status::COMMAND_OK, status::REQUESTED_FILE_ACTION_OK])
            .map(|_| ())
    }

    /// Gets the current directory
    pub fn pwd(&mut self) -> Result<String> {
        self.write_str("PWD")?;
        let Line(_, content) = self.read_response(status::PATH_CREATED)?;
        match (content.find('"'), content.rfind('"')) {
            (Some(begin), Some(end)) if begin < end => Ok(content[begin + 1..end].to_string()),
            _ => Err(FtpError::InvalidResponse(format!("Invalid PWD Response: {}", content))),
        }
    }

    /// This does nothing. This is usually just used to keep the connection open.
    pub fn noop(&mut self) -> Result<()> {
        self.write_str("NOOP")?;
        self.read_response(status::COMMAND_OK).map(|_| ())
    }

    /// This creates a new directory on the server.
    pub fn mkdir(&mut self, pathname: &str) -> Result<()> {
        self.write_str(format!("MKD {}", pathname))?;
        self.read_response(status::PATH_CREATED).map(|_| ())
    }

    /// Sets the type of file to be transferred. That is the implementation
    /// of `TYPE` command.
    pub fn transfer_type(&mut self, file_type: FileType) -> Result<()> {
        self.write_str(format!("TYPE {}", file_type))?;
        self.read_response(status::COMMAND_OK).map(|_| ())
    }

    /// Renames the file from_name to to_name
    pub fn rename(&mut self, from_name: &str, to_name: &str) -> Result<()> {
        self.write_str(format!("RNFR {}", from_name))?;
        self.read_response(status::REQUEST_FILE_PENDING)?;
        self.write_str(format!("RNTO {}", to_name))?;
        self.read_response(status::REQUESTED_FILE_ACTION_OK).map(|_| ())
    }

    /// Removes the remote pathname from the server.
    pub fn rmdir(&mut self, pathname: &str) -> Result<()> {
        self.write_str(format!("RMD {}", pathname))?;
        self.read_response(status::REQUESTED_FILE_ACTION_OK).map(|_| ())
    }

    /// Remove the remote file from the server.
    pub fn rm(&mut self, filename: &str) -> Result<()> {
        self.write_str(format!("DELE {}", filename))?;
        self.read_response(status::REQUESTED_FILE_ACTION_OK).map(|_| ())
    }

    /// Deletes `pathname` and everything below it.
    pub fn remove_dir_recur(&mut self, pathname: &str) -> Result<()> {
        let entries = self.list(Some(pathname))?;
        for entry in entries.iter().filter(|e| e.name() != "." && e.name() != "..") {
            let child = join_path(pathname, entry.name());
            if entry.is_dir() {
                self.remove_dir_recur(&child)?;
            } else {
                self.rm(&child)?;
            }
        }
        self.rmdir(pathname)
    }

    /// Retrieves the size of the file in bytes at `pathname` if it exists.
    /// In case the reply carries no size `None` is returned.
    pub fn size(&mut self, pathname: &str) -> Result<Option<u64>> {
        self.write_str(format!("SIZE {}", pathname))?;
        let Line(_, content) = self.read_response(status::FILE)?;
        match SIZE_RE.captures(&content) {
            Some(caps) => caps[1]
                .parse()
                .map(Some)
                .map_err(|_| FtpError::InvalidResponse(format!("Invalid SIZE response: {}", content))),
            None => Ok(None),
        }
    }

    /// Retrieves the modification time of the file at `pathname` if it exists.
    /// In case the reply carries no time `None` is returned.
    pub fn mdtm(&mut self, pathname: &str) -> Result<Option<DateTime<Utc>>> {
        self.write_str(format!("MDTM {}", pathname))?;
        let Line(_, content) = self.read_response(status::FILE)?;
        match MDTM_RE.captures(&content) {
            Some(caps) => parse_compact_time(&caps[1]).map(Some),
            None => Ok(None),
        }
    }

    /// Sets the modification time of `pathname`, with `MFMT` when the server
    /// has it, else with the writing form of `MDTM` when that was enabled.
    pub fn set_time(&mut self, pathname: &str, time: DateTime<Utc>) -> Result<()> {
        let stamp = time.format("%Y%m%d%H%M%S");
        let command = if self.mfmt_supported {
            format!("MFMT {} {}", stamp, pathname)
        } else if self.mdtm_can_write {
            format!("MDTM {} {}", stamp, pathname)
        } else {
            return Err(FtpError::NotSupported("MFMT"));
        };
        self.write_str(command)?;
        self.read_response(status::FILE).map(|_| ())
    }

    /// Describes a single path with `MLST`.
    pub fn mlst(&mut self, pathname: &str) -> Result<Entry> {
        if !self.mlst_supported {
            return Err(FtpError::NotSupported("MLST"));
        }
        self.write_str(format!("MLST {}", pathname))?;
        let Line(_, message) = self.read_response(status::REQUESTED_FILE_ACTION_OK)?;
        parse_mlst_reply(&message, &self.list_context())
    }

    /// Lists `pathname` (or the current directory) with `MLSD` when the
    /// server supports it, `LIST` otherwise. Fails as a whole if any line is
    /// in an unknown format.
    pub fn list(&mut self, pathname: Option<&str>) -> Result<Vec<Entry>> {
        let verb = if self.mlst_supported { "MLSD" } else { "LIST" };
        let command = with_path(verb, pathname);
        let ctx = self.list_context();
        self.list_command(&command)?
            .iter()
            .map(|line| parse_list_line(line, &ctx))
            .collect()
    }

    /// Execute `NLST` command which returns the list of file names only.
    /// If `pathname` is omited then the list of files in the current directory will be
    /// returned otherwise it will the list of files on `pathname`.
    pub fn nlst(&mut self, pathname: Option<&str>) -> Result<Vec<String>> {
        self.list_command(&with_path("NLST", pathname))
    }

    /// Walks the tree below `root`, depth first.
    pub fn walk(&mut self, root: &str) -> Walker<'_> {
        Walker::new(self, root)
    }

    /// Opens a download of `filename`. The returned `Response` must be read
    /// and closed (or dropped) before the session is used again.
    pub fn retr(&mut self, filename: &str) -> Result<Response<'_>> {
        self.retr_from(filename, 0)
    }

    /// Like `retr`, resuming at byte `offset`.
    pub fn retr_from(&mut self, filename: &str, offset: u64) -> Result<Response<'_>> {
        self.cmd_data_conn_from(offset, &format!("RETR {}", filename))
    }

    /// Simple way to retr a file from the server. This stores the file in memory.
    pub fn simple_retr(&mut self, filename: &str) -> Result<Cursor<Vec<u8>>> {
        let mut response = self.retr(filename)?;
        let mut buffer = Vec::new();
        let read = response.read_to_end(&mut buffer);
        let closed = response.close();
        read?;
        closed?;
        Ok(Cursor::new(buffer))
    }

    /// This stores a file on the server.
    pub fn stor<R: Read>(&mut self, filename: &str, r: &mut R) -> Result<()> {
        self.stor_from(filename, r, 0)
    }

    /// Stores `r` into `filename`, starting at byte `offset` of the remote file.
    pub fn stor_from<R: Read>(&mut self, filename: &str, r: &mut R, offset: u64) -> Result<()> {
        self.upload(offset, &format!("STOR {}", filename), r)
    }

    /// Appends `r` to `filename`.
    pub fn append<R: Read>(&mut self, filename: &str, r: &mut R) -> Result<()> {
        self.upload(0, &format!("APPE {}", filename), r)
    }

    /// Issues `REIN`, leaving the session connected but logged out.
    pub fn logout(&mut self) -> Result<()> {
        self.write_str("REIN")?;
        self.read_response(status::READY).map(|_| ())
    }

    /// Quits the current FTP session and closes the control connection.
    pub fn quit(mut self) -> Result<()> {
        self.write_str("QUIT")?;
        let result = self.read_response(status::CLOSING).map(|_| ());
        if let Err(err) = self.reader.into_inner().shutdown() {
            trace!("control connection shutdown: {}", err);
        }
        result
    }

    /// Opens a data connection and issues `command` over the control
    /// connection, after `REST offset` when `offset` is not zero. The server
    /// must answer 125 or 150. On any failure the data connection is closed
    /// before the error is returned.
    pub fn cmd_data_conn_from(&mut self, offset: u64, command: &str) -> Result<Response<'_>> {
        if self.data_pending {
            return Err(FtpError::InvalidState(
                "previous data connection was not closed".to_owned(),
            ));
        }
        if self.use_pret {
            self.pret(command)?;
        }
        let stream = self.open_data_conn()?;
        if let Err(err) = self.start_transfer(offset, command) {
            if let Err(close_err) = stream.shutdown() {
                trace!("data connection shutdown: {}", close_err);
            }
            return Err(err);
        }
        self.data_pending = true;
        Ok(Response {
            conn: self,
            stream: Some(stream),
        })
    }

    fn start_transfer(&mut self, offset: u64, command: &str) -> Result<()> {
        if offset != 0 {
            debug!("Requesting to resume transfer at offset {}", offset);
            self.write_str(format!("REST {}", offset))?;
            self.read_response(status::REQUEST_FILE_PENDING)?;
        }
        self.write_str(command)?;
        self.read_response_in(&[status::ALREADY_OPEN, status::ABOUT_TO_SEND])
            .map(|_| ())
    }

    /// `PRET` tells servers with a pool of passive ports what is coming.
    fn pret(&mut self, command: &str) -> Result<()> {
        self.write_str(format!("PRET {}", command))?;
        let line = self.read_response_any()?;
        if line.0 / 100 == 2 {
            return Ok(());
        }
        match self.options.pret_policy {
            PretPolicy::Strict => Err(FtpError::UnexpectedResponse(line)),
            PretPolicy::Permissive => {
                warn!("PRET refused, continuing: {}", line);
                Ok(())
            }
        }
    }

    fn open_data_conn(&mut self) -> Result<DataStream> {
        let addr = self.data_conn_addr()?;
        debug!("Opening data connection to {}", addr);
        let stream = DataStream::Tcp(dial_tcp(&self.options, &addr.to_string())?);
        #[cfg(feature = "secure")]
        let stream = match self.options.tls_connector {
            Some(ref connector) => stream.into_secure(connector, &self.host)?,
            None => stream,
        };
        Ok(stream)
    }

    /// Asks for a passive data address, `EPSV` first unless disabled or
    /// already failed once on this session.
    fn data_conn_addr(&mut self) -> Result<SocketAddr> {
        if !self.options.disable_epsv && !self.skip_epsv {
            match self.epsv() {
                Ok(addr) => return Ok(addr),
                Err(err) => {
                    debug!("EPSV failed, using PASV from now on: {}", err);
                    self.skip_epsv = true;
                }
            }
        }
        self.pasv()
    }

    fn epsv(&mut self) -> Result<SocketAddr> {
        self.write_str("EPSV")?;
        let Line(_, line) = self.read_response(status::EXTENDED_PASSIVE_MODE)?;
        let port = parse_epsv(&line)?;
        Ok(SocketAddr::new(self.get_ref().peer_addr()?.ip(), port))
    }

    /// Runs the PASV command.
    fn pasv(&mut self) -> Result<SocketAddr> {
        self.write_str("PASV")?;
        let Line(_, line) = self.read_response(status::PASSIVE_MODE)?;
        parse_pasv(&line)
    }

    /// Reads the reply owed for a data connection that was just closed.
    /// When it does not come in time the session keeps owing it, and the
    /// next command discards it first.
    fn finish_data_conn(&mut self) -> Result<()> {
        self.data_pending = false;
        match self.read_transfer_reply() {
            Ok(Line(code, _))
                if code == status::CLOSING_DATA_CONNECTION
                    || code == status::REQUESTED_FILE_ACTION_OK =>
            {
                Ok(())
            }
            Ok(line) => Err(FtpError::UnexpectedResponse(line)),
            Err(FtpError::Timeout) => {
                self.reply_owed = true;
                Err(FtpError::Timeout)
            }
            Err(err) => Err(err),
        }
    }

    /// Consumes a transfer reply left over by a timed out close.
    fn discard_owed_reply(&mut self) -> Result<()> {
        if self.reply_owed {
            let line = self.read_transfer_reply()?;
            self.reply_owed = false;
            debug!("Discarded late transfer reply: {}", line);
        }
        Ok(())
    }

    /// Reads one reply, bounded by the shutdown timeout when there is one.
    fn read_transfer_reply(&mut self) -> Result<Line> {
        let timeout = self.options.shutdown_timeout;
        let previous = match timeout {
            Some(_) => {
                let previous = self.get_ref().read_timeout()?;
                self.get_ref().set_read_timeout(timeout)?;
                Some(previous)
            }
            None => None,
        };
        let result = self.read_response_any();
        if let Some(previous) = previous {
            if let Err(err) = self.get_ref().set_read_timeout(previous) {
                trace!("could not restore read timeout: {}", err);
            }
        }
        match result {
            Err(FtpError::ConnectionError(ref err))
                if err.kind() == io::ErrorKind::WouldBlock || err.kind() == io::ErrorKind::TimedOut =>
            {
                Err(FtpError::Timeout)
            }
            result => result,
        }
    }

    /// Execute a command which returns list of strings in a separate stream
    fn list_command(&mut self, command: &str) -> Result<Vec<String>> {
        let mut response = self.cmd_data_conn_from(0, command)?;
        let mut buffer = Vec::new();
        let read = response.read_to_end(&mut buffer);
        let closed = response.close();
        read?;
        closed?;
        let text = String::from_utf8(buffer)
            .map_err(|err| FtpError::InvalidResponse(format!("listing is not valid UTF-8: {}", err)))?;
        Ok(text
            .lines()
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn upload<R: Read>(&mut self, offset: u64, command: &str, r: &mut R) -> Result<()> {
        let mut response = self.cmd_data_conn_from(offset, command)?;
        let copied = copy(r, &mut response);
        let closed = response.close();
        copied?;
        closed
    }

    fn list_context(&self) -> ListContext {
        ListContext {
            now: Utc::now(),
            location: self.options.location,
            future_threshold: self.options.future_threshold,
        }
    }

    fn write_str<S: AsRef<str>>(&mut self, command: S) -> Result<()> {
        self.discard_owed_reply()?;
        let command = command.as_ref();
        let shown = if command.starts_with("PASS ") {
            "PASS ******"
        } else {
            command
        };
        debug!("CMD {}", shown);
        self.debug_output("CMD", shown);

        let stream = self.reader.get_mut();
        stream.write_all(format!("{}\r\n", command).as_bytes())?;
        Ok(())
    }

    fn debug_output(&mut self, prefix: &str, text: &str) {
        if let Some(ref mut output) = self.options.debug_output {
            if let Err(err) = writeln!(output, "{} {}", prefix, text) {
                trace!("debug output failed: {}", err);
            }
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(FtpError::ConnectionError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "control connection closed by server",
            )));
        }
        let line = line.trim_end_matches(&['\r', '\n'][..]).to_owned();
        trace!("FTP {}", line);
        self.debug_output("FTP", &line);
        Ok(line)
    }

    /// Reads one reply, following `code-` continuation lines up to the
    /// closing `code ` line, whatever its code.
    pub fn read_response_any(&mut self) -> Result<Line> {
        let first = self.read_line()?;
        let code = parse_reply_code(&first).ok_or_else(|| {
            FtpError::InvalidResponse(format!("error: could not parse reply code: {}", first))
        })?;

        let mut message = first.get(4..).unwrap_or("").to_owned();
        if first.as_bytes().get(3) == Some(&b'-') {
            let last = format!("{} ", &first[0..3]);
            let continued = format!("{}-", &first[0..3]);
            loop {
                let line = self.read_line()?;
                message.push('\n');
                if line.starts_with(&last) || line == first[0..3] {
                    message.push_str(line.get(4..).unwrap_or(""));
                    break;
                }
                if line.starts_with(&continued) {
                    message.push_str(&line[4..]);
                } else {
                    message.push_str(&line);
                }
            }
        }

        if status::status_text(code).is_none() {
            warn!("Unknown status code: {}", code);
        }
        Ok(Line(code, message))
    }

    pub fn read_response(&mut self, expected_code: u32) -> Result<Line> {
        self.read_response_in(&[expected_code])
    }

    /// Reads one reply and checks its code against `expected_code`.
    pub fn read_response_in(&mut self, expected_code: &[u32]) -> Result<Line> {
        let line = self.read_response_any()?;
        if expected_code.contains(&line.0) {
            Ok(line)
        } else {
            Err(FtpError::UnexpectedResponse(line))
        }
    }
}

/// An open data connection. Reading or writing goes to the server;
/// closing it, explicitly or by drop, also consumes the reply the server
/// sends once the transfer is over, so the session is ready for the next
/// command.
#[derive(Debug)]
pub struct Response<'a> {
    conn: &'a mut ServerConn,
    stream: Option<DataStream>,
}

impl<'a> Response<'a> {
    /// Closes the data connection and reads the final transfer reply.
    /// The socket is closed even when that reply is an error or never
    /// comes. Closing again does nothing.
    pub fn close(&mut self) -> Result<()> {
        match self.stream.take() {
            Some(stream) => {
                if let Err(err) = stream.shutdown() {
                    trace!("data connection shutdown: {}", err);
                }
                self.conn.finish_data_conn()
            }
            None => Ok(()),
        }
    }

    /// The data connection socket, until closed.
    pub fn get_ref(&self) -> Option<&TcpStream> {
        self.stream.as_ref().map(DataStream::get_ref)
    }
}

impl<'a> Read for Response<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream {
            Some(ref mut stream) => stream.read(buf),
            None => Ok(0),
        }
    }
}

impl<'a> Write for Response<'a> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream {
            Some(ref mut stream) => stream.write(buf),
            None => Err(closed_data_conn()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream {
            Some(ref mut stream) => stream.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> Drop for Response<'a> {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            debug!("error while closing data connection: {}", err);
        }
    }
}

fn closed_data_conn() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "data connection already closed")
}

/// `VERB path`, or the bare verb when there is no path.
fn with_path(verb: &str, pathname: Option<&str>) -> String {
    match pathname {
        Some(path) if !path.is_empty() => format!("{} {}", verb, path),
        _ => verb.to_owned(),
    }
}

/// The three digit code opening a reply line.
fn parse_reply_code(line: &str) -> Option<u32> {
    let digits = line.get(0..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn dial_tcp(options: &DialOptions, addr: &str) -> Result<TcpStream> {
    if let Some(ref dial) = options.dial_func {
        return dial(addr).map_err(FtpError::ConnectionError);
    }
    match options.timeout {
        Some(timeout) => {
            let mut last_err = None;
            for sock_addr in addr.to_socket_addrs()? {
                match TcpStream::connect_timeout(&sock_addr, timeout) {
                    Ok(stream) => return Ok(stream),
                    Err(err) => last_err = Some(err),
                }
            }
            Err(FtpError::ConnectionError(last_err.unwrap_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
            })))
        }
        None => TcpStream::connect(addr).map_err(FtpError::ConnectionError),
    }
}

/// Host part of `host:port`, `[v6]:port`, or a bare host.
fn host_of(addr: &str) -> String {
    if let Some(bracketed) = addr.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or(bracketed).to_owned();
    }
    match addr.rfind(':') {
        Some(i) if !addr[..i].contains(':') => addr[..i].to_owned(),
        _ => addr.to_owned(),
    }
}

/// PASV response format : 227 Entering Passive Mode (h1,h2,h3,h4,p1,p2).
fn parse_pasv(line: &str) -> Result<SocketAddr> {
    let invalid = || FtpError::InvalidResponse(format!("Invalid PASV response: {}", line));
    let caps = PORT_RE.captures(line).ok_or_else(invalid)?;
    let (msb, lsb) = match (caps[5].parse::<u16>(), caps[6].parse::<u16>()) {
        (Ok(msb), Ok(lsb)) if msb <= 255 && lsb <= 255 => (msb, lsb),
        _ => return Err(invalid()),
    };
    let port = (msb << 8) + lsb;
    let addr = format!("{}.{}.{}.{}:{}", &caps[1], &caps[2], &caps[3], &caps[4], port);
    SocketAddr::from_str(&addr).map_err(FtpError::InvalidAddress)
}

/// EPSV response format : 229 Entering Extended Passive Mode (|||port|)
fn parse_epsv(line: &str) -> Result<u16> {
    let invalid = || FtpError::InvalidResponse(format!("Invalid EPSV response: {}", line));
    let start = line.find("|||").ok_or_else(invalid)? + 3;
    let end = line.rfind('|').ok_or_else(invalid)?;
    if end < start {
        return Err(invalid());
    }
    line[start..end].parse().map_err(|_| invalid())
}

/// Feature lines of a 211 `FEAT` reply are the ones indented by exactly
/// one space: ` NAME params`.
fn parse_features(message: &str) -> HashMap<String, String> {
    message
        .lines()
        .filter(|line| line.starts_with(' ') && !line.starts_with("  "))
        .filter_map(|line| {
            let mut parts = line.trim().splitn(2, ' ');
            let name = parts.next().filter(|name| !name.is_empty())?;
            let params = parts.next().unwrap_or("").trim();
            Some((name.to_ascii_uppercase(), params.to_owned()))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pasv_reply_gives_address() {
        let addr = parse_pasv("Entering Passive Mode (192,168,1,20,19,137).").unwrap();
        assert_eq!(addr, "192.168.1.20:5001".parse::<SocketAddr>().unwrap());
        let addr = parse_pasv("=(10,0,0,1,0,21)").unwrap();
        assert_eq!(addr.port(), 21);
    }

    #[test]
    fn malformed_pasv_replies() {
        for line in &[
            "Entering Passive Mode 192,168,1,20,19,137",
            "Entering Passive Mode (192,168,1,20,19)",
            "Entering Passive Mode (192,168,1,20,19,1337)",
            "Entering Passive Mode ()",
        ] {
            match parse_pasv(line) {
                Err(FtpError::InvalidResponse(_)) => {}
                other => panic!("{}: {:?}", line, other),
            }
        }
        match parse_pasv("(300,168,1,20,19,137)") {
            Err(FtpError::InvalidAddress(_)) => {}
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn epsv_reply_gives_port() {
        assert_eq!(parse_epsv("Entering Extended Passive Mode (|||6446|)").unwrap(), 6446);
        assert!(parse_epsv("Entering Extended Passive Mode (6446)").is_err());
        assert!(parse_epsv("Entering Extended Passive Mode (|||)").is_err());
        assert!(parse_epsv("Entering Extended Passive Mode (|||abc|)").is_err());
        assert!(parse_epsv("Entering Extended Passive Mode (|||70000|)").is_err());
    }

    #[test]
    fn feature_lines() {
        let message = "Extensions supported:\n MLST type*;size*;modify*;\n utf8\n  INDENTED\nNotAFeature\n PRET\nEnd";
        let features = parse_features(message);
        assert_eq!(features.len(), 3);
        assert_eq!(features["MLST"], "type*;size*;modify*;");
        assert_eq!(features["UTF8"], "");
        assert!(features.contains_key("PRET"));
    }

    #[test]
    fn reply_codes_are_three_digits() {
        assert_eq!(parse_reply_code("226 Transfer complete."), Some(226));
        assert_eq!(parse_reply_code("211-Features:"), Some(211));
        assert_eq!(parse_reply_code("+12 sneaky"), None);
        assert_eq!(parse_reply_code(" 12 spaced"), None);
        assert_eq!(parse_reply_code("22"), None);
        assert_eq!(parse_reply_code("é26 x"), None);
    }

    #[test]
    fn empty_path_means_no_argument() {
        assert_eq!(with_path("LIST", None), "LIST");
        assert_eq!(with_path("LIST", Some("")), "LIST");
        assert_eq!(with_path("NLST", Some("/pub")), "NLST /pub");
    }

    #[test]
    fn host_from_address() {
        assert_eq!(host_of("ftp.example.com:21"), "ftp.example.com");
        assert_eq!(host_of("ftp.example.com"), "ftp.example.com");
        assert_eq!(host_of("[::1]:21"), "::1");
        assert_eq!(host_of("127.0.0.1:2121"), "127.0.0.1");
    }
}
