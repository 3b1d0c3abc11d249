//! Depth first traversal of a remote tree.

use super::entry::{Entry, EntryType};
use super::ftp::ServerConn;
use super::types::FtpError;

#[derive(Debug)]
struct Item {
    path: String,
    entry: Entry,
    err: Option<FtpError>,
}

/// Walks the tree below a root directory, one entry per `next()` call.
///
/// Folders are listed lazily, when the walker steps past them. Children are
/// kept on a stack, so the last entry a listing returned is visited first.
///
/// ```rust,no_run
/// # use ftpwalk::ServerConn;
/// let mut conn = ServerConn::connect("127.0.0.1:21").unwrap();
/// conn.login("anonymous", "anonymous").unwrap();
/// let mut walker = conn.walk("/pub");
/// while walker.next() {
///     if walker.path().ends_with("/.git") {
///         walker.skip_dir();
///         continue;
///     }
///     println!("{}", walker.path());
/// }
/// if let Some(err) = walker.err() {
///     eprintln!("walk stopped: {}", err);
/// }
/// ```
#[derive(Debug)]
pub struct Walker<'a> {
    conn: &'a mut ServerConn,
    root: String,
    cur: Option<Item>,
    stack: Vec<Item>,
    descend: bool,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(conn: &'a mut ServerConn, root: &str) -> Walker<'a> {
        Walker {
            conn,
            root: root.to_owned(),
            cur: None,
            stack: Vec::new(),
            descend: true,
        }
    }

    /// Advances to the next entry. Returns false once the tree is exhausted
    /// or a listing failed, in which case `err()` has the failure.
    pub fn next(&mut self) -> bool {
        if self.err().is_some() {
            return false;
        }

        let root = &self.root;
        let cur = self.cur.get_or_insert_with(|| Item {
            path: root.clone(),
            entry: Entry::new(root.as_str(), EntryType::Folder),
            err: None,
        });

        if self.descend && cur.entry.is_dir() {
            match self.conn.list(Some(&cur.path)) {
                Ok(entries) => {
                    for entry in entries {
                        if entry.name() == "." || entry.name() == ".." {
                            continue;
                        }
                        self.stack.push(Item {
                            path: join_path(&cur.path, entry.name()),
                            entry,
                            err: None,
                        });
                    }
                }
                Err(err) => {
                    debug!("listing {} failed: {}", cur.path, err);
                    cur.err = Some(err);
                    return false;
                }
            }
        }

        match self.stack.pop() {
            Some(item) => {
                self.cur = Some(item);
                self.descend = true;
                true
            }
            None => {
                // Everything is expanded; don't list the last folder again.
                self.descend = false;
                false
            }
        }
    }

    /// Don't descend into the folder the walker is positioned on.
    pub fn skip_dir(&mut self) {
        self.descend = false;
    }

    /// Path of the current entry, empty before the first `next()`.
    pub fn path(&self) -> &str {
        self.cur.as_ref().map_or("", |item| item.path.as_str())
    }

    pub fn stat(&self) -> Option<&Entry> {
        self.cur.as_ref().map(|item| &item.entry)
    }

    /// The listing failure that stopped the walk, if any.
    pub fn err(&self) -> Option<&FtpError> {
        self.cur.as_ref().and_then(|item| item.err.as_ref())
    }
}

/// Joins a remote directory path and an entry name with a single '/'.
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_owned()
    } else if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod test {
    use super::join_path;

    #[test]
    fn joins_with_one_separator() {
        assert_eq!(join_path("/", "pub"), "/pub");
        assert_eq!(join_path("/pub", "a.txt"), "/pub/a.txt");
        assert_eq!(join_path("/pub/", "a.txt"), "/pub/a.txt");
        assert_eq!(join_path("", "a.txt"), "a.txt");
    }
}
