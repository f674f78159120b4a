//! Per-vessel intermediate edge stores.
//!
//! Each vessel owns one append-only file `{mmsi:09}.edges` written by the
//! worker that processed it. Layout:
//!
//! ```text
//! header:  b"TGEDGES\0"  u16 LE version
//! record:  u32 LE length  bincode(NetworkEdge)
//! ```
//!
//! End of file at a record boundary ends reading. End of file inside a
//! record is [`GraphError::TruncatedRecord`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use super::edge::NetworkEdge;
use crate::{GraphError, Result};

pub const STORE_MAGIC: &[u8; 8] = b"TGEDGES\0";
pub const STORE_VERSION: u16 = 1;
pub const STORE_EXTENSION: &str = "edges";

/// Path of a vessel's store inside `dir`.
pub fn store_path(dir: &Path, mmsi: u32) -> PathBuf {
    dir.join(format!("{:09}.{}", mmsi, STORE_EXTENSION))
}

/// Appends edge records to one vessel's store.
pub struct EdgeStoreWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl EdgeStoreWriter {
    /// Open (or create) the store of `mmsi` inside `dir`.
    ///
    /// The directory is created if absent; the header is written only to a
    /// new, empty file.
    pub fn open(dir: &Path, mmsi: u32) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = store_path(dir, mmsi);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = BufWriter::new(file);
        if is_new {
            writer.write_all(STORE_MAGIC)?;
            writer.write_all(&STORE_VERSION.to_le_bytes())?;
        }

        Ok(Self {
            path,
            writer,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one complete record.
    pub fn append(&mut self, edge: &NetworkEdge) -> Result<()> {
        let body = bincode::serialize(edge)?;
        let len = u32::try_from(body.len())
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "edge record exceeds 4 GiB"))?;
        self.writer.write_all(&len.to_le_bytes())?;
        self.writer.write_all(&body)?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, returning the number of records appended.
    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

/// Reads edge records back from a store, in write order.
pub struct EdgeStoreReader {
    path: PathBuf,
    reader: BufReader<File>,
    done: bool,
}

impl EdgeStoreReader {
    /// Open a store and check its header.
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);

        let mut header = [0u8; 10];
        if read_full(&mut reader, &mut header)? < header.len() || &header[..8] != STORE_MAGIC {
            return Err(GraphError::BadStoreHeader {
                path: path.to_path_buf(),
            });
        }
        let version = u16::from_le_bytes([header[8], header[9]]);
        if version != STORE_VERSION {
            return Err(GraphError::UnsupportedStoreVersion {
                path: path.to_path_buf(),
                found: version,
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next record, or `None` at a clean end of file.
    pub fn read_edge(&mut self) -> Result<Option<NetworkEdge>> {
        let mut len = [0u8; 4];
        match read_full(&mut self.reader, &mut len)? {
            0 => return Ok(None),
            4 => {}
            _ => return Err(self.truncated()),
        }

        let mut body = vec![0u8; u32::from_le_bytes(len) as usize];
        if read_full(&mut self.reader, &mut body)? < body.len() {
            return Err(self.truncated());
        }
        Ok(Some(bincode::deserialize(&body)?))
    }

    fn truncated(&self) -> GraphError {
        GraphError::TruncatedRecord {
            path: self.path.clone(),
        }
    }
}

impl Iterator for EdgeStoreReader {
    type Item = Result<NetworkEdge>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = self.read_edge().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}

/// Fill `buf` as far as the input allows, returning the bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
