use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;
use crate::external_sort::record::parse_edge_line;
use crate::graph::edge::Edge;

/// Peek-head cursor over one sorted chunk file.
///
/// `open` consumes the header line and seeds the head. Once the file runs
/// out, or a line fails to parse, the cursor is exhausted and the file
/// handle is dropped; it is never reopened.
pub struct ChunkReader {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    head: Option<Edge>,
    line_number: usize,
    records_read: usize,
    truncated: bool,
    buf: Vec<u8>,
}

impl ChunkReader {
    pub fn open(path: &Path, io_buffer_size: usize) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(io_buffer_size, file);

        let mut buf = Vec::new();
        let header_len = reader.read_until(b'\n', &mut buf)?;

        let mut cursor = Self {
            path: path.to_path_buf(),
            reader: Some(reader),
            head: None,
            line_number: if header_len > 0 { 1 } else { 0 },
            records_read: 0,
            truncated: false,
            buf,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current unread record, or `None` once exhausted.
    pub fn peek_head(&self) -> Option<&Edge> {
        self.head.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.reader.is_none() && self.head.is_none()
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// True when a malformed or out-of-order line cut this chunk short.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Replaces the head with the next record, or exhausts the cursor.
    pub fn advance(&mut self) -> Result<()> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => {
                self.head = None;
                return Ok(());
            }
        };

        self.buf.clear();
        if reader.read_until(b'\n', &mut self.buf)? == 0 {
            debug!("Chunk {} exhausted after {} records", self.path.display(), self.records_read);
            self.close();
            return Ok(());
        }
        self.line_number += 1;

        let edge = match parse_edge_line(&self.buf, self.line_number) {
            Ok(edge) => edge,
            Err(e) => {
                warn!("Truncating chunk {}: {}", self.path.display(), e);
                self.truncated = true;
                self.close();
                return Ok(());
            }
        };

        if let Some(previous) = &self.head {
            if edge <= *previous {
                warn!(
                    "Truncating chunk {}: line {} is not strictly ascending",
                    self.path.display(),
                    self.line_number
                );
                self.truncated = true;
                self.close();
                return Ok(());
            }
        }

        self.head = Some(edge);
        self.records_read += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.head = None;
        // Dropping the BufReader closes the file; `take` makes this happen once.
        self.reader.take();
    }
}
