//! Lazy line-at-a-time iteration over a [`BinaryFile`] or [`TextFile`].
//!
//! Per spec §9's own note, this consolidates what the original implements
//! as an ad hoc re-buffering loop into a thin driver over the file's own
//! `read` primitive: each step reads one unit (byte or character) at a time
//! until a newline or EOF, relying on the file's own buffering (not a fresh
//! syscall per step) to keep that cheap.

use crate::buffered::BinaryFile;
use crate::error::Error;
use crate::text::TextFile;

pub(crate) struct BinaryLines<'a> {
    source: &'a mut BinaryFile,
    finished: bool,
}

impl<'a> BinaryLines<'a> {
    pub(crate) fn new(source: &'a mut BinaryFile) -> Self {
        Self {
            source,
            finished: false,
        }
    }

    /// The next `\n`-terminated record, or the trailing residue at EOF
    /// (which may itself be empty, in which case iteration is over).
    pub(crate) async fn next(&mut self) -> Result<Option<Vec<u8>>, Error> {
        if self.finished {
            return Ok(None);
        }

        let mut line = Vec::new();
        loop {
            let chunk = self.source.read(1).await?;
            if chunk.is_empty() {
                self.finished = true;
                return Ok(if line.is_empty() { None } else { Some(line) });
            }

            let byte = chunk[0];
            line.push(byte);
            if byte == b'\n' {
                return Ok(Some(line));
            }
        }
    }
}

pub(crate) struct TextLines<'a> {
    source: &'a mut TextFile,
    finished: bool,
}

impl<'a> TextLines<'a> {
    pub(crate) fn new(source: &'a mut TextFile) -> Self {
        Self {
            source,
            finished: false,
        }
    }

    pub(crate) async fn next(&mut self) -> Result<Option<String>, Error> {
        if self.finished {
            return Ok(None);
        }

        let mut line = String::new();
        loop {
            let chunk = self.source.read(1).await?;
            if chunk.is_empty() {
                self.finished = true;
                return Ok(if line.is_empty() { None } else { Some(line) });
            }

            line.push_str(&chunk);
            if chunk == "\n" {
                return Ok(Some(line));
            }
        }
    }
}
