//! Incremental UTF-8 text layer over a [`BinaryFile`].
//!
//! Decoding is stateful across refills: a byte chunk that ends mid-sequence
//! is held in `pending_bytes` until the next chunk completes it, and any
//! characters decoded beyond what a bounded `read(n)` asked for are held in
//! `pending_chars` rather than re-decoded or discarded.
//!
//! `BinaryFile::tell()` tracks bytes *consumed from the kernel*, which runs
//! ahead of what the caller has actually seen whenever `pending_bytes` or
//! `pending_chars` holds read-ahead the caller hasn't been given yet. The
//! text-mode logical position `tell()`/`seek(Current, _)` must report is the
//! binary position minus that undelivered residue — see
//! [`TextFile::logical_position`].

use crate::buffered::{apply_delta, BinaryFile};
use crate::error::Error;
use crate::mode::FileMode;

use std::io::SeekFrom;

pub(crate) struct TextFile {
    binary: BinaryFile,
    pending_bytes: Vec<u8>,
    pending_chars: String,
}

impl TextFile {
    pub(crate) fn new(binary: BinaryFile) -> Self {
        Self {
            binary,
            pending_bytes: Vec::new(),
            pending_chars: String::new(),
        }
    }

    pub(crate) fn mode(&self) -> FileMode {
        self.binary.mode()
    }

    /// The binary position minus whatever's sitting undelivered in
    /// `pending_bytes`/`pending_chars` — both are byte counts (`String::len`
    /// is a byte length, not a char count), so this is exact even though the
    /// caller thinks in characters.
    fn logical_position(&self) -> u64 {
        self.binary
            .tell()
            .saturating_sub(self.pending_bytes.len() as u64)
            .saturating_sub(self.pending_chars.len() as u64)
    }

    pub(crate) fn tell(&self) -> u64 {
        self.logical_position()
    }

    /// Up to `n` characters, or everything remaining when `n < 0`.
    pub(crate) async fn read(&mut self, n: i64) -> Result<String, Error> {
        let target = if n < 0 { None } else { Some(n as usize) };
        let mut out = String::new();
        let mut count = 0usize;

        loop {
            if !self.pending_chars.is_empty() {
                let pending_count = self.pending_chars.chars().count();
                match target {
                    Some(target) if count + pending_count > target => {
                        let need = target - count;
                        let mut chars = self.pending_chars.chars();
                        let take: String = chars.by_ref().take(need).collect();
                        let rest: String = chars.collect();
                        out.push_str(&take);
                        count += need;
                        self.pending_chars = rest;
                        break;
                    }
                    _ => {
                        out.push_str(&self.pending_chars);
                        count += pending_count;
                        self.pending_chars.clear();
                    }
                }
            }

            if let Some(target) = target {
                if count >= target {
                    break;
                }
            }

            let chunk_size = self.binary.buffer_capacity();
            let raw = self.binary.read(chunk_size as i64).await?;

            let mut combined = std::mem::take(&mut self.pending_bytes);
            combined.extend_from_slice(&raw);

            if raw.is_empty() {
                if combined.is_empty() {
                    break;
                }
                // Bytes that were never completed and never will be: the
                // file ends mid-sequence. Report where the incomplete
                // sequence actually starts rather than a hardcoded 0.
                let valid_up_to = match std::str::from_utf8(&combined) {
                    Ok(_) => combined.len(),
                    Err(e) => e.valid_up_to(),
                };
                return Err(Error::Decode { valid_up_to });
            }

            let (decoded, leftover) = decode_utf8_prefix(&combined)?;
            self.pending_bytes = leftover;
            self.pending_chars = decoded;
        }

        Ok(out)
    }

    /// Encodes `s` to UTF-8 and delegates to the binary write path, then
    /// reports the number of characters written.
    pub(crate) async fn write(&mut self, s: &str) -> Result<usize, Error> {
        self.discard_read_ahead().await?;
        self.binary.write(s.as_bytes()).await?;
        Ok(s.chars().count())
    }

    /// Read→write mode boundary (spec §4.4/§4.5): if a prior read left
    /// undelivered bytes/chars parked ahead of the logical position, the
    /// binary layer's own position needs rewinding to match before a write
    /// lands there, or the write would start past bytes the caller never
    /// saw.
    async fn discard_read_ahead(&mut self) -> Result<(), Error> {
        if self.pending_bytes.is_empty() && self.pending_chars.is_empty() {
            return Ok(());
        }

        let logical = self.logical_position();
        self.pending_bytes.clear();
        self.pending_chars.clear();
        self.binary.seek(SeekFrom::Start(logical)).await?;
        Ok(())
    }

    /// `Current` is resolved against this file's own logical position (spec
    /// §8 scenario 6: `seek(2, current)` after reading 3 characters must land
    /// at character 5, not at however far the binary read-ahead overshot).
    /// `Start`/`End` are already absolute byte offsets and pass straight
    /// through to the binary layer.
    pub(crate) async fn seek(&mut self, pos: SeekFrom) -> Result<u64, Error> {
        let resolved = match pos {
            SeekFrom::Current(delta) => SeekFrom::Start(apply_delta(self.logical_position(), delta)?),
            other => other,
        };

        self.pending_bytes.clear();
        self.pending_chars.clear();
        self.binary.seek(resolved).await
    }

    pub(crate) async fn truncate(&mut self, length: Option<u64>) -> Result<(), Error> {
        self.binary.truncate(length).await
    }

    pub(crate) async fn flush(&mut self) -> Result<(), Error> {
        self.binary.flush().await
    }

    pub(crate) async fn fsync(&mut self) -> Result<(), Error> {
        self.binary.fsync().await
    }

    pub(crate) async fn close(&mut self) -> Result<(), Error> {
        self.binary.close().await
    }
}

/// Splits `buf` into the longest valid UTF-8 prefix and a trailing leftover
/// of bytes that form an incomplete (not invalid) sequence. Genuinely
/// malformed bytes fail with [`Error::Decode`] carrying the byte offset.
fn decode_utf8_prefix(buf: &[u8]) -> Result<(String, Vec<u8>), Error> {
    match std::str::from_utf8(buf) {
        Ok(s) => Ok((s.to_string(), Vec::new())),
        Err(e) => {
            let valid_up_to = e.valid_up_to();
            match e.error_len() {
                None => {
                    let valid = std::str::from_utf8(&buf[..valid_up_to])
                        .expect("prefix already validated by from_utf8")
                        .to_string();
                    Ok((valid, buf[valid_up_to..].to_vec()))
                }
                Some(_) => Err(Error::Decode { valid_up_to }),
            }
        }
    }
}
