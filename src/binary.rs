//! Binary opcode buffer handling
//!
//! `.obj` files hold KC pseudo-assembly for the game's script interpreter.
//! This layer imposes no structure on them; opcode semantics belong to the
//! transforms that edit specific code sequences. The buffer is read and
//! written verbatim.
//!
//! Mutation through [`BinaryFile::data_mut`] is not auto-detected; callers
//! editing the buffer directly must call [`BinaryFile::mark_dirty`]. The
//! [`BinaryFile::patch`] helper does both.

use crate::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A loaded binary file
#[derive(Debug)]
pub struct BinaryFile {
    virtual_path: String,
    data: Vec<u8>,
    dirty: bool,
}

impl BinaryFile {
    /// Wrap raw bytes; the buffer starts clean.
    pub fn new(virtual_path: &str, bytes: Vec<u8>) -> Self {
        Self {
            virtual_path: virtual_path.to_string(),
            data: bytes,
            dirty: false,
        }
    }

    /// Virtual path of this file.
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// The raw buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the raw buffer.
    ///
    /// Does not mark the file dirty; call [`mark_dirty`](Self::mark_dirty)
    /// after editing.
    pub fn data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.data
    }

    /// Flag the buffer as modified so it gets written back.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether this buffer must be written back.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Find the first occurrence of a byte pattern.
    pub fn find(&self, pattern: &[u8]) -> Option<usize> {
        if pattern.is_empty() || pattern.len() > self.data.len() {
            return None;
        }
        self.data
            .windows(pattern.len())
            .position(|window| window == pattern)
    }

    /// Overwrite bytes at `offset` and mark the buffer dirty.
    ///
    /// The replacement must fit within the existing buffer; opcode patches
    /// must never change code offsets.
    pub fn patch(&mut self, offset: usize, replacement: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(replacement.len())
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                Error::integrity(format!(
                    "patch at offset {offset} ({} bytes) exceeds {} ({} bytes)",
                    replacement.len(),
                    self.virtual_path,
                    self.data.len()
                ))
            })?;
        self.data[offset..end].copy_from_slice(replacement);
        self.dirty = true;
        Ok(())
    }

    /// Write the buffer verbatim to `dest`.
    pub fn write_to(&self, dest: &Path) -> Result<()> {
        let mut file = File::create(dest)?;
        file.write_all(&self.data)?;
        Ok(())
    }
}
