//! Files generated from scratch by transforms
//!
//! Generated files have no source origin; a transform constructs them with
//! their full content. Presence of content is what drives write-back, so
//! they are always write candidates and carry no dirty flag.

use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Content of a generated file
#[derive(Debug)]
pub enum GeneratedContent {
    /// Text content; a final line terminator is enforced at write time
    Text(String),
    /// Binary content, written verbatim
    Binary(Vec<u8>),
}

/// A transform-generated output file
#[derive(Debug)]
pub struct GeneratedFile {
    content: GeneratedContent,
}

impl GeneratedFile {
    /// Create a generated text file.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: GeneratedContent::Text(content.into()),
        }
    }

    /// Create a generated binary file.
    pub fn binary(content: Vec<u8>) -> Self {
        Self {
            content: GeneratedContent::Binary(content),
        }
    }

    /// The content to be written.
    pub fn content(&self) -> &GeneratedContent {
        &self.content
    }

    /// Write the content to `dest`.
    pub fn write_to(&self, dest: &Path) -> Result<()> {
        let mut file = File::create(dest)?;
        match &self.content {
            GeneratedContent::Text(text) => {
                file.write_all(text.as_bytes())?;
                if !text.ends_with('\n') {
                    file.write_all(b"\n")?;
                }
            }
            GeneratedContent::Binary(bytes) => {
                file.write_all(bytes)?;
            }
        }
        Ok(())
    }
}
