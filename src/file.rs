//! Unified game file representation
//!
//! Every loaded or generated file is a [`GameFile`]: a virtual-path
//! identity, the concrete origin its bytes came from, and a [`FileBody`]
//! holding exactly one of the typed variants. The variant is decided once
//! at load time from the path convention; there is no runtime re-sniffing.

use crate::binary::BinaryFile;
use crate::generated::GeneratedFile;
use crate::path::{self, FileKind};
use crate::table::TableFile;
use crate::xml::XmlFile;
use crate::{Result, SourceOrigin};
use std::path::Path;

/// Typed body of a game file
#[derive(Debug)]
pub enum FileBody {
    /// Semicolon-delimited type table
    Table(TableFile),
    /// XML text document
    Xml(XmlFile),
    /// Raw binary buffer
    Binary(BinaryFile),
    /// Transform-generated output
    Generated(GeneratedFile),
}

/// A file in the game's virtual path space
#[derive(Debug)]
pub struct GameFile {
    virtual_path: String,
    source: SourceOrigin,
    body: FileBody,
}

impl GameFile {
    /// Parse raw bytes into the typed variant matching the path convention.
    pub fn load(virtual_path: &str, bytes: &[u8], source: SourceOrigin) -> Result<Self> {
        let body = match path::classify(virtual_path) {
            FileKind::Table => FileBody::Table(TableFile::parse(virtual_path, bytes)?),
            FileKind::Xml => FileBody::Xml(XmlFile::parse(virtual_path, bytes)?),
            FileKind::Binary => FileBody::Binary(BinaryFile::new(virtual_path, bytes.to_vec())),
        };
        Ok(Self {
            virtual_path: virtual_path.to_string(),
            source,
            body,
        })
    }

    /// Wrap a transform-generated file.
    pub fn generated(virtual_path: &str, file: GeneratedFile) -> Self {
        Self {
            virtual_path: virtual_path.to_string(),
            source: SourceOrigin::Generated,
            body: FileBody::Generated(file),
        }
    }

    /// Virtual path of this file.
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// File name: the final segment of the virtual path.
    pub fn name(&self) -> &str {
        path::file_name(&self.virtual_path)
    }

    /// Where this file's bytes came from.
    pub fn source(&self) -> &SourceOrigin {
        &self.source
    }

    /// The typed body.
    pub fn body(&self) -> &FileBody {
        &self.body
    }

    /// The typed body, mutably.
    pub fn body_mut(&mut self) -> &mut FileBody {
        &mut self.body
    }

    /// The table body, if this is a table file.
    pub fn as_table_mut(&mut self) -> Option<&mut TableFile> {
        match &mut self.body {
            FileBody::Table(table) => Some(table),
            _ => None,
        }
    }

    /// The XML body, if this is an XML file.
    pub fn as_xml_mut(&mut self) -> Option<&mut XmlFile> {
        match &mut self.body {
            FileBody::Xml(xml) => Some(xml),
            _ => None,
        }
    }

    /// The binary body, if this is a binary file.
    pub fn as_binary_mut(&mut self) -> Option<&mut BinaryFile> {
        match &mut self.body {
            FileBody::Binary(binary) => Some(binary),
            _ => None,
        }
    }

    /// Whether this file must be written at flush time.
    ///
    /// Generated files are always write candidates; their content is their
    /// reason to exist.
    pub fn is_dirty(&self) -> bool {
        match &self.body {
            FileBody::Table(table) => table.is_dirty(),
            FileBody::Xml(xml) => xml.is_dirty(),
            FileBody::Binary(binary) => binary.is_dirty(),
            FileBody::Generated(_) => true,
        }
    }

    /// Serialize the current state to `dest`.
    pub fn write_to(&self, dest: &Path) -> Result<()> {
        match &self.body {
            FileBody::Table(table) => table.write_to(dest),
            FileBody::Xml(xml) => xml.write_to(dest),
            FileBody::Binary(binary) => binary.write_to(dest),
            FileBody::Generated(generated) => generated.write_to(dest),
        }
    }
}
