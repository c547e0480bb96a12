//! XML document handling with declaration-sensitive encoding
//!
//! Game XML files declare their encoding on the first line
//! (`<?xml version="1.0" encoding="ISO-8859-1" ?>`), and the game engine
//! trusts that declaration, so written output must be encoded accordingly.
//! Files without a declaration (plain script bodies) default to UTF-8.
//!
//! Documents are held as text. Transforms either swap the text wholesale
//! ([`XmlFile::set_text`]) or re-serialize a parsed tree and splice it in
//! under the original declaration ([`XmlFile::update_body`]); the latter
//! enforces that exactly one declaration marker survives, since a document
//! with zero or duplicated declarations is unloadable by the engine.

use crate::{Error, Result};
use quick_xml::Reader;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Encoding used when no declaration is present or parsable
const DEFAULT_ENCODING: &str = "utf-8";

/// XML declaration marker
const DECLARATION: &str = "<?xml";

/// A loaded XML document
#[derive(Debug)]
pub struct XmlFile {
    virtual_path: String,
    text: String,
    encoding: String,
    dirty: bool,
}

impl XmlFile {
    /// Parse an XML file from its raw bytes.
    ///
    /// The declared encoding is sniffed from the first line (always read
    /// as UTF-8 bytes), then the content is decoded with it. CRLF line
    /// endings are normalized to LF.
    pub fn parse(virtual_path: &str, bytes: &[u8]) -> Result<Self> {
        let encoding = find_encoding(bytes);
        let text = decode(virtual_path, bytes, &encoding)?.replace("\r\n", "\n");
        Ok(Self {
            virtual_path: virtual_path.to_string(),
            text,
            encoding,
            dirty: false,
        })
    }

    /// Virtual path of this document.
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// Current document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Encoding declared by the document (lowercased declaration value).
    ///
    /// Writing output in a different encoding without updating the
    /// declaration is the caller's responsibility; it is not validated
    /// here.
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Replace the document text wholesale and mark the file dirty.
    pub fn set_text(&mut self, new_text: impl Into<String>) {
        self.text = new_text.into();
        self.dirty = true;
    }

    /// Replace everything after the first line with newly serialized
    /// content, keeping the original first line (the XML declaration)
    /// verbatim.
    ///
    /// Fails with an integrity error if the result would not contain
    /// exactly one declaration marker; writing such a document would
    /// corrupt it for the game engine.
    pub fn update_body(&mut self, body: &str) -> Result<()> {
        let first_line = self.text.lines().next().unwrap_or("");
        let new_text = format!("{first_line}\n{body}");

        let declarations = new_text.matches(DECLARATION).count();
        if declarations != 1 {
            return Err(Error::integrity(format!(
                "structured update of {} left {declarations} XML declarations",
                self.virtual_path
            )));
        }

        self.text = new_text;
        self.dirty = true;
        Ok(())
    }

    /// Event reader over the current text, for transforms that edit the
    /// document as a tree rather than as raw text.
    pub fn reader(&self) -> Reader<&'_ [u8]> {
        Reader::from_str(&self.text)
    }

    /// Whether this document must be written back.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Encode the current text with the declared encoding.
    pub fn encoded(&self) -> Result<Vec<u8>> {
        encode(&self.virtual_path, &self.text, &self.encoding)
    }

    /// Write the current state to `dest` in the declared encoding,
    /// appending a final line terminator if the text lacks one.
    pub fn write_to(&self, dest: &Path) -> Result<()> {
        let mut bytes = self.encoded()?;
        if bytes.last() != Some(&b'\n') {
            bytes.push(b'\n');
        }
        let mut file = File::create(dest)?;
        file.write_all(&bytes)?;
        Ok(())
    }
}

/// Sniff the declared encoding from the first line of an XML file.
///
/// The bytes are always read as UTF-8 for sniffing purposes regardless of
/// the declared encoding. A missing or malformed declaration is not an
/// error; it means UTF-8.
pub fn find_encoding(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let Some(line) = text.lines().next() else {
        return DEFAULT_ENCODING.to_string();
    };

    let Some((_, rest)) = line.split_once("encoding") else {
        return DEFAULT_ENCODING.to_string();
    };

    // Expect '="NAME"' next, modulo whitespace.
    let rest = rest.replace('=', "");
    let mut quoted = rest.split('"');
    let _before = quoted.next();
    match (quoted.next(), quoted.next()) {
        (Some(name), Some(_)) if !name.trim().is_empty() => name.trim().to_lowercase(),
        _ => {
            log::warn!("malformed encoding declaration, defaulting to utf-8: {line}");
            DEFAULT_ENCODING.to_string()
        }
    }
}

fn decode(virtual_path: &str, bytes: &[u8], encoding: &str) -> Result<String> {
    match encoding {
        "utf-8" | "utf8" => String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::integrity(format!("{virtual_path} is not valid UTF-8"))),
        "iso-8859-1" | "latin-1" | "latin1" => {
            // Every byte maps directly to the code point of the same value.
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
        other => {
            log::warn!("{virtual_path}: unsupported declared encoding {other}, reading as utf-8");
            String::from_utf8(bytes.to_vec())
                .map_err(|_| Error::integrity(format!("{virtual_path} is not valid UTF-8")))
        }
    }
}

fn encode(virtual_path: &str, text: &str, encoding: &str) -> Result<Vec<u8>> {
    match encoding {
        "utf-8" | "utf8" => Ok(text.as_bytes().to_vec()),
        "iso-8859-1" | "latin-1" | "latin1" => text
            .chars()
            .map(|c| {
                u8::try_from(c as u32).map_err(|_| {
                    Error::integrity(format!(
                        "{virtual_path}: character {c:?} not encodable as {encoding}"
                    ))
                })
            })
            .collect(),
        other => {
            log::warn!("{virtual_path}: unsupported declared encoding {other}, writing as utf-8");
            Ok(text.as_bytes().to_vec())
        }
    }
}
