//! Type table ("T file") parsing and editing
//!
//! Type tables are semicolon-delimited text files under `types/`. Every
//! physical line becomes one [`Row`]: an ordered list of `(key, value)`
//! field pairs, where a key is either a schema-assigned name or the raw
//! field position. Because each line keeps its own terminator as the final
//! field, serializing is a plain rejoin and unmodified tables round-trip
//! byte-identically.
//!
//! Rows with at least the schema's minimum field count are *data rows*, the
//! ones transforms iterate and edit. Header and comment lines are retained
//! in the full row sequence so they survive write-back, but are never
//! data-classified.

use crate::schema::{FieldLookup, TableSchema, schema_for};
use crate::{Error, Result, path};
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Comment marker for table lines
const COMMENT: &str = "//";

/// Field separator
const SEPARATOR: char = ';';

/// Key of one field within a row
///
/// Field order is physical order; named and positional keys coexist in the
/// same row, so rows store an ordered pair list rather than a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    /// Schema-assigned field name
    Name(&'static str),
    /// Raw field position for unmapped fields
    Index(usize),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKey::Name(name) => write!(f, "{name}"),
            FieldKey::Index(index) => write!(f, "{index}"),
        }
    }
}

/// One physical line of a table file
#[derive(Debug, Clone)]
pub struct Row {
    fields: Vec<(FieldKey, String)>,
    is_data: bool,
    modified: bool,
}

impl Row {
    /// Get a field value by schema name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|(key, value)| match key {
            FieldKey::Name(n) if *n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Get a field value by physical position.
    pub fn get_at(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(_, value)| value.as_str())
    }

    /// Set a field value by schema name, marking the row modified.
    ///
    /// Returns `false` if the row has no field with that name.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        for (key, field) in &mut self.fields {
            if matches!(key, FieldKey::Name(n) if *n == name) {
                *field = value.into();
                self.modified = true;
                return true;
            }
        }
        false
    }

    /// Set a field value by physical position, marking the row modified.
    ///
    /// Returns `false` if the position is out of range.
    pub fn set_at(&mut self, index: usize, value: impl Into<String>) -> bool {
        match self.fields.get_mut(index) {
            Some((_, field)) => {
                *field = value.into();
                self.modified = true;
                true
            }
            None => false,
        }
    }

    /// Number of fields in this row, including the terminator field.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Whether this row is data-classified (editable by transforms).
    pub fn is_data(&self) -> bool {
        self.is_data
    }

    /// Iterate over this row's keys in physical field order.
    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.fields.iter().map(|(key, _)| key)
    }

    fn first_value(&self) -> &str {
        self.fields.first().map(|(_, v)| v.as_str()).unwrap_or("")
    }

    fn join(&self, out: &mut String) {
        for (i, (_, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(SEPARATOR);
            }
            out.push_str(value);
        }
    }
}

/// A loaded type table file
#[derive(Debug)]
pub struct TableFile {
    virtual_path: String,
    /// Original decoded text, kept for reference and diffing
    text: String,
    rows: Vec<Row>,
    /// Effective schema after parsing (the extended layout if the switch
    /// was triggered)
    schema: &'static TableSchema,
    rows_added: bool,
}

impl TableFile {
    /// Parse a table file from its raw bytes.
    ///
    /// The layout is looked up by file name; a missing layout is fatal.
    /// The table may switch to its extended layout at most once, on the
    /// first row whose width matches the extended trigger; all later rows
    /// are parsed under the extended layout.
    pub fn parse(virtual_path: &str, bytes: &[u8]) -> Result<Self> {
        let mut schema = schema_for(path::file_name(virtual_path))?;

        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::integrity(format!("{virtual_path} is not valid UTF-8")))?
            .replace("\r\n", "\n");

        let mut rows = Vec::new();
        for line in text.split_inclusive('\n') {
            if line.starts_with(COMMENT) {
                // Comment lines are kept whole for write-back and never
                // participate in data classification.
                rows.push(Row {
                    fields: vec![(FieldKey::Index(0), line.to_string())],
                    is_data: false,
                    modified: false,
                });
                continue;
            }

            let values: Vec<&str> = line.split(SEPARATOR).collect();
            let width = values.len();

            // One-shot layout switch when a row of the extended width
            // appears; the extended layout itself declares no trigger.
            if let Some(ext) = schema.extended {
                if width == ext.trigger_width {
                    schema = schema_for(ext.schema)?;
                }
            }

            let is_data = width >= schema.min_data_entries;
            let mut fields = Vec::with_capacity(width);
            for (index, value) in values.into_iter().enumerate() {
                let key = if is_data {
                    match schema.lookup(index, width) {
                        FieldLookup::Named(name) => FieldKey::Name(name),
                        FieldLookup::Positional => FieldKey::Index(index),
                        FieldLookup::Conflict => {
                            return Err(Error::SchemaConflict {
                                file: virtual_path.to_string(),
                                index,
                                width,
                            });
                        }
                    }
                } else {
                    FieldKey::Index(index)
                };
                fields.push((key, value.to_string()));
            }

            rows.push(Row {
                fields,
                is_data,
                modified: false,
            });
        }

        Ok(Self {
            virtual_path: virtual_path.to_string(),
            text,
            rows,
            schema,
            rows_added: false,
        })
    }

    /// Virtual path of this table.
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// Original decoded text of the file as loaded.
    pub fn original_text(&self) -> &str {
        &self.text
    }

    /// Effective schema for this table (extended layout if triggered).
    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    /// Iterate over data rows.
    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|row| row.is_data)
    }

    /// Iterate mutably over data rows.
    ///
    /// Setting a field through [`Row::set`] or [`Row::set_at`] marks the
    /// row modified and thereby the table dirty.
    pub fn data_rows_mut(&mut self) -> impl Iterator<Item = &mut Row> {
        self.rows.iter_mut().filter(|row| row.is_data)
    }

    /// Number of data rows.
    pub fn data_row_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_data).count()
    }

    /// Total number of rows, headers and comments included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Build a new data row from field values, keyed per the effective
    /// schema. The line terminator field is appended automatically.
    pub fn new_row<S: Into<String>>(&self, values: Vec<S>) -> Result<Row> {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.push("\n".to_string());

        let width = values.len();
        let is_data = width >= self.schema.min_data_entries;
        let mut fields = Vec::with_capacity(width);
        for (index, value) in values.into_iter().enumerate() {
            let key = if is_data {
                match self.schema.lookup(index, width) {
                    FieldLookup::Named(name) => FieldKey::Name(name),
                    FieldLookup::Positional => FieldKey::Index(index),
                    FieldLookup::Conflict => {
                        return Err(Error::SchemaConflict {
                            file: self.virtual_path.clone(),
                            index,
                            width,
                        });
                    }
                }
            } else {
                FieldKey::Index(index)
            };
            fields.push((key, value));
        }

        Ok(Row {
            fields,
            is_data,
            modified: true,
        })
    }

    /// Append data rows to the table, updating the header entry counter.
    ///
    /// The header is the first non-comment row whose field count equals the
    /// schema's declared header width; its counter field is incremented by
    /// the number of appended rows. Hitting a data row before the header,
    /// or never finding it, fails without touching the table.
    pub fn add_rows(&mut self, new_rows: Vec<Row>) -> Result<()> {
        if new_rows.is_empty() {
            return Ok(());
        }

        let header = self
            .schema
            .header
            .ok_or_else(|| Error::HeaderNotFound(self.virtual_path.clone()))?;

        let mut bumped = false;
        for row in &mut self.rows {
            if !row.first_value().trim_start().starts_with('/')
                && row.field_count() == header.columns
            {
                let count: i64 = row
                    .get_at(header.count_index)
                    .unwrap_or("")
                    .trim()
                    .parse()
                    .map_err(|_| {
                        Error::integrity(format!(
                            "header counter of {} is not numeric",
                            self.virtual_path
                        ))
                    })?;
                row.set_at(header.count_index, (count + new_rows.len() as i64).to_string());
                bumped = true;
                break;
            }
            if row.is_data {
                return Err(Error::PrematureData(self.virtual_path.clone()));
            }
        }
        if !bumped {
            return Err(Error::HeaderNotFound(self.virtual_path.clone()));
        }

        self.rows.extend(new_rows);
        self.rows_added = true;
        Ok(())
    }

    /// Whether this table must be written back.
    pub fn is_dirty(&self) -> bool {
        self.rows_added || self.rows.iter().any(|row| row.modified)
    }

    /// Serialize all rows, in original order, back to table text.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for row in &self.rows {
            row.join(&mut out);
        }
        out
    }

    /// Write the current state to `dest`, appending a final line terminator
    /// if the serialized text lacks one.
    pub fn write_to(&self, dest: &Path) -> Result<()> {
        let mut text = self.serialize();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        let mut file = File::create(dest)?;
        file.write_all(text.as_bytes())?;
        Ok(())
    }
}
