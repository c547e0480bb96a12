//! Virtual path utilities
//!
//! Game files are addressed by *virtual paths*: forward-slash separated,
//! case-significant paths relative to the game's addon root, with no leading
//! separator (for example `types/TShields.txt` or `maps/x3_universe.xml`).
//! The same string is used as a dependency-declaration key, a cache key, and
//! a relative output path, so it is never normalized after construction.

use std::path::{Path, PathBuf};

/// Path prefix of the directory holding the semicolon-delimited type tables.
pub const TYPES_PREFIX: &str = "types/";

/// Kind of file a virtual path refers to, decided once at resolution time.
///
/// The set is closed: every loaded file is parsed and serialized through
/// exactly one of these, so transforms never need runtime type sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Semicolon-delimited type table (under `types/`)
    Table,
    /// XML text document
    Xml,
    /// Raw binary opcode buffer
    Binary,
}

/// Classify a virtual path by directory and extension convention.
///
/// Files under the `types/` directory are tables, `.obj` and `.pck` files
/// are opaque binaries, and everything else is treated as XML text (scripts,
/// maps and director files are all XML in this game).
///
/// # Examples
///
/// ```
/// use x3_patcher::path::{classify, FileKind};
///
/// assert_eq!(classify("types/TShields.txt"), FileKind::Table);
/// assert_eq!(classify("maps/x3_universe.xml"), FileKind::Xml);
/// assert_eq!(classify("L/x3story.obj"), FileKind::Binary);
/// ```
pub fn classify(virtual_path: &str) -> FileKind {
    if virtual_path.starts_with(TYPES_PREFIX) {
        return FileKind::Table;
    }
    if virtual_path.ends_with(".obj") || virtual_path.ends_with(".pck") {
        return FileKind::Binary;
    }
    FileKind::Xml
}

/// Extract the file name (final path segment) from a virtual path.
///
/// # Examples
///
/// ```
/// use x3_patcher::path::file_name;
///
/// assert_eq!(file_name("types/TShields.txt"), "TShields.txt");
/// assert_eq!(file_name("x3_universe.xml"), "x3_universe.xml");
/// ```
pub fn file_name(virtual_path: &str) -> &str {
    virtual_path.rsplit('/').next().unwrap_or(virtual_path)
}

/// Map a virtual path to a concrete path under a root directory.
///
/// The output tree mirrors the virtual path hierarchy; two calls with the
/// same arguments always produce the same path.
pub fn to_system_path(root: &Path, virtual_path: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for segment in virtual_path.split('/') {
        out.push(segment);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("types/TBullets.txt", FileKind::Table; "type table")]
    #[test_case("types/Globals.txt", FileKind::Table; "globals table")]
    #[test_case("L/x3story.obj", FileKind::Binary; "obj blob")]
    #[test_case("scripts/plugin.example.pck", FileKind::Binary; "compiled script")]
    #[test_case("scripts/plugin.example.xml", FileKind::Xml; "script source")]
    #[test_case("director/3.08 Generic Missions.xml", FileKind::Xml; "director file")]
    fn test_classify(virtual_path: &str, expected: FileKind) {
        assert_eq!(classify(virtual_path), expected);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("types/TShields.txt"), "TShields.txt");
        assert_eq!(file_name("a/b/c.xml"), "c.xml");
        assert_eq!(file_name("plain.txt"), "plain.txt");
        assert_eq!(file_name(""), "");
    }

    #[test]
    fn test_to_system_path() {
        let root = Path::new("/tmp/out");
        let p = to_system_path(root, "types/TShields.txt");
        assert_eq!(p, Path::new("/tmp/out").join("types").join("TShields.txt"));

        // Determinism: same input, same output.
        assert_eq!(p, to_system_path(root, "types/TShields.txt"));
    }
}
