//! Transient JSON files sent back to the user

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use tempfile::TempDir;

/// A JSON file living in its own temporary directory. Dropping it deletes
/// the file.
pub struct Artifact {
    dir: TempDir,
    name: String,
}

impl Artifact {
    /// Write `value` to `<tmp>/<name>` as four-space indented JSON.
    pub fn write<T: Serialize + ?Sized>(name: &str, value: &T) -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("superbot-").tempdir()?;
        let body = to_pretty_json(value).map_err(io::Error::other)?;
        fs::write(dir.path().join(name), body)?;
        Ok(Self {
            dir,
            name: name.to_string(),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join(&self.name)
    }
}

/// Serialize `value` as JSON with four-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
