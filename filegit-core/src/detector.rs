//! Change detection for tracked files.

use crate::error::Result;
use crate::models::Digest;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Digest of the file's current bytes, or `None` if it no longer exists.
pub fn current_digest(path: &Path) -> Result<Option<Digest>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(Digest::from_reader(file)?))
}

/// True when the file exists and its digest differs from `last_known`.
pub fn has_changed(path: &Path, last_known: Option<&Digest>) -> Result<bool> {
    Ok(match current_digest(path)? {
        Some(current) => Some(&current) != last_known,
        None => false,
    })
}

/// Reads the file's current bytes, or `None` if it no longer exists.
pub(crate) fn read_current(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
