//! JSON encoding of the raw store contents: a single object mapping
//! `id -> {vector, text}`. The approximate index is never persisted.

use crate::error::Result;
use crate::types::StoredVector;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub type VectorMap = HashMap<String, StoredVector>;

pub fn to_writer(vectors: &VectorMap, writer: impl Write) -> Result<()> {
    write_entries(vectors.iter().map(|(id, stored)| (id.as_str(), stored)), writer)
}

fn write_entries<'a>(
    entries: impl Iterator<Item = (&'a str, &'a StoredVector)>,
    writer: impl Write,
) -> Result<()> {
    // Sorted keys keep saved files diffable and byte-stable.
    let ordered: BTreeMap<&str, &StoredVector> = entries.collect();
    serde_json::to_writer(writer, &ordered)?;
    Ok(())
}

pub fn from_reader(reader: impl Read) -> Result<VectorMap> {
    Ok(serde_json::from_reader(reader)?)
}

pub fn to_bytes(vectors: &VectorMap) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    to_writer(vectors, &mut out)?;
    Ok(out)
}

pub fn from_bytes(bytes: &[u8]) -> Result<VectorMap> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Writes to a temp file next to `path`, then renames it over `path`.
pub fn save_to_path(vectors: &VectorMap, path: &Path) -> Result<()> {
    save_entries_to_path(vectors.iter().map(|(id, stored)| (id.as_str(), stored)), path)
}

pub(crate) fn save_entries_to_path<'a>(
    entries: impl Iterator<Item = (&'a str, &'a StoredVector)>,
    path: &Path,
) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        write_entries(entries, &mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

pub fn load_from_path(path: &Path) -> Result<VectorMap> {
    let file = File::open(path)?;
    from_reader(BufReader::new(file))
}
