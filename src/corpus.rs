//! Corpus snapshots: a JSON array of documents read once and written whole.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::error::{Error, Result};

/// Reads every document from the JSON array at `path`.
pub fn load(path: &Path) -> Result<Vec<Document>> {
    let file = File::open(path)
        .map_err(|err| Error::Storage(format!("failed to open {}: {err}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| Error::Storage(format!("invalid corpus {}: {err}", path.display())))
}

/// Writes `documents` to `path` as one complete snapshot. The data goes to
/// a sibling temp file first and is renamed into place, so readers never
/// observe a half-written collection.
pub fn save(path: &Path, documents: &[Document]) -> Result<()> {
    let staging = staging_path(path);
    let result = write_snapshot(&staging, documents).and_then(|()| {
        fs::rename(&staging, path).map_err(|err| {
            Error::Storage(format!(
                "failed to move snapshot into {}: {err}",
                path.display()
            ))
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn write_snapshot(path: &Path, documents: &[Document]) -> Result<()> {
    let file = File::create(path)
        .map_err(|err| Error::Storage(format!("failed to create {}: {err}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, documents)
        .map_err(|err| Error::Storage(format!("failed to serialize snapshot: {err}")))?;
    writer
        .flush()
        .and_then(|()| writer.get_ref().sync_all())
        .map_err(|err| Error::Storage(format!("failed to write {}: {err}", path.display())))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn save_then_load_keeps_documents_and_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("films_with_embeddings.json");
        let mut doc = Document::new()
            .with_field("id", 1)
            .with_field("name", "Inception")
            .with_field("genre", vec!["scifi", "thriller"]);
        doc.set_vector("film_vector", vec![0.25, -0.5]);
        save(&path, std::slice::from_ref(&doc)).expect("saved");
        assert!(!staging_path(&path).exists());
        assert_eq!(load(&path).expect("loaded"), vec![doc]);
    }

    #[test]
    fn missing_or_malformed_corpus_is_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.json");
        assert!(matches!(load(&missing), Err(Error::Storage(_))));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{\"not\": \"an array\"}").expect("write");
        assert!(matches!(load(&bad), Err(Error::Storage(_))));
    }

    #[test]
    fn staging_file_sits_next_to_target() {
        assert_eq!(
            staging_path(Path::new("out/films.json")),
            PathBuf::from("out/films.json.partial")
        );
    }
}
