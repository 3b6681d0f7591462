use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::apis::PaperRecord;

/// Largest document we are willing to write, in encoded bytes.
pub const MAX_OUTPUT_BYTES: usize = 1024 * 1024;
/// Characters of an abstract kept by a truncation pass.
pub const ABSTRACT_KEEP_CHARS: usize = 500;
pub const TRUNCATION_MARKER: &str = "...";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("output is {bytes} bytes after truncating every abstract, limit is {limit}")]
    TooLarge { bytes: usize, limit: usize },
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug)]
pub struct BoundedDocument {
    pub json: String,
    pub records: usize,
    pub truncation_passes: usize,
}

/// Serialize `records` as indented JSON no larger than `limit` bytes.
///
/// While the document is too large, every abstract is cut to its first
/// 500 characters plus a marker and the set is serialized again. Abstracts
/// are shortened in place. A pass that shortens nothing means truncation
/// cannot help, which is reported as [`OutputError::TooLarge`].
pub fn serialize_bounded(
    records: &mut [PaperRecord],
    limit: usize,
) -> Result<BoundedDocument, OutputError> {
    let mut json = serde_json::to_string_pretty(&*records)?;
    let mut passes = 0;

    while json.len() > limit {
        let mut shortened = 0;
        for record in records.iter_mut() {
            if truncate_abstract(record) {
                shortened += 1;
            }
        }
        if shortened == 0 {
            return Err(OutputError::TooLarge {
                bytes: json.len(),
                limit,
            });
        }
        passes += 1;
        json = serde_json::to_string_pretty(&*records)?;
        tracing::info!(
            "Truncation pass {}: shortened {} abstracts, document now {} bytes",
            passes,
            shortened,
            json.len()
        );
    }

    Ok(BoundedDocument {
        json,
        records: records.len(),
        truncation_passes: passes,
    })
}

/// Returns true if the abstract got shorter.
fn truncate_abstract(record: &mut PaperRecord) -> bool {
    let Some(text) = record.abstract_text.as_mut() else {
        return false;
    };
    let cut: String = text
        .chars()
        .take(ABSTRACT_KEEP_CHARS)
        .chain(TRUNCATION_MARKER.chars())
        .collect();
    if cut.chars().count() < text.chars().count() {
        *text = cut;
        true
    } else {
        false
    }
}

/// Write `json` to `path` via a temporary file in the same directory.
pub fn write_document(path: &Path, json: &str) -> Result<(), OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| OutputError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(i: usize, abstract_chars: usize) -> PaperRecord {
        PaperRecord {
            url: format!("http://arxiv.org/abs/2401.{:05}v1", i),
            title: format!("Paper number {}", i),
            authors: vec!["First Author".to_string(), "Second Author".to_string()],
            date: "2024-01-15".to_string(),
            abstract_text: Some("w".repeat(abstract_chars)),
        }
    }

    #[test]
    fn test_small_set_is_untouched() {
        let mut records = vec![record(1, 2000), record(2, 40)];
        let doc = serialize_bounded(&mut records, MAX_OUTPUT_BYTES).unwrap();
        assert_eq!(doc.records, 2);
        assert_eq!(doc.truncation_passes, 0);
        assert_eq!(records[0].abstract_text.as_ref().unwrap().len(), 2000);
        assert!(doc.json.starts_with("[\n  {"));
    }

    #[test]
    fn test_empty_set_is_empty_array() {
        let mut records: Vec<PaperRecord> = Vec::new();
        let doc = serialize_bounded(&mut records, MAX_OUTPUT_BYTES).unwrap();
        assert_eq!(doc.json, "[]");
        assert_eq!(doc.records, 0);
    }

    #[test]
    fn test_one_pass_brings_large_set_under_limit() {
        // 50 abstracts of 2000 chars is ~100 KB, so shrink the limit to force truncation.
        let mut records: Vec<_> = (0..50).map(|i| record(i, 2000)).collect();
        let limit = 64 * 1024;
        let doc = serialize_bounded(&mut records, limit).unwrap();
        assert_eq!(doc.truncation_passes, 1);
        assert!(doc.json.len() <= limit);
        for r in &records {
            let text = r.abstract_text.as_ref().unwrap();
            assert_eq!(text.chars().count(), ABSTRACT_KEEP_CHARS + TRUNCATION_MARKER.len());
            assert!(text.ends_with(TRUNCATION_MARKER));
        }
    }

    #[test]
    fn test_megabyte_ceiling_with_huge_abstracts() {
        let mut records: Vec<_> = (0..50).map(|i| record(i, 30_000)).collect();
        let doc = serialize_bounded(&mut records, MAX_OUTPUT_BYTES).unwrap();
        assert_eq!(doc.truncation_passes, 1);
        assert!(doc.json.len() <= MAX_OUTPUT_BYTES);
        assert!(records
            .iter()
            .all(|r| r.abstract_text.as_ref().unwrap().chars().count() <= 503));
    }

    #[test]
    fn test_short_abstracts_never_grow() {
        let mut records = vec![record(1, 3000), record(2, 10), record(3, 502)];
        let limit = serde_json::to_string_pretty(&records).unwrap().len() - 1;
        serialize_bounded(&mut records, limit).unwrap();
        assert_eq!(records[1].abstract_text.as_deref(), Some("wwwwwwwwww"));
        assert_eq!(records[2].abstract_text.as_ref().unwrap().len(), 502);
        assert!(records[0].abstract_text.as_ref().unwrap().ends_with("..."));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let mut r = record(1, 0);
        r.abstract_text = Some("é".repeat(800));
        assert!(truncate_abstract(&mut r));
        let text = r.abstract_text.unwrap();
        assert_eq!(text.chars().count(), 503);
        assert!(text.starts_with("éé"));
    }

    #[test]
    fn test_fixed_overhead_over_limit_is_too_large() {
        let mut records: Vec<_> = (0..200).map(|i| record(i, 10)).collect();
        let err = serialize_bounded(&mut records, 4096).unwrap_err();
        assert!(matches!(err, OutputError::TooLarge { limit: 4096, .. }));
    }

    #[test]
    fn test_write_document_replaces_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        std::fs::write(&path, "old").unwrap();
        write_document(&path, "[]").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
