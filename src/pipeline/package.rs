//! Bundle packaging: successful outputs → one deterministic zip archive.
//!
//! Every entry is written with the DOS epoch as its timestamp and fixed
//! permissions, so the archive is a pure function of the entries' names,
//! bytes and order.

use crate::error::Doc2PdfError;
use crate::output::BundleEntry;
use crate::pipeline::input::{output_name, OUTPUT_EXTENSION};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Zip the entries in order.
///
/// Fails with [`Doc2PdfError::Packaging`] when there is nothing to pack or
/// the archive cannot be finalised.
pub fn pack(entries: &[BundleEntry]) -> Result<Vec<u8>, Doc2PdfError> {
    if entries.is_empty() {
        return Err(Doc2PdfError::Packaging {
            detail: "no converted documents to package".into(),
        });
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        zip.start_file(entry.name.as_str(), options)
            .map_err(packaging_error)?;
        zip.write_all(&entry.bytes).map_err(|e| Doc2PdfError::Packaging {
            detail: format!("writing '{}': {e}", entry.name),
        })?;
    }

    let archive = zip.finish().map_err(packaging_error)?.into_inner();
    debug!("Packed {} entries into {} bytes", entries.len(), archive.len());
    Ok(archive)
}

/// Archive names for the given source names, in order.
///
/// Each is the source name with a `.pdf` extension. A name already taken
/// earlier in the batch gets a `_2`, `_3`, … suffix.
pub fn entry_names<'a>(source_names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken = HashSet::new();
    source_names
        .into_iter()
        .map(|source| {
            let base = output_name(source);
            if taken.insert(base.clone()) {
                return base;
            }
            let stem = Path::new(&base)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&base)
                .to_string();
            (2..)
                .map(|n| format!("{stem}_{n}.{OUTPUT_EXTENSION}"))
                .find(|candidate| taken.insert(candidate.clone()))
                .unwrap_or(base)
        })
        .collect()
}

fn packaging_error(e: zip::result::ZipError) -> Doc2PdfError {
    Doc2PdfError::Packaging {
        detail: e.to_string(),
    }
}
