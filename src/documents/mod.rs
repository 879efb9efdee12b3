
use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::AskError;

/// File extension of the office documents this loader accepts.
pub const DOCUMENT_EXTENSION: &str = "docx";

/// Plain text extracted from one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub text: String,
}

/// A file that could not be loaded, with the reason.
#[derive(Debug)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Result of loading a documents folder. Partial success is the contract:
/// callers get every document that loaded plus the list of files that did
/// not, and decide for themselves whether that is acceptable.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub documents: Vec<LoadedDocument>,
    pub failures: Vec<DocumentFailure>,
}

/// Load all documents from a folder (non-recursive).
///
/// The folder itself must exist; a file that fails extraction is logged,
/// recorded as a failure, and skipped.
#[inline]
pub fn load_documents(dir: &Path) -> Result<LoadOutcome, AskError> {
    if !dir.is_dir() {
        return Err(AskError::Extraction(format!(
            "Documents directory not found: {}",
            dir.display()
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION))
        })
        .collect();
    paths.sort();

    let mut outcome = LoadOutcome::default();

    for path in paths {
        match extract_document_text(&path) {
            Ok(text) => {
                debug!(
                    "Loaded {} ({} characters)",
                    path.display(),
                    text.chars().count()
                );
                outcome.documents.push(LoadedDocument { path, text });
            }
            Err(error) => {
                warn!("Skipping {}: {:#}", path.display(), error);
                outcome.failures.push(DocumentFailure {
                    path,
                    error: format!("{:#}", error),
                });
            }
        }
    }

    debug!(
        "Loaded {} documents, {} failures",
        outcome.documents.len(),
        outcome.failures.len()
    );

    Ok(outcome)
}

/// Extract plain text from one OOXML word-processing document.
///
/// The document is a ZIP container; the text lives in `word/document.xml`
/// as runs of `w:t` elements grouped into `w:p` paragraphs.
#[inline]
pub fn extract_document_text(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .context("Not a valid document container")?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("Document body not found in container")?
        .read_to_string(&mut xml)
        .context("Failed to read document body")?;

    decode_document_xml(&xml)
}

fn decode_document_xml(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text_run = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("Malformed document XML")?
        {
            Event::Start(element) => {
                if element.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Event::End(element) => match element.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(element) => match element.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" => text.push('\n'),
                _ => {}
            },
            Event::Text(content) => {
                if in_text_run {
                    text.push_str(&content.unescape().context("Malformed document text")?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text.trim_end().to_string())
}
