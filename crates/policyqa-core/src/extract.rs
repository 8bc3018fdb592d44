//! PDF text extraction and chunk ingestion.
//!
//! A document is identified by a local path or an http(s) URL. Text is
//! pulled per page with lopdf, falling back to pdf-extract's whole-document
//! pass for files whose page streams lopdf cannot decode. Each page is
//! normalized, windowed into chunks, and tagged with the page's most recent
//! ALL-CAPS heading as its section.

use std::path::PathBuf;
use std::time::Duration;

use lopdf::Document;

use crate::chunker::{normalize_whitespace, split_text};
use crate::config::RagConfig;
use crate::document::DocumentChunk;
use crate::error::RagError;

/// Where a policy document lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Path(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// Classify a raw string as a URL or a local path.
    pub fn parse(raw: &str) -> Result<Self, RagError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RagError::InvalidRequest(
                "document source cannot be empty".to_string(),
            ));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Ok(Self::Url(trimmed.to_string()))
        } else {
            Ok(Self::Path(PathBuf::from(trimmed)))
        }
    }

    /// Base filename used in chunk metadata and cache keys.
    pub fn filename(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document.pdf".to_string()),
            Self::Url(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                without_query
                    .rsplit('/')
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .unwrap_or("document.pdf")
                    .to_string()
            }
        }
    }

    /// The raw source string, used as a cache key.
    pub fn key(&self) -> String {
        match self {
            Self::Path(path) => path.to_string_lossy().into_owned(),
            Self::Url(url) => url.clone(),
        }
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Fetch document bytes from disk or over HTTP.
pub async fn fetch_document(
    source: &DocumentSource,
    timeout_secs: u64,
) -> Result<Vec<u8>, RagError> {
    match source {
        DocumentSource::Path(path) => tokio::fs::read(path).await.map_err(|err| {
            RagError::DocumentNotFound(format!("{}: {}", path.display(), err))
        }),
        DocumentSource::Url(url) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .map_err(|err| RagError::DocumentNotFound(format!("{}: {}", url, err)))?;

            let response = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|err| RagError::DocumentNotFound(format!("{}: {}", url, err)))?;

            let bytes = response
                .bytes()
                .await
                .map_err(|err| RagError::DocumentNotFound(format!("{}: {}", url, err)))?;
            Ok(bytes.to_vec())
        }
    }
}

/// Extract text from PDF bytes and split it into chunks with metadata.
pub fn extract_chunks(
    bytes: &[u8],
    filename: &str,
    config: &RagConfig,
) -> Result<Vec<DocumentChunk>, RagError> {
    let pages = extract_pages(bytes)?;

    let mut chunks = Vec::new();
    for (page, text) in &pages {
        if text.trim().is_empty() {
            continue;
        }

        let section = detect_section(text);
        let normalized = normalize_whitespace(text);

        for (chunk_index, chunk_text) in
            split_text(&normalized, config.chunk_size, config.chunk_overlap)
                .into_iter()
                .filter(|c| c.chars().count() >= config.min_chunk_chars)
                .enumerate()
        {
            chunks.push(DocumentChunk {
                text: chunk_text,
                page: *page,
                section: section.clone(),
                source_filename: filename.to_string(),
                chunk_index,
            });
        }
    }

    if chunks.is_empty() {
        return Err(RagError::Extraction(format!(
            "no text extracted from {}",
            filename
        )));
    }

    tracing::info!(
        filename,
        pages = pages.len(),
        chunks = chunks.len(),
        "document ingested"
    );
    Ok(chunks)
}

/// Pull raw text per page, 1-indexed.
fn extract_pages(bytes: &[u8]) -> Result<Vec<(u32, String)>, RagError> {
    let doc = Document::load_mem(bytes)
        .map_err(|err| RagError::Extraction(format!("cannot parse PDF: {}", err)))?;

    if doc.is_encrypted() {
        return Err(RagError::Extraction("PDF is encrypted".to_string()));
    }

    let mut pages = Vec::new();
    for &page_num in doc.get_pages().keys() {
        let text = doc.extract_text(&[page_num]).unwrap_or_default();
        pages.push((page_num, text));
    }

    // Some generators produce streams lopdf's page walker cannot decode;
    // pdf-extract handles more of them, at the cost of page attribution.
    if pages.iter().all(|(_, text)| text.trim().is_empty()) {
        let whole = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|err| RagError::Extraction(format!("cannot extract text: {}", err)))?;
        if !whole.trim().is_empty() {
            return Ok(vec![(1, whole)]);
        }
    }

    Ok(pages)
}

/// Last ALL-CAPS line on the page, treated as the section heading in effect.
fn detect_section(page_text: &str) -> Option<String> {
    page_text
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.len() > 5
                && line.len() < 100
                && line.chars().any(|c| c.is_alphabetic())
                && line.chars().filter(|c| c.is_alphabetic()).all(|c| c.is_uppercase())
        })
        .last()
        .map(str::to_string)
}
