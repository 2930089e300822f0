//! Per-format line extraction.
//!
//! Every candidate is reduced to an ordered sequence of non-empty text
//! lines before matching. Text-like files are read as UTF-8 with invalid
//! byte sequences replaced; PDFs go through a priority list of decoding
//! backends until one yields text; DOCX yields one line per paragraph.
//! A file that cannot be decoded contributes zero lines: it still counts
//! as scanned, and it never fails the surrounding batch.

use anyhow::Result;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::SkipReason;
use crate::models::FileCandidate;

/// Extensions read as plain text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".rst", ".py", ".js", ".ts", ".rs", ".go", ".java", ".c", ".h", ".cpp",
    ".html", ".css", ".json", ".yaml", ".yml", ".toml", ".sh",
];

/// Maximum decompressed bytes read from a single ZIP entry (zip-bomb guard).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// One way of turning PDF bytes into text. Backends are tried in
/// registration order until one returns a non-empty result.
trait PdfBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

struct PdfExtractBackend;

impl PdfBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| anyhow::anyhow!("pdf-extract: {}", e))
    }
}

struct LopdfBackend;

impl PdfBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|e| anyhow::anyhow!("lopdf: {}", e))?;
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        doc.extract_text(&pages)
            .map_err(|e| anyhow::anyhow!("lopdf: {}", e))
    }
}

/// The extractor registry: dispatches on extension and enforces the
/// per-file byte ceiling.
pub struct Extractors {
    pdf_backends: Vec<Box<dyn PdfBackend>>,
    max_file_bytes: u64,
}

impl Extractors {
    pub fn new(max_file_bytes: u64) -> Self {
        Self {
            pdf_backends: vec![Box::new(PdfExtractBackend), Box::new(LopdfBackend)],
            max_file_bytes,
        }
    }

    /// Whether any extractor is registered for this extension.
    pub fn supports(&self, extension: &str) -> bool {
        TEXT_EXTENSIONS.contains(&extension) || extension == ".pdf" || extension == ".docx"
    }

    /// Extract the candidate's non-empty lines.
    ///
    /// Returns an empty sequence on any failure; the reason is logged and
    /// the caller treats the file as scanned-but-empty.
    pub fn extract_lines(&self, candidate: &FileCandidate) -> Vec<String> {
        if candidate.size > self.max_file_bytes {
            warn!(
                reason = SkipReason::TooLarge.as_str(),
                path = %candidate.path.display(),
                size = candidate.size,
                "file exceeds extraction ceiling"
            );
            return Vec::new();
        }

        let extension = candidate.extension.as_str();
        let result = if TEXT_EXTENSIONS.contains(&extension) {
            read_text_lines(&candidate.path)
        } else if extension == ".pdf" {
            self.extract_pdf_lines(&candidate.path)
        } else if extension == ".docx" {
            extract_docx_lines(&candidate.path)
        } else {
            debug!(
                reason = SkipReason::UnsupportedFormat.as_str(),
                path = %candidate.path.display(),
                "no extractor for extension"
            );
            return Vec::new();
        };

        match result {
            Ok(lines) => lines,
            Err(err) => {
                warn!(
                    reason = SkipReason::DecodeFailed.as_str(),
                    path = %candidate.path.display(),
                    error = %err,
                    "extraction failed"
                );
                Vec::new()
            }
        }
    }

    fn extract_pdf_lines(&self, path: &Path) -> Result<Vec<String>> {
        let bytes = std::fs::read(path)?;
        let mut last_error: Option<anyhow::Error> = None;

        for backend in &self.pdf_backends {
            match backend.extract(&bytes) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(backend = backend.name(), path = %path.display(), "decoded PDF");
                    return Ok(non_empty_lines(&text));
                }
                Ok(_) => {
                    last_error = Some(anyhow::anyhow!("{} produced no text", backend.name()));
                }
                Err(err) => {
                    debug!(
                        backend = backend.name(),
                        path = %path.display(),
                        error = %err,
                        "PDF backend failed, trying next"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no PDF backend available")))
    }
}

fn read_text_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(non_empty_lines(&text))
}

fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// DOCX: one extracted line per `<w:p>` paragraph of `word/document.xml`.
fn extract_docx_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))?;

    let mut doc_xml = Vec::new();
    archive
        .by_name("word/document.xml")?
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        anyhow::bail!("word/document.xml exceeds size limit");
    }

    let mut reader = quick_xml::Reader::from_reader(doc_xml.as_slice());
    reader.config_mut().trim_text(true);

    let mut lines = Vec::new();
    let mut paragraph = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(quick_xml::events::Event::Text(t)) if in_text => {
                paragraph.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if !paragraph.trim().is_empty() {
                        lines.push(std::mem::take(&mut paragraph));
                    } else {
                        paragraph.clear();
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(err) => anyhow::bail!("malformed document.xml: {}", err),
            _ => {}
        }
        buf.clear();
    }

    Ok(lines)
}
