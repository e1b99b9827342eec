//! Program documents on disk
//!
//! Two file kinds are supported: PDF (paginated) and plain text. Both
//! resolve to a [`Document`]; PDFs also carry their first pages as lead
//! text for metadata extraction.

use crate::error::SourceError;
use async_trait::async_trait;
use lectora_domain::Document;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pages of a PDF used as lead text
pub const LEAD_PAGES: usize = 3;

/// Supported document kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Paginated PDF
    Pdf,
    /// UTF-8 plain text
    Text,
}

impl DocumentKind {
    /// Kind of a path, judged by its extension (case-insensitive)
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }
}

/// Where document text comes from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Extract the text of one document
    async fn load(&self, path: &Path) -> Result<Document, SourceError>;
}

/// Reads PDF and text files from the local filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSource {
    lead_pages: usize,
}

impl FileSource {
    /// Create a file source using the default lead page count
    pub fn new() -> Self {
        Self {
            lead_pages: LEAD_PAGES,
        }
    }

    async fn load_pdf(&self, path: &Path, name: String) -> Result<Document, SourceError> {
        let owned = path.to_path_buf();
        // pdf-extract is blocking and may panic on unusual files
        let pages = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_by_pages(&owned).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| SourceError::extraction(path, format!("extraction task failed: {}", e)))?
        .map_err(|reason| SourceError::extraction(path, reason))?;

        let (text, lead) = assemble_pages(&pages, self.lead_pages)
            .ok_or_else(|| SourceError::extraction(path, "no text found"))?;
        info!(
            "{}: {} pages, {} chars",
            name,
            pages.iter().filter(|p| !p.trim().is_empty()).count(),
            text.chars().count()
        );

        Ok(Document::new(name, text).with_lead_text(lead))
    }

    async fn load_text(&self, path: &Path, name: String) -> Result<Document, SourceError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SourceError::io(path, e))?;

        if text.trim().is_empty() {
            return Err(SourceError::extraction(path, "file is empty"));
        }

        info!("{}: {} chars", name, text.chars().count());
        Ok(Document::new(name, text))
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    async fn load(&self, path: &Path) -> Result<Document, SourceError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Extracting text from {}", path.display());
        match DocumentKind::of(path) {
            Some(DocumentKind::Pdf) => self.load_pdf(path, name).await,
            Some(DocumentKind::Text) => self.load_text(path, name).await,
            None => Err(SourceError::extraction(path, "unsupported file type")),
        }
    }
}

/// Join extracted pages into the document text and its lead text
///
/// Pages are trimmed and blank ones dropped; the rest are separated by a
/// blank line. The lead text is the first `lead_pages` of those. Returns
/// `None` when no page has text.
fn assemble_pages(pages: &[String], lead_pages: usize) -> Option<(String, String)> {
    let pages: Vec<&str> = pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();

    if pages.is_empty() {
        return None;
    }

    let text = pages.join("\n\n");
    let lead = pages[..pages.len().min(lead_pages)].join("\n\n");
    Some((text, lead))
}

/// List the supported documents in `dir`, sorted by path
pub fn discover_documents(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SourceError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| SourceError::io(dir, e))?.path();
        if path.is_file() && DocumentKind::of(&path).is_some() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(SourceError::NoDocuments(dir.to_path_buf()));
    }

    paths.sort();
    info!("Found {} documents in {}", paths.len(), dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectora_domain::LEAD_TEXT_CHARS;
    use tempfile::TempDir;

    /// Minimal PDF with one line of Helvetica text per page
    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                (0..pages.len())
                    .map(|i| format!("{} 0 R", 4 + 2 * i))
                    .collect::<Vec<_>>()
                    .join(" "),
                pages.len()
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];
        for (i, text) in pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            ));
            let stream = format!("BT /F1 24 Tf 72 700 Td ({}) Tj ET", text);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ));
        }

        let mut pdf = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }
        let xref = pdf.len();
        pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
        for offset in offsets {
            pdf.push_str(&format!("{:010} 00000 n \n", offset));
        }
        pdf.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        ));

        std::fs::write(path, pdf).unwrap();
    }

    #[test]
    fn test_document_kind() {
        assert_eq!(DocumentKind::of(Path::new("a.pdf")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::of(Path::new("B.PDF")), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::of(Path::new("c.txt")), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::of(Path::new("d.docx")), None);
        assert_eq!(DocumentKind::of(Path::new("noext")), None);
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::write(dir.path().join("a.PDF"), "a").unwrap();
        std::fs::write(dir.path().join("notes.md"), "c").unwrap();
        std::fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let paths = discover_documents(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.txt"]);
    }

    #[test]
    fn test_discover_empty_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.md"), "x").unwrap();

        let result = discover_documents(dir.path());
        assert!(matches!(result, Err(SourceError::NoDocuments(_))));
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = TempDir::new().unwrap();
        let result = discover_documents(&dir.path().join("missing"));
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_text_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("programa.txt");
        let text = "Propuesta. ".repeat(2000);
        std::fs::write(&path, &text).unwrap();

        let document = FileSource::new().load(&path).await.unwrap();
        assert_eq!(document.name(), "programa.txt");
        assert_eq!(document.text(), text);
        assert_eq!(document.lead_text().chars().count(), LEAD_TEXT_CHARS);
    }

    #[tokio::test]
    async fn test_load_empty_text_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vacio.txt");
        std::fs::write(&path, "  \n ").unwrap();

        let result = FileSource::new().load(&path).await;
        assert!(matches!(result, Err(SourceError::Extraction { .. })));
    }

    #[tokio::test]
    async fn test_pdf_lead_text_is_first_pages() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("programa.pdf");
        write_pdf(
            &path,
            &["PAGINAUNO", "PAGINADOS", "PAGINATRES", "PAGINACUATRO", "PAGINACINCO"],
        );

        let document = FileSource::new().load(&path).await.unwrap();
        let lead = document.lead_text();
        assert!(lead.contains("PAGINAUNO"));
        assert!(lead.contains("PAGINATRES"));
        assert!(!lead.contains("PAGINACUATRO"));
        assert!(!lead.contains("PAGINACINCO"));

        let text = document.text();
        assert!(text.contains("PAGINACINCO"));
        assert!(text.contains("PAGINAUNO\n\nPAGINADOS"));
    }

    #[test]
    fn test_assemble_pages_drops_blank_pages() {
        let pages: Vec<String> = ["  uno \n", "", " \n\t", "dos", "tres", "cuatro"]
            .iter()
            .map(|p| p.to_string())
            .collect();

        let (text, lead) = assemble_pages(&pages, LEAD_PAGES).unwrap();
        assert_eq!(text, "uno\n\ndos\n\ntres\n\ncuatro");
        assert_eq!(lead, "uno\n\ndos\n\ntres");
    }

    #[test]
    fn test_assemble_pages_short_document() {
        let pages = vec!["solo".to_string()];
        let (text, lead) = assemble_pages(&pages, LEAD_PAGES).unwrap();
        assert_eq!(text, "solo");
        assert_eq!(lead, "solo");

        assert_eq!(assemble_pages(&[" ".to_string()], LEAD_PAGES), None);
        assert_eq!(assemble_pages(&[], LEAD_PAGES), None);
    }

    #[tokio::test]
    async fn test_load_corrupt_pdf_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("roto.pdf");
        std::fs::write(&path, "this is not a pdf").unwrap();

        let result = FileSource::new().load(&path).await;
        assert!(matches!(result, Err(SourceError::Extraction { .. })));
    }
}
