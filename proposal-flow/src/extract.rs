use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ProposalError, Result};

/// Recognized upload formats, detected from the file-name extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Pdf,
    Docx,
    Text,
}

/// Which side of the engagement uploaded a document. Provides the bucket
/// key prefix used by the source aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentOrigin {
    Client,
    Company,
}

impl DocumentOrigin {
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentOrigin::Client => "client",
            DocumentOrigin::Company => "company",
        }
    }
}

/// Fixed category tags assignable to an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceCategory {
    #[serde(rename = "RFP")]
    Rfp,
    #[serde(rename = "SOW")]
    Sow,
    #[serde(rename = "Company Info")]
    CompanyInfo,
    #[serde(rename = "Case Study")]
    CaseStudy,
    #[serde(rename = "News")]
    News,
    #[serde(rename = "Whitepaper")]
    Whitepaper,
    #[serde(rename = "Other")]
    Other,
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SourceCategory::Rfp => "RFP",
            SourceCategory::Sow => "SOW",
            SourceCategory::CompanyInfo => "Company Info",
            SourceCategory::CaseStudy => "Case Study",
            SourceCategory::News => "News",
            SourceCategory::Whitepaper => "Whitepaper",
            SourceCategory::Other => "Other",
        };
        f.write_str(label)
    }
}

/// A file-like upload: a name (used for kind detection) plus raw bytes.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Text extracted from one upload. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub origin: DocumentOrigin,
    pub name: String,
    pub kind: FileKind,
    pub category: SourceCategory,
    pub text: String,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractedDocument {
    pub fn from_upload(
        origin: DocumentOrigin,
        category: SourceCategory,
        file: &UploadedFile,
    ) -> Result<Self> {
        let kind = detect_kind(&file.name).ok_or_else(|| ProposalError::Extraction {
            file: file.name.clone(),
            cause: "unsupported file type (expected pdf, docx, or txt)".to_string(),
        })?;
        let text = extract(file)?;
        Ok(Self {
            origin,
            name: file.name.clone(),
            kind,
            category,
            text,
            extracted_at: Utc::now(),
        })
    }
}

/// Detect the file kind from the extension of a file name.
pub fn detect_kind(name: &str) -> Option<FileKind> {
    let extension = name.rsplit('.').next()?.to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some(FileKind::Pdf),
        "docx" => Some(FileKind::Docx),
        "txt" => Some(FileKind::Text),
        _ => None,
    }
}

/// Extract normalized plain text from an upload.
///
/// Stateless and idempotent: the same bytes always produce the same text.
/// Corrupt or unsupported input yields an extraction error carrying the
/// file name, never a silent empty string.
pub fn extract(file: &UploadedFile) -> Result<String> {
    let kind = detect_kind(&file.name).ok_or_else(|| ProposalError::Extraction {
        file: file.name.clone(),
        cause: "unsupported file type (expected pdf, docx, or txt)".to_string(),
    })?;

    let text = match kind {
        FileKind::Pdf => extract_pdf(file)?,
        FileKind::Docx => extract_docx(file)?,
        FileKind::Text => extract_plain_text(file)?,
    };

    if text.trim().is_empty() {
        return Err(ProposalError::Extraction {
            file: file.name.clone(),
            cause: "no extractable text".to_string(),
        });
    }

    info!(file = %file.name, chars = text.len(), "extracted document text");
    Ok(text)
}

/// All pages, concatenated in page order.
fn extract_pdf(file: &UploadedFile) -> Result<String> {
    pdf_extract::extract_text_from_mem(&file.bytes).map_err(|e| ProposalError::Extraction {
        file: file.name.clone(),
        cause: e.to_string(),
    })
}

/// All body paragraphs, concatenated in order with a line break between
/// paragraphs.
fn extract_docx(file: &UploadedFile) -> Result<String> {
    let docx = docx_rs::read_docx(&file.bytes).map_err(|e| ProposalError::Extraction {
        file: file.name.clone(),
        cause: format!("invalid docx: {e:?}"),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut out = String::new();
    for child in &paragraph.children {
        if let docx_rs::ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let docx_rs::RunChild::Text(text) = run_child {
                    out.push_str(&text.text);
                }
            }
        }
    }
    out
}

fn extract_plain_text(file: &UploadedFile) -> Result<String> {
    String::from_utf8(file.bytes.clone()).map_err(|_| ProposalError::Extraction {
        file: file.name.clone(),
        cause: "not valid UTF-8 text".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_extraction_is_idempotent() {
        let file = UploadedFile::new("notes.txt", b"Project scope and goals".to_vec());
        let first = extract(&file).unwrap();
        let second = extract(&file).unwrap();
        assert_eq!(first, "Project scope and goals");
        assert_eq!(first, second);
    }

    #[test]
    fn unsupported_extension_is_an_extraction_failure() {
        let file = UploadedFile::new("deck.pptx", vec![1, 2, 3]);
        let err = extract(&file).unwrap_err();
        match err {
            ProposalError::Extraction { file, .. } => assert_eq!(file, "deck.pptx"),
            other => panic!("expected extraction failure, got {other:?}"),
        }
    }

    #[test]
    fn empty_text_is_not_silently_accepted() {
        let file = UploadedFile::new("blank.txt", b"   \n".to_vec());
        assert!(extract(&file).is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let file = UploadedFile::new("weird.txt", vec![0xff, 0xfe, 0x00]);
        assert!(extract(&file).is_err());
    }

    #[test]
    fn docx_paragraphs_join_with_line_breaks() {
        use docx_rs::{Docx, Paragraph, Run};

        let mut buf = std::io::Cursor::new(Vec::new());
        Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("First paragraph")))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Second paragraph")))
            .build()
            .pack(&mut buf)
            .unwrap();

        let file = UploadedFile::new("proposal.docx", buf.into_inner());
        let text = extract(&file).unwrap();
        assert!(text.contains("First paragraph\nSecond paragraph"));
    }

    #[test]
    fn category_labels_round_trip() {
        let category: SourceCategory = serde_json::from_str("\"Company Info\"").unwrap();
        assert_eq!(category, SourceCategory::CompanyInfo);
        assert_eq!(category.to_string(), "Company Info");
    }
}
