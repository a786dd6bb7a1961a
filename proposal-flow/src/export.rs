use docx_rs::{Docx, Paragraph, Run, Style, StyleType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::info;

use crate::drafts::SectionDraftStore;
use crate::error::{ProposalError, Result};
use crate::outline::ProposalOutline;

/// One block of the exported document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocBlock {
    Heading { level: u8, text: String },
    Paragraph { text: String },
}

/// The structured export: front matter followed by a heading per drafted
/// section and its rendered body, in outline order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalDocument {
    pub blocks: Vec<DocBlock>,
}

/// Cover-sheet fields gathered at export time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrontMatter {
    pub prepared_for: Option<String>,
    pub prepared_by: Option<String>,
    pub cover_page: Option<String>,
    pub metadata: Option<String>,
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.*)").expect("valid heading pattern"))
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold pattern"))
}

/// Render lightweight markdown into document blocks.
///
/// `#`..`######` markers map to heading levels 1–6 by marker count. Bold
/// markers are stripped to plain emphasis-less text, matching the
/// exporter this replaces.
pub fn render_markdown(text: &str) -> Vec<DocBlock> {
    text.lines()
        .map(|line| {
            if let Some(captures) = heading_re().captures(line) {
                DocBlock::Heading {
                    level: captures[1].len() as u8,
                    text: captures[2].to_string(),
                }
            } else {
                DocBlock::Paragraph {
                    text: bold_re().replace_all(line, "$1").into_owned(),
                }
            }
        })
        .collect()
}

/// Assemble the export from the draft store's ordered view.
pub fn build_document(
    drafts: &SectionDraftStore,
    outline: &ProposalOutline,
    front: &FrontMatter,
) -> ProposalDocument {
    let mut blocks = Vec::new();

    let prepared_for = front.prepared_for.as_deref().unwrap_or("Client");
    let prepared_by = front.prepared_by.as_deref().unwrap_or("Your Company");
    blocks.push(DocBlock::Paragraph {
        text: format!("Prepared for: {prepared_for}"),
    });
    blocks.push(DocBlock::Paragraph {
        text: format!("Prepared by: {prepared_by}"),
    });
    if let Some(cover) = front.cover_page.as_deref().filter(|c| !c.trim().is_empty()) {
        blocks.push(DocBlock::Paragraph {
            text: cover.to_string(),
        });
    }
    if let Some(metadata) = front.metadata.as_deref().filter(|m| !m.trim().is_empty()) {
        blocks.push(DocBlock::Paragraph {
            text: metadata.to_string(),
        });
    }

    for (section, draft) in drafts.ordered(outline) {
        blocks.push(DocBlock::Heading {
            level: 2,
            text: section.to_string(),
        });
        blocks.extend(render_markdown(draft));
    }

    info!(blocks = blocks.len(), "assembled proposal document");
    ProposalDocument { blocks }
}

/// Render the block document as .docx bytes.
pub fn to_docx_bytes(document: &ProposalDocument) -> Result<Vec<u8>> {
    let mut docx = Docx::new();

    // Heading sizes in half-points, level 1 largest; body matches 11pt.
    let heading_sizes = [32usize, 28, 26, 24, 22, 20];
    for (index, size) in heading_sizes.iter().enumerate() {
        let id = format!("Heading{}", index + 1);
        let name = format!("Heading {}", index + 1);
        docx = docx.add_style(
            Style::new(&id, StyleType::Paragraph)
                .name(&name)
                .size(*size)
                .bold(),
        );
    }

    for block in &document.blocks {
        let paragraph = match block {
            DocBlock::Heading { level, text } => {
                let level = (*level).clamp(1, 6);
                Paragraph::new()
                    .add_run(Run::new().add_text(text.as_str()))
                    .style(&format!("Heading{level}"))
            }
            DocBlock::Paragraph { text } => {
                Paragraph::new().add_run(Run::new().add_text(text.as_str()).size(22))
            }
        };
        docx = docx.add_paragraph(paragraph);
    }

    let mut buffer = std::io::Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ProposalError::Export(e.to_string()))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_headings_map_to_levels_and_bold_is_stripped() {
        let blocks = render_markdown("### Phase One\n**Total:** $100\nplain line");
        assert_eq!(
            blocks,
            vec![
                DocBlock::Heading {
                    level: 3,
                    text: "Phase One".to_string()
                },
                DocBlock::Paragraph {
                    text: "Total: $100".to_string()
                },
                DocBlock::Paragraph {
                    text: "plain line".to_string()
                },
            ]
        );
    }

    #[test]
    fn export_contains_section_heading_with_stripped_body() {
        let outline = ProposalOutline::parse("- Pricing\n");
        let mut drafts = SectionDraftStore::new();
        drafts.store_draft("Pricing", "**Total:** $100");

        let document = build_document(&drafts, &outline, &FrontMatter::default());
        let heading_index = document
            .blocks
            .iter()
            .position(|b| {
                matches!(b, DocBlock::Heading { level: 2, text } if text == "Pricing")
            })
            .expect("pricing heading present");
        assert_eq!(
            document.blocks[heading_index + 1],
            DocBlock::Paragraph {
                text: "Total: $100".to_string()
            }
        );
    }

    #[test]
    fn front_matter_defaults_are_applied() {
        let document = build_document(
            &SectionDraftStore::new(),
            &ProposalOutline::default(),
            &FrontMatter::default(),
        );
        assert_eq!(
            document.blocks[0],
            DocBlock::Paragraph {
                text: "Prepared for: Client".to_string()
            }
        );
        assert_eq!(
            document.blocks[1],
            DocBlock::Paragraph {
                text: "Prepared by: Your Company".to_string()
            }
        );
    }

    #[test]
    fn docx_bytes_are_a_zip_container() {
        let outline = ProposalOutline::parse("- Pricing\n");
        let mut drafts = SectionDraftStore::new();
        drafts.store_draft("Pricing", "# Costs\nbody");

        let document = build_document(&drafts, &outline, &FrontMatter::default());
        let bytes = to_docx_bytes(&document).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
