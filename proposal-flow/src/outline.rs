use serde::{Deserialize, Serialize};

/// One outline entry: a section title plus the bullet points guiding its
/// generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSection {
    pub title: String,
    pub bullets: Vec<String>,
}

/// An ordered proposal outline parsed from user-editable free text.
///
/// An unindented line starting with a `-` marker (marker trimmed) is a
/// section title. Indented `*` lines under it are its bullets; when a
/// section has no `*` bullets, any indented lines under it are taken as
/// bullets instead. Order is significant and defines section identity:
/// two differently worded titles are different sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalOutline {
    pub sections: Vec<OutlineSection>,
}

impl ProposalOutline {
    pub fn parse(text: &str) -> Self {
        let mut sections: Vec<OutlineSection> = Vec::new();

        for line in text.lines() {
            if is_section_line(line) {
                let title = line.trim().trim_start_matches('-').trim().to_string();
                if !title.is_empty() {
                    sections.push(OutlineSection {
                        title,
                        bullets: Vec::new(),
                    });
                }
            } else if let Some(section) = sections.last_mut() {
                let trimmed = line.trim();
                if trimmed.starts_with('*') {
                    let bullet = trimmed.trim_start_matches('*').trim().to_string();
                    if !bullet.is_empty() {
                        section.bullets.push(bullet);
                    }
                }
            }
        }

        // Fallback pass: a section written with plain indented lines
        // instead of `*` bullets still gets its guidance captured.
        if sections.iter().any(|s| s.bullets.is_empty()) {
            let mut current: Option<usize> = None;
            for line in text.lines() {
                if is_section_line(line) {
                    let title = line.trim().trim_start_matches('-').trim();
                    current = sections.iter().position(|s| s.title == title);
                } else if let Some(index) = current {
                    if sections[index].bullets.is_empty()
                        && line.starts_with("  ")
                        && !line.trim().is_empty()
                        && !line.trim().starts_with('*')
                    {
                        sections[index].bullets.push(line.trim().to_string());
                    }
                }
            }
        }

        Self { sections }
    }

    pub fn titles(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.title.as_str()).collect()
    }

    pub fn bullets_for(&self, title: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.bullets.as_slice())
    }

    pub fn contains(&self, title: &str) -> bool {
        self.sections.iter().any(|s| s.title == title)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The outline template offered before any structure is generated.
    pub fn default_template() -> &'static str {
        DEFAULT_OUTLINE
    }
}

fn is_section_line(line: &str) -> bool {
    line.trim_start().starts_with('-') && !line.starts_with("  ")
}

const DEFAULT_OUTLINE: &str = "\
- Executive Summary
  * Key project objectives and scope
  * Value proposition and benefits
  * Unique selling points
  * Project timeline overview

- Technical Approach
  * Solution architecture and components
  * Technology stack and tools
  * Integration points and APIs
  * Security and compliance measures
  * Scalability and performance considerations

- Pricing Proposal
  * Cost breakdown by phase
  * Resource allocation
  * Payment terms and conditions
  * ROI analysis and benefits

- Implementation Plan
  * Project phases and milestones
  * Team structure and roles
  * Risk mitigation strategies
  * Quality assurance process
  * Change management approach

- Compliance Statements
  * Regulatory requirements
  * Industry standards
  * Security certifications
  * Data protection measures

- Conclusion
  * Project success criteria
  * Long-term benefits
  * Next steps and call to action
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_titles_in_order_with_bullets() {
        let outline = ProposalOutline::parse(
            "- Executive Summary\n  * Objectives\n  * Value\n- Technical Approach\n  * Architecture\n",
        );
        assert_eq!(outline.titles(), vec!["Executive Summary", "Technical Approach"]);
        assert_eq!(
            outline.bullets_for("Executive Summary").unwrap(),
            &["Objectives".to_string(), "Value".to_string()]
        );
    }

    #[test]
    fn differently_worded_titles_are_distinct_sections() {
        let outline = ProposalOutline::parse("- Summary\n- Executive Summary\n");
        assert_eq!(outline.titles(), vec!["Summary", "Executive Summary"]);
    }

    #[test]
    fn indented_plain_lines_become_bullets_when_no_starred_ones_exist() {
        let outline = ProposalOutline::parse("- Pricing\n  Cost breakdown\n  Payment schedule\n");
        assert_eq!(
            outline.bullets_for("Pricing").unwrap(),
            &["Cost breakdown".to_string(), "Payment schedule".to_string()]
        );
    }

    #[test]
    fn default_template_parses() {
        let outline = ProposalOutline::parse(ProposalOutline::default_template());
        assert_eq!(outline.sections.len(), 6);
        assert_eq!(outline.titles()[0], "Executive Summary");
    }
}
