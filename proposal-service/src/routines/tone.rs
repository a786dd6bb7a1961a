/// Tone and style profile applied to drafting prompts, derived from the
/// client classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneSettings {
    pub tone: &'static str,
    pub style: &'static str,
    pub description: &'static str,
}

/// Classification to tone mapping; anything unrecognized gets the
/// enterprise profile.
pub fn tone_settings_for(classification: &str) -> ToneSettings {
    match classification.to_ascii_lowercase().as_str() {
        "government" => ToneSettings {
            tone: "Formal",
            style: "Compliance-focused",
            description: "A formal tone with an emphasis on compliance and regulatory details.",
        },
        _ => ToneSettings {
            tone: "Persuasive",
            style: "Business-focused",
            description: "A persuasive tone designed to appeal to business objectives and ROI.",
        },
    }
}
