//! Best-effort extraction of labels from free-text model output.
//!
//! The model is asked, not required, to answer in `LABEL | detail` or
//! `LABEL : detail` form. These helpers never index into the split blindly:
//! when the delimiter is absent the whole response is returned as
//! [`ParsedLabel::Unstructured`].

/// The result of splitting a model response on a delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLabel {
    /// The delimiter was present; `label` is the trimmed text before its first
    /// occurrence and `detail` the trimmed remainder.
    Labeled { label: String, detail: String },
    /// The delimiter was absent; holds the trimmed response.
    Unstructured(String),
}

impl ParsedLabel {
    /// The label, or the whole unstructured text when no delimiter was found.
    pub fn label(&self) -> &str {
        match self {
            ParsedLabel::Labeled { label, .. } => label,
            ParsedLabel::Unstructured(text) => text,
        }
    }

    /// The text after the delimiter, if there was one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ParsedLabel::Labeled { detail, .. } => Some(detail),
            ParsedLabel::Unstructured(_) => None,
        }
    }
}

/// Splits `text` on the first `delimiter`.
pub fn split_label(text: &str, delimiter: char) -> ParsedLabel {
    match text.split_once(delimiter) {
        Some((label, detail)) => ParsedLabel::Labeled {
            label: label.trim().to_string(),
            detail: detail.trim().to_string(),
        },
        None => ParsedLabel::Unstructured(text.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_separated_summary_yields_label() {
        let parsed = split_label("ESFP | Energetic and spontaneous, loves social scenes.", '|');
        assert_eq!(parsed.label(), "ESFP");
        assert_eq!(
            parsed.detail(),
            Some("Energetic and spontaneous, loves social scenes.")
        );
    }

    #[test]
    fn only_the_first_delimiter_splits() {
        let parsed = split_label("INFJ : Quiet: but warm", ':');
        assert_eq!(
            parsed,
            ParsedLabel::Labeled {
                label: "INFJ".into(),
                detail: "Quiet: but warm".into()
            }
        );
    }

    #[test]
    fn missing_delimiter_falls_back_to_whole_text() {
        let parsed = split_label("  Probably an introvert  ", '|');
        assert_eq!(parsed, ParsedLabel::Unstructured("Probably an introvert".into()));
        assert_eq!(parsed.label(), "Probably an introvert");
        assert_eq!(parsed.detail(), None);
    }

    #[test]
    fn empty_response_is_unstructured() {
        assert_eq!(split_label("", ':'), ParsedLabel::Unstructured(String::new()));
    }
}
