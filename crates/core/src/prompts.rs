//! Prompt Library
//!
//! Every prompt the coach sends is a Markdown template with `{name}`
//! placeholders. The templates ship embedded in the binary; a directory of
//! `*.md` files can override any of them by file stem.

use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Identifies one template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKey {
    ClassifyYesNo,
    KnownMbtiSummary,
    MbtiIntro,
    InferMbti,
    GuessTargetMbti,
    InsightWithTarget,
    InsightGeneral,
    BondingSuggestions,
    DeepDive,
}

impl PromptKey {
    pub const ALL: [PromptKey; 9] = [
        PromptKey::ClassifyYesNo,
        PromptKey::KnownMbtiSummary,
        PromptKey::MbtiIntro,
        PromptKey::InferMbti,
        PromptKey::GuessTargetMbti,
        PromptKey::InsightWithTarget,
        PromptKey::InsightGeneral,
        PromptKey::BondingSuggestions,
        PromptKey::DeepDive,
    ];

    /// The file stem used for overrides, e.g. `deep_dive` for `deep_dive.md`.
    pub fn file_stem(&self) -> &'static str {
        match self {
            PromptKey::ClassifyYesNo => "classify_yes_no",
            PromptKey::KnownMbtiSummary => "known_mbti_summary",
            PromptKey::MbtiIntro => "mbti_intro",
            PromptKey::InferMbti => "infer_mbti",
            PromptKey::GuessTargetMbti => "guess_target_mbti",
            PromptKey::InsightWithTarget => "insight_with_target",
            PromptKey::InsightGeneral => "insight_general",
            PromptKey::BondingSuggestions => "bonding_suggestions",
            PromptKey::DeepDive => "deep_dive",
        }
    }

    fn builtin(&self) -> &'static str {
        match self {
            PromptKey::ClassifyYesNo => include_str!("../prompts/classify_yes_no.md"),
            PromptKey::KnownMbtiSummary => include_str!("../prompts/known_mbti_summary.md"),
            PromptKey::MbtiIntro => include_str!("../prompts/mbti_intro.md"),
            PromptKey::InferMbti => include_str!("../prompts/infer_mbti.md"),
            PromptKey::GuessTargetMbti => include_str!("../prompts/guess_target_mbti.md"),
            PromptKey::InsightWithTarget => include_str!("../prompts/insight_with_target.md"),
            PromptKey::InsightGeneral => include_str!("../prompts/insight_general.md"),
            PromptKey::BondingSuggestions => include_str!("../prompts/bonding_suggestions.md"),
            PromptKey::DeepDive => include_str!("../prompts/deep_dive.md"),
        }
    }

    fn from_file_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.file_stem() == stem)
    }
}

/// The set of templates used by a session.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<PromptKey, String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptLibrary {
    /// The embedded templates.
    pub fn builtin() -> Self {
        let templates = PromptKey::ALL
            .into_iter()
            .map(|k| (k, k.builtin().to_string()))
            .collect();
        Self { templates }
    }

    /// The embedded templates, with any `<stem>.md` file in `dir` replacing the
    /// template of the same name. Files with unknown stems are ignored.
    pub fn with_overrides(dir: &Path) -> std::io::Result<Self> {
        let mut library = Self::builtin();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match PromptKey::from_file_stem(stem) {
                Some(key) => {
                    let content = std::fs::read_to_string(&path)?;
                    info!(prompt = stem, "Overriding built-in prompt");
                    library.templates.insert(key, content);
                }
                None => warn!(file = %path.display(), "Ignoring unknown prompt file"),
            }
        }
        Ok(library)
    }

    /// Fills the placeholders of `key` with `vars`.
    pub fn render(&self, key: PromptKey, vars: &[(&str, &str)]) -> String {
        let template = self
            .templates
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.builtin());
        fill(template, vars)
    }
}

/// Substitutes `{name}` placeholders in a single pass, so braces inside the
/// substituted values are never expanded. Unknown placeholders are kept as is.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replacement = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| (*v, close))
        });
        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
