use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the sixteen Myers-Briggs type codes.
///
/// The type is used purely as a label space; nothing in this crate computes
/// a type from behaviour. Inference, when it happens, is delegated to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MbtiType {
    Infp,
    Infj,
    Intj,
    Intp,
    Isfp,
    Istp,
    Isfj,
    Istj,
    Enfp,
    Enfj,
    Entj,
    Entp,
    Esfp,
    Esfj,
    Estp,
    Estj,
}

impl MbtiType {
    pub const ALL: [MbtiType; 16] = [
        MbtiType::Infp,
        MbtiType::Infj,
        MbtiType::Intj,
        MbtiType::Intp,
        MbtiType::Isfp,
        MbtiType::Istp,
        MbtiType::Isfj,
        MbtiType::Istj,
        MbtiType::Enfp,
        MbtiType::Enfj,
        MbtiType::Entj,
        MbtiType::Entp,
        MbtiType::Esfp,
        MbtiType::Esfj,
        MbtiType::Estp,
        MbtiType::Estj,
    ];

    /// The canonical upper-case code, e.g. `"INFP"`.
    pub fn code(&self) -> &'static str {
        match self {
            MbtiType::Infp => "INFP",
            MbtiType::Infj => "INFJ",
            MbtiType::Intj => "INTJ",
            MbtiType::Intp => "INTP",
            MbtiType::Isfp => "ISFP",
            MbtiType::Istp => "ISTP",
            MbtiType::Isfj => "ISFJ",
            MbtiType::Istj => "ISTJ",
            MbtiType::Enfp => "ENFP",
            MbtiType::Enfj => "ENFJ",
            MbtiType::Entj => "ENTJ",
            MbtiType::Entp => "ENTP",
            MbtiType::Esfp => "ESFP",
            MbtiType::Esfj => "ESFJ",
            MbtiType::Estp => "ESTP",
            MbtiType::Estj => "ESTJ",
        }
    }

    /// Normalizes raw user input (trim + upper-case) and checks it against the
    /// sixteen codes.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized = input.trim().to_uppercase();
        Self::ALL.into_iter().find(|t| t.code() == normalized)
    }
}

impl fmt::Display for MbtiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not one of the 16 MBTI types")]
pub struct InvalidMbti(pub String);

impl FromStr for MbtiType {
    type Err = InvalidMbti;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidMbti(s.to_string()))
    }
}
