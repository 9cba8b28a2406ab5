use crate::mbti::MbtiType;
use crate::persona::CoachStyle;
use serde::Serialize;
use tracing::warn;

/// The stages of a coaching session, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    SelectPersona,
    LearnMbti,
    SetGoal,
    BoostConnection,
    DeepDive,
    Finished,
}

impl Stage {
    /// The stage that follows this one. `Finished` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::SelectPersona => Stage::LearnMbti,
            Stage::LearnMbti => Stage::SetGoal,
            Stage::SetGoal => Stage::BoostConnection,
            Stage::BoostConnection => Stage::DeepDive,
            Stage::DeepDive | Stage::Finished => Stage::Finished,
        }
    }
}

/// The coach the user picked and the preamble derived from its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaSelection {
    pub style: CoachStyle,
    pub context: String,
}

/// The specific person the user wants to connect with.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPerson {
    pub mbti: MbtiType,
    pub hobbies: String,
    /// One-sentence overview, present when the type was guessed by the model.
    pub description: Option<String>,
}

/// A model output kept as context for later stages.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage: Stage,
    pub text: String,
}

/// What the session hands back to its caller once it is over.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub user_mbti: Option<String>,
    pub relationship_goal: Option<String>,
}

/// Fields collected over one session.
///
/// Persona, user MBTI and relationship goal are write-once: a second attempt
/// to set them is ignored.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    persona: Option<PersonaSelection>,
    user_mbti: Option<String>,
    relationship_goal: Option<String>,
    target: Option<TargetPerson>,
    step_summaries: Vec<StageSummary>,
}

impl SessionState {
    pub fn persona(&self) -> Option<&PersonaSelection> {
        self.persona.as_ref()
    }

    pub fn user_mbti(&self) -> Option<&str> {
        self.user_mbti.as_deref()
    }

    pub fn relationship_goal(&self) -> Option<&str> {
        self.relationship_goal.as_deref()
    }

    pub fn target(&self) -> Option<&TargetPerson> {
        self.target.as_ref()
    }

    pub fn step_summaries(&self) -> &[StageSummary] {
        &self.step_summaries
    }

    /// The most recent summary recorded by `stage`.
    pub fn summary_for(&self, stage: Stage) -> Option<&str> {
        self.step_summaries
            .iter()
            .rev()
            .find(|s| s.stage == stage)
            .map(|s| s.text.as_str())
    }

    pub fn set_persona(&mut self, selection: PersonaSelection) -> bool {
        if self.persona.is_some() {
            warn!(style = ?selection.style, "Persona already chosen, ignoring");
            return false;
        }
        self.persona = Some(selection);
        true
    }

    /// Records the user's MBTI label. Returns `false` if one was already set.
    pub fn record_user_mbti(&mut self, label: impl Into<String>) -> bool {
        let label = label.into();
        if let Some(existing) = &self.user_mbti {
            warn!(%existing, ignored = %label, "User MBTI already recorded, ignoring");
            return false;
        }
        self.user_mbti = Some(label);
        true
    }

    pub fn set_relationship_goal(&mut self, goal: impl Into<String>) -> bool {
        let goal = goal.into();
        if self.relationship_goal.is_some() {
            warn!(ignored = %goal, "Relationship goal already recorded, ignoring");
            return false;
        }
        self.relationship_goal = Some(goal);
        true
    }

    pub fn set_target(&mut self, target: TargetPerson) {
        self.target = Some(target);
    }

    pub fn push_summary(&mut self, stage: Stage, text: impl Into<String>) {
        self.step_summaries.push(StageSummary {
            stage,
            text: text.into(),
        });
    }

    pub fn outcome(&self) -> SessionOutcome {
        SessionOutcome {
            user_mbti: self.user_mbti.clone(),
            relationship_goal: self.relationship_goal.clone(),
        }
    }
}
