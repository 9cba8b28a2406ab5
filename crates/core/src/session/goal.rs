use super::learn::{TYPE_RETRY, UNKNOWN_LABEL};
use super::{CoachSession, SessionError, Stage, TargetPerson};
use crate::console::Console;
use crate::llm_client::GenerationRequest;
use crate::mbti::MbtiType;
use crate::parsing::{ParsedLabel, split_label};
use crate::prompts::PromptKey;
use tracing::{info, warn};

const HAS_TARGET_QUESTION: &str =
    "Do you already have someone in mind you’d like to connect with? (yes/no): ";
const TARGET_MBTI_QUESTION: &str =
    "What is their MBTI (if you know it)? Or how would you describe their personality? ";
const DESCRIBE_OFFER: &str = "Would you like to describe their personality so I can guess their MBTI (yes/no)? \n\
    If No, I can instead suggest the top 3 MBTI types that would be most compatible for your social goals 😊: ";
const DESCRIBE_QUESTION: &str =
    "Please describe their personality (e.g., ‘very outgoing, loves planning’):\n";
const TARGET_HOBBIES_QUESTION: &str = "What are their interests or hobbies? ";
const TARGET_GOAL_QUESTION: &str =
    "What kind of relationship would you like to develop? (e.g., friend, romantic, professional): ";
const GENERAL_GOAL_QUESTION: &str = "What kind of connection are you hoping to make in general? \
    (e.g., close friends, romantic partner, mentor, etc.): ";

const GUESS_TOKENS: u32 = 50;
const INSIGHT_TOKENS: u32 = 256;

/// What the SetGoal stage settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionGoal {
    pub relationship_goal: String,
    pub target: Option<TargetPerson>,
    pub insight: Option<String>,
}

impl<C: Console> CoachSession<C> {
    /// Finds out who the user wants to connect with and how, then asks the
    /// model for a relationship insight.
    ///
    /// A specific person only counts as a target once their MBTI is one of the
    /// sixteen codes; otherwise the stage falls back to general suggestions.
    pub async fn set_goal(&mut self) -> Result<ConnectionGoal, SessionError> {
        self.console.show("\n🔍 Let's explore your connection goals.\n");
        let answer = self.ask(HAS_TARGET_QUESTION)?.trim().to_lowercase();
        let mut target_known = None;
        if self.classify_yes(HAS_TARGET_QUESTION, &answer).await? {
            target_known = self.establish_target_mbti().await?;
        }

        let user_mbti = self
            .state
            .user_mbti()
            .unwrap_or(UNKNOWN_LABEL)
            .to_string();

        let (goal, target, prompt) = match target_known {
            Some((mbti, description)) => {
                let hobbies = self.ask(TARGET_HOBBIES_QUESTION)?;
                let goal = self.ask(TARGET_GOAL_QUESTION)?.trim().to_string();
                let info = format!(
                    "User MBTI: {user_mbti}\n\
                     Target MBTI: {mbti}\n\
                     Target interests: {hobbies}\n\
                     User's relationship goal: {goal}"
                );
                let prompt = self.render(PromptKey::InsightWithTarget, &[("info", info.as_str())]);
                let target = TargetPerson {
                    mbti,
                    hobbies,
                    description,
                };
                (goal, Some(target), prompt)
            }
            None => {
                let goal = self.ask(GENERAL_GOAL_QUESTION)?.trim().to_string();
                let info = format!(
                    "User MBTI: {user_mbti}\nThey want to build a relationship focused on: {goal}"
                );
                let prompt = self.render(PromptKey::InsightGeneral, &[("info", info.as_str())]);
                (goal, None, prompt)
            }
        };

        let insight = self
            .ask_model(GenerationRequest::creative(prompt, INSIGHT_TOKENS))
            .await?;
        if let Some(text) = &insight {
            self.console.show("\n🎯 Connection Insight:\n");
            self.console.show(text);
            self.state.push_summary(Stage::SetGoal, text.clone());
        }

        self.state.set_relationship_goal(goal.clone());
        if let Some(t) = &target {
            self.state.set_target(t.clone());
        }
        info!(goal = %goal, target = ?target.as_ref().map(|t| t.mbti), "Connection goal set");

        Ok(ConnectionGoal {
            relationship_goal: goal,
            target,
            insight,
        })
    }

    /// Asks for the target's MBTI, retrying once, then offers to guess it from
    /// a description. Returns `None` when no valid type could be established.
    async fn establish_target_mbti(
        &mut self,
    ) -> Result<Option<(MbtiType, Option<String>)>, SessionError> {
        if let Some(mbti) = MbtiType::parse(&self.ask(TARGET_MBTI_QUESTION)?) {
            return Ok(Some((mbti, None)));
        }
        if let Some(mbti) = MbtiType::parse(&self.ask(TYPE_RETRY)?) {
            return Ok(Some((mbti, None)));
        }

        let answer = self.ask(DESCRIBE_OFFER)?.trim().to_lowercase();
        if !self.classify_yes(DESCRIBE_OFFER, &answer).await? {
            return Ok(None);
        }

        let description = self.ask(DESCRIBE_QUESTION)?;
        let prompt = self.render(
            PromptKey::GuessTargetMbti,
            &[("description", description.as_str())],
        );
        let Some(guess) = self
            .ask_model(GenerationRequest::creative(prompt, GUESS_TOKENS))
            .await?
        else {
            return Ok(None);
        };

        let parsed = split_label(&guess, ':');
        match (&parsed, MbtiType::parse(parsed.label())) {
            (ParsedLabel::Labeled { detail, .. }, Some(mbti)) => {
                self.console.show(&format!("Guessed MBTI: {mbti}"));
                self.console.show(&format!("MBTI Overview: {detail}"));
                Ok(Some((mbti, Some(detail.clone()))))
            }
            (ParsedLabel::Unstructured(_), Some(mbti)) => {
                self.console.show(&format!("Guessed MBTI: {mbti}"));
                Ok(Some((mbti, None)))
            }
            (_, None) => {
                warn!(%guess, "Model guess did not start with an MBTI code");
                self.console.show(&format!("My best read on them: {guess}"));
                Ok(None)
            }
        }
    }
}
