use super::learn::UNKNOWN_LABEL;
use super::{CoachSession, SessionError, Stage};
use crate::console::Console;
use crate::llm_client::GenerationRequest;
use crate::prompts::PromptKey;
use tracing::info;

/// Upper bound on deep-dive rounds in one session.
pub const MAX_DEEP_DIVES: u32 = 4;

const ADVICE_TOKENS: u32 = 256;
const STOP_WORDS: [&str; 4] = ["no", "n", "exit", "quit"];

const GO_DEEPER_QUESTION: &str =
    "\nWould you like to explore one of these topics or tips in more detail? (yes/no): ";
const TOPIC_QUESTION: &str =
    "Which part would you like to go deeper into? (e.g., conversation, activity, tip): ";

impl<C: Console> CoachSession<C> {
    /// Asks the model for conversation starters, shared activities and a
    /// bonding tip for the goal set earlier.
    pub async fn boost_connection(&mut self) -> Result<Option<String>, SessionError> {
        let info = self.bonding_context();
        let prompt = self.render(PromptKey::BondingSuggestions, &[("info", info.as_str())]);
        let suggestions = self
            .ask_model(GenerationRequest::creative(prompt, ADVICE_TOKENS))
            .await?;
        if let Some(text) = &suggestions {
            self.console
                .show("\n💬 Suggestions to Strengthen the Relationship:\n");
            self.console.show(text);
            self.state.push_summary(Stage::BoostConnection, text.clone());
        }
        Ok(suggestions)
    }

    /// Offers up to [`MAX_DEEP_DIVES`] rounds of focused advice.
    ///
    /// Returns how many rounds were completed.
    pub async fn deep_dive(&mut self) -> Result<u32, SessionError> {
        let mut rounds = 0;
        loop {
            if rounds >= MAX_DEEP_DIVES {
                self.console
                    .show("\n👋 Welcome back for making meaningful connections again. ");
                break;
            }
            let answer = self.ask(GO_DEEPER_QUESTION)?.trim().to_lowercase();
            if STOP_WORDS.contains(&answer.as_str()) {
                self.console
                    .show("\n👍 No problem! You're all set to make meaningful connections.");
                break;
            }

            let topic = self.ask(TOPIC_QUESTION)?.trim().to_lowercase();
            let mbti = self.state.user_mbti().unwrap_or(UNKNOWN_LABEL).to_string();
            let goal = self.state.relationship_goal().unwrap_or_default().to_string();
            let target = self.target_context();
            let prompt = self.render(
                PromptKey::DeepDive,
                &[
                    ("mbti", mbti.as_str()),
                    ("relationship_goal", goal.as_str()),
                    ("target", target.as_str()),
                    ("topic", topic.as_str()),
                ],
            );
            if let Some(advice) = self
                .ask_model(GenerationRequest::creative(prompt, ADVICE_TOKENS))
                .await?
            {
                self.console.show("\n🧠 Here's a deeper insight:\n");
                self.console.show(&advice);
                self.state.push_summary(Stage::DeepDive, advice);
            }
            rounds += 1;
            info!(round = rounds, %topic, "Deep dive round complete");
        }
        Ok(rounds)
    }

    fn bonding_context(&self) -> String {
        let mbti = self.state.user_mbti().unwrap_or(UNKNOWN_LABEL);
        let goal = self.state.relationship_goal().unwrap_or_default();
        let counterpart = match self.state.target() {
            Some(target) => format!("Target MBTI: {}", target.mbti),
            None => format!(
                "Suggested match types from previous step: {}",
                self.state
                    .summary_for(Stage::SetGoal)
                    .unwrap_or("none yet")
            ),
        };
        format!("User MBTI: {mbti}\nRelationship goal: {goal}\n{counterpart}")
    }

    fn target_context(&self) -> String {
        match self.state.target() {
            Some(target) => format!(
                "Target MBTI: {}\nTarget Hobbies: {}",
                target.mbti, target.hobbies
            ),
            None => self
                .state
                .summary_for(Stage::SetGoal)
                .unwrap_or("No specific person in mind.")
                .to_string(),
        }
    }
}
