//! Core of the MBTI coach: the conversation state machine and everything it
//! talks to (console, model client, prompts, persona profiles).

pub mod console;
pub mod guard;
pub mod llm_client;
pub mod mbti;
pub mod parsing;
pub mod persona;
pub mod prompts;
pub mod retry;
pub mod session;

pub use session::{CoachSession, SessionError, SessionOutcome, SessionSettings};
