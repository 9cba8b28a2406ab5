use super::{CoachSession, PersonaSelection, SessionError};
use crate::console::Console;
use crate::persona::CoachStyle;
use tracing::{info, warn};

const MAX_ATTEMPTS: usize = 2;

const MENU: &str = "Before we start, choose your coach style:\n\
    1. Mature Uncle – Wise and experienced advice.\n\
    2. Gentle Miss Sister – Warm and caring support.\n\
    3. Big Sister – Direct and straightforward guidance.\n\
    4. Funny Bro – Light-hearted, humorous tips.\n\n\
    Please type the number of your choice: ";

impl<C: Console> CoachSession<C> {
    /// Shows the coach menu and records the chosen persona.
    ///
    /// Two invalid answers select the Mature Uncle. A chosen style without a
    /// profile also falls back to the Mature Uncle profile; if that one is
    /// missing too the session cannot continue.
    pub fn select_persona(&mut self) -> Result<PersonaSelection, SessionError> {
        let mut chosen = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let answer = self.ask(MENU)?;
            if let Some(style) = CoachStyle::from_choice(&answer) {
                chosen = Some(style);
                break;
            }
            if attempt < MAX_ATTEMPTS {
                self.console
                    .show("Sorry, that’s not a valid option. Let’s try again.\n");
            } else {
                self.console
                    .show("Invalid choice. Defaulting to Mature Uncle style.\n");
            }
        }
        let style = chosen.unwrap_or(CoachStyle::MatureUncle);

        let (style, profile) = match self.profiles.get(style) {
            Some(profile) => (style, profile),
            None => {
                warn!(?style, "No profile for chosen coach, using the default");
                (CoachStyle::MatureUncle, self.profiles.default_profile()?)
            }
        };
        let selection = PersonaSelection {
            style,
            context: profile.persona_context(),
        };
        info!(?style, role = %profile.role_name, "Coach selected");
        self.state.set_persona(selection.clone());
        Ok(selection)
    }
}
