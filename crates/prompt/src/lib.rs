//! The Prompt Builder (§4.3): a pure, deterministic function from world
//! state to a provider-neutral message list. No I/O, no randomness, no
//! clock reads — given identical inputs the output is byte-exact, which is
//! what makes the `mock` adapter's captured-prompt assertions meaningful.

use ws_domain::config::EventDiceConfig;
use ws_domain::entities::{MessageRole, TimelineMessage, UserIntervention};
use ws_domain::message::Message;

/// Inputs collected by the Runner before a round's `generate` call (§4.3, §4.5).
pub struct PromptInput<'a> {
    pub world_preset: &'a str,
    pub tick_label: &'a str,
    /// Up to 20 most recent entries on the active branch, in `seq` order.
    pub recent_window: &'a [TimelineMessage],
    /// Freshly consumed interventions, ordered by `created_at`.
    pub pending_interventions: &'a [UserIntervention],
    /// Short strings from the memory collaborator; may be empty.
    pub memory_snippets: &'a [String],
    pub output_locale: &'a str,
    pub event_dice: &'a EventDiceConfig,
}

const SYSTEM_PROMPT: &str = "You produce a \"world progress report\": an objective, continuous \
narration of how the simulated world changed over the elapsed time. Respond with a single JSON \
object with exactly these fields: {\"title\": string, \"time_advance\": string, \"summary\": \
string, \"events\": [{\"category\": \"positive\"|\"negative\"|\"neutral\", \"severity\": \
\"low\"|\"medium\"|\"high\", \"description\": string}], \"risks\": [{\"category\": \
\"positive\"|\"negative\"|\"neutral\", \"severity\": \"low\"|\"medium\"|\"high\", \"description\": \
string}], \"tension_percent\": number (optional), \"crisis_focus\": string (optional)}. Do not \
include any text outside the JSON object.";

/// Build the `{system, user}` message pair the adapter receives (§4.3).
pub fn build_prompt(input: &PromptInput<'_>) -> Vec<Message> {
    vec![Message::system(SYSTEM_PROMPT), Message::user(build_user_body(input))]
}

fn build_user_body(input: &PromptInput<'_>) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!("World preset: {}", input.world_preset));
    sections.push(format!("Tick: {}", input.tick_label));

    if !input.memory_snippets.is_empty() {
        let joined = input
            .memory_snippets
            .iter()
            .map(|s| format!("- {s}"))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Relevant memory:\n{joined}"));
    }

    sections.push(format!(
        "Recent timeline:\n{}",
        render_timeline_window(input.recent_window)
    ));

    if !input.pending_interventions.is_empty() {
        let joined = input
            .pending_interventions
            .iter()
            .map(|i| format!("- {}", i.content))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("User interventions to account for this round:\n{joined}"));
    }

    sections.push(render_event_dice(input.event_dice));
    sections.push("Respond with the single JSON object described in the system message, nothing else.".to_string());
    sections.push(format!("Write the report in: {}", input.output_locale));

    sections.join("\n\n")
}

fn render_timeline_window(window: &[TimelineMessage]) -> String {
    if window.is_empty() {
        return "(no prior entries — this is the first round)".to_string();
    }
    window
        .iter()
        .map(|m| {
            let tag = match m.role {
                MessageRole::SystemReport => "report",
                MessageRole::UserIntervention => "intervention",
            };
            format!("[seq {} / {tag}] {}", m.seq, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_event_dice(dice: &EventDiceConfig) -> String {
    if !dice.enabled {
        return "Random world events: disabled.".to_string();
    }
    format!(
        "Random world events: enabled. Roll {}–{} event(s) this round with roughly {:.0}% good, \
         {:.0}% bad, {:.0}% rebellion-flavored outcomes, biased toward the {} hemisphere's season.",
        dice.min_events,
        dice.max_events,
        dice.good_prob * 100.0,
        dice.bad_prob * 100.0,
        dice.rebel_prob * 100.0,
        dice.hemisphere
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_input<'a>(
        window: &'a [TimelineMessage],
        interventions: &'a [UserIntervention],
        snippets: &'a [String],
        dice: &'a EventDiceConfig,
    ) -> PromptInput<'a> {
        PromptInput {
            world_preset: "a steampunk city",
            tick_label: "1 month",
            recent_window: window,
            pending_interventions: interventions,
            memory_snippets: snippets,
            output_locale: "en",
            event_dice: dice,
        }
    }

    #[test]
    fn identical_inputs_produce_byte_exact_output() {
        let dice = EventDiceConfig::default();
        let input = sample_input(&[], &[], &[], &dice);
        let a = build_prompt(&input);
        let b = build_prompt(&input);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn empty_window_says_first_round() {
        let dice = EventDiceConfig::default();
        let input = sample_input(&[], &[], &[], &dice);
        let msgs = build_prompt(&input);
        assert!(msgs[1].content.contains("first round"));
    }

    #[test]
    fn pending_intervention_text_is_included() {
        let dice = EventDiceConfig::default();
        let intervention = UserIntervention {
            id: "iv-1".into(),
            session_id: "s-1".into(),
            branch_id: "b-1".into(),
            content: "a drought strikes the north".into(),
            status: ws_domain::entities::InterventionStatus::Consumed,
            created_at: Utc::now(),
            consumed_at: Some(Utc::now()),
        };
        let input = sample_input(&[], std::slice::from_ref(&intervention), &[], &dice);
        let msgs = build_prompt(&input);
        assert!(msgs[1].content.contains("a drought strikes the north"));
    }

    #[test]
    fn memory_snippets_are_labeled() {
        let dice = EventDiceConfig::default();
        let snippets = vec!["the mayor resigned last round".to_string()];
        let input = sample_input(&[], &[], &snippets, &dice);
        let msgs = build_prompt(&input);
        assert!(msgs[1].content.contains("Relevant memory"));
        assert!(msgs[1].content.contains("the mayor resigned last round"));
    }

    #[test]
    fn disabled_event_dice_says_disabled() {
        let dice = EventDiceConfig::default();
        let input = sample_input(&[], &[], &[], &dice);
        let msgs = build_prompt(&input);
        assert!(msgs[1].content.contains("disabled"));
    }
}
