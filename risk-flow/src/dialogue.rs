//! The conversation state machine.
//!
//! [`DialogueEngine::step`] is a pure function of the session and one
//! event. It never performs I/O: replies and prediction requests come back
//! as [`Effect`]s for the caller to carry out.

use std::collections::VecDeque;
use std::mem;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::DispatchError;
use crate::imputation::ImputationTable;
use crate::intent::{self, Intent};
use crate::message::ChatMessage;
use crate::payload::{PredictionRequest, build_payload};
use crate::prediction::PredictionResult;
use crate::report::format_report;
use crate::schema::{Domain, FieldSpec, required_fields};
use crate::value::{CollectedData, InvalidValue, parse};

pub const GREETING: &str = "Hi! I'm your construction project assistant. I can help you predict **Delay** or **Cost Overrun** for your projects. What would you like to know?";

const HELP: &str = "I can help you with:\n\n🔹 **Delay Prediction** - Predict if your project will be delayed and by how many days\n🔹 **Cost Overrun Prediction** - Predict if your project will exceed budget and by how much\n\nJust tell me what you'd like to predict, or ask about 'delay' or 'cost overrun'!";

const GUIDANCE: &str = "I can help you predict **Delay** or **Cost Overrun** for your construction projects.\n\n💡 **Try saying:**\n• \"I want to predict delay\"\n• \"Check cost overrun\"\n• \"Will my project be delayed?\"\n• \"Budget overrun prediction\"\n\nWhich one would you like to know about?";

const ANOTHER_PREDICTION: &str =
    "I can help you with another prediction. Would you like to predict **Delay** or **Cost Overrun**?";

const PROCESSING: &str = "Processing your prediction... This may take a moment.";

const NOT_UNDERSTOOD: &str = "I didn't understand that. Please provide optional fields in the format 'field_name: value' or type 'proceed' to continue with defaults.";

const BUSY: &str = "I'm still working on your prediction. Please wait for it to finish before sending more messages.";

const PROCEED_WORDS: &[&str] = &["proceed", "continue", "yes"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    CollectingRequired,
    CollectingOptional,
    Processing,
    ShowingResult,
}

/// State of one chat widget's conversation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogueSession {
    pub mode: Option<Domain>,
    pub collected: CollectedData,
    /// Index of the next required field to ask
    pub required_cursor: usize,
    pub phase: Phase,
    pub last_result: Option<PredictionResult>,
    /// Messages received while a prediction is in flight, oldest first
    #[serde(default)]
    pub pending_inputs: VecDeque<String>,
}

impl DialogueSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.mode = None;
        self.collected.clear();
        self.required_cursor = 0;
        self.phase = Phase::Idle;
        self.last_result = None;
    }

    /// The required field waiting for an answer
    pub fn current_field(&self) -> Option<&'static FieldSpec> {
        if self.phase != Phase::CollectingRequired {
            return None;
        }
        required_fields(self.mode?).get(self.required_cursor)
    }
}

#[derive(Debug)]
pub enum Event {
    UserText(String),
    PredictionResolved(Result<PredictionResult, DispatchError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Reply(ChatMessage),
    Dispatch(PredictionRequest),
}

/// Outcome of one step
#[derive(Debug)]
pub struct Transition {
    pub session: DialogueSession,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn replies(&self) -> impl Iterator<Item = &ChatMessage> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Reply(message) => Some(message),
            Effect::Dispatch(_) => None,
        })
    }

    pub fn dispatch(&self) -> Option<&PredictionRequest> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Dispatch(request) => Some(request),
            Effect::Reply(_) => None,
        })
    }
}

fn field_prompt(field: &FieldSpec) -> String {
    let options = field.options();
    if options.is_empty() {
        format!("**{}**", field.label)
    } else {
        format!("**{}**\nOptions: {}", field.label, options.join(", "))
    }
}

fn optional_prompt(domain: Domain) -> String {
    let keys: Vec<&str> = domain.schema().optional.iter().map(|f| f.key).collect();
    format!(
        "Perfect! I have all the required information. Would you like to provide any optional details, or should I proceed with the prediction using default values for optional fields?\n\nOptional fields: {}\n\nType 'proceed' to continue or provide optional field values as 'field_name: value'.",
        keys.join(", ")
    )
}

fn wants_to_proceed(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    lowered == "y" || PROCEED_WORDS.iter().any(|word| lowered.contains(word))
}

/// Split `name: value`; the name loses all whitespace and is lower-cased
fn split_assignment(text: &str) -> Option<(String, &str)> {
    let mut parts = text.split(':');
    let (name, value) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let name: String = name
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}

fn invalid_hint(field: &FieldSpec, reason: &InvalidValue) -> String {
    match reason {
        InvalidValue::NotAnOption(_) => format!("Options: {}", field.options().join(", ")),
        InvalidValue::NotANumber(_) | InvalidValue::Empty if field.is_numeric() => {
            format!("Please enter a number ({}).", field.placeholder)
        }
        InvalidValue::NotANumber(_) | InvalidValue::Empty => {
            format!("Options: {}", field.options().join(", "))
        }
    }
}

/// Drives a [`DialogueSession`] through the conversation
#[derive(Debug, Clone)]
pub struct DialogueEngine {
    defaults: ImputationTable,
    pending_limit: usize,
}

impl Default for DialogueEngine {
    fn default() -> Self {
        Self::new(ImputationTable::default(), 8)
    }
}

impl DialogueEngine {
    pub fn new(defaults: ImputationTable, pending_limit: usize) -> Self {
        Self {
            defaults,
            pending_limit,
        }
    }

    pub fn defaults(&self) -> &ImputationTable {
        &self.defaults
    }

    pub fn step(&self, mut session: DialogueSession, event: Event) -> Transition {
        let mut effects = Vec::new();
        let before = session.phase;

        match event {
            Event::UserText(text) => self.on_text(&mut session, &text, &mut effects),
            Event::PredictionResolved(outcome) => {
                self.on_resolved(&mut session, outcome, &mut effects)
            }
        }

        debug!(
            from = ?before,
            to = ?session.phase,
            mode = ?session.mode,
            cursor = session.required_cursor,
            effects = effects.len(),
            "Dialogue step"
        );
        Transition { session, effects }
    }

    fn on_text(&self, session: &mut DialogueSession, text: &str, out: &mut Vec<Effect>) {
        match session.phase {
            Phase::Idle => self.on_idle(session, text, out),
            Phase::CollectingRequired => self.on_required(session, text, out),
            Phase::CollectingOptional => self.on_optional(session, text, out),
            Phase::Processing => self.on_busy(session, text, out),
            Phase::ShowingResult => {
                session.reset();
                match intent::classify(text) {
                    Intent::Predict(domain) => self.start_collection(session, domain, out),
                    Intent::Unknown => reply(out, ANOTHER_PREDICTION),
                }
            }
        }
    }

    fn on_idle(&self, session: &mut DialogueSession, text: &str, out: &mut Vec<Effect>) {
        match intent::classify(text) {
            Intent::Predict(domain) => self.start_collection(session, domain, out),
            Intent::Unknown if intent::is_help_request(text) => reply(out, HELP),
            Intent::Unknown => reply(out, GUIDANCE),
        }
    }

    fn start_collection(&self, session: &mut DialogueSession, domain: Domain, out: &mut Vec<Effect>) {
        session.reset();
        session.mode = Some(domain);
        session.phase = Phase::CollectingRequired;

        let first = required_fields(domain)
            .first()
            .map(field_prompt)
            .unwrap_or_default();
        reply(
            out,
            format!(
                "Great! I'll help you predict {}. Let me collect the required information.\n\n{first}\n\nPlease provide this information:",
                domain.subject()
            ),
        );
    }

    fn on_required(&self, session: &mut DialogueSession, text: &str, out: &mut Vec<Effect>) {
        let Some(domain) = session.mode else {
            warn!("Collecting required fields without a mode, resetting");
            session.reset();
            return self.on_idle(session, text, out);
        };
        let fields = required_fields(domain);
        let Some(field) = fields.get(session.required_cursor) else {
            session.phase = Phase::CollectingOptional;
            return reply(out, optional_prompt(domain));
        };

        let value = match parse(field, text) {
            Ok(value) => value,
            Err(reason) => {
                debug!(field = field.key, %reason, "Rejected required value");
                return reply(
                    out,
                    format!(
                        "Please provide a valid value for **{}**.\n{}",
                        field.label,
                        invalid_hint(field, &reason)
                    ),
                );
            }
        };

        session.collected.insert(field.key, value);
        session.required_cursor += 1;

        match fields.get(session.required_cursor) {
            Some(next) => reply(
                out,
                format!("Got it! Now, please provide {}:", field_prompt(next)),
            ),
            None => {
                session.phase = Phase::CollectingOptional;
                reply(out, optional_prompt(domain));
            }
        }
    }

    fn on_optional(&self, session: &mut DialogueSession, text: &str, out: &mut Vec<Effect>) {
        let Some(domain) = session.mode else {
            warn!("Collecting optional fields without a mode, resetting");
            session.reset();
            return self.on_idle(session, text, out);
        };

        if wants_to_proceed(text) {
            return self.dispatch(session, domain, out);
        }

        let Some((name, raw)) = split_assignment(text) else {
            return reply(out, NOT_UNDERSTOOD);
        };
        let Some(field) = domain.schema().optional_field(&name) else {
            debug!(field = %name, domain = %domain, "Unknown optional field");
            return reply(out, NOT_UNDERSTOOD);
        };

        match parse(field, raw) {
            Ok(value) => {
                session.collected.insert(field.key, value);
                reply(
                    out,
                    format!(
                        "Got it! Added {}. Provide more optional fields or type 'proceed' to continue.",
                        field.label
                    ),
                );
            }
            Err(reason) => {
                debug!(field = field.key, %reason, "Rejected optional value");
                reply(
                    out,
                    format!(
                        "{} needs a valid value: {reason}. {} Use 'field_name: value' or type 'proceed' to continue.",
                        field.label,
                        invalid_hint(field, &reason)
                    ),
                );
            }
        }
    }

    fn dispatch(&self, session: &mut DialogueSession, domain: Domain, out: &mut Vec<Effect>) {
        match build_payload(domain, &session.collected, &self.defaults) {
            Ok(request) => {
                session.phase = Phase::Processing;
                reply(out, PROCESSING);
                out.push(Effect::Dispatch(request));
            }
            Err(e) => {
                error!(error = %e, domain = %domain, "Could not build prediction payload");
                reply(out, format!("❌ Error: {e}"));
            }
        }
    }

    fn on_busy(&self, session: &mut DialogueSession, text: &str, out: &mut Vec<Effect>) {
        if session.pending_inputs.len() < self.pending_limit {
            session.pending_inputs.push_back(text.to_string());
            debug!(queued = session.pending_inputs.len(), "Queued input while processing");
        } else {
            warn!(limit = self.pending_limit, "Pending input queue full, dropping message");
            reply(out, BUSY);
        }
    }

    fn on_resolved(
        &self,
        session: &mut DialogueSession,
        outcome: Result<PredictionResult, DispatchError>,
        out: &mut Vec<Effect>,
    ) {
        if session.phase != Phase::Processing {
            warn!(phase = ?session.phase, "Ignoring prediction outcome outside Processing");
            return;
        }

        match outcome {
            Ok(result) => {
                out.push(Effect::Reply(ChatMessage::report(
                    format_report(&result).to_string(),
                )));
                session.last_result = Some(result);
                session.phase = Phase::ShowingResult;
            }
            Err(e) => {
                warn!(error = %e, "Prediction dispatch failed");
                session.phase = Phase::CollectingOptional;
                reply(
                    out,
                    format!(
                        "❌ Error: {e}\n\nYour answers are saved. Type 'proceed' to try again or adjust optional fields with 'field_name: value'."
                    ),
                );
            }
        }

        // Replay what arrived while waiting; a replayed "proceed" may start
        // another dispatch, which re-queues the rest.
        for text in mem::take(&mut session.pending_inputs) {
            self.on_text(session, &text, out);
        }
    }
}

fn reply(out: &mut Vec<Effect>, text: impl Into<String>) {
    out.push(Effect::Reply(ChatMessage::assistant(text)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use crate::prediction::{CostOverrunPrediction, DelayPrediction};
    use crate::schema::optional_fields;
    use crate::value::FieldValue;

    const ANSWERS: [&str; 6] = [
        "50000000",
        "100",
        "365",
        "Residential/Group Housing",
        "COMPANY",
        "Ahmedabad",
    ];

    fn engine() -> DialogueEngine {
        DialogueEngine::new(ImputationTable::default(), 2)
    }

    fn say(engine: &DialogueEngine, session: DialogueSession, text: &str) -> Transition {
        engine.step(session, Event::UserText(text.to_string()))
    }

    fn only_reply(transition: &Transition) -> &str {
        let replies: Vec<_> = transition.replies().collect();
        assert_eq!(replies.len(), 1, "expected exactly one reply");
        &replies[0].text
    }

    fn ready_for_optional(engine: &DialogueEngine, domain: Domain) -> DialogueSession {
        let opener = match domain {
            Domain::Delay => "Will my project be delayed?",
            Domain::CostOverrun => "Check cost overrun",
        };
        let mut session = say(engine, DialogueSession::new(), opener).session;
        for answer in ANSWERS {
            session = say(engine, session, answer).session;
        }
        assert_eq!(session.phase, Phase::CollectingOptional);
        session
    }

    fn processing(engine: &DialogueEngine, domain: Domain) -> DialogueSession {
        let session = ready_for_optional(engine, domain);
        let t = say(engine, session, "proceed");
        assert_eq!(t.session.phase, Phase::Processing);
        t.session
    }

    fn delay_result() -> PredictionResult {
        PredictionResult::Delay(DelayPrediction {
            is_delayed: true,
            delay_probability: 0.75,
            predicted_delay_days: 40,
            risk_level: "High".into(),
            confidence: "High".into(),
            recommendations: vec!["Consider increasing workforce allocation.".into()],
        })
    }

    #[test]
    fn test_idle_classifies_and_asks_first_field() {
        let t = say(&engine(), DialogueSession::new(), "I want to predict delay");
        assert_eq!(t.session.phase, Phase::CollectingRequired);
        assert_eq!(t.session.mode, Some(Domain::Delay));
        assert_eq!(t.session.required_cursor, 0);
        assert!(only_reply(&t).contains("**Final Project Cost (₹)**"));
        assert!(t.dispatch().is_none());
    }

    #[test]
    fn test_idle_help_and_guidance() {
        let t = say(&engine(), DialogueSession::new(), "help");
        assert_eq!(only_reply(&t), HELP);
        assert_eq!(t.session, DialogueSession::new());

        let t = say(&engine(), DialogueSession::new(), "there is a schedule and budget risk");
        assert_eq!(only_reply(&t), GUIDANCE);
        assert_eq!(t.session.phase, Phase::Idle);
    }

    #[test]
    fn test_required_fields_collected_in_order_for_both_domains() {
        let engine = engine();
        for domain in Domain::ALL {
            let session = ready_for_optional(&engine, domain);
            let keys: Vec<&str> = session.collected.keys().collect();
            let mut expected: Vec<&str> = required_fields(domain).iter().map(|f| f.key).collect();
            expected.sort();
            assert_eq!(keys, expected);
            assert_eq!(session.required_cursor, required_fields(domain).len());
        }
    }

    #[test]
    fn test_optional_prompt_emitted_exactly_once() {
        let engine = engine();
        let mut session = say(&engine, DialogueSession::new(), "cost overrun").session;
        let mut optional_prompts = 0;
        for answer in ANSWERS {
            let t = say(&engine, session, answer);
            if only_reply(&t).contains("proceed") {
                optional_prompts += 1;
            }
            session = t.session;
        }
        assert_eq!(optional_prompts, 1);
    }

    #[test]
    fn test_invalid_numeric_keeps_cursor_and_reprompts() {
        let engine = engine();
        let session = say(&engine, DialogueSession::new(), "delay").session;
        let session = say(&engine, session, "50000000").session;
        assert_eq!(session.required_cursor, 1);

        let t = say(&engine, session.clone(), "a hundred");
        assert_eq!(t.session, session);
        assert!(only_reply(&t).contains("**Total Units**"));
    }

    // Categorical answers are checked against the option list.
    #[test]
    fn test_invalid_categorical_lists_options() {
        let engine = engine();
        let mut session = say(&engine, DialogueSession::new(), "delay").session;
        for answer in &ANSWERS[..3] {
            session = say(&engine, session, answer).session;
        }
        let t = say(&engine, session, "Skyscraper");
        assert_eq!(t.session.required_cursor, 3);
        assert!(only_reply(&t).contains("Options: Residential/Group Housing, Commercial"));

        let t = say(&engine, t.session, "commercial");
        assert_eq!(
            t.session.collected.get("final_project_type"),
            Some(&FieldValue::Text("Commercial".into()))
        );
    }

    #[test]
    fn test_optional_assignment() {
        let engine = engine();
        let session = ready_for_optional(&engine, Domain::Delay);
        let t = say(&engine, session, "avg_temp: 31");
        assert_eq!(t.session.phase, Phase::CollectingOptional);
        assert_eq!(t.session.collected.get("avg_temp"), Some(&FieldValue::Number(31.0)));

        let t = say(&engine, t.session, "Total_Rain : 1,200");
        assert_eq!(t.session.collected.number("total_rain"), Some(1200.0));
    }

    #[test]
    fn test_optional_rejections_leave_state_untouched() {
        let engine = engine();
        let session = ready_for_optional(&engine, Domain::Delay);
        for text in [
            "totalsellingamount: 5",
            "weather: sunny",
            "just some words",
            "a: b: c",
        ] {
            let t = say(&engine, session.clone(), text);
            assert_eq!(t.session, session, "{text}");
            assert_eq!(only_reply(&t), NOT_UNDERSTOOD);
        }

        let t = say(&engine, session.clone(), "avg_temp: warm");
        assert_eq!(t.session, session);
        assert!(only_reply(&t).contains("Average Temperature"));
    }

    #[test]
    fn test_proceed_words() {
        assert!(wants_to_proceed("Proceed"));
        assert!(wants_to_proceed("please continue"));
        assert!(wants_to_proceed("YES"));
        assert!(wants_to_proceed(" y "));
        assert!(!wants_to_proceed("maybe"));
        assert!(!wants_to_proceed("why"));
    }

    #[test]
    fn test_proceed_dispatches_fully_imputed_payload() {
        let engine = engine();
        let session = ready_for_optional(&engine, Domain::CostOverrun);
        let t = say(&engine, session, "proceed");

        assert_eq!(t.session.phase, Phase::Processing);
        let replies: Vec<_> = t.replies().collect();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, PROCESSING);

        let request = t.dispatch().expect("dispatch effect");
        assert_eq!(request.domain, Domain::CostOverrun);
        for field in optional_fields(Domain::CostOverrun) {
            assert!(request.body.contains(field.key), "{} unset", field.key);
        }
        assert_eq!(request.body.number("final_project_cost"), Some(50_000_000.0));
        assert_eq!(request.body.number("totallandcost"), Some(0.2 * 50_000_000.0));
        // Session keeps only what the user typed.
        assert_eq!(t.session.collected.len(), 6);
    }

    #[test]
    fn test_success_shows_report() {
        let engine = engine();
        let session = processing(&engine, Domain::Delay);
        let t = engine.step(session, Event::PredictionResolved(Ok(delay_result())));

        assert_eq!(t.session.phase, Phase::ShowingResult);
        assert_eq!(t.session.last_result, Some(delay_result()));
        let replies: Vec<_> = t.replies().collect();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].kind, MessageKind::Result);
        assert!(replies[0].text.contains("**Predicted Delay:** 40 days"));
    }

    #[test]
    fn test_failure_returns_to_optional_with_data() {
        let engine = engine();
        let session = processing(&engine, Domain::CostOverrun);
        let collected = session.collected.clone();
        let t = engine.step(
            session,
            Event::PredictionResolved(Err(DispatchError::Network("connection refused".into()))),
        );

        assert_eq!(t.session.phase, Phase::CollectingOptional);
        assert_eq!(t.session.collected, collected);
        assert!(only_reply(&t).starts_with("❌ Error: Unable to reach the prediction service"));

        let retry = say(&engine, t.session, "proceed");
        assert!(retry.dispatch().is_some());
    }

    #[test]
    fn test_input_during_processing_is_queued_and_replayed() {
        let engine = engine();
        let session = processing(&engine, Domain::Delay);

        let t = say(&engine, session, "cost overrun please");
        assert!(t.effects.is_empty());
        assert_eq!(t.session.pending_inputs.len(), 1);

        let t = engine.step(t.session, Event::PredictionResolved(Ok(delay_result())));
        let replies: Vec<_> = t.replies().collect();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].kind, MessageKind::Result);
        assert!(replies[1].text.contains("predict cost overrun"));
        assert_eq!(t.session.mode, Some(Domain::CostOverrun));
        assert_eq!(t.session.phase, Phase::CollectingRequired);
        assert!(t.session.pending_inputs.is_empty());
    }

    #[test]
    fn test_queue_overflow_gets_busy_notice() {
        let engine = engine();
        let mut session = processing(&engine, Domain::Delay);
        for text in ["one", "two"] {
            session = say(&engine, session, text).session;
        }
        let t = say(&engine, session, "three");
        assert_eq!(only_reply(&t), BUSY);
        assert_eq!(t.session.pending_inputs, VecDeque::from(["one".to_string(), "two".to_string()]));
    }

    #[test]
    fn test_replayed_proceed_after_failure_dispatches_again() {
        let engine = engine();
        let session = processing(&engine, Domain::Delay);
        let session = say(&engine, session, "proceed").session;
        let session = say(&engine, session, "hello").session;

        let t = engine.step(
            session,
            Event::PredictionResolved(Err(DispatchError::Timeout(std::time::Duration::from_secs(30)))),
        );
        assert_eq!(t.session.phase, Phase::Processing);
        assert!(t.dispatch().is_some());
        assert_eq!(t.session.pending_inputs, VecDeque::from(["hello".to_string()]));
    }

    #[test]
    fn test_result_then_new_text_resets_and_reclassifies() {
        let engine = engine();
        let session = processing(&engine, Domain::Delay);
        let session = engine
            .step(session, Event::PredictionResolved(Ok(delay_result())))
            .session;

        let t = say(&engine, session.clone(), "now the budget overrun");
        assert_eq!(t.session.mode, Some(Domain::CostOverrun));
        assert_eq!(t.session.phase, Phase::CollectingRequired);
        assert!(t.session.collected.is_empty());
        assert_eq!(t.session.required_cursor, 0);

        let t = say(&engine, session, "thanks!");
        assert_eq!(only_reply(&t), ANOTHER_PREDICTION);
        assert_eq!(t.session.mode, None);
        assert_eq!(t.session.phase, Phase::Idle);
        assert!(t.session.collected.is_empty());
    }

    #[test]
    fn test_stale_outcome_is_ignored() {
        let engine = engine();
        let session = ready_for_optional(&engine, Domain::Delay);
        let t = engine.step(session.clone(), Event::PredictionResolved(Ok(delay_result())));
        assert_eq!(t.session, session);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_cost_result_report_kind() {
        let engine = engine();
        let session = processing(&engine, Domain::CostOverrun);
        let result = PredictionResult::CostOverrun(CostOverrunPrediction {
            expected_overrun_percent: 8.0,
            predicted_final_cost: 54_000_000.0,
            risk_level: "Medium".into(),
            intervals: None,
            cost_intervals: None,
            alerts: vec![],
            recommendations: vec![],
            model_version: None,
        });
        let t = engine.step(session, Event::PredictionResolved(Ok(result)));
        assert!(only_reply(&t).contains("₹5,40,00,000"));
    }
}
