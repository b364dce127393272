//! Turn orchestration: message history plus mode in, assistant turn out.
//!
//! Quiet mode runs a gate check before anything is generated; when the gate
//! says no (or cannot be parsed, or the call fails) the turn ends silently.
//! The main generation call is fatal on failure. The follow-up suggestion
//! call is best-effort and degrades to no suggestions.

use std::sync::Arc;

use tracing::{debug, warn};

use alma_core::config::{ChatConfig, LlmConfig};
use alma_core::{ConversationMode, Message, Role, TurnOutcome};
use alma_llm::{ChatMessage, ChatRequest, LanguageModel, MessageRole};

use crate::error::Result;
use crate::modes::{build_system_prompt, suggestion_context};
use crate::parser::{parse_gate_decision, parse_suggestions, GateDecision};

const GATE_TEMPERATURE: f32 = 0.0;
const GATE_MAX_TOKENS: u32 = 150;
const SUGGESTION_TEMPERATURE: f32 = 0.8;
const SUGGESTION_MAX_TOKENS: u32 = 150;
/// How many trailing history turns the suggestion prompt quotes.
const SUGGESTION_HISTORY: usize = 3;

/// Drives a single assistant turn against the generation capability.
pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    temperature: f32,
    max_tokens: u32,
    max_suggestions: usize,
    enable_suggestions: bool,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn LanguageModel>, llm: &LlmConfig, chat: &ChatConfig) -> Self {
        Self {
            model,
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            max_suggestions: chat.max_suggestions,
            enable_suggestions: chat.enable_suggestions,
        }
    }

    /// Produce the assistant turn for the given history and mode. The history
    /// is expected to already end with the user message being answered.
    pub async fn respond(
        &self,
        history: &[Message],
        mode: ConversationMode,
        language: Option<&str>,
    ) -> Result<TurnOutcome> {
        if mode == ConversationMode::Quiet {
            let decision = self.gate_check(history, language).await;
            if !decision.should_respond {
                debug!(reasoning = %decision.reasoning, "gate chose silence");
                let reasoning = if decision.reasoning.is_empty() {
                    None
                } else {
                    Some(decision.reasoning)
                };
                return Ok(TurnOutcome::silent(mode, reasoning));
            }
        }

        let content = self.generate(history, mode, language).await?;

        let suggestions = if self.enable_suggestions {
            self.suggest(history, &content, mode, language).await
        } else {
            Vec::new()
        };

        Ok(TurnOutcome::reply(content, mode, suggestions))
    }

    async fn generate(
        &self,
        history: &[Message],
        mode: ConversationMode,
        language: Option<&str>,
    ) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(build_system_prompt(mode, language)));
        messages.extend(history.iter().map(to_chat_message));

        let request = ChatRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        debug!(
            history = history.len(),
            mode = mode.as_str(),
            "requesting completion"
        );
        let completion = self.model.complete(&request).await?;
        Ok(completion.content)
    }

    /// Quiet-mode gate. Any failure, provider or parse, resolves to silence.
    async fn gate_check(&self, history: &[Message], language: Option<&str>) -> GateDecision {
        let latest = history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let request = ChatRequest::new(vec![ChatMessage::user(build_gate_prompt(
            latest, language,
        ))])
        .with_temperature(GATE_TEMPERATURE)
        .with_max_tokens(GATE_MAX_TOKENS);

        match self.model.complete(&request).await {
            Ok(completion) => parse_gate_decision(&completion.content).unwrap_or_else(|| {
                warn!("gate output was not parseable, staying silent");
                GateDecision {
                    should_respond: false,
                    reasoning: String::new(),
                }
            }),
            Err(e) => {
                warn!(error = %e, "gate check failed, staying silent");
                GateDecision {
                    should_respond: false,
                    reasoning: String::new(),
                }
            }
        }
    }

    /// Best-effort follow-up suggestions. Failures yield an empty list.
    async fn suggest(
        &self,
        history: &[Message],
        last_response: &str,
        mode: ConversationMode,
        language: Option<&str>,
    ) -> Vec<String> {
        let prompt = build_suggestion_prompt(history, last_response, mode, language);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_temperature(SUGGESTION_TEMPERATURE)
            .with_max_tokens(SUGGESTION_MAX_TOKENS);

        match self.model.complete(&request).await {
            Ok(completion) => parse_suggestions(&completion.content, self.max_suggestions),
            Err(e) => {
                warn!(error = %e, "suggestion generation failed");
                Vec::new()
            }
        }
    }
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let role = match message.role {
        Role::User => MessageRole::User,
        Role::Assistant => MessageRole::Assistant,
    };
    ChatMessage::new(role, message.content.clone())
}

fn build_gate_prompt(latest_message: &str, language: Option<&str>) -> String {
    let mut prompt = format!(
        r#"You are the response gate for a conversation in quiet mode. The user is reading or thinking and only wants a reply when they clearly ask for one.

Latest user message:
{latest_message}

Respond only if the message is a direct question or request, expresses clear distress or confusion, explicitly asks for your input, or signals urgency or a safety concern. Stay silent when the user is thinking aloud, processing, or making statements without seeking a reply.

Return a JSON object in the form {{"shouldRespond": true or false, "reasoning": "one short sentence"}}, nothing else."#
    );
    if let Some(language) = language {
        prompt.push_str(&format!(
            "\nWrite the reasoning in the user's language: {language}."
        ));
    }
    prompt
}

fn build_suggestion_prompt(
    history: &[Message],
    last_response: &str,
    mode: ConversationMode,
    language: Option<&str>,
) -> String {
    let start = history.len().saturating_sub(SUGGESTION_HISTORY);
    let context: Vec<String> = history[start..]
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect();

    let mut prompt = format!(
        r#"You are assisting an HR professional. Based on this conversation, generate 3 smart, actionable suggestions that move the user toward their work goals and next steps.

Current mode: {mode_name}
{mode_context}

Conversation context:
{context}

Your last response: {last_response}

Generate 3 brief, goal-oriented suggestions (each under 10 words) written from the USER's perspective. These should:
- Help the user make progress on their HR tasks
- Point toward concrete next actions or decisions
- Be specific to the conversation context, not generic
- Guide the user toward clarity, resolution, or forward movement

Examples of good suggestions:
- "Draft the performance review template now"
- "Schedule the team feedback session this week"
- "Prioritize the urgent hiring decisions first"

Format your response as a JSON array of 3 strings, nothing else. Example: ["suggestion 1", "suggestion 2", "suggestion 3"]"#,
        mode_name = mode.as_str().to_uppercase(),
        mode_context = suggestion_context(mode),
        context = context.join("\n"),
    );
    if let Some(language) = language {
        prompt.push_str(&format!(
            "\nWrite the suggestions in the user's language: {language}."
        ));
    }
    prompt
}
