use crate::error::DialogueError;
use crate::message::{Message, Role};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub(crate) const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Interviewer persona used when the runtime does not supply its own prompt
/// file. `{job_role}` and `{company_name}` are substituted per session.
pub const DEFAULT_PERSONA: &str = r#"You are a professional AI interviewer conducting an interview for a {job_role} position at {company_name}.

Your persona is encouraging, professional, and insightful. Your goal is to have a natural, flowing conversation, not just a list of questions.

RULES:
1. Analyze the candidate's most recent answer and ask a relevant follow-up question.
2. Keep it conversational: your response should logically follow what the candidate just said, never a random next question.
3. Guide the conversation to cover the areas that matter for the role.
4. Stay in character and address the candidate directly.
5. After a reasonable number of exchanges (around 5 to 7), decide whether the interview has reached a natural conclusion. If it has, set "endInterview" to true and make your response a concluding remark rather than another question.

Respond with a JSON object containing exactly two keys: "interviewerResponse" (your next question or comment, as a string) and "endInterview" (a boolean)."#;

/// Everything the engine needs to produce the next interviewer line. The
/// latest answer travels in its own field; `history` ends with the previous
/// interviewer line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueRequest {
    pub job_role: String,
    pub company_name: String,
    pub history: Vec<Message>,
    pub latest_answer: String,
}

/// The engine's decision for one turn. `end_interview` is the only
/// authority on whether the conversation is over.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueTurn {
    pub interviewer_response: String,
    pub end_interview: bool,
}

/// The generative capability behind the interviewer. Mocked in orchestrator
/// tests so turn-taking can be exercised without a network.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait DialogueEngine: Send + Sync {
    async fn next_turn(&self, request: DialogueRequest) -> Result<DialogueTurn, DialogueError>;
}

// Minimal view of a chat completions response.
#[derive(Debug, Deserialize)]
pub(crate) struct LlmResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: String,
}

/// [`DialogueEngine`] backed by the OpenAI chat completions API.
pub struct ChatDialogueEngine {
    client: Client,
    api_key: String,
    model: String,
    persona: String,
}

impl ChatDialogueEngine {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            persona: DEFAULT_PERSONA.to_string(),
        }
    }

    /// Replaces the built-in persona with a template loaded by the runtime.
    pub fn with_persona(mut self, persona: String) -> Self {
        self.persona = persona;
        self
    }
}

#[async_trait]
impl DialogueEngine for ChatDialogueEngine {
    async fn next_turn(&self, request: DialogueRequest) -> Result<DialogueTurn, DialogueError> {
        let body = json!({
            "model": self.model,
            "messages": build_messages(&self.persona, &request),
            "response_format": { "type": "json_object" },
        });

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DialogueError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| DialogueError::Transport(e.to_string()))?
            .json::<LlmResponse>()
            .await
            .map_err(|e| DialogueError::Malformed(e.to_string()))?;

        let content = &resp.choices.first().ok_or(DialogueError::Empty)?.message.content;
        parse_turn(content)
    }
}

pub(crate) fn chat_role(role: Role) -> &'static str {
    match role {
        Role::Candidate => "user",
        Role::Interviewer => "assistant",
    }
}

/// Maps a request onto chat messages: persona as the system message, the
/// history as alternating user/assistant turns, the latest answer last.
fn build_messages(persona: &str, request: &DialogueRequest) -> Vec<serde_json::Value> {
    let system = persona
        .replace("{job_role}", &request.job_role)
        .replace("{company_name}", &request.company_name);

    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(json!({ "role": "system", "content": system }));
    for m in &request.history {
        messages.push(json!({ "role": chat_role(m.role), "content": m.content }));
    }
    messages.push(json!({ "role": "user", "content": request.latest_answer }));
    messages
}

fn parse_turn(content: &str) -> Result<DialogueTurn, DialogueError> {
    serde_json::from_str(content).map_err(|e| DialogueError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DialogueRequest {
        DialogueRequest {
            job_role: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            history: vec![
                Message::interviewer("Tell me about yourself."),
                Message::candidate("I build services in Rust."),
                Message::interviewer("What was your hardest outage?"),
            ],
            latest_answer: "A cascading cache failure.".to_string(),
        }
    }

    #[test]
    fn parses_a_complete_turn() {
        let turn = parse_turn(r#"{"interviewerResponse": "Walk me through it.", "endInterview": false}"#)
            .expect("valid turn");
        assert_eq!(turn.interviewer_response, "Walk me through it.");
        assert!(!turn.end_interview);
    }

    #[test]
    fn missing_end_flag_is_malformed() {
        let err = parse_turn(r#"{"interviewerResponse": "Walk me through it."}"#).unwrap_err();
        assert!(matches!(err, DialogueError::Malformed(_)));
    }

    #[test]
    fn non_json_content_is_malformed() {
        let err = parse_turn("Sure, let's keep going!").unwrap_err();
        assert!(matches!(err, DialogueError::Malformed(_)));
    }

    #[test]
    fn messages_carry_persona_history_and_latest_answer() {
        let messages = build_messages(DEFAULT_PERSONA, &request());

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0]["role"], "system");
        let system = messages[0]["content"].as_str().expect("system content");
        assert!(system.contains("Backend Engineer position at Acme"));
        assert!(!system.contains("{job_role}"));

        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[3]["role"], "assistant");
        assert_eq!(messages[4]["role"], "user");
        assert_eq!(messages[4]["content"], "A cascading cache failure.");
    }
}
