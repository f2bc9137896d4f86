//! Post-interview feedback report generation.

use crate::dialogue::{CHAT_COMPLETIONS_URL, LlmResponse};
use crate::error::DialogueError;
use crate::message::{Message, render_transcript};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Default report prompt. `{job_role}`, `{company_name}` and `{transcript}`
/// are substituted per request.
pub const DEFAULT_FEEDBACK_PROMPT: &str = r#"You are an AI interview feedback generator. Based on the job role, company, and interview transcript below, write a summary report of the candidate's performance.

Job role: {job_role}
Company: {company_name}

Interview transcript:
{transcript}

Respond with a JSON object containing exactly three keys, each a string: "strengths", "weaknesses", and "suggestedImprovements"."#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub job_role: String,
    pub company_name: String,
    pub transcript: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackReport {
    pub strengths: String,
    pub weaknesses: String,
    pub suggested_improvements: String,
}

/// Produces the written report once a session summary is back.
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    async fn review(&self, request: FeedbackRequest) -> Result<FeedbackReport, DialogueError>;
}

/// [`FeedbackGenerator`] backed by the OpenAI chat completions API.
pub struct ChatFeedbackGenerator {
    client: Client,
    api_key: String,
    model: String,
    prompt: String,
}

impl ChatFeedbackGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
            prompt: DEFAULT_FEEDBACK_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: String) -> Self {
        self.prompt = prompt;
        self
    }
}

#[async_trait]
impl FeedbackGenerator for ChatFeedbackGenerator {
    async fn review(&self, request: FeedbackRequest) -> Result<FeedbackReport, DialogueError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": feedback_prompt(&self.prompt, &request) },
            ],
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
        parse_report(content)
    }
}

fn feedback_prompt(template: &str, request: &FeedbackRequest) -> String {
    template
        .replace("{job_role}", &request.job_role)
        .replace("{company_name}", &request.company_name)
        .replace("{transcript}", &render_transcript(&request.transcript))
}

fn parse_report(content: &str) -> Result<FeedbackReport, DialogueError> {
    serde_json::from_str(content).map_err(|e| DialogueError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_profile_and_transcript() {
        let request = FeedbackRequest {
            job_role: "Data Analyst".to_string(),
            company_name: "Initech".to_string(),
            transcript: vec![
                Message::interviewer("Why Initech?"),
                Message::candidate("I like spreadsheets."),
            ],
        };

        let prompt = feedback_prompt(DEFAULT_FEEDBACK_PROMPT, &request);
        assert!(prompt.contains("Job role: Data Analyst"));
        assert!(prompt.contains("Company: Initech"));
        assert!(prompt.contains("Interviewer: Why Initech?"));
        assert!(prompt.contains("Candidate: I like spreadsheets."));
        assert!(!prompt.contains("{transcript}"));
    }

    #[test]
    fn parses_a_report() {
        let report = parse_report(
            r#"{"strengths": "Clear examples.", "weaknesses": "Rambling.", "suggestedImprovements": "Use STAR."}"#,
        )
        .expect("valid report");
        assert_eq!(report.strengths, "Clear examples.");
        assert_eq!(report.suggested_improvements, "Use STAR.");
    }

    #[test]
    fn report_missing_a_field_is_malformed() {
        let err = parse_report(r#"{"strengths": "Clear examples."}"#).unwrap_err();
        assert!(matches!(err, DialogueError::Malformed(_)));
    }
}
