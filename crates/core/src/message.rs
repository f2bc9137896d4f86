use serde::{Deserialize, Serialize};

/// Who said a line of the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Candidate,
    Interviewer,
}

/// One line of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn candidate(content: impl Into<String>) -> Self {
        Self {
            role: Role::Candidate,
            content: content.into(),
        }
    }

    pub fn interviewer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            content: content.into(),
        }
    }
}

/// Renders a history as a plain-text transcript, one speaker-tagged line per
/// message. Used for the feedback prompt and for logging.
pub fn render_transcript(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::Candidate => "Candidate",
                Role::Interviewer => "Interviewer",
            };
            format!("{speaker}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_tags_each_speaker() {
        let history = vec![
            Message::interviewer("Tell me about yourself."),
            Message::candidate("I have five years of experience."),
        ];
        assert_eq!(
            render_transcript(&history),
            "Interviewer: Tell me about yourself.\nCandidate: I have five years of experience."
        );
    }

    #[test]
    fn transcript_of_empty_history_is_empty() {
        assert_eq!(render_transcript(&[]), "");
    }
}
