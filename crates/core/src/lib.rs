pub mod capture;
pub mod dialogue;
pub mod error;
pub mod feedback;
pub mod message;
pub mod playback;
pub mod session;
pub mod synthesis;

use crate::message::Message;
use crate::session::InterviewStatus;

/// Candidate actions fed into a running [`session::InterviewSession`].
///
/// This enum is the only way a frontend (terminal, web, test harness) can
/// steer the conversation; the orchestrator decides whether an action is
/// legal in the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// The microphone button: starts a capture from `Idle`, finalizes an
    /// in-flight capture from `Listening`, ignored everywhere else.
    ToggleMic,
    /// Hang up. Valid in any state, idempotent.
    EndInterview,
}

/// Observable output of a running session, emitted over an mpsc channel so
/// the runtime rendering the conversation stays decoupled from the state
/// machine that drives it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The orchestrator moved to a new status.
    Status(InterviewStatus),
    /// A message was appended to the conversation history.
    Line(Message),
    /// A recoverable problem the candidate should hear about.
    Notice(SessionNotice),
}

/// Non-fatal conditions surfaced to the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    /// Speech recognition does not exist in this runtime. Emitted at most
    /// once, before the session settles into a text-less idle.
    CaptureUnavailable(String),
    /// A capture attempt failed mid-session; the candidate may retry.
    CaptureFailed(String),
    /// The dialogue engine failed or timed out; the candidate may retry.
    DialogueFailed(String),
    /// Synthesis or playback failed; the conversation continues text-only.
    AudioUnavailable(String),
}
