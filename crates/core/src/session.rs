//! The conversation orchestrator.
//!
//! [`InterviewSession`] owns one interview attempt: the profile, the
//! append-only history, the status state machine, and the three capability
//! adapters. It runs as a single task; candidate actions arrive over an
//! input channel and every await on an adapter is raced against that channel
//! with `select!`, so termination and mic actions interleave only at the
//! defined suspension points. Capture and playback can therefore never run
//! at the same time, and at most one dialogue-engine call is ever in flight.

use crate::capture::{Availability, SpeechCapture};
use crate::dialogue::{DialogueEngine, DialogueRequest, DialogueTurn};
use crate::error::{CaptureError, DialogueError, PlaybackError, SynthesisError};
use crate::message::Message;
use crate::playback::AudioPlayer;
use crate::synthesis::{AudioClip, SpeechSynthesizer};
use crate::{SessionEvent, SessionInput, SessionNotice};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The interviewer's scripted opening. It is driven through synthesis and
/// playback only; the dialogue engine is not consulted for it.
pub const OPENING_LINE: &str = "Hello, thank you for coming in today. To start, could you tell me a little bit about yourself and your background?";

/// Where the session is in its turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewStatus {
    Idle,
    Listening,
    Processing,
    Speaking,
    Finished,
}

impl std::fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InterviewStatus::Idle => "idle",
            InterviewStatus::Listening => "listening",
            InterviewStatus::Processing => "processing",
            InterviewStatus::Speaking => "speaking",
            InterviewStatus::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// The role and company this attempt is rehearsing for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewProfile {
    pub job_role: String,
    pub company_name: String,
}

/// Orchestrator policy knobs. The timeouts bound the external calls so the
/// session can never hang in `Processing` or `Speaking`; the closing grace
/// lets the final line be heard before the session locks.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub dialogue_timeout: Duration,
    pub synthesis_timeout: Duration,
    pub closing_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialogue_timeout: Duration::from_secs(30),
            synthesis_timeout: Duration::from_secs(20),
            closing_grace: Duration::from_secs(3),
        }
    }
}

/// What a finished session leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub transcript: Vec<Message>,
    /// True when the dialogue engine concluded the interview, false when the
    /// candidate hung up first (or never got past the capability gate).
    pub concluded: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Ended,
}

enum Listened {
    Heard(String),
    Failed(CaptureError),
    Terminated,
}

enum Consulted {
    Turn(DialogueTurn),
    Failed(DialogueError),
    Terminated,
}

pub struct InterviewSession {
    profile: InterviewProfile,
    history: Vec<Message>,
    status: InterviewStatus,
    end_requested: bool,
    engine: Arc<dyn DialogueEngine>,
    capture: Box<dyn SpeechCapture>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    player: Box<dyn AudioPlayer>,
    events: mpsc::Sender<SessionEvent>,
    config: SessionConfig,
}

impl InterviewSession {
    pub fn new(
        profile: InterviewProfile,
        engine: Arc<dyn DialogueEngine>,
        capture: Box<dyn SpeechCapture>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        player: Box<dyn AudioPlayer>,
        events: mpsc::Sender<SessionEvent>,
        config: SessionConfig,
    ) -> Self {
        Self {
            profile,
            history: Vec::new(),
            status: InterviewStatus::Idle,
            end_requested: false,
            engine,
            capture,
            synthesizer,
            player,
            events,
            config,
        }
    }

    /// Drives the session until it reaches `Finished`, consuming it.
    ///
    /// Closing the input channel is equivalent to hanging up.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<SessionInput>) -> SessionSummary {
        // Capability gate: probed once, before anything else. An unavailable
        // recognizer permanently blocks the idle-to-listening transition.
        if let Availability::Unavailable(reason) = self.capture.availability() {
            tracing::warn!(%reason, "speech capture unavailable, session cannot proceed");
            self.emit(SessionEvent::Notice(SessionNotice::CaptureUnavailable(reason)))
                .await;
            loop {
                match inputs.recv().await {
                    Some(SessionInput::ToggleMic) => {
                        tracing::debug!("mic toggle ignored: capture capability unavailable");
                    }
                    Some(SessionInput::EndInterview) | None => {
                        self.finish().await;
                        return self.into_summary();
                    }
                }
            }
        }

        // Opening bootstrap: the greeting goes straight to synthesis, no
        // dialogue round trip.
        self.append(Message::interviewer(OPENING_LINE)).await;
        if self.speak(OPENING_LINE, &mut inputs).await == Flow::Ended {
            return self.into_summary();
        }

        while self.status != InterviewStatus::Finished {
            match inputs.recv().await {
                Some(SessionInput::ToggleMic) => {
                    if self.status == InterviewStatus::Idle {
                        if self.take_turn(&mut inputs).await == Flow::Ended {
                            break;
                        }
                    } else {
                        tracing::debug!(status = %self.status, "mic toggle ignored outside idle");
                    }
                }
                Some(SessionInput::EndInterview) | None => {
                    self.finish().await;
                    break;
                }
            }
        }

        self.into_summary()
    }

    /// One capture-to-playback cycle: listening, processing, speaking.
    async fn take_turn(&mut self, inputs: &mut mpsc::Receiver<SessionInput>) -> Flow {
        self.set_status(InterviewStatus::Listening).await;

        let transcript = match self.listen(inputs).await {
            Listened::Terminated => {
                self.finish().await;
                return Flow::Ended;
            }
            Listened::Failed(e) => {
                tracing::warn!(error = %e, "capture failed, returning to idle");
                self.emit(SessionEvent::Notice(SessionNotice::CaptureFailed(e.to_string())))
                    .await;
                self.set_status(InterviewStatus::Idle).await;
                return Flow::Continue;
            }
            Listened::Heard(t) => t,
        };

        let answer = transcript.trim().to_string();
        if answer.is_empty() {
            tracing::debug!("capture finalized without speech, nothing to submit");
            self.set_status(InterviewStatus::Idle).await;
            return Flow::Continue;
        }

        self.set_status(InterviewStatus::Processing).await;
        let turn = match self.consult_engine(&answer, inputs).await {
            Consulted::Terminated => {
                self.finish().await;
                return Flow::Ended;
            }
            Consulted::Failed(e) => {
                tracing::warn!(error = %e, "dialogue engine failed, returning to idle");
                self.emit(SessionEvent::Notice(SessionNotice::DialogueFailed(e.to_string())))
                    .await;
                self.set_status(InterviewStatus::Idle).await;
                return Flow::Continue;
            }
            Consulted::Turn(turn) => turn,
        };

        // Both lines land together, only once the engine has actually
        // produced a response; a failed call leaves history untouched.
        self.append(Message::candidate(answer)).await;
        self.append(Message::interviewer(turn.interviewer_response.clone()))
            .await;
        self.end_requested = turn.end_interview;

        self.speak(&turn.interviewer_response, inputs).await
    }

    /// Waits out one capture, racing the input channel. A mic toggle here is
    /// a manual stop; termination cancels the capture outright.
    async fn listen(&mut self, inputs: &mut mpsc::Receiver<SessionInput>) -> Listened {
        enum Raced {
            Finalized(Result<String, CaptureError>),
            ManualStop,
            Terminate,
        }

        let raced = {
            let mut capturing = self.capture.capture();
            loop {
                // Input-first polling: a queued stop or hang-up wins over a
                // simultaneously finalized transcript.
                tokio::select! {
                    biased;
                    input = inputs.recv() => match input {
                        Some(SessionInput::ToggleMic) => break Raced::ManualStop,
                        Some(SessionInput::EndInterview) | None => break Raced::Terminate,
                    },
                    res = &mut capturing => break Raced::Finalized(res),
                }
            }
        };

        match raced {
            Raced::Finalized(Ok(t)) => Listened::Heard(t),
            Raced::Finalized(Err(e)) => Listened::Failed(e),
            Raced::ManualStop => match self.capture.finish().await {
                Ok(t) => Listened::Heard(t),
                Err(e) => Listened::Failed(e),
            },
            Raced::Terminate => {
                self.capture.cancel();
                Listened::Terminated
            }
        }
    }

    /// The single outstanding dialogue-engine call for this turn, under the
    /// configured timeout. The state guard keeps the mic locked while it is
    /// in flight; termination drops the call and discards its result.
    async fn consult_engine(
        &mut self,
        answer: &str,
        inputs: &mut mpsc::Receiver<SessionInput>,
    ) -> Consulted {
        let engine = Arc::clone(&self.engine);
        let request = DialogueRequest {
            job_role: self.profile.job_role.clone(),
            company_name: self.profile.company_name.clone(),
            history: self.history.clone(),
            latest_answer: answer.to_string(),
        };
        let deadline = self.config.dialogue_timeout;
        let mut call =
            Box::pin(async move { tokio::time::timeout(deadline, engine.next_turn(request)).await });

        loop {
            // Input-first polling so mic presses made while the call is in
            // flight are consumed (and discarded) rather than left queued to
            // fire once the session is idle again.
            tokio::select! {
                biased;
                input = inputs.recv() => match input {
                    Some(SessionInput::ToggleMic) => {
                        tracing::debug!("mic toggle ignored while processing");
                    }
                    Some(SessionInput::EndInterview) | None => break Consulted::Terminated,
                },
                res = &mut call => break match res {
                    Err(_) => Consulted::Failed(DialogueError::Timeout),
                    Ok(Err(e)) => Consulted::Failed(e),
                    Ok(Ok(turn)) => Consulted::Turn(turn),
                },
            }
        }
    }

    /// Synthesizes and plays one interviewer line, then settles into idle or,
    /// when the engine has concluded the interview, into the grace period.
    /// Synthesis and playback failures degrade to text-only continuation.
    async fn speak(&mut self, line: &str, inputs: &mut mpsc::Receiver<SessionInput>) -> Flow {
        enum Synthesized {
            Clip(AudioClip),
            Failed(SynthesisError),
            Terminated,
        }

        let synthesized = {
            let synthesizer = Arc::clone(&self.synthesizer);
            let text = line.to_string();
            let deadline = self.config.synthesis_timeout;
            let mut synthesis = Box::pin(async move {
                match tokio::time::timeout(deadline, synthesizer.synthesize(&text)).await {
                    Err(_) => Err(SynthesisError::Timeout),
                    Ok(res) => res,
                }
            });
            loop {
                tokio::select! {
                    biased;
                    input = inputs.recv() => match input {
                        Some(SessionInput::ToggleMic) => {
                            tracing::debug!("mic toggle ignored while synthesizing");
                        }
                        Some(SessionInput::EndInterview) | None => break Synthesized::Terminated,
                    },
                    res = &mut synthesis => break match res {
                        Ok(clip) => Synthesized::Clip(clip),
                        Err(e) => Synthesized::Failed(e),
                    },
                }
            }
        };

        let clip = match synthesized {
            Synthesized::Terminated => {
                self.finish().await;
                return Flow::Ended;
            }
            Synthesized::Failed(e) => {
                tracing::warn!(error = %e, "synthesis failed, continuing text-only");
                self.emit(SessionEvent::Notice(SessionNotice::AudioUnavailable(e.to_string())))
                    .await;
                return self.settle_after_line(inputs).await;
            }
            Synthesized::Clip(clip) => clip,
        };

        self.set_status(InterviewStatus::Speaking).await;

        enum Played {
            Done(Result<(), PlaybackError>),
            Terminated,
        }

        let played = {
            let mut playing = self.player.play(clip);
            loop {
                tokio::select! {
                    biased;
                    input = inputs.recv() => match input {
                        Some(SessionInput::ToggleMic) => {
                            tracing::debug!("mic toggle ignored while speaking");
                        }
                        Some(SessionInput::EndInterview) | None => break Played::Terminated,
                    },
                    res = &mut playing => break Played::Done(res),
                }
            }
        };

        match played {
            Played::Terminated => {
                self.finish().await;
                Flow::Ended
            }
            Played::Done(Err(e)) => {
                tracing::warn!(error = %e, "playback failed, continuing text-only");
                self.emit(SessionEvent::Notice(SessionNotice::AudioUnavailable(e.to_string())))
                    .await;
                self.settle_after_line(inputs).await
            }
            Played::Done(Ok(())) => self.settle_after_line(inputs).await,
        }
    }

    /// After an interviewer line has been delivered (or audio gave up): back
    /// to idle for the next turn, unless the engine concluded the interview,
    /// in which case the closing grace runs and the session finishes. The
    /// engine's flag is the only authority here; there is no turn counting.
    async fn settle_after_line(&mut self, inputs: &mut mpsc::Receiver<SessionInput>) -> Flow {
        if !self.end_requested {
            self.set_status(InterviewStatus::Idle).await;
            return Flow::Continue;
        }

        let grace = tokio::time::sleep(self.config.closing_grace);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                biased;
                input = inputs.recv() => match input {
                    Some(SessionInput::ToggleMic) => {
                        tracing::debug!("mic toggle ignored after conclusion");
                    }
                    Some(SessionInput::EndInterview) | None => break,
                },
                _ = &mut grace => break,
            }
        }

        self.finish().await;
        Flow::Ended
    }

    /// Moves to `Finished` exactly once, discarding any queued audio.
    async fn finish(&mut self) {
        if self.status == InterviewStatus::Finished {
            return;
        }
        if let Err(e) = self.player.stop().await {
            tracing::debug!(error = %e, "failed to stop playback while finishing");
        }
        self.set_status(InterviewStatus::Finished).await;
    }

    async fn append(&mut self, message: Message) {
        self.history.push(message.clone());
        self.emit(SessionEvent::Line(message)).await;
    }

    async fn set_status(&mut self, status: InterviewStatus) {
        self.status = status;
        self.emit(SessionEvent::Status(status)).await;
    }

    async fn emit(&self, event: SessionEvent) {
        // A dropped receiver means nobody is rendering the session anymore;
        // the state machine itself is unaffected.
        if self.events.send(event).await.is_err() {
            tracing::debug!("event receiver dropped");
        }
    }

    fn into_summary(self) -> SessionSummary {
        SessionSummary {
            transcript: self.history,
            concluded: self.end_requested,
        }
    }
}
