mod config;
mod mic_adapter;
mod playback_adapter;
mod prompt_loader;
mod transcriber;
mod voice_adapter;

use crate::config::{Config, INPUT_CHUNK_SIZE, OUTPUT_CHUNK_SIZE, OUTPUT_LATENCY_MS};
use crate::mic_adapter::{EndpointConfig, MicCapture};
use crate::playback_adapter::{LineOutPlayer, MutePlayer};
use crate::transcriber::WhisperTranscriber;
use crate::voice_adapter::OpenAiVoice;
use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{BufferSize, FrameCount, StreamConfig};
use greenroom_core::feedback::{ChatFeedbackGenerator, FeedbackGenerator, FeedbackRequest};
use greenroom_core::dialogue::ChatDialogueEngine;
use greenroom_core::message::Role;
use greenroom_core::playback::AudioPlayer;
use greenroom_core::session::{InterviewProfile, InterviewSession, SessionConfig};
use greenroom_core::{SessionEvent, SessionInput};
use greenroom_native_utils::{audio, device};
use ringbuf::traits::{Consumer, Split};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(about = "Rehearse a spoken mock interview from the terminal")]
struct Cli {
    /// The job role to rehearse for
    job_role: String,
    /// The company the mock interview is for
    company_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let profile = InterviewProfile {
        job_role: args.job_role.clone(),
        company_name: args.company_name.clone(),
    };

    // --- 4. Load Prompt Overrides ---
    let prompts = prompt_loader::load_prompts(Path::new("prompts"))
        .context("Failed to load prompt overrides")?;
    tracing::info!("Loaded {} prompt override(s).", prompts.len());

    // --- 5. Build the Dialogue and Feedback Engines ---
    let mut dialogue =
        ChatDialogueEngine::new(config.openai_api_key.clone(), config.chat_model.clone());
    if let Some(persona) = prompts.get("interviewer") {
        dialogue = dialogue.with_persona(persona.clone());
    }
    let mut reviewer =
        ChatFeedbackGenerator::new(config.openai_api_key.clone(), config.chat_model.clone());
    if let Some(prompt) = prompts.get("feedback") {
        reviewer = reviewer.with_prompt(prompt.clone());
    }
    let voice = OpenAiVoice::new(
        config.openai_api_key.clone(),
        config.speech_model.clone(),
        config.speech_voice.clone(),
    );

    // --- 6. Microphone Capture ---
    // The stream callback pushes mono chunks into the channel while the
    // gate is raised; the capture adapter owns the other end. A missing
    // device degrades to an unavailable adapter instead of failing startup,
    // so the session itself can surface the condition.
    let gate = Arc::new(AtomicBool::new(false));
    let (chunk_tx, chunk_rx) = tokio::sync::mpsc::channel::<Vec<f32>>(256);
    let transcriber = WhisperTranscriber::new(
        config.openai_api_key.clone(),
        config.transcribe_model.clone(),
    );
    let mut _input_stream = None;
    let capture = match build_microphone(Arc::clone(&gate), chunk_tx) {
        Ok((stream, sample_rate)) => {
            _input_stream = Some(stream);
            MicCapture::new(transcriber, gate, chunk_rx, sample_rate, EndpointConfig::default())
        }
        Err(e) => {
            tracing::warn!(error = %e, "no usable input device");
            MicCapture::unavailable(transcriber, chunk_rx, e.to_string())
        }
    };

    // --- 7. Speaker Playback ---
    let purge = Arc::new(AtomicBool::new(false));
    let mut _output_stream = None;
    let player: Box<dyn AudioPlayer> = match build_speaker(Arc::clone(&purge)) {
        Ok((stream, line_out)) => {
            _output_stream = Some(stream);
            Box::new(line_out)
        }
        Err(e) => {
            tracing::warn!(error = %e, "no usable output device, interview will run text-only");
            Box::new(MutePlayer)
        }
    };

    // --- 8. Run the Session ---
    let (event_tx, mut events) = tokio::sync::mpsc::channel(64);
    let (input_tx, input_rx) = tokio::sync::mpsc::channel(8);
    let session = InterviewSession::new(
        profile,
        Arc::new(dialogue),
        Box::new(capture),
        Arc::new(voice),
        player,
        event_tx,
        SessionConfig::default(),
    );
    let session_task = tokio::spawn(session.run(input_rx));

    println!("Mock interview: {} at {}.", args.job_role, args.company_name);
    println!("Press Enter to toggle the microphone; type \"end\" to hang up.");

    // --- 9. Terminal Control ---
    let control = tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let input = match line.trim().to_lowercase().as_str() {
                "" | "m" | "mic" => SessionInput::ToggleMic,
                "end" | "quit" | "q" => SessionInput::EndInterview,
                other => {
                    tracing::debug!(command = %other, "unrecognized command");
                    continue;
                }
            };
            let hang_up = input == SessionInput::EndInterview;
            if input_tx.send(input).await.is_err() || hang_up {
                break;
            }
        }
    });

    // --- 10. Render the Conversation ---
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Status(status) => tracing::info!(%status, "session status"),
            SessionEvent::Line(message) => {
                let speaker = match message.role {
                    Role::Interviewer => "Interviewer",
                    Role::Candidate => "You",
                };
                println!("{speaker}: {}", message.content);
            }
            SessionEvent::Notice(notice) => tracing::warn!(?notice, "session notice"),
        }
    }

    let summary = session_task.await.context("session task failed")?;
    control.abort();

    if summary.concluded {
        println!("\nThe interviewer concluded the interview.");
    } else {
        println!("\nInterview ended.");
    }

    // --- 11. Feedback Report ---
    if summary.transcript.iter().any(|m| m.role == Role::Candidate) {
        println!("Generating feedback...");
        let request = FeedbackRequest {
            job_role: args.job_role,
            company_name: args.company_name,
            transcript: summary.transcript,
        };
        match reviewer.review(request).await {
            Ok(report) => {
                println!("\nStrengths:\n{}", report.strengths);
                println!("\nWeaknesses:\n{}", report.weaknesses);
                println!("\nSuggested improvements:\n{}", report.suggested_improvements);
            }
            Err(e) => tracing::warn!(error = %e, "feedback generation failed"),
        }
    }

    Ok(())
}

/// Opens the default input device and starts a stream that feeds mono f32
/// chunks into the capture channel whenever the gate is raised.
fn build_microphone(
    gate: Arc<AtomicBool>,
    chunk_tx: tokio::sync::mpsc::Sender<Vec<f32>>,
) -> Result<(cpal::Stream, u32)> {
    let input = device::get_or_default_input(None)?;
    tracing::info!("Using input device: {:?}", input.name()?);

    let default_config = input
        .default_input_config()
        .context("Failed to get default input config")?;
    let stream_config = StreamConfig {
        channels: default_config.channels(),
        sample_rate: default_config.sample_rate(),
        buffer_size: BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
    };
    let channel_count = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate.0;
    tracing::debug!("Input stream config: {:?}", &stream_config);

    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        if !gate.load(Ordering::Acquire) {
            return;
        }
        let mono = if channel_count > 1 {
            data.chunks(channel_count)
                .map(|frame| frame.iter().sum::<f32>() / channel_count as f32)
                .collect::<Vec<f32>>()
        } else {
            data.to_vec()
        };
        if let Err(e) = chunk_tx.try_send(mono) {
            tracing::warn!("Failed to send audio chunk to capture: {:?}", e);
        }
    };

    let stream = input.build_input_stream(
        &stream_config,
        input_data_fn,
        |err| tracing::error!("An error occurred on the input stream: {err}"),
        None,
    )?;
    stream.play()?;
    Ok((stream, sample_rate))
}

/// Opens the default output device and starts a stream that plays whatever
/// the `LineOutPlayer` pushes into the shared ring buffer. The purge flag
/// makes the callback discard queued audio on a stop request.
fn build_speaker(purge: Arc<AtomicBool>) -> Result<(cpal::Stream, LineOutPlayer)> {
    let output = device::get_or_default_output(None)?;
    tracing::info!("Using output device: {:?}", output.name()?);

    let default_config = output
        .default_output_config()
        .context("Failed to get default output config")?;
    let stream_config = StreamConfig {
        channels: default_config.channels(),
        sample_rate: default_config.sample_rate(),
        buffer_size: BufferSize::Fixed(FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
    };
    let channel_count = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate.0;
    tracing::debug!("Output stream config: {:?}", &stream_config);

    let buffer = audio::shared_buffer(sample_rate as usize * OUTPUT_LATENCY_MS / 1000);
    let (producer, mut consumer) = buffer.split();

    let callback_purge = Arc::clone(&purge);
    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        if callback_purge.load(Ordering::Acquire) {
            while consumer.try_pop().is_some() {}
        }
        for frame in data.chunks_mut(channel_count) {
            let sample = consumer.try_pop().unwrap_or(0.0);
            for slot in frame {
                *slot = sample;
            }
        }
    };

    let stream = output.build_output_stream(
        &stream_config,
        output_data_fn,
        |err| tracing::error!("An error occurred on the output stream: {err}"),
        None,
    )?;
    stream.play()?;
    Ok((stream, LineOutPlayer::new(producer, sample_rate, purge)))
}
