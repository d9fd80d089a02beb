//! Integration tests for the voice pipeline (STT -> Agent -> TTS)

mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

use common::{project, Reply, ScriptedBackend, ScriptedStt, StaticRetriever, TaggedTts};
use realty_agent_agent::{
    AgentError, ChatSession, ListenerPhase, RealtyAgent, Responder, UtterancePhase,
    VoiceSession, VoiceSessionConfig, VoiceSessionEvent,
};
use realty_agent_core::{AudioFrame, Language, TranscriptEvent};

fn voice_session(
    reply: Reply,
    script: Vec<TranscriptEvent>,
    tts: Arc<TaggedTts>,
) -> (VoiceSession, Arc<ChatSession>) {
    let backend = ScriptedBackend::new("English", reply);
    let retriever = StaticRetriever::new(vec![project("Hill Crest, Lonavala")]);
    let agent: Arc<dyn Responder> = Arc::new(RealtyAgent::new(backend, retriever, 15));
    let chat = Arc::new(ChatSession::new("voice-test", agent, 40));
    let session = VoiceSession::new(
        Arc::clone(&chat),
        ScriptedStt::new(script),
        tts,
        VoiceSessionConfig::default(),
    );
    (session, chat)
}

/// Runs the session over a few silent frames and returns the reply audio
async fn run_session(session: &VoiceSession) -> (Result<(), AgentError>, Vec<AudioFrame>) {
    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(64);

    for _ in 0..4 {
        in_tx
            .send(AudioFrame::pcm16(vec![0; 640], 16000))
            .await
            .unwrap();
    }
    drop(in_tx);

    let outcome = timeout(Duration::from_secs(5), session.run(in_rx, out_tx))
        .await
        .expect("voice session did not finish");

    let mut frames = Vec::new();
    while let Some(frame) = out_rx.recv().await {
        frames.push(frame);
    }
    (outcome, frames)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<VoiceSessionEvent>) -> Vec<VoiceSessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_two_quick_finals_both_answered() {
    let tts = TaggedTts::new(3);
    let (session, chat) = voice_session(
        Reply::Echo,
        vec![
            TranscriptEvent::interim("show me"),
            TranscriptEvent::final_text("Show me villas"),
            TranscriptEvent::final_text("And flats in Pune"),
        ],
        Arc::clone(&tts),
    );
    let mut events = session.subscribe();

    let (outcome, frames) = run_session(&session).await;
    assert!(outcome.is_ok());
    assert_eq!(session.phase(), ListenerPhase::Ended);

    // both replies spoken, each as one uninterrupted run of frames
    let tags: Vec<String> = frames
        .iter()
        .map(|f| String::from_utf8(f.data.clone()).unwrap())
        .collect();
    assert_eq!(tags.len(), 6);
    assert_eq!(tags.iter().filter(|t| *t == "Reply to Show me villas").count(), 3);
    assert_eq!(tags.iter().filter(|t| *t == "Reply to And flats in Pune").count(), 3);
    let switches = tags.windows(2).filter(|w| w[0] != w[1]).count();
    assert_eq!(switches, 1);

    assert_eq!(chat.history().len(), 4);

    let requests = tts.requests.lock();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|(_, voice)| voice.language == Language::English));
    drop(requests);

    let events = drain(&mut events);
    let completed = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                VoiceSessionEvent::Utterance {
                    phase: UtterancePhase::Completed,
                    ..
                }
            )
        })
        .count();
    assert_eq!(completed, 2);
    assert!(events
        .iter()
        .any(|e| matches!(e, VoiceSessionEvent::Transcript { is_final: false, .. })));
    assert!(matches!(events.last(), Some(VoiceSessionEvent::Ended { .. })));
}

#[tokio::test]
async fn test_empty_final_is_discarded() {
    let tts = TaggedTts::new(2);
    let (session, chat) = voice_session(
        Reply::Echo,
        vec![TranscriptEvent::final_text("   ")],
        Arc::clone(&tts),
    );

    let (outcome, frames) = run_session(&session).await;
    assert!(outcome.is_ok());
    assert!(frames.is_empty());
    assert!(chat.history().is_empty());
    assert!(tts.requests.lock().is_empty());
}

#[tokio::test]
async fn test_pipeline_failure_is_silent() {
    let tts = TaggedTts::new(2);
    let (session, chat) = voice_session(
        Reply::Fail,
        vec![TranscriptEvent::final_text("Is Hill Crest ready to move?")],
        Arc::clone(&tts),
    );
    let mut events = session.subscribe();

    let (outcome, frames) = run_session(&session).await;
    assert!(outcome.is_ok());
    assert!(frames.is_empty());
    // the user turn is kept, no assistant turn
    assert_eq!(chat.history().len(), 1);

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        VoiceSessionEvent::Error {
            utterance_id: Some(1),
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        VoiceSessionEvent::Utterance {
            utterance_id: 1,
            phase: UtterancePhase::Failed
        }
    )));
}

#[tokio::test]
async fn test_session_runs_once() {
    let (session, _chat) = voice_session(Reply::Echo, Vec::new(), TaggedTts::new(1));
    let (outcome, _) = run_session(&session).await;
    assert!(outcome.is_ok());

    let (outcome, _) = run_session(&session).await;
    assert!(matches!(outcome, Err(AgentError::Conversation(_))));
}
