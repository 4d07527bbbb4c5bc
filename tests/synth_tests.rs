// Tests for the single-playback guarantee and the overlap policy.

mod common;

use anyhow::Result;
use capture_relay::error::SynthesisError;
use capture_relay::synth::{OverlapPolicy, SpeechSynthesizer};
use common::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test]
async fn queue_policy_serializes_playbacks() -> Result<()> {
    let engine = Arc::new(CountingVoiceEngine::new());
    let sink = Arc::new(TimedSink::new(Duration::from_millis(50)));
    let synth = SpeechSynthesizer::new(
        Arc::clone(&engine) as _,
        Arc::clone(&sink) as _,
        OverlapPolicy::Queue,
    );

    let started = Instant::now();
    let first = synth.speak("one").await?;
    // The second speak waits for the first playback's slot
    let second = synth.speak("two").await?;
    second.finished().await;
    first.finished().await;

    assert!(
        started.elapsed() >= Duration::from_millis(100),
        "playbacks must not overlap"
    );
    assert_eq!(engine.spoken_texts(), vec!["one".to_string(), "two".to_string()]);
    Ok(())
}

#[tokio::test]
async fn reject_policy_refuses_overlapping_playback() -> Result<()> {
    let engine = Arc::new(CountingVoiceEngine::new());
    let sink = Arc::new(TimedSink::new(Duration::from_millis(50)));
    let synth = SpeechSynthesizer::new(
        Arc::clone(&engine) as _,
        Arc::clone(&sink) as _,
        OverlapPolicy::Reject,
    );

    let first = synth.speak("one").await?;
    let second = synth.speak("two").await;

    assert!(matches!(second, Err(SynthesisError::Busy)));
    first.finished().await;

    // After the first playback ends, the slot is free again
    let third = synth.speak("three").await?;
    third.finished().await;

    assert_eq!(
        engine.spoken_texts(),
        vec!["one".to_string(), "three".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn synthesis_failure_releases_the_slot() -> Result<()> {
    let engine = Arc::new(CountingVoiceEngine::failing());
    let sink = Arc::new(TimedSink::new(Duration::from_millis(5)));
    let synth = SpeechSynthesizer::new(
        Arc::clone(&engine) as _,
        Arc::clone(&sink) as _,
        OverlapPolicy::Reject,
    );

    assert!(synth.speak("one").await.is_err());
    // The failed attempt must not leave the playback slot held
    assert!(matches!(
        synth.speak("two").await,
        Err(SynthesisError::SynthesisFailed(_))
    ));
    Ok(())
}
