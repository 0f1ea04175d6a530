// Half-duplex gating and the speak/acknowledge cycle

mod common;

use common::{segmenter_config, speech, utterance_chunks, CHUNK_BYTES};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use voice_agent::protocol::{OutboundFrame, ServerMessage};
use voice_agent::services::BrowserSynthesizer;
use voice_agent::session::SessionCounters;
use voice_agent::{AudioSegment, DuplexController, DuplexState, PlaybackOutcome, Segmenter};

struct Harness {
    duplex: Arc<DuplexController>,
    segmenter: Arc<Segmenter>,
    segments: mpsc::UnboundedReceiver<AudioSegment>,
    outbound: mpsc::UnboundedReceiver<OutboundFrame>,
    counters: Arc<SessionCounters>,
}

fn harness(ack_timeout: Duration) -> Harness {
    let segmenter = Arc::new(Segmenter::new(segmenter_config()));
    let (segment_tx, segments) = mpsc::unbounded_channel();
    let (out_tx, outbound) = mpsc::unbounded_channel();
    let counters = Arc::new(SessionCounters::default());

    let duplex = Arc::new(DuplexController::new(
        Arc::clone(&segmenter),
        segment_tx,
        out_tx,
        Arc::new(BrowserSynthesizer),
        ack_timeout,
        Arc::clone(&counters),
    ));

    Harness {
        duplex,
        segmenter,
        segments,
        outbound,
        counters,
    }
}

async fn wait_for_speak(outbound: &mut mpsc::UnboundedReceiver<OutboundFrame>) -> String {
    loop {
        match outbound.recv().await {
            Some(OutboundFrame::Message(ServerMessage::Speak { text })) => return text,
            Some(_) => continue,
            None => panic!("outbound closed before speak"),
        }
    }
}

#[tokio::test]
async fn test_initial_state_is_listening() {
    let h = harness(Duration::from_secs(1));
    assert_eq!(h.duplex.state().await, DuplexState::Listening);
}

#[tokio::test]
async fn test_listening_routes_chunks_to_segmenter() {
    let mut h = harness(Duration::from_secs(1));

    for chunk in utterance_chunks(6) {
        assert!(h.duplex.offer_chunk(&chunk).await);
    }

    let segment = h.segments.try_recv().expect("segment dispatched");
    assert_eq!(segment.len(), 9 * CHUNK_BYTES);
}

#[tokio::test]
async fn test_acknowledged_cycle() {
    let mut h = harness(Duration::from_secs(5));
    let duplex = Arc::clone(&h.duplex);

    let cycle = tokio::spawn(async move { duplex.speak("hello there").await });

    assert_eq!(wait_for_speak(&mut h.outbound).await, "hello there");
    assert_eq!(h.duplex.state().await, DuplexState::AgentSpeaking);
    assert!(h.duplex.acknowledge().await);

    assert_eq!(cycle.await.unwrap(), PlaybackOutcome::Acknowledged);
    assert_eq!(h.duplex.state().await, DuplexState::Listening);
}

#[tokio::test]
async fn test_response_sent_before_speak() {
    let mut h = harness(Duration::from_millis(50));

    h.duplex.speak("ok").await;

    assert_eq!(
        h.outbound.recv().await,
        Some(OutboundFrame::Message(ServerMessage::Response {
            text: "ok".to_string()
        }))
    );
    assert_eq!(
        h.outbound.recv().await,
        Some(OutboundFrame::Message(ServerMessage::Speak {
            text: "ok".to_string()
        }))
    );
}

#[tokio::test]
async fn test_missing_ack_times_out_and_unmutes() {
    let h = harness(Duration::from_millis(50));

    let outcome = h.duplex.speak("anyone there?").await;

    assert_eq!(outcome, PlaybackOutcome::TimedOut);
    assert_eq!(h.duplex.state().await, DuplexState::Listening);
    assert_eq!(h.counters.ack_timeouts.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(h.counters.speak_cycles.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_late_ack_after_timeout_is_ignored() {
    let h = harness(Duration::from_millis(30));

    assert_eq!(h.duplex.speak("first").await, PlaybackOutcome::TimedOut);
    assert!(!h.duplex.acknowledge().await);

    // The stray ack must not pre-complete the next cycle
    let started = tokio::time::Instant::now();
    assert_eq!(h.duplex.speak("second").await, PlaybackOutcome::TimedOut);
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[tokio::test]
async fn test_stray_ack_while_listening_ignored() {
    let h = harness(Duration::from_secs(1));
    assert!(!h.duplex.acknowledge().await);
    assert_eq!(h.duplex.state().await, DuplexState::Listening);
}

#[tokio::test]
async fn test_no_chunk_reaches_segmenter_while_speaking() {
    let mut h = harness(Duration::from_secs(5));
    let duplex = Arc::clone(&h.duplex);

    let cycle = tokio::spawn(async move { duplex.speak("talking").await });
    wait_for_speak(&mut h.outbound).await;

    for chunk in utterance_chunks(20) {
        assert!(!h.duplex.offer_chunk(&chunk).await);
    }
    assert_eq!(h.segmenter.buffered_len().await, 0);
    assert!(h.segments.try_recv().is_err());

    h.duplex.acknowledge().await;
    cycle.await.unwrap();

    assert_eq!(h.counters.chunks_muted.load(std::sync::atomic::Ordering::SeqCst), 23);
    assert!(h.segments.try_recv().is_err());
}

#[tokio::test]
async fn test_entering_speech_flushes_pending_user_audio() {
    let mut h = harness(Duration::from_millis(20));

    for _ in 0..6 {
        h.duplex.offer_chunk(&speech()).await;
    }
    assert!(h.segments.try_recv().is_err());

    h.duplex.speak("reply").await;

    let segment = h.segments.try_recv().expect("trailing audio captured before mute");
    assert_eq!(segment.len(), 6 * CHUNK_BYTES);
}

#[tokio::test]
async fn test_close_flushes_when_listening() {
    let mut h = harness(Duration::from_secs(1));

    for _ in 0..6 {
        h.duplex.offer_chunk(&speech()).await;
    }
    h.duplex.close().await;

    assert_eq!(h.segments.try_recv().unwrap().len(), 6 * CHUNK_BYTES);
    assert_eq!(h.segmenter.buffered_len().await, 0);
}

#[tokio::test]
async fn test_close_with_sub_floor_buffer_emits_nothing() {
    let mut h = harness(Duration::from_secs(1));

    h.duplex.offer_chunk(&speech()).await;
    h.duplex.close().await;

    assert!(h.segments.try_recv().is_err());
}

#[tokio::test]
async fn test_every_cycle_returns_to_listening_once() {
    let mut h = harness(Duration::from_millis(40));
    let duplex = Arc::clone(&h.duplex);

    let cycles = tokio::spawn(async move {
        let mut outcomes = Vec::new();
        for text in ["one", "two", "three", "four"] {
            outcomes.push(duplex.speak(text).await);
        }
        outcomes
    });

    // Acknowledge the first and third cycles only
    for i in 0..4 {
        wait_for_speak(&mut h.outbound).await;
        if i % 2 == 0 {
            h.duplex.acknowledge().await;
        }
    }

    let outcomes = cycles.await.unwrap();
    assert_eq!(
        outcomes,
        vec![
            PlaybackOutcome::Acknowledged,
            PlaybackOutcome::TimedOut,
            PlaybackOutcome::Acknowledged,
            PlaybackOutcome::TimedOut,
        ]
    );
    assert_eq!(h.counters.speak_cycles.load(std::sync::atomic::Ordering::SeqCst), 4);
    assert_eq!(h.counters.ack_timeouts.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_overlapping_speak_waits_for_cycle_in_flight() {
    let mut h = harness(Duration::from_secs(5));

    let first = {
        let duplex = Arc::clone(&h.duplex);
        tokio::spawn(async move { duplex.speak("one").await })
    };
    assert_eq!(wait_for_speak(&mut h.outbound).await, "one");

    let second = {
        let duplex = Arc::clone(&h.duplex);
        tokio::spawn(async move { duplex.speak("two").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The second cycle has not started and the first is still muted
    assert!(!first.is_finished());
    assert!(h.outbound.try_recv().is_err());
    assert_eq!(h.duplex.state().await, DuplexState::AgentSpeaking);
    assert!(!h.duplex.offer_chunk(&speech()).await);

    assert!(h.duplex.acknowledge().await);
    assert_eq!(first.await.unwrap(), PlaybackOutcome::Acknowledged);

    assert_eq!(wait_for_speak(&mut h.outbound).await, "two");
    assert_eq!(h.duplex.state().await, DuplexState::AgentSpeaking);
    assert!(!h.duplex.offer_chunk(&speech()).await);

    assert!(h.duplex.acknowledge().await);
    assert_eq!(second.await.unwrap(), PlaybackOutcome::Acknowledged);

    assert_eq!(h.duplex.state().await, DuplexState::Listening);
    assert_eq!(h.counters.speak_cycles.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(h.counters.ack_timeouts.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(h.segmenter.buffered_len().await, 0);
}

#[tokio::test]
async fn test_undelivered_reply_does_not_wait_for_ack() {
    let h = harness(Duration::from_secs(30));
    drop(h.outbound);

    let outcome = tokio::time::timeout(Duration::from_secs(1), h.duplex.speak("hello?"))
        .await
        .expect("speak returns without waiting for an acknowledgment");

    assert_eq!(outcome, PlaybackOutcome::TimedOut);
    assert_eq!(h.duplex.state().await, DuplexState::Listening);
}
