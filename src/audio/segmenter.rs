use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

use super::pcm;

/// Segmenter tuning
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Sample rate of the incoming PCM16 mono stream
    pub sample_rate: u32,

    /// RMS amplitude (i16 scale) above which a chunk counts as speech
    pub silence_threshold: f64,

    /// Consecutive silent chunks after speech that end an utterance
    pub silence_chunks: usize,

    /// Segments shorter than this are discarded as noise
    pub min_segment_ms: u32,

    /// Silent chunks kept from before speech onset and prepended to the
    /// segment. 0 discards all leading silence.
    pub pre_roll_chunks: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            silence_threshold: 500.0,
            silence_chunks: 10,
            min_segment_ms: 500,
            pre_roll_chunks: 0,
        }
    }
}

impl SegmenterConfig {
    /// Minimum buffered length, in bytes, for a segment to be emitted
    pub fn min_segment_bytes(&self) -> usize {
        pcm::bytes_for_duration(self.sample_rate, self.min_segment_ms)
    }
}

/// A finalized span of user audio, ready for transcription
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Raw PCM16 LE mono bytes
    pub pcm: Vec<u8>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioSegment {
    pub fn duration_ms(&self) -> u64 {
        pcm::duration_ms(self.pcm.len(), self.sample_rate)
    }

    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

/// The open accumulation buffer
#[derive(Debug, Default)]
struct AudioBuffer {
    bytes: Vec<u8>,
    speech_detected: bool,
    silence_run: usize,
    pre_roll: VecDeque<Vec<u8>>,
}

impl AudioBuffer {
    fn reset(&mut self) {
        self.bytes.clear();
        self.speech_detected = false;
        self.silence_run = 0;
        self.pre_roll.clear();
    }
}

/// Energy-based endpointing segmenter
///
/// Turns a stream of PCM16 chunks into finalized utterance buffers. All
/// buffer mutation happens under one lock, so concurrent `add_chunk` and
/// `flush` calls never interleave partial updates.
pub struct Segmenter {
    config: SegmenterConfig,
    buffer: Mutex<AudioBuffer>,
    discarded: AtomicUsize,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        debug!(
            "Segmenter initialized: {}Hz, threshold={}, silence_chunks={}, min={}ms",
            config.sample_rate, config.silence_threshold, config.silence_chunks, config.min_segment_ms
        );

        Self {
            config,
            buffer: Mutex::new(AudioBuffer::default()),
            discarded: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    /// Feed one chunk; returns a segment when endpointing fires and the
    /// buffered audio clears the minimum length.
    pub async fn add_chunk(&self, chunk: &[u8]) -> Option<AudioSegment> {
        if chunk.is_empty() {
            return None;
        }

        let mut buffer = self.buffer.lock().await;

        if pcm::rms(chunk) > self.config.silence_threshold {
            if !buffer.speech_detected {
                buffer.speech_detected = true;
                let pre_roll: Vec<Vec<u8>> = buffer.pre_roll.drain(..).collect();
                for held in pre_roll {
                    buffer.bytes.extend_from_slice(&held);
                }
            }
            buffer.bytes.extend_from_slice(chunk);
            buffer.silence_run = 0;
            return None;
        }

        if !buffer.speech_detected {
            if self.config.pre_roll_chunks > 0 {
                if buffer.pre_roll.len() == self.config.pre_roll_chunks {
                    buffer.pre_roll.pop_front();
                }
                buffer.pre_roll.push_back(chunk.to_vec());
            }
            return None;
        }

        buffer.bytes.extend_from_slice(chunk);
        buffer.silence_run += 1;

        if buffer.silence_run >= self.config.silence_chunks {
            return self.finalize(&mut buffer);
        }

        None
    }

    /// Force the open buffer closed.
    ///
    /// With `transcribe` the buffer is finalized subject to the minimum
    /// length; without it the buffer is emptied and nothing is returned.
    pub async fn flush(&self, transcribe: bool) -> Option<AudioSegment> {
        let mut buffer = self.buffer.lock().await;

        if !transcribe {
            if !buffer.bytes.is_empty() {
                debug!("Discarding {} buffered bytes", buffer.bytes.len());
            }
            buffer.reset();
            return None;
        }

        self.finalize(&mut buffer)
    }

    /// Bytes currently buffered
    pub async fn buffered_len(&self) -> usize {
        self.buffer.lock().await.bytes.len()
    }

    /// Segments dropped for falling under the minimum length
    pub fn discarded_count(&self) -> usize {
        self.discarded.load(Ordering::SeqCst)
    }

    fn finalize(&self, buffer: &mut AudioBuffer) -> Option<AudioSegment> {
        if !buffer.speech_detected || buffer.bytes.is_empty() {
            buffer.reset();
            return None;
        }

        let bytes = std::mem::take(&mut buffer.bytes);
        buffer.reset();

        if bytes.len() < self.config.min_segment_bytes() {
            debug!(
                "Segment too short ({} bytes < {}), discarding as noise",
                bytes.len(),
                self.config.min_segment_bytes()
            );
            self.discarded.fetch_add(1, Ordering::SeqCst);
            return None;
        }

        let segment = AudioSegment {
            pcm: bytes,
            sample_rate: self.config.sample_rate,
        };
        debug!(
            "Segment finalized: {} bytes ({}ms)",
            segment.len(),
            segment.duration_ms()
        );
        Some(segment)
    }
}
