use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Bytes per PCM16 sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Decode little-endian PCM16 bytes into samples.
///
/// A trailing odd byte is ignored.
pub fn samples(pcm: &[u8]) -> impl Iterator<Item = i16> + '_ {
    pcm.chunks_exact(BYTES_PER_SAMPLE)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
}

/// Root-mean-square amplitude of a PCM16 chunk, on the i16 scale.
///
/// Returns 0.0 for chunks with no complete sample.
pub fn rms(pcm: &[u8]) -> f64 {
    let (sum, count) = samples(pcm).fold((0.0f64, 0usize), |(sum, count), s| {
        let s = s as f64;
        (sum + s * s, count + 1)
    });

    if count == 0 {
        return 0.0;
    }

    (sum / count as f64).sqrt()
}

/// Number of PCM16 mono bytes covering `duration_ms` at `sample_rate`
pub fn bytes_for_duration(sample_rate: u32, duration_ms: u32) -> usize {
    (sample_rate as u64 * duration_ms as u64 / 1000) as usize * BYTES_PER_SAMPLE
}

/// Duration in milliseconds of `len` PCM16 mono bytes at `sample_rate`
pub fn duration_ms(len: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (len / BYTES_PER_SAMPLE) as u64 * 1000 / sample_rate as u64
}

/// Wrap raw PCM16 mono bytes in an in-memory WAV container
pub fn encode_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for sample in samples(pcm) {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}
