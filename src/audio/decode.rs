use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use super::{DecodedAudio, Decoder};
use crate::error::{PlayerError, Result};

/// In-memory decoder backed by symphonia.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    extension: Option<String>,
}

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the file extension of `path` as a format hint.
    pub fn for_path(path: &Path) -> Self {
        Self {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_lowercase),
        }
    }
}

impl Decoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = &self.extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| PlayerError::Decode(format!("unrecognized format: {}", e)))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PlayerError::Decode("no audio track".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channel_count = track.codec_params.channels.map_or(0, |c| c.count());

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| PlayerError::Decode(format!("unsupported codec: {}", e)))?;

        let mut interleaved: Vec<f32> = Vec::new();
        let mut sample_buf: Option<(SampleBuffer<f32>, SignalSpec, usize)> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                // End of stream
                Err(Error::IoError(_)) => break,
                Err(Error::ResetRequired) => {
                    debug!("Decoder reset requested, stopping at {} samples", interleaved.len());
                    break;
                }
                Err(e) => return Err(PlayerError::Decode(e.to_string())),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(Error::DecodeError(e)) => {
                    warn!("Skipping undecodable packet: {}", e);
                    continue;
                }
                Err(Error::IoError(_)) => break,
                Err(e) => return Err(PlayerError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let frames = decoded.capacity();
            let reuse = matches!(&sample_buf, Some((_, s, cap)) if *s == spec && *cap >= frames);
            if !reuse {
                sample_buf = Some((SampleBuffer::<f32>::new(frames as u64, spec), spec, frames));
            }
            if let Some((buf, _, _)) = sample_buf.as_mut() {
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }
            sample_rate = spec.rate;
            channel_count = spec.channels.count();
        }

        if channel_count == 0 || sample_rate == 0 {
            return Err(PlayerError::Decode("stream has no channel layout".to_string()));
        }

        let mut channels = vec![Vec::with_capacity(interleaved.len() / channel_count); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        let audio = DecodedAudio::new(channels, sample_rate);
        debug!(
            "Decoded {} frames x {} channels at {} Hz ({:.2}s)",
            audio.frames(),
            audio.channel_count(),
            audio.sample_rate,
            audio.duration
        );
        Ok(audio)
    }
}
