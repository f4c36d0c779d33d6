//! Rodio decode engine
//!
//! Uses the Rodio library for cross-platform decoding and playback.
//! Rodio is pure Rust and supports WAV, OGG Vorbis, MP3, and FLAC formats.
//! Clips are decoded to interleaved `f32` samples on a worker thread and
//! each stream plays through its own [`Sink`].

use super::{CompletionListener, DecodeEngine, EngineConfig, PlayParams, SoundId, StreamId, LOAD_SUCCESS};
use crate::error::PoolError;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Status reported when Rodio cannot decode the bytes
pub const DECODE_ERROR: i32 = 1;

/// A fully decoded clip
struct DecodedClip {
    channels: u16,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl DecodedClip {
    fn decode(bytes: Vec<u8>) -> Result<Self, rodio::decoder::DecoderError> {
        let decoder = Decoder::new(Cursor::new(bytes))?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        let samples = decoder.convert_samples::<f32>().collect();
        Ok(Self {
            channels,
            sample_rate,
            samples,
        })
    }

    fn buffer(&self) -> SamplesBuffer<f32> {
        SamplesBuffer::new(self.channels, self.sample_rate, self.samples.clone())
    }

    /// Length of one pass through the clip
    fn duration(&self) -> Duration {
        if self.channels == 0 || self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() / usize::from(self.channels);
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate))
    }

    /// Length of the clip played once plus `loops` repetitions
    fn looped_duration(&self, loops: u32) -> Duration {
        self.duration().saturating_mul(loops.saturating_add(1))
    }
}

type ClipTable = Arc<Mutex<HashMap<SoundId, DecodedClip>>>;

fn lock(clips: &Mutex<HashMap<SoundId, DecodedClip>>) -> MutexGuard<'_, HashMap<SoundId, DecodedClip>> {
    clips.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A stream playing through its own sink
struct ActiveSink {
    sink: Sink,
    auto_paused: bool,
}

/// Rodio-based decode engine
pub struct RodioEngine {
    /// Audio output stream (must be kept alive)
    _output_stream: OutputStream,
    /// Output stream handle for creating sinks
    stream_handle: OutputStreamHandle,
    clips: ClipTable,
    listener: Option<CompletionListener>,
    sinks: HashMap<StreamId, ActiveSink>,
    next_sound: u32,
    next_stream: u32,
    max_streams: usize,
}

impl RodioEngine {
    /// Open the default output device
    ///
    /// # Errors
    /// - `EngineInit` if no output device is available
    pub fn new(config: &EngineConfig) -> Result<Self, PoolError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| PoolError::EngineInit(format!("Failed to create audio output: {e}")))?;

        log::info!("Rodio engine initialized with {} max streams", config.max_streams);
        Ok(Self {
            _output_stream: stream,
            stream_handle,
            clips: Arc::new(Mutex::new(HashMap::new())),
            listener: None,
            sinks: HashMap::new(),
            next_sound: 0,
            next_stream: 0,
            max_streams: config.max_streams as usize,
        })
    }

    /// Stream ids are never zero; zero is the failure sentinel
    fn next_stream_id(&mut self) -> StreamId {
        self.next_stream = self.next_stream.wrapping_add(1).max(1);
        StreamId(self.next_stream)
    }
}

impl DecodeEngine for RodioEngine {
    fn set_completion_listener(&mut self, listener: CompletionListener) {
        self.listener = Some(listener);
    }

    fn submit(&mut self, bytes: Vec<u8>, _priority: i32) -> SoundId {
        self.next_sound += 1;
        let sound = SoundId(self.next_sound);

        let clips = Arc::clone(&self.clips);
        let listener = self.listener.clone();
        thread::spawn(move || {
            let status = match DecodedClip::decode(bytes) {
                Ok(clip) => {
                    lock(&clips).insert(sound, clip);
                    LOAD_SUCCESS
                }
                Err(e) => {
                    log::warn!("Failed to decode sound {}: {}", sound, e);
                    DECODE_ERROR
                }
            };
            match listener {
                Some(listener) => listener(sound, status),
                None => log::warn!("Completion for sound {} dropped: no listener installed", sound),
            }
        });

        sound
    }

    fn unload(&mut self, sound: SoundId) {
        lock(&self.clips).remove(&sound);
    }

    fn play(&mut self, sound: SoundId, params: PlayParams) -> StreamId {
        // Finished streams free their slot
        self.sinks.retain(|_, active| !active.sink.empty());
        if self.sinks.len() >= self.max_streams {
            return StreamId::NONE;
        }

        let clips = lock(&self.clips);
        let Some(clip) = clips.get(&sound) else {
            return StreamId::NONE;
        };

        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(sink) => sink,
            Err(e) => {
                log::warn!("Failed to create sink: {}", e);
                return StreamId::NONE;
            }
        };

        sink.set_speed(params.rate.clamp(0.5, 2.0));
        sink.set_volume(((params.left_gain + params.right_gain) / 2.0).clamp(0.0, 1.0));
        // Repetitions share one buffer instead of copying the samples per loop
        match params.loops {
            0 => sink.append(clip.buffer()),
            loops if loops < 0 => sink.append(clip.buffer().repeat_infinite()),
            loops => sink.append(
                clip.buffer()
                    .repeat_infinite()
                    .take_duration(clip.looped_duration(loops.unsigned_abs())),
            ),
        }
        drop(clips);

        let stream = self.next_stream_id();
        self.sinks.insert(
            stream,
            ActiveSink {
                sink,
                auto_paused: false,
            },
        );
        stream
    }

    fn stop(&mut self, stream: StreamId) {
        if let Some(active) = self.sinks.remove(&stream) {
            active.sink.stop();
        }
    }

    fn pause(&mut self, stream: StreamId) {
        if let Some(active) = self.sinks.get(&stream) {
            active.sink.pause();
        }
    }

    fn resume(&mut self, stream: StreamId) {
        if let Some(active) = self.sinks.get_mut(&stream) {
            active.sink.play();
            active.auto_paused = false;
        }
    }

    fn pause_all(&mut self) {
        for active in self.sinks.values_mut() {
            if !active.sink.is_paused() {
                active.sink.pause();
                active.auto_paused = true;
            }
        }
    }

    fn resume_all(&mut self) {
        for active in self.sinks.values_mut() {
            if active.auto_paused {
                active.sink.play();
                active.auto_paused = false;
            }
        }
    }

    fn release(&mut self) {
        for (_stream, active) in self.sinks.drain() {
            active.sink.stop();
        }
        lock(&self.clips).clear();
        self.listener = None;
        log::info!("Rodio engine released");
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    /// One second of silence as a 16-bit mono WAV file
    fn silent_wav() -> Vec<u8> {
        let sample_rate: u32 = 8000;
        let data_len: u32 = sample_rate * 2;
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        wav.resize(wav.len() + data_len as usize, 0);
        wav
    }

    #[test]
    fn test_decode_wav() {
        let clip = DecodedClip::decode(silent_wav()).unwrap();
        assert_eq!(clip.channels, 1);
        assert_eq!(clip.sample_rate, 8000);
        assert_eq!(clip.samples.len(), 8000);
    }

    #[test]
    fn test_clip_durations() {
        let mono = DecodedClip::decode(silent_wav()).unwrap();
        assert_eq!(mono.duration(), Duration::from_secs(1));
        assert_eq!(mono.looped_duration(0), Duration::from_secs(1));
        assert_eq!(mono.looped_duration(2), Duration::from_secs(3));

        let stereo = DecodedClip {
            channels: 2,
            sample_rate: 44_100,
            samples: vec![0.0; 44_100],
        };
        assert_eq!(stereo.duration(), Duration::from_millis(500));
        assert_eq!(stereo.looped_duration(999), Duration::from_secs(500));

        // Huge loop counts stay cheap to compute
        assert!(mono.looped_duration(u32::MAX) >= Duration::from_secs(u64::from(u32::MAX)));

        let empty = DecodedClip {
            channels: 0,
            sample_rate: 0,
            samples: Vec::new(),
        };
        assert_eq!(empty.looped_duration(5), Duration::ZERO);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(DecodedClip::decode(b"definitely not audio".to_vec()).is_err());
    }

    #[test]
    fn test_submit_and_play() {
        // May fail in CI/test environments without audio device
        let Ok(mut engine) = RodioEngine::new(&EngineConfig { max_streams: 1 }) else {
            return;
        };
        let (tx, rx) = mpsc::channel();
        engine.set_completion_listener(Arc::new(move |sound: SoundId, status: i32| {
            let _ = tx.send((sound, status));
        }));

        let sound = engine.submit(silent_wav(), 1);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), (sound, LOAD_SUCCESS));

        let params = PlayParams {
            left_gain: 0.0,
            right_gain: 0.0,
            priority: 1,
            loops: 0,
            rate: 1.0,
        };
        let stream = engine.play(sound, params);
        assert!(stream.is_valid());
        assert_eq!(engine.play(sound, params), StreamId::NONE);

        engine.stop(stream);
        engine.release();
    }
}
