use std::path::Path;

use super::frame::StereoFrame;
use crate::error::LoadError;

#[derive(Clone, Debug)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>, // the audio data array, already at engine rate
}

impl SampleBuffer {
    // Load a WAV file from disk and bring it to the engine's sample rate
    pub fn load_wav(path: &Path, target_rate: u32) -> Result<Self, LoadError> {
        let wav_err = |source| LoadError::Wav { path: path.to_path_buf(), source };

        let mut reader = hound::WavReader::open(path).map_err(wav_err)?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(LoadError::Unsupported {
                path: path.to_path_buf(),
                detail: "zero channels".into(),
            });
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader // float, just pass it through
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(wav_err)?,
            hound::SampleFormat::Int => { // int, scale into -1.0..1.0
                if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                    return Err(LoadError::Unsupported {
                        path: path.to_path_buf(),
                        detail: format!("{}-bit integer samples", spec.bits_per_sample),
                    });
                }
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(wav_err)?
            }
        };

        let mut frames: Vec<StereoFrame> = if channels == 1 {
            samples.into_iter().map(StereoFrame::mono).collect() // mono, duplicate
        } else {
            // anything past the first two channels is dropped
            samples
                .chunks_exact(channels)
                .map(|c| StereoFrame { left: c[0], right: c[1] })
                .collect()
        };

        if frames.is_empty() {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        if spec.sample_rate != target_rate {
            frames = resample_linear(&frames, spec.sample_rate, target_rate);
        }

        Ok(Self { data: frames })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    // plain linear interpolation, drum one-shots don't need better
    if source_rate == target_rate || source_rate == 0 {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let last = frames.last().copied().unwrap_or_default();

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio; // ex. 3.7
            let idx = src_pos.floor() as usize; // ex. 3
            let frac = (src_pos - idx as f64) as f32; // ex. 0.7
            if idx + 1 >= frames.len() {
                return last;
            }
            let (a, b) = (frames[idx], frames[idx + 1]);
            StereoFrame {
                left: a.left * (1.0 - frac) + b.left * frac,
                right: a.right * (1.0 - frac) + b.right * frac,
            }
        })
        .collect()
}
