//! 16-bit PCM WAV files, for recording session output and feeding captures.
//!
//! This is application-thread I/O. Nothing here is reachable from the
//! hardware callbacks; copy blocks out of the ring (or out of the simulated
//! platform) and write them from a regular thread.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::BYTES_PER_SAMPLE;
use crate::error::PcmError;

/// Layout of a PCM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PcmSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmSpec {
    fn to_hound(self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: (BYTES_PER_SAMPLE * 8) as u16,
            sample_format: SampleFormat::Int,
        }
    }
}

/// Streaming writer of interleaved `i16` samples.
pub struct PcmWriter {
    inner: WavWriter<BufWriter<File>>,
    spec: PcmSpec,
    samples: u64,
}

/// Create (or truncate) a WAV file at `path`.
pub fn create_wav(
    path: impl AsRef<Path>,
    sample_rate: u32,
    channels: u16,
) -> Result<PcmWriter, PcmError> {
    if channels == 0 {
        return Err(PcmError::NoChannels);
    }
    let spec = PcmSpec {
        sample_rate,
        channels,
    };
    let inner = WavWriter::create(path, spec.to_hound())?;
    Ok(PcmWriter {
        inner,
        spec,
        samples: 0,
    })
}

impl PcmWriter {
    /// Append one interleaved block of whole frames.
    pub fn write_block(&mut self, samples: &[i16]) -> Result<(), PcmError> {
        let channels = self.spec.channels;
        if samples.len() % channels as usize != 0 {
            return Err(PcmError::PartialFrame {
                samples: samples.len(),
                channels,
            });
        }
        let mut writer = self.inner.get_i16_writer(samples.len() as u32);
        for &s in samples {
            writer.write_sample(s);
        }
        writer.flush()?;
        self.samples += samples.len() as u64;
        Ok(())
    }

    pub fn spec(&self) -> PcmSpec {
        self.spec
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.samples / self.spec.channels as u64
    }

    /// Patch the header sizes and flush. Dropping without closing also
    /// finalizes, but swallows any I/O error.
    pub fn close(self) -> Result<(), PcmError> {
        self.inner.finalize()?;
        Ok(())
    }
}

/// Read a whole 16-bit integer WAV file.
pub fn read_wav(path: impl AsRef<Path>) -> Result<(PcmSpec, Vec<i16>), PcmError> {
    let mut reader = WavReader::open(path)?;
    let header = reader.spec();
    if header.bits_per_sample != 16 || header.sample_format != SampleFormat::Int {
        return Err(PcmError::UnsupportedFormat {
            bits: header.bits_per_sample,
            format: match header.sample_format {
                SampleFormat::Int => "int",
                SampleFormat::Float => "float",
            },
        });
    }

    let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
    let spec = PcmSpec {
        sample_rate: header.sample_rate,
        channels: header.channels,
    };
    Ok((spec, samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_are_written_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut writer = create_wav(&path, 44_100, 2).unwrap();
        writer.write_block(&[1, -1, 2, -2]).unwrap();
        writer.write_block(&[3, -3]).unwrap();
        assert_eq!(writer.frames(), 3);
        writer.close().unwrap();

        let (spec, samples) = read_wav(&path).unwrap();
        assert_eq!(
            spec,
            PcmSpec {
                sample_rate: 44_100,
                channels: 2
            }
        );
        assert_eq!(samples, vec![1, -1, 2, -2, 3, -3]);
    }

    #[test]
    fn header_sizes_match_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sized.wav");

        let mut writer = create_wav(&path, 48_000, 2).unwrap();
        writer.write_block(&[0; 512]).unwrap();
        writer.close().unwrap();

        let reader = WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 512);
        assert_eq!(reader.duration(), 256);
        let file_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(file_len, 44 + 512 * BYTES_PER_SAMPLE as u64);
    }

    #[test]
    fn partial_frames_are_rejected_and_file_stays_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.wav");

        let mut writer = create_wav(&path, 44_100, 2).unwrap();
        writer.write_block(&[1, -1]).unwrap();
        let err = writer.write_block(&[2, -2, 3]).err().unwrap();
        assert!(matches!(
            err,
            PcmError::PartialFrame {
                samples: 3,
                channels: 2
            }
        ));
        assert_eq!(writer.frames(), 1);
        writer.close().unwrap();

        let (_, samples) = read_wav(&path).unwrap();
        assert_eq!(samples, vec![1, -1]);
    }

    #[test]
    fn zero_channels_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_wav(dir.path().join("x.wav"), 48_000, 0).err().unwrap();
        assert!(matches!(err, PcmError::NoChannels));
    }

    #[test]
    fn float_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        let err = read_wav(&path).err().unwrap();
        assert!(matches!(err, PcmError::UnsupportedFormat { bits: 32, .. }));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_wav(dir.path().join("nope.wav")),
            Err(PcmError::Wav(_))
        ));
    }
}
