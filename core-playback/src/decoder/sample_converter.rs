//! # Sample Format Converter
//!
//! Mixes Symphonia's decoded buffers down to mono signed 16-bit PCM.

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::conv::IntoSample;
use symphonia::core::sample::Sample;

/// Sample converter producing mono `i16` output.
///
/// Symphonia outputs audio in various sample formats (u8 through f64) and in
/// planar layout. Each frame is converted to f32, channels are averaged, and
/// the result is scaled back to the `i16` range.
pub struct SampleConverter;

impl SampleConverter {
    /// Append the mono mix of `buffer` to `out`.
    pub fn append_mono_i16(buffer: &AudioBufferRef<'_>, out: &mut Vec<i16>) {
        match buffer {
            AudioBufferRef::F32(buf) => Self::mix_down(&**buf, |sample: f32| sample, out),
            AudioBufferRef::F64(buf) => {
                Self::mix_down(&**buf, |sample: f64| sample.into_sample(), out)
            }
            AudioBufferRef::S32(buf) => {
                Self::mix_down(&**buf, |sample: i32| sample.into_sample(), out)
            }
            AudioBufferRef::S24(buf) => {
                Self::mix_down(&**buf, |sample| IntoSample::into_sample(sample), out)
            }
            AudioBufferRef::S16(buf) => {
                Self::mix_down(&**buf, |sample: i16| sample.into_sample(), out)
            }
            AudioBufferRef::S8(buf) => Self::mix_down(&**buf, |sample: i8| sample.into_sample(), out),
            AudioBufferRef::U32(buf) => {
                Self::mix_down(&**buf, |sample: u32| sample.into_sample(), out)
            }
            AudioBufferRef::U24(buf) => {
                Self::mix_down(&**buf, |sample| IntoSample::into_sample(sample), out)
            }
            AudioBufferRef::U16(buf) => {
                Self::mix_down(&**buf, |sample: u16| sample.into_sample(), out)
            }
            AudioBufferRef::U8(buf) => Self::mix_down(&**buf, |sample: u8| sample.into_sample(), out),
        }
    }

    /// Convert a whole buffer to a fresh mono vector.
    pub fn to_mono_i16(buffer: &AudioBufferRef<'_>) -> Vec<i16> {
        let mut out = Vec::with_capacity(buffer.frames());
        Self::append_mono_i16(buffer, &mut out);
        out
    }

    fn mix_down<T>(buf: &AudioBuffer<T>, convert: fn(T) -> f32, out: &mut Vec<i16>)
    where
        T: Sample + Copy,
    {
        let num_channels = buf.spec().channels.count();
        let num_frames = buf.frames();
        if num_channels == 0 {
            return;
        }

        out.reserve(num_frames);
        for frame_idx in 0..num_frames {
            let mut sum = 0.0f32;
            for chan_idx in 0..num_channels {
                sum += convert(buf.chan(chan_idx)[frame_idx]);
            }
            out.push(Self::f32_to_i16(sum / num_channels as f32));
        }
    }

    /// Scale a normalized sample in `[-1.0, 1.0]` to `i16`, saturating.
    ///
    /// Values that came from `i16` round-trip exactly.
    pub fn f32_to_i16(sample: f32) -> i16 {
        if sample.is_nan() {
            return 0;
        }
        (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symphonia::core::audio::{Channels, SignalSpec};

    #[test]
    fn test_f32_to_i16_round_trips_i16_values() {
        for value in [i16::MIN, -12345, -1, 0, 1, 4096, i16::MAX] {
            let normalized: f32 = value.into_sample();
            assert_eq!(SampleConverter::f32_to_i16(normalized), value);
        }
    }

    #[test]
    fn test_f32_to_i16_saturates() {
        assert_eq!(SampleConverter::f32_to_i16(1.5), i16::MAX);
        assert_eq!(SampleConverter::f32_to_i16(-1.5), i16::MIN);
        assert_eq!(SampleConverter::f32_to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_mix_down_stereo_buffer() {
        let spec = SignalSpec::new(16000, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let mut buffer = AudioBuffer::<i16>::new(4, spec);
        buffer.render_reserved(Some(4));
        {
            let (left, right) = buffer.chan_pair_mut(0, 1);
            left.copy_from_slice(&[1000, -1000, 0, 32767]);
            right.copy_from_slice(&[3000, -3000, 0, 32767]);
        }

        let mono = SampleConverter::to_mono_i16(&AudioBufferRef::S16(std::borrow::Cow::Borrowed(
            &buffer,
        )));
        assert_eq!(mono, vec![2000, -2000, 0, 32767]);
    }
}
