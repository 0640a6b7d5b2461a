use std::sync::Arc;

use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

// One playing one-shot. Holds its own reference to the buffer so the engine
// can forget samples without yanking audio out from under a voice.
#[derive(Clone, Debug)]
pub struct Voice {
    buffer: Arc<SampleBuffer>,
    pos: usize,
    gain: f32,
    delay: usize, // frames of silence before the voice starts, within the current block
}

impl Voice {
    pub fn new(buffer: Arc<SampleBuffer>, gain: f32, delay: usize) -> Self {
        Self { buffer, pos: 0, gain, delay }
    }

    pub fn is_finished(&self) -> bool {
        self.pos >= self.buffer.len()
    }

    // how far in, used to pick a voice to steal
    pub fn position(&self) -> usize {
        self.pos
    }

    // mix into `out`, starting `delay` frames in on the first block
    pub fn render_into(&mut self, out: &mut [StereoFrame]) {
        let start = self.delay.min(out.len());
        self.delay -= start;

        let data = &self.buffer.data;
        for (frame, sample) in out[start..].iter_mut().zip(data.iter().skip(self.pos)) {
            frame.mix_in(*sample, self.gain);
            self.pos += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize) -> Arc<SampleBuffer> {
        Arc::new(SampleBuffer {
            data: (0..len).map(|i| StereoFrame::mono(i as f32 + 1.0)).collect(),
        })
    }

    #[test]
    fn delay_shifts_the_first_frame() {
        let mut voice = Voice::new(ramp(4), 1.0, 2);
        let mut out = vec![StereoFrame::zero(); 4];
        voice.render_into(&mut out);
        assert_eq!(out[0], StereoFrame::zero());
        assert_eq!(out[1], StereoFrame::zero());
        assert_eq!(out[2], StereoFrame::mono(1.0));
        assert_eq!(out[3], StereoFrame::mono(2.0));
        assert!(!voice.is_finished());

        let mut next = vec![StereoFrame::zero(); 4];
        voice.render_into(&mut next);
        assert_eq!(next[0], StereoFrame::mono(3.0));
        assert_eq!(next[1], StereoFrame::mono(4.0));
        assert_eq!(next[2], StereoFrame::zero());
        assert!(voice.is_finished());
    }

    #[test]
    fn delay_longer_than_block_carries_over() {
        let mut voice = Voice::new(ramp(2), 0.5, 6);
        let mut out = vec![StereoFrame::zero(); 4];
        voice.render_into(&mut out);
        assert!(out.iter().all(|f| *f == StereoFrame::zero()));

        voice.render_into(&mut out);
        assert_eq!(out[2], StereoFrame::mono(0.5));
        assert_eq!(out[3], StereoFrame::mono(1.0));
    }

    #[test]
    fn zero_gain_is_silent_but_still_plays_through() {
        let mut voice = Voice::new(ramp(3), 0.0, 0);
        let mut out = vec![StereoFrame::zero(); 3];
        voice.render_into(&mut out);
        assert!(out.iter().all(|f| *f == StereoFrame::zero()));
        assert!(voice.is_finished());
    }
}
