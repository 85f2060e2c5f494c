// src/audio_buffer.rs

/// Interleaved 16-bit stereo output block.
#[derive(Debug)]
pub struct AudioBuffer<'a> {
    pub frames: usize,
    pub data: &'a mut [i16], // interleaved: L, R, frame by frame
}

impl<'a> AudioBuffer<'a> {
    pub const CHANNELS: usize = 2;

    /// Wrap existing data. A trailing odd sample is left untouched.
    #[inline]
    pub fn new(data: &'a mut [i16]) -> Self {
        let frames = data.len() / Self::CHANNELS;
        Self { frames, data }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Write one frame, clamping both sides to i16.
    #[inline]
    pub fn set_frame(&mut self, frame: usize, left: i32, right: i32) {
        let i = frame * Self::CHANNELS;
        self.data[i] = clamp_sample(left);
        self.data[i + 1] = clamp_sample(right);
    }

    #[inline]
    pub fn frame(&self, frame: usize) -> (i16, i16) {
        let i = frame * Self::CHANNELS;
        (self.data[i], self.data[i + 1])
    }

    /// Sub-view over `len` frames starting at frame `start`.
    #[inline]
    pub fn slice_mut(&mut self, start: usize, len: usize) -> AudioBuffer<'_> {
        let begin = start * Self::CHANNELS;
        let end = (start + len) * Self::CHANNELS;
        AudioBuffer::new(&mut self.data[begin..end])
    }
}

#[inline]
pub fn clamp_sample(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
