/// The user's audio routine, driven from whichever hardware context owns delivery.
///
/// `buffer` holds `frames` interleaved stereo frames and is processed in place:
/// in capture-driven delivery it arrives holding captured audio, in
/// playback-only mode it arrives holding stale data to overwrite. Return `true`
/// if the buffer now holds audio to keep; `false` makes the caller zero it and
/// count it as silence.
///
/// Runs in a hardware callback context: it must not block or allocate, and
/// must finish within one block period.
pub trait ProcessBlock: Send {
    fn process(&mut self, buffer: &mut [i16], frames: usize, sample_rate: u32) -> bool;
}

impl<F> ProcessBlock for F
where
    F: FnMut(&mut [i16], usize, u32) -> bool + Send,
{
    fn process(&mut self, buffer: &mut [i16], frames: usize, sample_rate: u32) -> bool {
        self(buffer, frames, sample_rate)
    }
}
