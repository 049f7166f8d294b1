/*!
    Decoder configuration.
*/

use ffmpeg_next::codec::{context::Context, threading};

/**
    Configuration shared by audio and video decoders.
*/
#[derive(Clone, Debug, Default)]
pub struct DecoderConfig {
    /// Number of codec threads, `None` lets FFmpeg decide.
    pub thread_count: Option<usize>,
}

impl DecoderConfig {
    pub fn with_threads(count: usize) -> Self {
        Self {
            thread_count: Some(count),
        }
    }

    pub(crate) fn apply(&self, context: &mut Context) {
        if let Some(count) = self.thread_count {
            context.set_threading(threading::Config::count(count));
        }
    }
}
