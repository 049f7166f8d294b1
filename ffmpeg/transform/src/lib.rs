/*!
    Media frame transformation for the ffmpeg crate ecosystem.

    - [`VideoScaler`] converts frames between pixel formats and sizes with
      one swscale context per (source, target) geometry.
    - [`AudioResampler`] converts frames to a fixed sample format, rate and
      channel count.
*/

mod audio;
mod video;

pub use audio::{AudioResampler, AudioResamplerConfig};
pub use video::{ScalingAlgorithm, VideoScaler};
