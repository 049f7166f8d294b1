mod bridge;
mod convert;
#[cfg(feature = "output")]
mod output;

pub use bridge::AudioRingBridge;
pub use convert::PcmConverter;
#[cfg(feature = "output")]
pub use output::{AudioError, AudioOutput};
