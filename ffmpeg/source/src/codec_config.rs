/*!
    Opaque codec configuration for passing to decoders.
*/

use ffmpeg_next::codec;

use ffmpeg_types::Rational;

/**
    Codec parameters of one stream, captured from an open source.

    Keeps ffmpeg-next types out of the public signatures of the source
    crate. Pass it to `ffmpeg-decode` to build a decoder for the stream.
*/
pub struct CodecConfig {
    parameters: codec::Parameters,
    time_base: Rational,
}

impl CodecConfig {
    pub(crate) fn new(parameters: codec::Parameters, time_base: Rational) -> Self {
        Self {
            parameters,
            time_base,
        }
    }

    /**
        Time base of the stream the parameters were taken from.
    */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn into_parameters(self) -> codec::Parameters {
        self.parameters
    }
}

impl Clone for CodecConfig {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
            time_base: self.time_base,
        }
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("codec_id", &self.parameters.id())
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}
