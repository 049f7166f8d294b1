/*!
    Pull-based frame decoding for one stream.
*/

use ffmpeg_types::{Error, Frame, Packet, Pts, Rational, StreamType};
use tracing::{debug, error, warn};

use crate::backend::{PacketSource, StreamDecoder};
use crate::broker::{NoPacket, PacketBroker};
use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    Active,
    /// Input ended and the codec is handing out its buffered frames.
    Draining,
    /// Every frame has been returned. Cleared by [`FrameDecoder::reset`].
    Ended,
    /// The codec failed for good. Survives resets.
    Disabled(DecodeError),
}

/**
    Turns the packets of one stream into frames, asking the broker for
    input whenever the codec runs dry.

    The most recent frame is kept in a single slot that the next successful
    decode overwrites.
*/
pub struct FrameDecoder {
    stream_index: usize,
    kind: StreamType,
    time_base: Rational,
    codec: Box<dyn StreamDecoder>,
    frame: Option<Frame>,
    last_pts: Option<Pts>,
    state: DecoderState,
    /// Packet the codec refused until its frames are drained.
    held: Option<Packet>,
}

impl FrameDecoder {
    pub fn new(
        stream_index: usize,
        kind: StreamType,
        time_base: Rational,
        codec: Box<dyn StreamDecoder>,
    ) -> Self {
        Self {
            stream_index,
            kind,
            time_base,
            codec,
            frame: None,
            last_pts: None,
            state: DecoderState::Active,
            held: None,
        }
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    pub fn kind(&self) -> StreamType {
        self.kind
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.state, DecoderState::Disabled(_))
    }

    pub fn is_ended(&self) -> bool {
        self.state == DecoderState::Ended
    }

    /**
        Decode the next frame into the slot and return it.

        [`DecodeError::NoInput`] is the only outcome worth retrying.
        [`DecodeError::EndOfStream`] holds until the next reset and the two
        fatal errors hold for the life of the decoder.
    */
    pub fn decode(
        &mut self,
        broker: &mut PacketBroker,
        source: &mut dyn PacketSource,
    ) -> Result<&Frame, DecodeError> {
        match self.state {
            DecoderState::Disabled(fault) => return Err(fault),
            DecoderState::Ended => return Err(DecodeError::EndOfStream),
            DecoderState::Active | DecoderState::Draining => {}
        }

        loop {
            match self.codec.receive_frame() {
                Ok(frame) => {
                    self.last_pts = frame.pts().or(frame.dts()).or(self.last_pts);
                    broker.reclaim();
                    debug!(
                        stream = self.stream_index,
                        pts = self.last_pts.map(|p| p.0),
                        "decoded frame"
                    );
                    return Ok(self.frame.insert(frame));
                }
                Err(Error::Again) if self.state == DecoderState::Draining => {
                    return Err(self.end());
                }
                Err(Error::Again) => {}
                Err(Error::Eof) => return Err(self.end()),
                Err(e) => return Err(self.disable(broker, &e)),
            }

            let sent = match self.held.take() {
                Some(packet) => match self.codec.send_packet(&packet) {
                    Err(Error::Again) => {
                        warn!(stream = self.stream_index, "decoder refused packet twice, dropping it");
                        continue;
                    }
                    result => result,
                },
                None => match broker.next(source, self.stream_index) {
                    Ok(packet) => {
                        let result = self.codec.send_packet(packet);
                        if matches!(result, Err(Error::Again)) {
                            self.held = Some(packet.clone());
                        }
                        result
                    }
                    Err(NoPacket::EndOfInput) => {
                        match self.codec.send_eof() {
                            Ok(()) | Err(Error::Eof) => {}
                            Err(e) => return Err(self.disable(broker, &e)),
                        }
                        debug!(stream = self.stream_index, "draining decoder");
                        self.state = DecoderState::Draining;
                        continue;
                    }
                    Err(NoPacket::ReadFailed | NoPacket::NotInterested) => {
                        return Err(DecodeError::NoInput);
                    }
                },
            };

            match sent {
                Ok(()) | Err(Error::Again) => {}
                Err(Error::Eof) => return Err(self.end()),
                Err(e) => return Err(self.disable(broker, &e)),
            }
        }
    }

    fn end(&mut self) -> DecodeError {
        if self.state != DecoderState::Ended {
            debug!(stream = self.stream_index, "end of stream");
        }
        self.state = DecoderState::Ended;
        DecodeError::EndOfStream
    }

    fn disable(&mut self, broker: &mut PacketBroker, cause: &Error) -> DecodeError {
        let fault = match cause {
            Error::InvalidData { .. } => DecodeError::Corrupt,
            _ => DecodeError::Unknown,
        };
        error!(stream = self.stream_index, error = %cause, "disabling stream");
        self.state = DecoderState::Disabled(fault);
        self.held = None;
        broker.set_interest(self.stream_index, false);
        fault
    }

    /**
        Forget everything buffered, e.g. after the cursor moved.

        The slot is emptied but the last presentation time is kept, so the
        clock can still compare against where the stream was.
    */
    pub fn reset(&mut self) {
        self.codec.reset();
        self.frame = None;
        self.held = None;
        if !matches!(self.state, DecoderState::Disabled(_)) {
            self.state = DecoderState::Active;
        }
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.frame.as_mut()
    }

    pub fn take_frame(&mut self) -> Option<Frame> {
        self.frame.take()
    }

    pub fn last_pts(&self) -> Option<Pts> {
        self.last_pts
    }

    /// Presentation time of the most recent frame in seconds.
    pub fn presentation_time(&self) -> Option<f64> {
        self.last_pts.map(|pts| pts.to_seconds(self.time_base))
    }
}

impl std::fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("stream_index", &self.stream_index)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("last_pts", &self.last_pts)
            .finish_non_exhaustive()
    }
}
