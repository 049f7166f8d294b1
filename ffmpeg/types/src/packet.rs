/*!
    Encoded packet type.
*/

use crate::{MediaDuration, Pts, Rational};

/**
    Type of elementary stream.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    Video,
    Audio,
}

/**
    A compressed packet belonging to one container stream.

    Packets are read in container order from a single cursor, so packets of
    different streams arrive interleaved. `stream_index` says which stream a
    packet belongs to.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    pub data: Vec<u8>,
    /// Index of the owning stream within the container.
    pub stream_index: usize,
    /// Presentation timestamp.
    pub pts: Option<Pts>,
    /// Decode timestamp, may differ from `pts` when frames are reordered.
    pub dts: Option<Pts>,
    pub duration: MediaDuration,
    pub time_base: Rational,
    /// Whether this packet can be decoded without earlier packets.
    pub is_keyframe: bool,
}

impl Packet {
    /**
        Create a packet with no timing information.
    */
    pub fn new(data: Vec<u8>, stream_index: usize, time_base: Rational) -> Self {
        Self {
            data,
            stream_index,
            pts: None,
            dts: None,
            duration: MediaDuration(0),
            time_base,
            is_keyframe: false,
        }
    }

    pub fn with_timestamps(mut self, pts: Option<Pts>, dts: Option<Pts>) -> Self {
        self.pts = pts;
        self.dts = dts;
        self
    }

    pub fn with_duration(mut self, duration: MediaDuration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_keyframe(mut self, is_keyframe: bool) -> Self {
        self.is_keyframe = is_keyframe;
        self
    }

    /**
        Presentation time in seconds, if the packet has a PTS.
    */
    pub fn presentation_seconds(&self) -> Option<f64> {
        self.pts.map(|pts| pts.to_seconds(self.time_base))
    }
}

static_assertions::assert_impl_all!(Packet: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    const TB: Rational = Rational { num: 1, den: 1000 };

    #[test]
    fn builder_sets_fields() {
        let packet = Packet::new(vec![1, 2, 3], 1, TB)
            .with_timestamps(Some(Pts(1500)), Some(Pts(1400)))
            .with_duration(MediaDuration(40))
            .with_keyframe(true);

        assert_eq!(packet.stream_index, 1);
        assert_eq!(packet.dts, Some(Pts(1400)));
        assert_eq!(packet.duration, MediaDuration(40));
        assert!(packet.is_keyframe);
        assert_eq!(packet.presentation_seconds(), Some(1.5));
    }

    #[test]
    fn untimed_packet() {
        let packet = Packet::new(Vec::new(), 0, TB);
        assert_eq!(packet.presentation_seconds(), None);
        assert!(!packet.is_keyframe);
    }
}
