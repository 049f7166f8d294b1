/*!
    Distribution of packets from one container cursor to several decoders.
*/

use std::collections::VecDeque;

use ffmpeg_types::Packet;
use tracing::{debug, warn};

use crate::backend::PacketSource;

/// Interest slots are tracked as bits of a `u32`.
const MAX_STREAMS: usize = 32;

/**
    Why [`PacketBroker::next`] had nothing to hand out.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPacket {
    /// The container has no more packets. Sticky until [`PacketBroker::flush`].
    EndOfInput,
    /// The container read failed. A later call may succeed.
    ReadFailed,
    /// The stream is not in the interest set.
    NotInterested,
}

#[derive(Debug)]
struct PendingPacket {
    packet: Packet,
    /// One bit per interest slot. Set once the slot has seen the packet or
    /// never needs to.
    delivered: u32,
}

/**
    Gives every interested stream its own read position over the shared
    container cursor.

    Packets read on behalf of one stream that belong to another interested
    stream are held until that stream asks for them. A packet is only ever
    handed to the stream that owns it, so every other slot is marked as
    delivered when it is queued. Packets of streams nobody is interested in
    are dropped as soon as they are read.
*/
#[derive(Debug)]
pub struct PacketBroker {
    pending: VecDeque<PendingPacket>,
    slots: Vec<usize>,
    active: u32,
    end_of_input: bool,
    high_water_mark: usize,
    dropped: u64,
}

impl PacketBroker {
    pub fn new(high_water_mark: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            slots: Vec::new(),
            active: 0,
            end_of_input: false,
            high_water_mark: high_water_mark.max(2),
            dropped: 0,
        }
    }

    fn slot_of(&self, stream: usize) -> Option<usize> {
        self.slots.iter().position(|&s| s == stream)
    }

    fn active_bit(&self, stream: usize) -> Option<u32> {
        let bit = 1u32 << self.slot_of(stream)?;
        (self.active & bit != 0).then_some(bit)
    }

    /**
        Add or remove a stream from the interest set.

        Removing a stream releases every packet that was only waiting for
        it. Adding one never replays packets already queued.
    */
    pub fn set_interest(&mut self, stream: usize, interested: bool) {
        let slot = match self.slot_of(stream) {
            Some(slot) => slot,
            None if !interested => return,
            None if self.slots.len() >= MAX_STREAMS => {
                warn!(stream, "too many streams for packet broker, ignoring");
                return;
            }
            None => {
                self.slots.push(stream);
                self.slots.len() - 1
            }
        };
        let bit = 1u32 << slot;
        if interested {
            self.active |= bit;
            for pending in &mut self.pending {
                pending.delivered |= bit;
            }
        } else {
            self.active &= !bit;
            self.reclaim();
        }
    }

    pub fn is_interested(&self, stream: usize) -> bool {
        self.active_bit(stream).is_some()
    }

    /**
        Hand out the oldest packet of `stream` that it has not seen yet,
        reading from `source` when none is queued.
    */
    pub fn next(
        &mut self,
        source: &mut dyn PacketSource,
        stream: usize,
    ) -> Result<&Packet, NoPacket> {
        let bit = self.active_bit(stream).ok_or(NoPacket::NotInterested)?;

        if let Some(index) = self.pending.iter().position(|p| p.delivered & bit == 0) {
            let pending = &mut self.pending[index];
            pending.delivered |= bit;
            return Ok(&pending.packet);
        }

        loop {
            if self.end_of_input {
                return Err(NoPacket::EndOfInput);
            }
            let packet = match source.read_packet() {
                Ok(Some(packet)) => packet,
                Ok(None) => {
                    debug!("end of input");
                    self.end_of_input = true;
                    return Err(NoPacket::EndOfInput);
                }
                Err(e) => {
                    warn!(stream, error = %e, "failed to read packet");
                    return Err(NoPacket::ReadFailed);
                }
            };

            let Some(owner) = self.active_bit(packet.stream_index) else {
                debug!(stream = packet.stream_index, "dropping packet of unwatched stream");
                continue;
            };
            let delivered = !owner | if owner == bit { bit } else { 0 };
            self.pending.push_back(PendingPacket { packet, delivered });
            self.enforce_high_water_mark();

            if owner == bit {
                return self
                    .pending
                    .back()
                    .map(|p| &p.packet)
                    .ok_or(NoPacket::ReadFailed);
            }
        }
    }

    /**
        Remove packets from the front of the queue that every interested
        stream has consumed. Returns how many were removed.
    */
    pub fn reclaim(&mut self) -> usize {
        let mut removed = 0;
        while self
            .pending
            .front()
            .is_some_and(|p| p.delivered & self.active == self.active)
        {
            self.pending.pop_front();
            removed += 1;
        }
        removed
    }

    /**
        Discard every pending packet regardless of who has seen it, and
        forget that the input ended. Used after the cursor moved.
    */
    pub fn flush(&mut self) {
        if !self.pending.is_empty() {
            debug!(count = self.pending.len(), "flushing pending packets");
        }
        self.pending.clear();
        self.end_of_input = false;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_end_of_input(&self) -> bool {
        self.end_of_input
    }

    /// Packets discarded by the high water mark since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn enforce_high_water_mark(&mut self) {
        if self.pending.len() <= self.high_water_mark {
            return;
        }
        let count = self.pending.len() / 2;
        self.pending.drain(..count);
        self.dropped += count as u64;
        warn!(
            count,
            high_water_mark = self.high_water_mark,
            "packet queue over limit, dropped oldest packets"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::test_support::{AUDIO, ScriptedMedia, VIDEO};

    fn av_broker() -> PacketBroker {
        let mut broker = PacketBroker::new(500);
        broker.set_interest(VIDEO, true);
        broker.set_interest(AUDIO, true);
        broker
    }

    #[test]
    fn packets_go_to_their_stream_once() {
        let media = ScriptedMedia::av().with_packets(40);
        let mut source = media.source();
        let mut broker = av_broker();
        let mut seen = HashSet::new();

        // Uneven pacing: three video requests for every audio request
        for round in 0..80 {
            let stream = if round % 4 == 3 { AUDIO } else { VIDEO };
            match broker.next(&mut source, stream) {
                Ok(packet) => {
                    assert_eq!(packet.stream_index, stream);
                    assert!(seen.insert((stream, packet.pts)), "duplicate delivery");
                }
                Err(NoPacket::EndOfInput) => {}
                Err(other) => panic!("unexpected {other:?}"),
            }
            broker.reclaim();
        }
        // Video hit the end of input with the remaining audio still queued
        while let Ok(packet) = broker.next(&mut source, AUDIO) {
            assert_eq!(packet.stream_index, AUDIO);
            assert!(seen.insert((AUDIO, packet.pts)), "duplicate delivery");
        }
        broker.reclaim();

        assert_eq!(seen.iter().filter(|(stream, _)| *stream == VIDEO).count(), 40);
        assert_eq!(seen.iter().filter(|(stream, _)| *stream == AUDIO).count(), 40);
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn queued_packet_waits_for_its_stream() {
        let media = ScriptedMedia::av().with_packets(5);
        let mut source = media.source();
        let mut broker = av_broker();

        // Reading the first video packet queues the audio packet before it
        let pts = broker.next(&mut source, VIDEO).map(|p| p.pts);
        assert_eq!(pts, Ok(Some(ffmpeg_types::Pts(0))));
        assert_eq!(broker.pending_len(), 2);
        assert_eq!(broker.reclaim(), 0);

        let audio = broker.next(&mut source, AUDIO).map(|p| p.stream_index);
        assert_eq!(audio, Ok(AUDIO));
        assert_eq!(broker.reclaim(), 2);
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn uninterested_streams_are_dropped_at_read() {
        let media = ScriptedMedia::av().with_packets(5);
        let mut source = media.source();
        let mut broker = PacketBroker::new(500);
        broker.set_interest(VIDEO, true);

        for _ in 0..5 {
            assert!(broker.next(&mut source, VIDEO).is_ok());
            broker.reclaim();
        }
        assert_eq!(broker.pending_len(), 0);
        assert_eq!(broker.next(&mut source, AUDIO).err(), Some(NoPacket::NotInterested));
    }

    #[test]
    fn removing_interest_releases_packets() {
        let media = ScriptedMedia::av().with_packets(10);
        let mut source = media.source();
        let mut broker = av_broker();

        for _ in 0..10 {
            assert!(broker.next(&mut source, VIDEO).is_ok());
        }
        // Ten consumed video packets behind ten unread audio packets
        assert_eq!(broker.pending_len(), 20);
        assert_eq!(broker.reclaim(), 0);
        broker.set_interest(AUDIO, false);
        assert_eq!(broker.pending_len(), 0);
    }

    #[test]
    fn end_of_input_is_sticky_until_flush() {
        let media = ScriptedMedia::video_only().with_packets(2);
        let mut source = media.source();
        let mut broker = PacketBroker::new(500);
        broker.set_interest(VIDEO, true);

        assert!(broker.next(&mut source, VIDEO).is_ok());
        assert!(broker.next(&mut source, VIDEO).is_ok());
        assert_eq!(broker.next(&mut source, VIDEO).err(), Some(NoPacket::EndOfInput));
        let reads = media.counters.reads.load(std::sync::atomic::Ordering::SeqCst);
        assert_eq!(broker.next(&mut source, VIDEO).err(), Some(NoPacket::EndOfInput));
        assert_eq!(
            media.counters.reads.load(std::sync::atomic::Ordering::SeqCst),
            reads
        );

        broker.flush();
        assert!(!broker.is_end_of_input());
    }

    #[test]
    fn read_failure_is_reported_not_fabricated() {
        let mut media = ScriptedMedia::video_only().with_packets(3);
        media.failing_reads = vec![1];
        let mut source = media.source();
        let mut broker = PacketBroker::new(500);
        broker.set_interest(VIDEO, true);

        assert_eq!(broker.next(&mut source, VIDEO).err(), Some(NoPacket::ReadFailed));
        assert!(!broker.is_end_of_input());
        assert!(broker.next(&mut source, VIDEO).is_ok());
    }

    #[test]
    fn high_water_mark_drops_oldest_half() {
        let media = ScriptedMedia::av().with_packets(20);
        let mut source = media.source();
        let mut broker = PacketBroker::new(8);
        broker.set_interest(VIDEO, true);
        broker.set_interest(AUDIO, true);

        // Audio never reads, so video requests pile its packets up
        for _ in 0..10 {
            assert!(broker.next(&mut source, VIDEO).is_ok());
        }
        assert!(broker.pending_len() <= 8);
        assert!(broker.dropped() > 0);

        // Whatever audio finds now must still be unseen audio
        let packet = broker.next(&mut source, AUDIO);
        assert_eq!(packet.map(|p| p.stream_index), Ok(AUDIO));
    }
}
