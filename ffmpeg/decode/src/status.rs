/*!
    Translation of codec status codes and packets between ffmpeg-next and
    ffmpeg-types.
*/

use ffmpeg_next::{ffi, packet::Mut as PacketMut};

use ffmpeg_types::{Error, Packet, Pts};

/**
    Map a send/receive error from ffmpeg-next onto the shared error type.
*/
pub(crate) fn map_codec_error(e: ffmpeg_next::Error) -> Error {
    match e {
        ffmpeg_next::Error::Other { errno } if errno == ffi::EAGAIN => Error::Again,
        ffmpeg_next::Error::Eof => Error::Eof,
        ffmpeg_next::Error::InvalidData => Error::invalid_data(e.to_string()),
        e => Error::codec(e.to_string()),
    }
}

/**
    Build an FFmpeg packet carrying our packet's data and timing.
*/
pub(crate) fn to_ffmpeg_packet(packet: &Packet) -> ffmpeg_next::Packet {
    let mut ffmpeg_pkt = if packet.data.is_empty() {
        ffmpeg_next::Packet::empty()
    } else {
        ffmpeg_next::Packet::copy(&packet.data)
    };

    // SAFETY: the packet was just allocated and is exclusively owned here.
    unsafe {
        let pkt_ptr = ffmpeg_pkt.as_mut_ptr();
        if let Some(pts) = packet.pts {
            (*pkt_ptr).pts = pts.0;
        }
        if let Some(dts) = packet.dts {
            (*pkt_ptr).dts = dts.0;
        }
        (*pkt_ptr).duration = packet.duration.0;
    }
    ffmpeg_pkt.set_flags(if packet.is_keyframe {
        ffmpeg_next::packet::Flags::KEY
    } else {
        ffmpeg_next::packet::Flags::empty()
    });

    ffmpeg_pkt
}

/**
    Decode timestamp of the packet a frame was decoded from.
*/
pub(crate) fn frame_dts(frame: &ffmpeg_next::Frame) -> Option<Pts> {
    // SAFETY: reading a plain field of a frame we hold a reference to.
    let dts = unsafe { (*frame.as_ptr()).pkt_dts };
    (dts != ffi::AV_NOPTS_VALUE).then_some(Pts(dts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eagain_maps_to_again() {
        let e = map_codec_error(ffmpeg_next::Error::Other {
            errno: ffi::EAGAIN,
        });
        assert!(e.is_again());
    }

    #[test]
    fn eof_and_invalid_data() {
        assert!(map_codec_error(ffmpeg_next::Error::Eof).is_eof());
        assert!(matches!(
            map_codec_error(ffmpeg_next::Error::InvalidData),
            Error::InvalidData { .. }
        ));
        assert!(matches!(
            map_codec_error(ffmpeg_next::Error::Bug),
            Error::Codec { .. }
        ));
    }
}
