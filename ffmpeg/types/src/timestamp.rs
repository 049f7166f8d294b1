/*!
    Timestamps in stream time base units.
*/

use std::time::Duration;

use crate::Rational;

/**
    Presentation or decode timestamp, in time base ticks.

    A raw value from the container. It only means something together with
    the time base of the stream it came from.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

impl Pts {
    /**
        Seconds represented by this timestamp. Negative timestamps stay
        negative, which the playback clock relies on when comparing frames
        that precede the first keyframe.
    */
    #[inline]
    pub fn to_seconds(self, time_base: Rational) -> f64 {
        self.0 as f64 * time_base.to_f64()
    }

    /**
        Nearest tick for the given position in seconds.
    */
    #[inline]
    pub fn from_seconds(seconds: f64, time_base: Rational) -> Self {
        Self((seconds / time_base.to_f64()).round() as i64)
    }

    /**
        Convert to a `Duration`, clamping negative values to zero.
    */
    #[inline]
    pub fn to_duration(self, time_base: Rational) -> Duration {
        Duration::from_secs_f64(self.to_seconds(time_base).max(0.0))
    }
}

impl From<i64> for Pts {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/**
    A length of time in time base ticks, as opposed to a point in time.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaDuration(pub i64);

impl MediaDuration {
    #[inline]
    pub fn to_seconds(self, time_base: Rational) -> f64 {
        self.0 as f64 * time_base.to_f64()
    }

    #[inline]
    pub fn to_duration(self, time_base: Rational) -> Duration {
        Duration::from_secs_f64(self.to_seconds(time_base).max(0.0))
    }
}

impl From<i64> for MediaDuration {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
