/*!
    Rational numbers for time bases and frame rates.
*/

use std::fmt;

/**
    A rational number stored as numerator and denominator.

    Time bases are rationals (1/90000 for MPEG-TS, 1/44100 for most audio
    streams), so converting stream ticks to seconds goes through this type.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational number.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        Returns true if the rational can be used as a time base.
    */
    #[inline]
    pub const fn is_valid_time_base(self) -> bool {
        self.num > 0 && self.den > 0
    }

    /**
        Rescale `ticks` expressed in `self` units into `to` units,
        rounding to the nearest tick.

        Computed in 128-bit integers so large timestamps in fine-grained
        time bases do not overflow.
    */
    pub fn rescale(self, ticks: i64, to: Rational) -> i64 {
        let num = ticks as i128 * self.num as i128 * to.den as i128;
        let den = self.den as i128 * to.num as i128;
        if den == 0 {
            return 0;
        }
        let half = den.abs() / 2;
        let rounded = if (num >= 0) == (den > 0) {
            (num.abs() + half) / den.abs()
        } else {
            -((num.abs() + half) / den.abs())
        };
        rounded.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}
