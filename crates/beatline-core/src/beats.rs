use std::{
    cmp::Ordering,
    fmt,
    ops::{Add, Sub},
};

/// Absolute tolerance used when comparing beat positions that arrive as floats.
pub const EPSILON_BEATS: f64 = 0.000_001;

/// An exact position on the beat axis, `numerator / divisor` beats.
///
/// Equality and ordering compare values, so `1/2 == 2/4`. The divisor is
/// always positive.
#[derive(Debug, Clone, Copy)]
pub struct Beats {
    numerator: i64,
    divisor: i64,
}

impl Beats {
    pub const ZERO: Self = Self {
        numerator: 0,
        divisor: 1,
    };

    /// # Panics
    ///
    /// Panics when `divisor` is zero.
    #[must_use]
    pub fn new(numerator: i64, divisor: i64) -> Self {
        assert!(divisor != 0, "beat divisor must be non-zero");
        if divisor < 0 {
            Self {
                numerator: numerator.saturating_neg(),
                divisor: divisor.saturating_neg(),
            }
        } else {
            Self { numerator, divisor }
        }
    }

    #[must_use]
    pub const fn whole(beats: i64) -> Self {
        Self {
            numerator: beats,
            divisor: 1,
        }
    }

    #[must_use]
    pub const fn numerator(self) -> i64 {
        self.numerator
    }

    #[must_use]
    pub const fn divisor(self) -> i64 {
        self.divisor
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.numerator as f64 / self.divisor as f64
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.numerator == 0
    }

    #[must_use]
    pub fn reduced(self) -> Self {
        from_wide(i128::from(self.numerator), i128::from(self.divisor))
    }

    /// Expresses both positions over their least common divisor.
    ///
    /// Returns `(a_units, b_units, divisor)`.
    #[must_use]
    pub fn align(a: Self, b: Self) -> (i64, i64, i64) {
        let a = a.reduced();
        let b = b.reduced();
        let a_div = i128::from(a.divisor);
        let b_div = i128::from(b.divisor);
        let common = a_div / i128::from(gcd(a.divisor.unsigned_abs(), b.divisor.unsigned_abs()))
            * b_div;
        (
            saturate(i128::from(a.numerator) * (common / a_div)),
            saturate(i128::from(b.numerator) * (common / b_div)),
            saturate(common),
        )
    }

    /// Number of whole `1/divisor` grid units at or before this position.
    #[must_use]
    pub fn floor_units(self, divisor: i64) -> i64 {
        let scaled = i128::from(self.numerator) * i128::from(divisor);
        saturate(scaled.div_euclid(i128::from(self.divisor)))
    }

    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if other < self { other } else { self }
    }
}

impl Default for Beats {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for Beats {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Beats {}

impl PartialOrd for Beats {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Beats {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.numerator) * i128::from(other.divisor);
        let rhs = i128::from(other.numerator) * i128::from(self.divisor);
        lhs.cmp(&rhs)
    }
}

impl Add for Beats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        from_wide(
            i128::from(self.numerator) * i128::from(other.divisor)
                + i128::from(other.numerator) * i128::from(self.divisor),
            i128::from(self.divisor) * i128::from(other.divisor),
        )
    }
}

impl Sub for Beats {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        from_wide(
            i128::from(self.numerator) * i128::from(other.divisor)
                - i128::from(other.numerator) * i128::from(self.divisor),
            i128::from(self.divisor) * i128::from(other.divisor),
        )
    }
}

impl fmt::Display for Beats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reduced = self.reduced();
        if reduced.divisor == 1 {
            write!(f, "{}", reduced.numerator)
        } else {
            write!(f, "{}/{}", reduced.numerator, reduced.divisor)
        }
    }
}

#[must_use]
pub fn equal(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON_BEATS
}

#[must_use]
pub fn lt(a: f64, b: f64) -> bool {
    a < b - EPSILON_BEATS
}

#[must_use]
pub fn lte(a: f64, b: f64) -> bool {
    a <= b + EPSILON_BEATS
}

#[must_use]
pub fn gt(a: f64, b: f64) -> bool {
    a > b + EPSILON_BEATS
}

#[must_use]
pub fn gte(a: f64, b: f64) -> bool {
    a >= b - EPSILON_BEATS
}

/// Re-expresses `value / old_divisor` on a `new_divisor` grid, rounding down.
#[must_use]
pub fn rebase(value: i64, old_divisor: i64, new_divisor: i64) -> i64 {
    if old_divisor <= 0 {
        return value;
    }
    Beats::new(value, old_divisor).floor_units(new_divisor)
}

#[must_use]
pub fn snap_floor(beats: f64, divisor: i64) -> f64 {
    if divisor <= 0 {
        return beats;
    }
    let divisor = divisor as f64;
    (beats * divisor).floor() / divisor
}

fn from_wide(numerator: i128, divisor: i128) -> Beats {
    let (mut numerator, mut divisor) = if divisor < 0 {
        (-numerator, -divisor)
    } else {
        (numerator, divisor)
    };
    let divisor_gcd = gcd_wide(numerator.unsigned_abs(), divisor.unsigned_abs());
    if divisor_gcd > 1 {
        let divisor_gcd = divisor_gcd as i128;
        numerator /= divisor_gcd;
        divisor /= divisor_gcd;
    }
    Beats {
        numerator: saturate(numerator),
        divisor: saturate(divisor).max(1),
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let next = a % b;
        a = b;
        b = next;
    }
    a.max(1)
}

fn gcd_wide(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let next = a % b;
        a = b;
        b = next;
    }
    a.max(1)
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}
