use serde::{Serialize, Serializer};
use std::fmt;

/// Balances within this many currency units of zero are treated as settled.
pub const EPSILON: f64 = 0.01;

/// Scaled values this close below a half cent still round up.
const HALF_CENT_BIAS: f64 = 1e-6;

/// Whether a floating-point balance is close enough to zero to be ignored.
pub fn is_negligible(value: f64) -> bool {
    value.abs() <= EPSILON
}

/// Fixed-point money with 2 decimal places, stored as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(i64);

impl Amount {
    const SCALE: i64 = 100;

    /// Round a currency value to the nearest cent, halves away from zero.
    ///
    /// Decimal halves such as 1.005 land just below the half once scaled, so
    /// the scaled value is nudged away from zero before rounding.
    pub fn from_float(value: f64) -> Self {
        let scaled = value * Self::SCALE as f64;
        Amount((scaled + scaled.signum() * HALF_CENT_BIAS).round() as i64)
    }

    /// Round a currency value down to the cent, returning the fraction of a
    /// cent that was dropped.
    pub fn floor_float(value: f64) -> (Self, f64) {
        let scaled = value * Self::SCALE as f64;
        let floor = scaled.floor();
        (Amount(floor as i64), scaled - floor)
    }

    pub fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    pub fn cents(self) -> i64 {
        self.0
    }

    pub fn to_float(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::ops::Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}
