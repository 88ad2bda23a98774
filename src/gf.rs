//! GF(256) arithmetic.
//!
//! The field is the one `ramrsbd` (and the `gf256` crate it grows out of)
//! both use: `x^8 + x^4 + x^3 + x^2 + 1` (0x11d), with generator `0x02`.

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};
use std::sync::OnceLock;

/// The irreducible polynomial defining the field.
pub const POLYNOMIAL: u16 = 0x11d;
/// A generator of the field's multiplicative group.
pub const GENERATOR: Gf256 = Gf256(0x02);
/// Size of the multiplicative group, `2^8 - 1`.
pub const NONZEROS: u8 = 255;

/// An element of GF(256).
///
/// Addition and subtraction are both xor; there's no separate `sub`
/// method for it, same as the C this is grounded on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gf256(pub u8);

struct Tables {
    // log(0) is undefined; we park it at NONZEROS so table lookups
    // involving log(0) naturally fail a pow/div precondition rather
    // than silently aliasing log(1) = 0.
    log: [u8; 256],
    // doubled to 512 entries so `exp[log(a) + log(b)]` never needs a
    // modulo reduction.
    exp: [u8; 512],
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut log = [0u8; 256];
        let mut exp = [0u8; 512];
        log[0] = NONZEROS;

        let mut x: u16 = 1;
        for i in 0..NONZEROS as usize {
            exp[i] = x as u8;
            log[x as usize] = i as u8;

            x <<= 1;
            if x & 0x100 != 0 {
                x ^= POLYNOMIAL;
            }
        }
        // mirror the first period so indices up to 2*NONZEROS-2 are valid
        for i in 0..NONZEROS as usize {
            exp[NONZEROS as usize + i] = exp[i];
        }

        Tables { log, exp }
    })
}

impl Gf256 {
    pub const fn new(x: u8) -> Self {
        Self(x)
    }

    /// Naive multiplication via carry-less multiply + reduction, used
    /// only to double-check the table-driven `mul` in tests.
    pub const fn naive_mul(self, other: Self) -> Self {
        let mut x = self.0 as u16;
        let y = other.0 as u16;
        let mut r: u16 = 0;

        let mut i = 0;
        while i < 8 {
            if y & (1 << i) != 0 {
                r ^= x;
            }
            x <<= 1;
            i += 1;
        }

        let mut i = 15;
        loop {
            if i < 8 {
                break;
            }
            if r & (1 << i) != 0 {
                r ^= POLYNOMIAL << (i - 8);
            }
            i -= 1;
        }

        Self(r as u8)
    }

    /// Multiplication in the field.
    pub fn mul(self, other: Self) -> Self {
        if self.0 == 0 || other.0 == 0 {
            return Self(0);
        }
        let t = tables();
        let i = t.log[self.0 as usize] as usize + t.log[other.0 as usize] as usize;
        Self(t.exp[i])
    }

    /// Exponentiation in the field, `self^exp`.
    pub fn pow(self, exp: u32) -> Self {
        if exp == 0 {
            return Self(1);
        }
        if self.0 == 0 {
            return Self(0);
        }
        let t = tables();
        let i = (t.log[self.0 as usize] as u32 * exp) % NONZEROS as u32;
        Self(t.exp[i as usize])
    }

    /// Multiplicative inverse. Panics if `self` is zero: dividing by
    /// zero is a contract violation, not a recoverable data error.
    pub fn recip(self) -> Self {
        assert!(self.0 != 0, "gf256: division by zero");
        let t = tables();
        let i = NONZEROS as usize - t.log[self.0 as usize] as usize;
        Self(t.exp[i])
    }

    /// Division in the field. Panics if `other` is zero.
    pub fn div(self, other: Self) -> Self {
        if self.0 == 0 {
            assert!(other.0 != 0, "gf256: division by zero");
            return Self(0);
        }
        self.mul(other.recip())
    }
}

impl From<u8> for Gf256 {
    fn from(x: u8) -> Self {
        Self(x)
    }
}

impl From<Gf256> for u8 {
    fn from(x: Gf256) -> Self {
        x.0
    }
}

impl fmt::Display for Gf256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl Add for Gf256 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }
}
impl AddAssign for Gf256 {
    fn add_assign(&mut self, other: Self) {
        self.0 ^= other.0;
    }
}
impl Sub for Gf256 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }
}
impl SubAssign for Gf256 {
    fn sub_assign(&mut self, other: Self) {
        self.0 ^= other.0;
    }
}
impl Mul for Gf256 {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Gf256::mul(self, other)
    }
}
impl MulAssign for Gf256 {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}
impl Div for Gf256 {
    type Output = Self;
    fn div(self, other: Self) -> Self {
        Gf256::div(self, other)
    }
}
impl DivAssign for Gf256 {
    fn div_assign(&mut self, other: Self) {
        *self = *self / other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_are_xor() {
        assert_eq!(Gf256(0x12) + Gf256(0x34), Gf256(0x26));
        assert_eq!(Gf256(0x12) - Gf256(0x34), Gf256(0x26));
    }

    #[test]
    fn mul_matches_naive() {
        for a in 0..=255u16 {
            for b in 0..=255u16 {
                let a = Gf256(a as u8);
                let b = Gf256(b as u8);
                assert_eq!(a.mul(b), a.naive_mul(b));
            }
        }
    }

    #[test]
    fn mul_div_are_inverse() {
        for a in (1..=255u16).map(|x| Gf256(x as u8)) {
            for b in (1..=255u16).map(|x| Gf256(x as u8)) {
                let c = a * b;
                assert_eq!(c / b, a);
                assert_eq!(c / a, b);
            }
        }
    }

    #[test]
    fn pow_matches_repeated_mul() {
        for a in (0..=255u16).map(|x| Gf256(x as u8)) {
            let mut x = Gf256(1);
            for e in 0..=16u32 {
                assert_eq!(a.pow(e), x);
                x = x * a;
            }
        }
    }

    #[test]
    fn zero_has_no_reciprocal() {
        let result = std::panic::catch_unwind(|| Gf256(0).recip());
        assert!(result.is_err());
    }

    #[test]
    fn generator_order_is_255() {
        // g^255 == g^0 == 1, and no smaller positive power does
        assert_eq!(GENERATOR.pow(255), Gf256(1));
        for e in 1..255 {
            assert_ne!(GENERATOR.pow(e), Gf256(1));
        }
    }
}
