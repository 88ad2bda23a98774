//! Polynomial arithmetic over GF(256), represented as most-significant-
//! coefficient-first byte slices.
//!
//! Every function here takes plain `&[u8]`/`&mut [u8]` rather than a
//! wrapper type, mirroring `ramrsbd_gf_p_*`'s slice-and-size signatures.

use crate::gf::Gf256;

/// Evaluate a polynomial at `x` using Horner's method.
pub fn eval(p: &[u8], x: u8) -> u8 {
    let x = Gf256(x);
    let mut y = Gf256(0);
    for &c in p {
        y = y * x + Gf256(c);
    }
    y.0
}

/// Multiply a polynomial in place by a scalar constant.
pub fn scale(p: &mut [u8], c: u8) {
    let c = Gf256(c);
    for x in p.iter_mut() {
        *x = (Gf256(*x) * c).0;
    }
}

/// Xor two polynomials together. This is both addition and subtraction
/// in a field of characteristic 2.
///
/// `b` may be shorter than `a`; it is aligned to `a`'s low-order end.
pub fn xor(a: &mut [u8], b: &[u8]) {
    debug_assert!(a.len() >= b.len());
    let off = a.len() - b.len();
    for i in 0..b.len() {
        a[off + i] ^= b[i];
    }
}

/// Xor `a` with `b` scaled by `c`, i.e. `a ^= c*b`, without needing to
/// materialize the scaled copy of `b`.
///
/// `b` may be shorter than `a`; it is aligned to `a`'s low-order end.
pub fn xors(a: &mut [u8], c: u8, b: &[u8]) {
    debug_assert!(a.len() >= b.len());
    let c = Gf256(c);
    let off = a.len() - b.len();
    for i in 0..b.len() {
        a[off + i] ^= (c * Gf256(b[i])).0;
    }
}

/// Multiply two polynomials together in place, truncating the result to
/// fit back into `a`'s length (this is how the generator-polynomial
/// construction and the error-evaluator computation stay in fixed-size
/// scratch buffers: high-order terms that would overflow `a` are
/// silently the ones this truncation drops, which is exactly `mod x^n`
/// for the callers that want that).
pub fn mul(a: &mut [u8], b: &[u8]) {
    debug_assert!(a.len() >= b.len());
    let n = a.len();
    let m = b.len();

    // only a[m-1 + i] for i in 0..(n-m)+1 is ever read as the "old" high
    // term, and m-1+i is always >= m-1+0-j for j in 0..m, so we can
    // multiply in place without a second buffer.
    for i in 0..(n - m) + 1 {
        let x = Gf256(a[m - 1 + i]);
        a[m - 1 + i] = 0;

        for j in 0..m {
            a[m - 1 + i - j] ^= (x * Gf256(b[m - 1 - j])).0;
        }
    }
}

/// Divide `a` by `b` via synthetic division, leaving the quotient in the
/// leading `a.len() - b.len() + 1` bytes and the remainder in the
/// trailing `b.len() - 1` bytes of `a`.
pub fn divmod(a: &mut [u8], b: &[u8]) {
    debug_assert!(a.len() >= b.len());
    let c = b[0];

    for i in 0..(a.len() - b.len()) + 1 {
        if a[i] != 0 {
            a[i] = (Gf256(a[i]) / Gf256(c)).0;
            for j in 1..b.len() {
                a[i + j] ^= (Gf256(a[i]) * Gf256(b[j])).0;
            }
        }
    }
}

/// Same as [`divmod`], but `b` has an implicit leading 1 and its actual
/// length is `b.len() + 1`. This is what the encoder uses: the generator
/// polynomial is stored without its (always-1) leading coefficient, so
/// no normalization step is needed.
pub fn divmod1(a: &mut [u8], b: &[u8]) {
    debug_assert!(a.len() >= b.len() + 1);

    for i in 0..(a.len() - (b.len() + 1)) + 1 {
        if a[i] != 0 {
            // leading coefficient of b is implicitly 1, so a[i] is
            // already normalized
            for j in 0..b.len() {
                a[i + 1 + j] ^= (Gf256(a[i]) * Gf256(b[j])).0;
            }
        }
    }
}
