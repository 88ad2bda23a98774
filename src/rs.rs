//! Reed-Solomon BCH encoding and decoding: generator-polynomial
//! construction, systematic encode, and syndrome/Berlekamp-Massey/Forney
//! decode.
//!
//! Operates on fixed-size codewords, one at a time, using caller-supplied
//! scratch space so no allocation happens on the read/write hot path —
//! [`crate::device`] owns that scratch for the lifetime of a device.

use crate::gf::{Gf256, GENERATOR};
use crate::poly;

/// Build the generator polynomial `P(x) = prod_{i=0}^{ecc_size-1} (x - g^i)`.
///
/// `p` has length `ecc_size`; the leading coefficient (always 1) is left
/// implicit, matching [`poly::divmod1`]'s convention.
pub fn generator_poly(p: &mut [u8]) {
    let ecc_size = p.len();
    if ecc_size == 0 {
        // no parity at all: P(x) = 1, fully implicit, nothing to store
        return;
    }
    // let P(x) = 1
    p.fill(0);
    p[ecc_size - 1] = 1;

    for i in 0..ecc_size {
        // let R(x) = x - g^i  (stored with its own implicit leading 1,
        // so just the trailing coefficient is explicit)
        let r = [GENERATOR.pow(i as u32).0];
        // let P(x) = P(x) * R(x), truncated back to ecc_size terms
        poly::mul(p, &r);
    }
}

/// Systematic encode: write the full `code_size`-byte codeword for
/// `message` (length `code_size - ecc_size`) into `c`.
///
/// `p` is the generator polynomial (length `ecc_size`, implicit leading
/// 1, as built by [`generator_poly`]).
pub fn encode(message: &[u8], c: &mut [u8], p: &[u8]) {
    let ecc_size = p.len();
    debug_assert!(c.len() == message.len() + ecc_size);
    let k = message.len();

    // C(x) = M(x) x^ecc_size + (M(x) x^ecc_size mod P(x))
    c[..k].copy_from_slice(message);
    c[k..].fill(0);
    poly::divmod1(c, p);

    // divmod1 clobbers the message part of c as a side effect of
    // synthetic division; restore it from the original. Skipping this
    // restore was a historical bug — the codeword written to media must
    // be the full message-plus-parity, not just the freshly computed
    // parity sitting atop a clobbered message.
    c[..k].copy_from_slice(message);
}

/// Outcome of [`decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// No errors were present; the codeword was already valid.
    Clean,
    /// `errors` byte errors were found and corrected in place.
    Corrected { errors: usize },
    /// More errors were found than the error-locator could resolve, or
    /// re-verification failed after correction. `errors` is the
    /// Berlekamp-Massey error count, if one was computed.
    Uncorrectable { errors: Option<usize> },
}

/// Scratch space for [`decode`], sized to match the codeword's ecc_size.
/// Reused across calls by the owner (see [`crate::device`]) to avoid
/// allocating per read.
pub struct DecodeScratch {
    /// syndrome buffer; doubles as the error-evaluator polynomial Ω(x)
    pub s: Vec<u8>,
    /// error-locator polynomial Λ(x)
    pub lambda: Vec<u8>,
    /// Berlekamp-Massey auxiliary buffer
    pub t: Vec<u8>,
}

impl DecodeScratch {
    pub fn new(ecc_size: usize) -> Self {
        Self {
            s: vec![0; ecc_size],
            lambda: vec![0; ecc_size],
            t: vec![0; ecc_size],
        }
    }
}

/// Find the syndromes of a codeword, `S_i = C(g^(n-k-1-i))`.
///
/// Returns `true` if all syndromes are zero (no errors present), for
/// convenience.
fn find_syndromes(s: &mut [u8], c: &[u8]) -> bool {
    let mut zero = true;
    let n = s.len();
    for i in 0..n {
        s[i] = poly::eval(c, GENERATOR.pow((n - 1 - i) as u32).0);
        if s[i] != 0 {
            zero = false;
        }
    }
    zero
}

/// Find the error-locator polynomial Λ(x) via Berlekamp-Massey, using
/// `t` as scratch space. Returns the number of errors found.
fn find_error_locator(lambda: &mut [u8], t: &mut [u8], s: &[u8]) -> usize {
    let n = lambda.len();
    debug_assert!(t.len() == n && s.len() == n);

    let mut e = 0usize;
    lambda.fill(0);
    lambda[n - 1] = 1;
    t.fill(0);
    t[n - 1] = 1;

    for iter in 0..n {
        // shift t left by one
        t.copy_within(1.., 0);
        t[n - 1] = 0;

        // discrepancy d = S_n - sum_{i=1}^{e} lambda_i * S_{n-i}
        let mut d = Gf256(s[n - 1 - iter]);
        for i in 1..=e {
            d += Gf256(lambda[n - 1 - i]) * Gf256(s[n - 1 - (iter - i)]);
        }

        if d.0 != 0 {
            // lambda -= d*t
            poly::xors(lambda, d.0, t);

            if iter >= 2 * e {
                e = iter + 1 - e;
                // t = t + d^-1 * lambda (reusing the just-updated lambda,
                // since t_new = d^-1 * lambda_new algebraically)
                let d_inv = Gf256(1).div(d).0;
                poly::xors(t, d_inv, lambda);
            }
        }
    }

    e
}

/// Evaluate the formal derivative of Λ at `x`.
///
/// Unlike the generator polynomial, Λ has no implicit leading term: it
/// is stored fully explicit over degrees `0..lambda.len()`, with
/// `lambda[lambda.len()-1-j]` the coefficient of `x^j`.
///
/// In characteristic 2, `d/dx (sum a_j x^j) = sum_{j odd} a_j x^(j-1)`:
/// even-power terms vanish since their coefficient doubles (and 2=0).
fn eval_error_locator_derivative(lambda: &[u8], x: u8) -> u8 {
    let x = Gf256(x);
    let x2 = x * x;
    let n = lambda.len();

    let mut y = Gf256(0);
    let mut xp = Gf256(1); // x^(j-1)
    let mut j = 1;
    while j < n {
        y += Gf256(lambda[n - 1 - j]) * xp;
        xp *= x2;
        j += 2;
    }

    y.0
}

/// Decode a received codeword `c` in place: find, locate, and correct
/// byte errors, then re-verify. `scratch` must have been sized for this
/// codeword's `ecc_size` (see [`DecodeScratch::new`]).
///
/// `limit` is the maximum number of byte errors to accept as
/// correctable (the device's `error_correction` policy, already resolved
/// against `ecc_size/2`).
pub fn decode(c: &mut [u8], scratch: &mut DecodeScratch, limit: usize) -> Decoded {
    let code_size = c.len();

    if find_syndromes(&mut scratch.s, c) {
        return Decoded::Clean;
    }

    let errors = find_error_locator(&mut scratch.lambda, &mut scratch.t, &scratch.s);

    if errors > limit {
        return Decoded::Uncorrectable {
            errors: Some(errors),
        };
    }

    // find the error-evaluator polynomial Omega(x) = S(x) Lambda(x) mod
    // x^n; S doubles as Omega's storage, and the mod is the truncation
    // poly::mul performs implicitly.
    poly::mul(&mut scratch.s, &scratch.lambda);

    // brute-force search for error locations: any location X_i=g^i where
    // X_i^-1 is a root of the error-locator, Lambda(X_i^-1) = 0
    for i in 0..code_size {
        let x_i = GENERATOR.pow((code_size - 1 - i) as u32);
        let x_i_inv = Gf256(1).div(x_i);

        if poly::eval(&scratch.lambda, x_i_inv.0) != 0 {
            continue;
        }

        // found an error location, find its magnitude via Forney's
        // formula: Y_i = X_i * Omega(X_i^-1) / Lambda'(X_i^-1)
        let omega_at = poly::eval(&scratch.s, x_i_inv.0);
        let lambda_deriv_at = eval_error_locator_derivative(&scratch.lambda, x_i_inv.0);
        let y_i = x_i * Gf256(omega_at).div(Gf256(lambda_deriv_at));

        c[i] ^= y_i.0;
    }

    if !find_syndromes(&mut scratch.s, c) {
        return Decoded::Uncorrectable { errors: None };
    }

    Decoded::Corrected { errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scheme {
        code_size: usize,
        ecc_size: usize,
        p: Vec<u8>,
    }

    impl Scheme {
        fn new(code_size: usize, ecc_size: usize) -> Self {
            let mut p = vec![0u8; ecc_size];
            generator_poly(&mut p);
            Self {
                code_size,
                ecc_size,
                p,
            }
        }

        fn encode(&self, message: &[u8]) -> Vec<u8> {
            let mut c = vec![0u8; self.code_size];
            encode(message, &mut c, &self.p);
            c
        }

        fn decode(&self, c: &mut [u8]) -> Decoded {
            let mut scratch = DecodeScratch::new(self.ecc_size);
            decode(c, &mut scratch, self.ecc_size / 2)
        }
    }

    #[test]
    fn generator_poly_has_correct_roots() {
        let mut p = vec![0u8; 4];
        generator_poly(&mut p);
        // P(x) has implicit leading 1; evaluate with that prefixed
        let mut full = vec![1u8];
        full.extend_from_slice(&p);
        for i in 0..4u32 {
            assert_eq!(poly::eval(&full, GENERATOR.pow(i).0), 0);
        }
    }

    #[test]
    fn clean_roundtrip() {
        let scheme = Scheme::new(16, 4);
        let message: Vec<u8> = (0..12).collect();
        let mut c = scheme.encode(&message);
        assert_eq!(scheme.decode(&mut c), Decoded::Clean);
        assert_eq!(&c[..12], &message[..]);
    }

    #[test]
    fn corrects_one_byte_error() {
        let scheme = Scheme::new(16, 4);
        let message: Vec<u8> = (0..12).collect();
        let mut c = scheme.encode(&message);
        c[3] ^= 0xff;
        assert_eq!(scheme.decode(&mut c), Decoded::Corrected { errors: 1 });
        assert_eq!(&c[..12], &message[..]);
    }

    #[test]
    fn corrects_two_byte_errors() {
        let scheme = Scheme::new(16, 4);
        let message: Vec<u8> = (0..12).collect();
        let mut c = scheme.encode(&message);
        c[0] ^= 0xaa;
        c[15] ^= 0x55;
        assert_eq!(scheme.decode(&mut c), Decoded::Corrected { errors: 2 });
        assert_eq!(&c[..12], &message[..]);
    }

    #[test]
    fn three_errors_are_uncorrectable_at_t_equals_2() {
        let scheme = Scheme::new(16, 4);
        let message: Vec<u8> = (0..12).collect();
        let mut c = scheme.encode(&message);
        c[0] ^= 0xaa;
        c[5] ^= 0x55;
        c[9] ^= 0x11;
        match scheme.decode(&mut c) {
            Decoded::Uncorrectable { .. } => {}
            other => panic!("expected uncorrectable, got {:?}", other),
        }
    }

    #[test]
    fn any_single_byte_error_in_small_scheme_is_corrected() {
        let scheme = Scheme::new(16, 4);
        let message: Vec<u8> = (0..12).collect();
        for i in 0..16 {
            let mut c = scheme.encode(&message);
            c[i] ^= 0x7e;
            assert_eq!(scheme.decode(&mut c), Decoded::Corrected { errors: 1 });
            assert_eq!(&c[..12], &message[..]);
        }
    }

    #[test]
    fn detect_only_rejects_any_error() {
        let scheme = Scheme::new(16, 4);
        let message: Vec<u8> = (0..12).collect();
        let mut c = scheme.encode(&message);
        c[2] ^= 0x01;
        let mut scratch = DecodeScratch::new(scheme.ecc_size);
        // error_correction == -1 means limit is effectively "reject any"
        match decode(&mut c, &mut scratch, 0) {
            Decoded::Corrected { errors } if errors > 0 => {
                panic!("detect-only policy should not have corrected")
            }
            _ => {}
        }
    }
}
