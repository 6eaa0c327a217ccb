//! Transcoding between the fixed-width `r‖s` signature format used on the wire
//! and the ASN.1 DER `SEQUENCE { INTEGER r, INTEGER s }` format the signing
//! primitives produce and consume. The wire format is always fixed-width hex;
//! DER never leaves this crate.

use crate::{error::Err, tracerr, Result};

/// Byte length of each signature component on curve P-256.
pub const COMPONENT_LEN: usize = 32;

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;

/// Convert a DER-encoded ECDSA signature to its fixed-width `(r, s)` components,
/// each left-padded to 32 bytes.
///
/// # Errors
///
/// * `MalformedSignature` - the outer tag is not a SEQUENCE, a length byte is
///   inconsistent, an inner tag is not an INTEGER, trailing bytes remain, or a
///   component exceeds 32 significant bytes (key/curve mismatch).
pub fn to_fixed_width(der: &[u8]) -> Result<([u8; COMPONENT_LEN], [u8; COMPONENT_LEN])> {
    if der.len() < 2 || der[0] != SEQUENCE_TAG {
        tracerr!(Err::MalformedSignature, "expected DER SEQUENCE tag");
    }
    // A P-256 signature body is at most 70 bytes, so only short-form lengths
    // are valid.
    let body_len = der[1] as usize;
    if der[1] & 0x80 != 0 || body_len != der.len() - 2 {
        tracerr!(Err::MalformedSignature, "inconsistent DER SEQUENCE length");
    }

    let body = &der[2..];
    let (r, rest) = parse_integer(body)?;
    let (s, rest) = parse_integer(rest)?;
    if !rest.is_empty() {
        tracerr!(Err::MalformedSignature, "trailing bytes after DER signature");
    }

    Ok((r, s))
}

/// Parse one DER INTEGER from the front of `data`, returning the value
/// left-padded to 32 bytes and the remaining input.
fn parse_integer(data: &[u8]) -> Result<([u8; COMPONENT_LEN], &[u8])> {
    if data.len() < 2 || data[0] != INTEGER_TAG {
        tracerr!(Err::MalformedSignature, "expected DER INTEGER tag");
    }
    let len = data[1] as usize;
    if data[1] & 0x80 != 0 || data.len() < 2 + len {
        tracerr!(Err::MalformedSignature, "inconsistent DER INTEGER length");
    }

    let mut value = &data[2..2 + len];
    if value.is_empty() {
        tracerr!(Err::MalformedSignature, "empty DER INTEGER");
    }
    // DER requires minimal encoding: a leading zero is only valid as sign
    // padding for a value whose high bit is set.
    if value[0] == 0x00 && value.len() > 1 && value[1] & 0x80 == 0 {
        tracerr!(Err::MalformedSignature, "non-minimal DER INTEGER encoding");
    }

    // Strip the sign-padding zero, then left-pad to the component width.
    while let Some((0, rest)) = value.split_first() {
        value = rest;
    }
    if value.len() > COMPONENT_LEN {
        tracerr!(
            Err::MalformedSignature,
            "integer of {} bytes exceeds the P-256 component width",
            value.len()
        );
    }

    let mut padded = [0u8; COMPONENT_LEN];
    padded[COMPONENT_LEN - value.len()..].copy_from_slice(value);
    Ok((padded, &data[2 + len..]))
}

/// Convert fixed-width `(r, s)` components to a DER-encoded ECDSA signature.
/// Leading zero bytes are trimmed and a single `0x00` is re-added when the top
/// bit of the trimmed value is set, keeping each INTEGER non-negative. A zero
/// component encodes as the single byte `0x00`.
#[must_use]
pub fn to_der(r: &[u8; COMPONENT_LEN], s: &[u8; COMPONENT_LEN]) -> Vec<u8> {
    let r_int = encode_integer(r);
    let s_int = encode_integer(s);

    let mut der = Vec::with_capacity(2 + r_int.len() + s_int.len());
    der.push(SEQUENCE_TAG);
    der.push(u8::try_from(r_int.len() + s_int.len()).unwrap_or(u8::MAX));
    der.extend_from_slice(&r_int);
    der.extend_from_slice(&s_int);
    der
}

/// Encode one signature component as a DER INTEGER, tag and length included.
fn encode_integer(value: &[u8; COMPONENT_LEN]) -> Vec<u8> {
    let mut trimmed: &[u8] = value;
    while let Some((0, rest)) = trimmed.split_first() {
        trimmed = rest;
    }

    let sign_pad = trimmed.first().map_or(true, |b| b & 0x80 != 0);
    let len = trimmed.len() + usize::from(sign_pad);

    let mut encoded = Vec::with_capacity(2 + len);
    encoded.push(INTEGER_TAG);
    encoded.push(u8::try_from(len).unwrap_or(u8::MAX));
    if sign_pad {
        encoded.push(0x00);
    }
    encoded.extend_from_slice(trimmed);
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(fill: u8, lead: u8) -> [u8; COMPONENT_LEN] {
        let mut c = [fill; COMPONENT_LEN];
        c[0] = lead;
        c
    }

    #[test]
    fn round_trip_plain() {
        let r = component(0x11, 0x7f);
        let s = component(0x22, 0x01);
        assert_eq!(to_fixed_width(&to_der(&r, &s)).expect("round trip"), (r, s));
    }

    #[test]
    fn round_trip_high_bit() {
        // Top bit set forces a 0x00 sign-padding byte in DER.
        let r = component(0xaa, 0x80);
        let s = component(0xff, 0xff);
        let der = to_der(&r, &s);
        assert_eq!(der[3], 33); // r INTEGER carries the padding byte
        assert_eq!(to_fixed_width(&der).expect("round trip"), (r, s));
    }

    #[test]
    fn round_trip_leading_zeros() {
        let mut r = [0u8; COMPONENT_LEN];
        r[31] = 0x01;
        let mut s = [0u8; COMPONENT_LEN];
        s[30] = 0x99; // high bit set after trimming
        let der = to_der(&r, &s);
        assert_eq!(der[3], 1); // r trimmed to a single byte
        assert_eq!(to_fixed_width(&der).expect("round trip"), (r, s));
    }

    #[test]
    fn zero_component_encodes_as_single_byte() {
        let zero = [0u8; COMPONENT_LEN];
        let der = to_der(&zero, &zero);
        insta::assert_snapshot!(hex::encode(&der), @"3006020100020100");
        assert_eq!(to_fixed_width(&der).expect("round trip"), (zero, zero));
    }

    #[test]
    fn rejects_wrong_outer_tag() {
        let der = to_der(&component(0x11, 0x11), &component(0x22, 0x22));
        let mut bad = der;
        bad[0] = 0x31;
        let err = to_fixed_width(&bad).expect_err("wrong outer tag");
        assert!(err.is(Err::MalformedSignature));
    }

    #[test]
    fn rejects_wrong_inner_tag() {
        let mut der = to_der(&component(0x11, 0x11), &component(0x22, 0x22));
        der[2] = 0x04;
        let err = to_fixed_width(&der).expect_err("wrong inner tag");
        assert!(err.is(Err::MalformedSignature));
    }

    #[test]
    fn rejects_trailing_bytes() {
        let mut der = to_der(&component(0x11, 0x11), &component(0x22, 0x22));
        der.push(0x00);
        let err = to_fixed_width(&der).expect_err("trailing byte");
        assert!(err.is(Err::MalformedSignature));
    }

    #[test]
    fn rejects_inconsistent_length() {
        let mut der = to_der(&component(0x11, 0x11), &component(0x22, 0x22));
        der[1] += 1;
        let err = to_fixed_width(&der).expect_err("bad sequence length");
        assert!(err.is(Err::MalformedSignature));
    }

    #[test]
    fn rejects_oversized_integer() {
        // 33 significant bytes cannot come from a P-256 signature.
        let mut der = vec![SEQUENCE_TAG, 38, INTEGER_TAG, 33];
        der.extend_from_slice(&[0x01; 33]);
        der.extend_from_slice(&[INTEGER_TAG, 1, 0x01]);
        let err = to_fixed_width(&der).expect_err("oversized integer");
        assert!(err.is(Err::MalformedSignature));
    }

    #[test]
    fn rejects_empty_integer() {
        // SEQUENCE { INTEGER <empty>, INTEGER 1 }
        let der = [SEQUENCE_TAG, 5, INTEGER_TAG, 0, INTEGER_TAG, 1, 0x01];
        let err = to_fixed_width(&der).expect_err("empty integer");
        assert!(err.is(Err::MalformedSignature));
    }

    #[test]
    fn rejects_non_minimal_integer() {
        // 0x00 sign padding is only valid when the next byte has its high
        // bit set; 00 01 is the non-minimal encoding of 1.
        let der = [SEQUENCE_TAG, 7, INTEGER_TAG, 2, 0x00, 0x01, INTEGER_TAG, 1, 0x01];
        let err = to_fixed_width(&der).expect_err("non-minimal integer");
        assert!(err.is(Err::MalformedSignature));
    }

    #[test]
    fn rejects_truncated_input() {
        assert!(to_fixed_width(&[]).is_err());
        assert!(to_fixed_width(&[SEQUENCE_TAG]).is_err());
        assert!(to_fixed_width(&[SEQUENCE_TAG, 2, INTEGER_TAG, 5]).is_err());
    }
}
