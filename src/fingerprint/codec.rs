//! Fingerprint to bit-vector encoding.
//!
//! Each 32-bit code contributes its bits most-significant-first, and codes
//! are concatenated in extraction order, so `encode` always yields exactly
//! `32 * codes` bits. The encoding is pure: two calls with the same
//! fingerprint produce bit-identical vectors, which is what makes Hamming
//! distances between independently encoded fingerprints meaningful.

use super::{BitVector, Fingerprint};

/// Encode a fingerprint into its bit-sequence form.
///
/// An empty fingerprint encodes to an empty bit vector.
///
/// # Example
///
/// ```
/// use clipsync::fingerprint::{codec, Fingerprint};
///
/// let bits = codec::encode(&Fingerprint::new(vec![0x8000_0001]));
/// assert_eq!(bits.len(), 32);
/// assert!(bits.bit(0));   // bit 31 of the code comes first
/// assert!(bits.bit(31));  // bit 0 of the code comes last
/// ```
#[must_use]
pub fn encode(fingerprint: &Fingerprint) -> BitVector {
    let mut bytes = Vec::with_capacity(fingerprint.len() * 4);
    for code in fingerprint.codes() {
        bytes.extend_from_slice(&code.to_be_bytes());
    }
    BitVector::from_bytes(bytes)
}
