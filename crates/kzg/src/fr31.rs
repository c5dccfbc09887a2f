//! Packing of raw blob bytes into BLS12-381 scalars.
//!
//! A 127-byte shard becomes four scalars of at most 254 bits each: scalar k
//! carries 31 full bytes plus six carry bits, with the carry shift advancing
//! by two bits per scalar (0, 2, 4, 6). The top byte of every packed chunk is
//! masked to six bits, so each scalar is strictly below the field modulus.

use crate::Fr;
use ark_ff::PrimeField;

/// Shard width in bytes; one shard packs into four scalars.
pub const SHARD_LEN: usize = 127;

/// Packs one 127-byte shard into four field elements.
///
/// Inputs longer than a shard are truncated, shorter ones zero-padded.
pub fn pad127(input: &[u8]) -> [Fr; 4] {
    let mut shard = [0u8; SHARD_LEN];
    let n = input.len().min(SHARD_LEN);
    shard[..n].copy_from_slice(&input[..n]);

    let mut out = [Fr::from(0u64); 4];
    let mut tmp = [0u8; 32];

    tmp[..31].copy_from_slice(&shard[..31]);
    let mut t = shard[31] >> 6;
    tmp[31] = shard[31] & 0x3f;
    out[0] = Fr::from_be_bytes_mod_order(&tmp);

    let mut v = 0u8;
    for i in 32..64 {
        v = shard[i];
        tmp[i - 32] = (v << 2) | t;
        t = v >> 6;
    }
    t = v >> 4;
    tmp[31] &= 0x3f;
    out[1] = Fr::from_be_bytes_mod_order(&tmp);

    for i in 64..96 {
        v = shard[i];
        tmp[i - 64] = (v << 4) | t;
        t = v >> 4;
    }
    t = v >> 2;
    tmp[31] &= 0x3f;
    out[2] = Fr::from_be_bytes_mod_order(&tmp);

    for i in 96..SHARD_LEN {
        v = shard[i];
        tmp[i - 96] = (v << 6) | t;
        t = v >> 2;
    }
    tmp[31] = t & 0x3f;
    out[3] = Fr::from_be_bytes_mod_order(&tmp);

    out
}

/// Splits arbitrary bytes into scalars, zero-padding the tail shard.
///
/// Emits `4 * ceil(len / 127)` scalars, the monomial coefficients of the
/// blob polynomial. Empty input yields no scalars.
pub fn split_data(data: &[u8]) -> Vec<Fr> {
    let shards = data.len().div_ceil(SHARD_LEN);
    let mut out = Vec::with_capacity(shards * 4);
    for i in 0..shards {
        let end = ((i + 1) * SHARD_LEN).min(data.len());
        out.extend_from_slice(&pad127(&data[i * SHARD_LEN..end]));
    }
    out
}
