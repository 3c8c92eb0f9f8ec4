/*!
# `Lumen` - Hashing
*/

use xxhash_rust::xxh3::{
	xxh3_128_with_seed,
	xxh3_64_with_seed,
};



/// # Wide Hash Length.
pub const HASH_WIDE_LEN: usize = 16;



#[inline]
#[must_use]
/// # Hash.
///
/// Return a seeded 64-bit XXH3 digest of the bytes. This is fast and
/// deterministic, but not cryptographic; it is meant for cache keys.
///
/// Pair it with a format's seed (e.g. [`ImageFormat::seed`](crate::ImageFormat::seed))
/// so the key changes whenever that encoder's output would.
pub fn hash(src: &[u8], seed: u64) -> u64 { xxh3_64_with_seed(src, seed) }

#[inline]
#[must_use]
/// # Wide Hash.
///
/// Same as [`hash`], but 128 bits wide, returned big-endian.
pub fn hash_wide(src: &[u8], seed: u64) -> [u8; HASH_WIDE_LEN] {
	xxh3_128_with_seed(src, seed).to_be_bytes()
}
