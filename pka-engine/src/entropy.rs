//! Entropy-source boundary.
//!
//! The engine consumes uniformly distributed bytes for scalar blinding,
//! splitting, ephemeral/private key generation and register scrubbing.
//! Two quality levels are distinguished: a fast source for values that
//! only need to be unpredictable to a side-channel observer, and a
//! cryptographically secure source for key material.

use rand_core::TryCryptoRng;

/// Failure of the external random-byte source.
///
/// Propagated unchanged through every randomized operation; all other
/// engine failures are contract violations and panic instead.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EntropyError;

impl core::fmt::Display for EntropyError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("entropy source exhausted or unavailable")
    }
}

impl core::error::Error for EntropyError {}

/// Quality level requested from the entropy source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RandomQuality {
    /// Fast, possibly non-cryptographic randomness: blinding factors,
    /// scalar-split divisors, scrub patterns.
    Fast,
    /// Cryptographically secure randomness: private keys and nonces.
    Secure,
}

/// Source of uniformly distributed random bytes.
pub trait EntropySource {
    /// Fills `dest` with uniform random bytes of at least the requested
    /// quality.
    fn try_fill(&mut self, quality: RandomQuality, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// Any cryptographically secure RNG satisfies both quality levels.
impl<R: TryCryptoRng + ?Sized> EntropySource for R {
    fn try_fill(&mut self, _quality: RandomQuality, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.try_fill_bytes(dest).map_err(|_| EntropyError)
    }
}
