//! ECDSA signature engine over the PKA curve engine.
//!
//! Keys and signatures cross this boundary as big-endian byte strings of
//! the curve's element width; each operation opens a [`CurveSession`],
//! stages its operands into engine registers, and tears the session down
//! again, scrubbing the accelerator. Nonces are drawn fresh per
//! signature; deterministic keys come from a counter-mode KDF over a
//! caller-provided secret.
//!
//! [`CurveSession`]: pka_weierstrass::CurveSession

#![no_std]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

extern crate alloc;

mod kdf;
mod signature;
mod signing;
mod verifying;

pub use signature::Signature;
pub use signing::SigningKey;
pub use verifying::VerifyingKey;

pub use pka_weierstrass;
pub use pka_weierstrass::CurveId;

/// Signature-engine failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The requested curve or parameter combination is not available.
    NotSupported,
    /// A private or public key is malformed or out of range.
    Key,
    /// The message digest is unusable (empty).
    Hash,
    /// The signature is malformed or does not verify.
    Signature,
    /// A caller-provided buffer has the wrong size.
    BufferSize,
    /// Fault detected during a protected computation.
    Fault,
    /// The entropy source failed.
    Entropy,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Error::NotSupported => "curve or parameters not supported",
            Error::Key => "invalid key",
            Error::Hash => "unusable digest",
            Error::Signature => "invalid signature",
            Error::BufferSize => "wrong buffer size",
            Error::Fault => "fault detected during computation",
            Error::Entropy => "entropy source failure",
        })
    }
}

impl core::error::Error for Error {}

impl From<pka_weierstrass::Error> for Error {
    fn from(err: pka_weierstrass::Error) -> Self {
        match err {
            pka_weierstrass::Error::NotSupported => Error::NotSupported,
            pka_weierstrass::Error::Fault => Error::Fault,
            pka_weierstrass::Error::Entropy => Error::Entropy,
            _ => Error::Key,
        }
    }
}

impl From<pka_weierstrass::pka_engine::EntropyError> for Error {
    fn from(_: pka_weierstrass::pka_engine::EntropyError) -> Self {
        Error::Entropy
    }
}
