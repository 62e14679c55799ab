//! Short-Weierstrass curve engine on top of the PKA register engine.
//!
//! A [`CurveSession`] pins the descriptor constants of one named curve
//! into engine registers and exposes point arithmetic over them: Jacobian
//! doubling and addition, affine conversion, full public-point validation,
//! side-channel-protected scalar multiplication and double-scalar
//! multiplication for verification.
//!
//! Secret scalars only ever pass through [`CurveSession::multiply`], which
//! recodes them into a fixed double-double-add pattern and (with the `dpa`
//! feature) blinds and splits them so no two runs walk the same sequence
//! of intermediate values. The `dfa` feature revalidates the pinned curve
//! constants and the output after the scalar loop and scrubs the result
//! on any mismatch.

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

mod arithmetic;
mod curves;
mod mul;
mod point;
mod session;
#[cfg(feature = "shamir")]
mod shamir;
#[cfg(not(feature = "shamir"))]
#[path = "shamir_fallback.rs"]
mod shamir;

pub use curves::{CurveId, CurveParams};
pub use point::{AffinePoint, ProjectivePoint};
pub use session::CurveSession;

pub use pka_engine;

/// Curve-engine failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The requested curve or parameter combination is not available.
    NotSupported,
    /// The operation produced or required the point at infinity.
    PointAtInfinity,
    /// A coordinate is not a reduced field element.
    PointOutsideField,
    /// The coordinates do not satisfy the curve equation.
    PointNotOnCurve,
    /// Fault detected: inputs or outputs failed revalidation.
    Fault,
    /// The entropy source failed.
    Entropy,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Error::NotSupported => "curve or parameters not supported",
            Error::PointAtInfinity => "point at infinity",
            Error::PointOutsideField => "coordinate outside the field",
            Error::PointNotOnCurve => "point not on the curve",
            Error::Fault => "fault detected during computation",
            Error::Entropy => "entropy source failure",
        })
    }
}

impl core::error::Error for Error {}

impl From<pka_engine::EntropyError> for Error {
    fn from(_: pka_engine::EntropyError) -> Self {
        Error::Entropy
    }
}
