//! Counter-mode key derivation (SP 800-108) with HMAC-SHA-256 as the
//! pseudorandom function.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Fills `out` with `PRF(key, [i] || label || 0x00 || context || [L])`
/// blocks for i = 1, 2, ... where L is the output length in bits.
pub(crate) fn derive_bytes(key: &[u8], label: &[u8], context: &[u8], out: &mut [u8]) {
    let bits = (out.len() as u32) * 8;
    let mut counter = 1u32;
    let mut off = 0;
    while off < out.len() {
        let mut prf =
            Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts any key length");
        prf.update(&counter.to_be_bytes());
        prf.update(label);
        prf.update(&[0x00]);
        prf.update(context);
        prf.update(&bits.to_be_bytes());
        let block = prf.finalize().into_bytes();
        let take = (out.len() - off).min(block.len());
        out[off..off + take].copy_from_slice(&block[..take]);
        off += take;
        counter += 1;
    }
}
