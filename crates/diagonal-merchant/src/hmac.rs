use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const TAG_LEN: usize = 32;

fn mac_over(secret: &[u8], chunks: &[&[u8]]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    for chunk in chunks {
        mac.update(chunk);
    }
    mac
}

/// Compute HMAC-SHA256 over the concatenation of `chunks` using the shared secret.
/// Returns the lowercase hex-encoded MAC.
pub fn compute_hmac(secret: &[u8], chunks: &[&[u8]]) -> String {
    alloy::hex::encode(mac_over(secret, chunks).finalize().into_bytes())
}

/// Verify a hex-encoded HMAC-SHA256 tag over the concatenation of `chunks`.
///
/// Comparison is constant-time. Undecodable hex is compared against a zero tag
/// so the timing does not depend on whether the input was well formed.
pub fn verify_hmac(secret: &[u8], chunks: &[&[u8]], signature: &str) -> bool {
    let mac = mac_over(secret, chunks);
    let (expected, well_formed) = match alloy::hex::decode(signature) {
        Ok(bytes) if bytes.len() == TAG_LEN => (bytes, true),
        _ => (vec![0u8; TAG_LEN], false),
    };
    mac.verify_slice(&expected).is_ok() && well_formed
}
