//! Referral code generation
//!
//! Codes are human-readable: an uppercased prefix taken from the customer's
//! display name plus a short random suffix, e.g. `KAVER-A4B8`.

use rand::rngs::OsRng;
use rand::Rng;

const PREFIX_LEN: usize = 5;
const SUFFIX_LEN: usize = 4;
const FALLBACK_PREFIX: &str = "CRM";
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a referral code from a display name.
///
/// The prefix is the first five non-space characters of the name, uppercased,
/// or `CRM` when the name yields none. The suffix is four characters drawn
/// from `A-Z0-9` using the OS CSPRNG. Uniqueness is enforced at the store;
/// the caller regenerates on collision.
pub fn generate_referral_code(display_name: &str) -> String {
    let prefix: String = display_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .take(PREFIX_LEN)
        .collect();
    let prefix = if prefix.is_empty() {
        FALLBACK_PREFIX.to_string()
    } else {
        prefix
    };

    let mut rng = OsRng;
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("{}-{}", prefix, suffix)
}
