//! Anonymous visitor fingerprints
//!
//! Likes, comments and visit counters are keyed by a fingerprint instead of
//! an account. The fingerprint is a 32-bit rolling hash over a handful of
//! browser traits plus a per-visitor token remembered in the blob store.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::auth::SessionUser;
use crate::persistence::{BlobStore, keys};
use crate::Result;

/// Prefix of every visitor fingerprint
pub const FINGERPRINT_PREFIX: &str = "fp_";

/// Browser properties that go into a fingerprint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorTraits {
    pub user_agent: String,
    pub language: String,
    pub color_depth: i32,
    pub screen_width: i32,
    pub screen_height: i32,
    pub timezone_offset_minutes: i32,
    /// Data URL of a canvas with fixed text drawn on it
    pub canvas_token: String,
}

impl VisitorTraits {
    fn components(&self, token: &str) -> String {
        [
            self.user_agent.clone(),
            self.language.clone(),
            self.color_depth.to_string(),
            self.screen_width.to_string(),
            self.screen_height.to_string(),
            self.timezone_offset_minutes.to_string(),
            self.canvas_token.clone(),
            token.to_string(),
        ]
        .join("|")
    }
}

/// `h = h * 31 + unit` in wrapping 32-bit arithmetic, taking the first
/// UTF-16 unit of every character
pub fn rolling_hash(input: &str) -> i32 {
    let mut buf = [0u16; 2];
    input.chars().fold(0i32, |hash, c| {
        let unit = c.encode_utf16(&mut buf)[0];
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32)
    })
}

/// Lowercase base-36 rendering
pub fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Fingerprint for the given traits and visitor token
pub fn fingerprint(traits: &VisitorTraits, token: &str) -> String {
    let hash = rolling_hash(&traits.components(token)) as i64;
    format!("{FINGERPRINT_PREFIX}{}", to_base36(hash.unsigned_abs()))
}

/// Fingerprint of the current visitor.
///
/// The remembered `visitor_id` is mixed in when present; a first-time
/// visitor gets a random token and the result is remembered.
pub fn visitor_fingerprint<R: Rng + ?Sized>(
    store: &mut dyn BlobStore,
    traits: &VisitorTraits,
    rng: &mut R,
) -> Result<String> {
    let remembered = store.get(keys::VISITOR_ID)?;
    let token = remembered
        .clone()
        .unwrap_or_else(|| to_base36(rng.random::<u64>()));

    let fp = fingerprint(traits, &token);
    if remembered.is_none() {
        store.set(keys::VISITOR_ID, &fp)?;
        log::info!("New visitor {}", fp);
    }
    Ok(fp)
}

/// Fingerprint under which the administrator's own visits are hidden;
/// empty when nobody or a non-admin is logged in
pub fn admin_fingerprint(session: Option<&SessionUser>) -> String {
    match session {
        Some(user) if user.is_admin() => format!("admin_{}", user.email),
        _ => String::new(),
    }
}
