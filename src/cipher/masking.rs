//! Additive shift cipher over 7-bit code points.
//!
//! `mask` maps every character `c` to `(c + key) mod 128`; `unmask` maps it
//! back with `(c - key) mod 128`. Two maskings compose to a single shift by
//! the sum of their keys, so layers can be removed in any order:
//!
//! ```
//! use blind_deal::cipher::{MaskKey, MaskingCipher};
//!
//! let a = MaskKey::new(3).unwrap();
//! let b = MaskKey::new(7).unwrap();
//!
//! let both = MaskingCipher::mask(&MaskingCipher::mask("QH", a), b);
//! // Peel in the opposite order from masking
//! let plain = MaskingCipher::unmask(&MaskingCipher::unmask(&both, a), b);
//! assert_eq!(plain, "QH");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size of the code-point space the cipher works in.
pub const CODE_SPACE: u32 = 128;

/// A masking key in `0..128`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct MaskKey(u8);

/// Key value outside `0..128`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("mask key {0} outside 0..128")]
pub struct InvalidMaskKey(pub u8);

impl MaskKey {
    /// Create a key. Returns `None` for values outside `0..128`.
    #[must_use]
    pub const fn new(key: u8) -> Option<Self> {
        if (key as u32) < CODE_SPACE {
            Some(Self(key))
        } else {
            None
        }
    }

    /// Get the raw key value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MaskKey {
    type Error = InvalidMaskKey;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        MaskKey::new(value).ok_or(InvalidMaskKey(value))
    }
}

/// Reversible character shift keyed by a `MaskKey`.
///
/// Only text made of code points below 128 round-trips. Other characters
/// are reduced modulo 128 and cannot be recovered.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaskingCipher;

impl MaskingCipher {
    /// Shift every character forward by `key`.
    #[must_use]
    pub fn mask(text: &str, key: MaskKey) -> String {
        shift(text, key.raw() as u32)
    }

    /// Shift every character back by `key`.
    #[must_use]
    pub fn unmask(text: &str, key: MaskKey) -> String {
        shift(text, CODE_SPACE - key.raw() as u32)
    }
}

fn shift(text: &str, by: u32) -> String {
    text.chars()
        .map(|c| {
            let code = (c as u32 + by) % CODE_SPACE;
            // Every value below 128 is a valid scalar
            char::from_u32(code).unwrap_or('\0')
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(k: u8) -> MaskKey {
        MaskKey::new(k).unwrap()
    }

    #[test]
    fn test_key_range() {
        assert!(MaskKey::new(0).is_some());
        assert!(MaskKey::new(127).is_some());
        assert!(MaskKey::new(128).is_none());
        assert!(MaskKey::new(255).is_none());
    }

    #[test]
    fn test_key_deserialize_checks_range() {
        assert_eq!(serde_json::from_str::<MaskKey>("127").unwrap(), key(127));
        assert!(serde_json::from_str::<MaskKey>("200").is_err());
        assert_eq!(MaskKey::try_from(128), Err(InvalidMaskKey(128)));

        let json = serde_json::to_string(&key(9)).unwrap();
        assert_eq!(json, "9");
    }

    #[test]
    fn test_mask_shifts_characters() {
        assert_eq!(MaskingCipher::mask("AS", key(1)), "BT");
        assert_eq!(MaskingCipher::unmask("BT", key(1)), "AS");
    }

    #[test]
    fn test_mask_wraps_at_128() {
        // 'z' is 122; 122 + 10 = 132 -> 4
        let masked = MaskingCipher::mask("z", key(10));
        assert_eq!(masked, "\u{4}");
        assert_eq!(MaskingCipher::unmask(&masked, key(10)), "z");
    }

    #[test]
    fn test_zero_key_is_identity() {
        assert_eq!(MaskingCipher::mask("10D", key(0)), "10D");
        assert_eq!(MaskingCipher::unmask("10D", key(0)), "10D");
    }

    #[test]
    fn test_layers_commute() {
        let ab = MaskingCipher::mask(&MaskingCipher::mask("KC", key(3)), key(7));
        let ba = MaskingCipher::mask(&MaskingCipher::mask("KC", key(7)), key(3));
        assert_eq!(ab, ba);
        assert_eq!(ab, MaskingCipher::mask("KC", key(10)));
    }

    proptest! {
        #[test]
        fn prop_unmask_inverts_mask(text in "[\\x00-\\x7f]{0,16}", k in 0u8..128) {
            let k = key(k);
            prop_assert_eq!(MaskingCipher::unmask(&MaskingCipher::mask(&text, k), k), text);
        }

        #[test]
        fn prop_layers_peel_in_any_order(text in "[\\x00-\\x7f]{0,8}", a in 0u8..128, b in 0u8..128) {
            let (a, b) = (key(a), key(b));
            let masked = MaskingCipher::mask(&MaskingCipher::mask(&text, a), b);
            let peeled_ab = MaskingCipher::unmask(&MaskingCipher::unmask(&masked, a), b);
            let peeled_ba = MaskingCipher::unmask(&MaskingCipher::unmask(&masked, b), a);
            prop_assert_eq!(&peeled_ab, &text);
            prop_assert_eq!(&peeled_ba, &text);
        }
    }
}
