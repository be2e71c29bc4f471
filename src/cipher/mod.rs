//! Per-player card masking.
//!
//! Cards travel through the table as masked tokens: the card's wire token
//! shifted character by character under one or more player keys. This is
//! the "mental poker" choreography in miniature, with one big caveat:
//!
//! **The cipher is obfuscation, not cryptography.** There are at most 128
//! keys and the plaintext alphabet is tiny, so anyone can brute-force a
//! masked token instantly. It keeps honest clients from showing hands by
//! accident; it does not protect against a curious one.

pub mod masking;
pub mod token;

pub use masking::{InvalidMaskKey, MaskKey, MaskingCipher, CODE_SPACE};
pub use token::MaskedToken;
