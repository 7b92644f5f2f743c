//! doclink canonical text layer.
//!
//! Every comparison the matcher makes happens between *normalized* strings.
//! This crate owns that normal form so the table loader, the matcher and the
//! HTTP layer all agree on it.
//!
//! ## What we do
//!
//! - Lowercase everything
//! - Drop every character outside `a-z`, `0-9` and whitespace
//! - Collapse whitespace runs to one ASCII space and trim the edges
//! - Split the result into whitespace tokens
//!
//! ## Pure function guarantee
//!
//! No I/O, no allocation beyond the output string, no locale dependence.
//! [`normalize`] is total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
//!
//! Non-ASCII letters are dropped rather than transliterated, so `"Café"`
//! becomes `"caf"`. Table names and queries pass through the same function,
//! which keeps both sides consistent.

mod normalize;
mod token;
mod whitespace;

pub use crate::normalize::{is_normalized, normalize};
pub use crate::token::{token_set, tokenize, Token};
pub use crate::whitespace::collapse_whitespace;
