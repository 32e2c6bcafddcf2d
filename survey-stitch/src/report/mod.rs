//! Report artifact writers
//!
//! - `json`: the full record set, pretty-printed
//! - `csv`: one row per client under the canonical header
//! - `html`: human-readable listing, all text escaped
//! - `bundle`: the three documents above in one `.tar.gz`

pub mod bundle;
pub mod csv;
pub mod html;
pub mod json;
