//! Per-cell transforms and the classifiers that gate them.
//!
//! Every transform takes `&str` and returns `Cow<str>`: borrowed when nothing
//! changed, owned otherwise. The pipeline compares before/after to count
//! modified cells. Transforms never fail; when a repair cannot be made with
//! confidence the input comes back unchanged.

pub mod date;
pub mod email;
pub mod encoding;
pub mod nulls;
pub mod number;
pub mod phone;
pub mod string_ops;
