//! Social network archive parsing used by Underhood.
//!
//! Only the Twitter/X archive format is implemented. Everything in this
//! crate is synchronous and free of I/O: records come in as JSON values,
//! normalized and rewritten [`twitter::Tweet`]s come out.
pub mod twitter;
