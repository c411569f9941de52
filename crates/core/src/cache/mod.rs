//! In-memory caches for API envelopes and page markup.
//!
//! Two instances of the same store back the client:
//!
//! - `ResponseCache` keeps backend envelopes for a fixed TTL (60s by default)
//! - `PageCache` keeps fetched page bodies until explicitly cleared
//!
//! Expired entries are never swept; they are dropped on the read that finds
//! them stale. Entries may carry resource tags so a mutation can invalidate
//! every dependent read without knowing its exact key.

pub mod store;
pub mod tags;

#[cfg(test)]
mod property_tests;

pub use store::{Cache, DEFAULT_RESPONSE_TTL, PageCache, ResponseCache};
pub use tags::{TagRule, TagRules, default_tag_rules};
