//! Knowledge source contract and the production Wikidata implementation.
//!
//! The crawl engine only sees the [`KnowledgeSource`] trait: resolve a name to
//! an id, fetch relatives, fetch birth-date candidates. Everything about the
//! transport (SPARQL, `wbsearchentities`, rate-limit retries) stays behind it.

mod client;

pub use client::WikidataClient;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::Result;

/// `(id, display name)` tuples for one entity's parents or children.
pub type RelativeSet = BTreeSet<(String, String)>;

/// Narrow contract to the external knowledge source.
///
/// All fetch operations return `Ok(None)` for a definitive "no data" answer;
/// an empty set/list means the entity exists but has no recorded relatives.
/// Rate limiting is handled inside implementations - callers only ever see
/// success or no data.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Resolve a free-text name to an entity id, first match wins.
    /// An empty search result is not an error.
    async fn resolve_id(&self, name: &str) -> Result<Option<String>>;

    async fn fetch_children(&self, id: &str) -> Result<Option<RelativeSet>>;

    async fn fetch_parents(&self, id: &str) -> Result<Option<RelativeSet>>;

    /// Birth-date candidate strings for an entity. The caller takes the first
    /// element and parses a year out of it.
    async fn fetch_birth_years(&self, id: &str) -> Result<Option<Vec<String>>>;
}
