use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use regex::Regex;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::WikidataConfig;
use crate::error::{BloodlineError, Result};
use crate::wikidata::{KnowledgeSource, RelativeSet};

/// Sleep applied when a 429 response carries no Retry-After header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// SPARQL SELECT response envelope. `results` is optional so a degenerate
/// payload reads as "no data" instead of a hard parse failure.
#[derive(Deserialize)]
struct SparqlResponse {
    results: Option<SparqlResults>,
}

#[derive(Deserialize)]
struct SparqlResults {
    bindings: Vec<HashMap<String, SparqlValue>>,
}

#[derive(Deserialize)]
struct SparqlValue {
    value: String,
}

/// `wbsearchentities` response envelope.
#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: String,
}

/// Wikidata client
///
/// Issues SPARQL queries for relatives and birth dates and `wbsearchentities`
/// lookups for name resolution. Handles rate limiting with an explicit retry
/// loop and keeps an LRU cache of name resolutions to avoid re-querying the
/// same root names.
pub struct WikidataClient {
    client: Client,
    sparql_endpoint: String,
    search_endpoint: String,
    max_retries: usize,
    entity_uri: Regex,
    resolve_cache: Option<Mutex<LruCache<String, Option<String>>>>,
}

impl WikidataClient {
    /// Create a new client from configuration.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// normal operation).
    pub fn new(config: &WikidataConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!(
                "bloodline/{} (genealogy graph crawler)",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .expect("Failed to build HTTP client");

        // Entity URIs look like http://www.wikidata.org/entity/Q9682
        let entity_uri = Regex::new(r"([A-Z]\d+)$").expect("Invalid regex pattern");

        let resolve_cache = NonZeroUsize::new(config.resolve_cache_capacity)
            .map(|cap| Mutex::new(LruCache::new(cap)));

        Self {
            client,
            sparql_endpoint: config.sparql_endpoint.clone(),
            search_endpoint: config.search_endpoint.clone(),
            max_retries: config.max_retries,
            entity_uri,
            resolve_cache,
        }
    }

    /// GET a JSON endpoint, retrying rate-limited responses.
    ///
    /// A 429 response sleeps `Retry-After + 1` seconds and reissues the
    /// identical request, up to `max_retries` attempts.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(url)
                .query(query)
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| BloodlineError::Source(format!("Network error: {}", e)))?;

            let status = response.status();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    return Err(BloodlineError::Source(format!(
                        "Rate limited after {} retries",
                        attempt
                    )));
                }
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                log::warn!(
                    "Rate limited, retry {}/{} in {}s",
                    attempt + 1,
                    self.max_retries,
                    retry_after + 1
                );
                tokio::time::sleep(Duration::from_secs(retry_after + 1)).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read error response".to_string());
                return Err(BloodlineError::Source(format!(
                    "Wikidata API error {}: {}",
                    status, body
                )));
            }

            return response
                .json::<T>()
                .await
                .map_err(|e| BloodlineError::Parse(format!("Failed to parse response: {}", e)));
        }
    }

    async fn sparql(&self, query: &str) -> Result<Option<SparqlResults>> {
        let response: SparqlResponse = self
            .get_json(&self.sparql_endpoint, &[("query", query), ("format", "json")])
            .await?;
        Ok(response.results)
    }

    /// Run a relatives query and collect `(id, name)` tuples from the
    /// `id_var`/`label_var` result columns.
    async fn fetch_relatives(
        &self,
        query: &str,
        id_var: &str,
        label_var: &str,
    ) -> Result<Option<RelativeSet>> {
        let results = match self.sparql(query).await? {
            Some(results) => results,
            None => return Ok(None),
        };

        let mut relatives = RelativeSet::new();
        for binding in &results.bindings {
            let uri = match binding.get(id_var) {
                Some(v) => &v.value,
                None => continue,
            };
            let id = match self.entity_id_from_uri(uri) {
                Some(id) => id,
                None => {
                    log::debug!("Skipping relative with unrecognized URI: {}", uri);
                    continue;
                }
            };
            // The label service falls back to the id when no English label exists
            let name = binding
                .get(label_var)
                .map(|v| v.value.clone())
                .unwrap_or_else(|| id.clone());
            relatives.insert((id, name));
        }
        Ok(Some(relatives))
    }

    /// Extract the trailing entity id from a result URI.
    fn entity_id_from_uri(&self, uri: &str) -> Option<String> {
        self.entity_uri
            .captures(uri)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn check_id(id: &str) -> Result<()> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BloodlineError::InvalidInput(format!(
                "malformed entity id: {:?}",
                id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KnowledgeSource for WikidataClient {
    async fn resolve_id(&self, name: &str) -> Result<Option<String>> {
        if let Some(cache) = &self.resolve_cache {
            if let Some(cached) = cache.lock().unwrap().get(name) {
                log::debug!("Resolve cache hit for: {}", name);
                return Ok(cached.clone());
            }
        }

        let response: SearchResponse = self
            .get_json(
                &self.search_endpoint,
                &[
                    ("action", "wbsearchentities"),
                    ("search", name),
                    ("language", "en"),
                    ("type", "item"),
                    ("format", "json"),
                ],
            )
            .await?;

        let id = response.search.into_iter().next().map(|hit| hit.id);

        if let Some(cache) = &self.resolve_cache {
            cache.lock().unwrap().put(name.to_string(), id.clone());
        }
        Ok(id)
    }

    async fn fetch_children(&self, id: &str) -> Result<Option<RelativeSet>> {
        Self::check_id(id)?;
        let query = format!(
            "SELECT ?child ?childLabel WHERE {{ \
               wd:{} wdt:P40 ?child. \
               SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"en\". }} \
             }}",
            id
        );
        self.fetch_relatives(&query, "child", "childLabel").await
    }

    async fn fetch_parents(&self, id: &str) -> Result<Option<RelativeSet>> {
        Self::check_id(id)?;
        let query = format!(
            "SELECT ?item ?itemLabel WHERE {{ \
               ?item wdt:P40 wd:{}. \
               SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"en\". }} \
             }}",
            id
        );
        self.fetch_relatives(&query, "item", "itemLabel").await
    }

    async fn fetch_birth_years(&self, id: &str) -> Result<Option<Vec<String>>> {
        Self::check_id(id)?;
        let query = format!(
            "SELECT ?dateOfBirth WHERE {{ wd:{} wdt:P569 ?dateOfBirth }}",
            id
        );
        let results = match self.sparql(&query).await? {
            Some(results) => results,
            None => return Ok(None),
        };
        let dates = results
            .bindings
            .iter()
            .filter_map(|b| b.get("dateOfBirth").map(|v| v.value.clone()))
            .collect();
        Ok(Some(dates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> WikidataConfig {
        WikidataConfig {
            sparql_endpoint: "https://query.wikidata.org/sparql".to_string(),
            search_endpoint: "https://www.wikidata.org/w/api.php".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            resolve_cache_capacity: 10,
        }
    }

    #[test]
    fn test_entity_id_from_uri() {
        let client = WikidataClient::new(&test_config());
        assert_eq!(
            client.entity_id_from_uri("http://www.wikidata.org/entity/Q9682"),
            Some("Q9682".to_string())
        );
        assert_eq!(
            client.entity_id_from_uri("http://www.wikidata.org/entity/L123"),
            Some("L123".to_string())
        );
        assert_eq!(client.entity_id_from_uri("http://example.com/no-id/"), None);
        assert_eq!(client.entity_id_from_uri(""), None);
    }

    #[test]
    fn test_check_id() {
        assert!(WikidataClient::check_id("Q9682").is_ok());
        assert!(WikidataClient::check_id("").is_err());
        assert!(WikidataClient::check_id("Q1 } UNION { ?s ?p ?o }").is_err());
    }

    #[test]
    fn test_resolve_cache_disabled_at_zero_capacity() {
        let mut config = test_config();
        config.resolve_cache_capacity = 0;
        let client = WikidataClient::new(&config);
        assert!(client.resolve_cache.is_none());
    }
}
