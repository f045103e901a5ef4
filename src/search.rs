use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SearchError;

/// A public registry exposed through `/{slug}/search.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registry {
    pub slug: &'static str,
    pub index: &'static str,
    pub data_key: &'static str,
    pub label: &'static str,
    pub not_found: &'static str,
}

pub const REGISTRIES: &[Registry] = &[
    Registry {
        slug: "nhif-outpatient",
        index: "nhif-outpatient",
        data_key: "nhif_outpatient",
        label: "Nhif-Outpatient",
        not_found: "No NHIF Outpatient facility by that name found.",
    },
    Registry {
        slug: "nhif-outpatient-cs",
        index: "nhif-outpatient-cs",
        data_key: "nhif_outpatient_cs",
        label: "Nhif-Outpatient-CS",
        not_found: "No NHIF Outpatient CS facility by that name found.",
    },
    Registry {
        slug: "nhif-inpatient",
        index: "nhif-inpatient",
        data_key: "nhif_inpatient",
        label: "Nhif-Inpatient",
        not_found: "No NHIF Inpatient facility by that name found.",
    },
    Registry {
        slug: "doctors",
        index: "doctors",
        data_key: "doctors",
        label: "Doctors",
        not_found: "No doctor by that name found.",
    },
    Registry {
        slug: "nurses",
        index: "nurses",
        data_key: "nurses",
        label: "Nurses",
        not_found: "No nurse by that name found.",
    },
    Registry {
        slug: "clinical-officers",
        index: "clinical-officers",
        data_key: "clinical_officers",
        label: "Clinical-Officers",
        not_found: "No clinical officer by that name found.",
    },
    Registry {
        slug: "health-facilities",
        index: "health-facilities",
        data_key: "health_facilities",
        label: "Health-Facilities",
        not_found: "No health facility by that name found.",
    },
];

impl Registry {
    pub fn by_slug(slug: &str) -> Option<&'static Registry> {
        REGISTRIES.iter().find(|r| r.slug == slug)
    }

    pub fn search_path(&self) -> String {
        format!("/{}/search.json", self.slug)
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Returns the stored documents matching `query`, best match first.
    async fn lookup(&self, index: &str, query: &str) -> Result<Vec<Value>, SearchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: Value,
}

/// Elasticsearch URI-search client.
#[derive(Debug, Clone)]
pub struct ElasticIndex {
    http: Client,
    base_url: String,
    size: usize,
}

impl ElasticIndex {
    pub fn new(http: Client, base_url: impl Into<String>, size: usize) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            size,
        }
    }

    fn search_url(&self, index: &str) -> String {
        format!("{}/{}/_search", self.base_url, index)
    }
}

#[async_trait]
impl SearchIndex for ElasticIndex {
    async fn lookup(&self, index: &str, query: &str) -> Result<Vec<Value>, SearchError> {
        let size = self.size.to_string();
        let res = self
            .http
            .get(self.search_url(index))
            .query(&[("q", query), ("size", size.as_str())])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        tracing::debug!(index, query, hits = parsed.hits.hits.len(), "search completed");
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_by_slug() {
        let registry = Registry::by_slug("nhif-outpatient").unwrap();
        assert_eq!(registry.data_key, "nhif_outpatient");
        assert_eq!(registry.search_path(), "/nhif-outpatient/search.json");
        assert!(Registry::by_slug("pharmacies").is_none());
    }

    #[test]
    fn test_registry_slugs_are_unique() {
        for (i, a) in REGISTRIES.iter().enumerate() {
            assert!(REGISTRIES[i + 1..].iter().all(|b| b.slug != a.slug));
        }
    }

    #[test]
    fn test_search_url() {
        let index = ElasticIndex::new(Client::new(), "http://es:9200/", 10);
        assert_eq!(index.search_url("doctors"), "http://es:9200/doctors/_search");
    }
}
