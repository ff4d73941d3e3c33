use std::time::Duration;

use crate::{
    config::SearchConfig,
    search::{SearchResult, TrackSearch, error::SearchError, results_from_body},
};

/// Client for the iTunes search endpoint
pub struct ItunesClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    limit: u32,
}

impl ItunesClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            limit: config.limit,
        })
    }

    fn query_params(&self, term: &str) -> [(&'static str, String); 3] {
        [
            ("term", term.to_string()),
            ("media", "music".to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

impl TrackSearch for ItunesClient {
    fn search(&self, term: &str) -> Result<Vec<SearchResult>, SearchError> {
        log::debug!("GET {} term={term}", self.endpoint);
        let response = self
            .http
            .get(&self.endpoint)
            .query(&self.query_params(term))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json()?;
        Ok(results_from_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params() -> anyhow::Result<()> {
        let client = ItunesClient::new(&SearchConfig {
            limit: 25,
            ..Default::default()
        })?;

        let params = client.query_params("lofi chill beats");

        assert_eq!(params[0], ("term", "lofi chill beats".to_string()));
        assert_eq!(params[1], ("media", "music".to_string()));
        assert_eq!(params[2], ("limit", "25".to_string()));
        Ok(())
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() -> anyhow::Result<()> {
        let client = ItunesClient::new(&SearchConfig {
            endpoint: "http://127.0.0.1:9/search".to_string(),
            timeout_secs: 2,
            ..Default::default()
        })?;

        assert!(matches!(client.search("x"), Err(SearchError::Http(_))));
        Ok(())
    }
}
