use anyhow::{Context, Result};
use reqwest::{header, Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::auth::{self, AuthError};
use crate::config::Config;
use crate::types::{AnalysesPage, Analysis, AnalysisUrls, Link, Scan, ScanUrl, ScansPage};

const ANALYSES_PATH: &str = "/was/configservice/v1/analyses";
const BODY_SNIPPET_MAX: usize = 256;

/// Everything that can go wrong talking to the configuration service. No
/// variant is retried; each one aborts the run.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("credentials rejected by {endpoint} (HTTP {status})")]
    Auth { endpoint: String, status: StatusCode },
    #[error("API error from {endpoint} (HTTP {status}): {body}")]
    Api {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected response from {endpoint}: {detail}")]
    Parse { endpoint: String, detail: String },
    #[error("failed to sign request to {endpoint}: {source}")]
    Sign {
        endpoint: String,
        #[source]
        source: AuthError,
    },
}

/// Thin authenticated wrapper around one `reqwest::Client`. Calls are
/// strictly sequential; the client is built once and reused for pooling.
pub struct ApiClient {
    http: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("veracode-target-urls/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, config })
    }

    /// Fetch the full ordered list of analyses, following `next` links
    /// until the collection is exhausted. An empty collection is valid.
    pub async fn list_analyses(&self) -> Result<Vec<Analysis>, ApiError> {
        let mut out = Vec::new();
        let mut next = Some(self.endpoint(ANALYSES_PATH)?);
        while let Some(url) = next {
            let page: AnalysesPage = self.get_json(&url).await?;
            out.extend(page.embedded.map(|e| e.analyses).unwrap_or_default());
            next = next_page_url(&url, page.links.next)?;
        }
        Ok(out)
    }

    /// Fetch the ordered list of scans for one analysis, same pagination.
    pub async fn list_scans(&self, analysis_id: &str) -> Result<Vec<Scan>, ApiError> {
        let mut out = Vec::new();
        let mut next = Some(self.endpoint(&format!("{ANALYSES_PATH}/{analysis_id}/scans"))?);
        while let Some(url) = next {
            let page: ScansPage = self.get_json(&url).await?;
            out.extend(page.embedded.map(|e| e.scans).unwrap_or_default());
            next = next_page_url(&url, page.links.next)?;
        }
        Ok(out)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.config
            .base_url
            .join(path)
            .map_err(|e| ApiError::Parse {
                endpoint: self.config.base_url.to_string(),
                detail: format!("cannot build endpoint {path:?}: {e}"),
            })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T, ApiError> {
        let endpoint = url.to_string();
        debug!(%endpoint, "GET");

        let authorization =
            auth::authorization_header(&self.config.api_id, &self.config.api_secret, "GET", url)
                .map_err(|source| ApiError::Sign {
                    endpoint: endpoint.clone(),
                    source,
                })?;

        let response = self
            .http
            .get(url.clone())
            .header(header::AUTHORIZATION, authorization)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Auth { endpoint, status });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                endpoint,
                status,
                body: snippet(&body),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|e| ApiError::Parse {
            endpoint,
            detail: format!("{e}; body: {}", snippet(&body)),
        })
    }
}

/// Walk every analysis and collect its scans' extracted URLs, sequentially
/// and in discovery order. The first failure aborts the whole walk.
pub async fn collect_target_urls(client: &ApiClient) -> Result<Vec<AnalysisUrls>, ApiError> {
    let analyses = client.list_analyses().await?;
    info!(count = analyses.len(), "fetched analyses");

    let mut out = Vec::with_capacity(analyses.len());
    for analysis in analyses {
        info!(
            analysis_id = %analysis.analysis_id,
            name = %analysis.name,
            "fetching scans"
        );
        let scans = client.list_scans(&analysis.analysis_id).await?;
        debug!(analysis_id = %analysis.analysis_id, scans = scans.len(), "fetched scans");

        out.push(AnalysisUrls {
            application_name: analysis.application.as_ref().and_then(|a| a.name.clone()),
            analysis_id: analysis.analysis_id,
            analysis_name: analysis.name,
            scans: scans.into_iter().map(ScanUrl::from).collect(),
        });
    }
    Ok(out)
}

fn next_page_url(current: &Url, next: Option<Link>) -> Result<Option<Url>, ApiError> {
    let Some(link) = next else {
        return Ok(None);
    };
    Url::parse(&link.href)
        .or_else(|_| current.join(&link.href))
        .map(Some)
        .map_err(|e| ApiError::Parse {
            endpoint: current.to_string(),
            detail: format!("bad next link {:?}: {e}", link.href),
        })
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET_MAX {
        trimmed.to_string()
    } else {
        let mut end = BODY_SNIPPET_MAX;
        while !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &trimmed[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_page_url_handles_absolute_relative_and_absent() {
        let current = Url::parse("https://api.veracode.com/was/configservice/v1/analyses").unwrap();

        assert!(next_page_url(&current, None).unwrap().is_none());

        let rel = next_page_url(
            &current,
            Some(Link {
                href: "/was/configservice/v1/analyses?page=1".into(),
            }),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            rel.as_str(),
            "https://api.veracode.com/was/configservice/v1/analyses?page=1"
        );

        let abs = next_page_url(
            &current,
            Some(Link {
                href: "https://api.veracode.com/was/configservice/v1/analyses?page=2".into(),
            }),
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            abs.as_str(),
            "https://api.veracode.com/was/configservice/v1/analyses?page=2"
        );
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let short = snippet("tiny");
        assert_eq!(short, "tiny");
        let long = snippet(&"x".repeat(1000));
        assert!(long.len() < 1000);
        assert!(long.ends_with('…'));
    }
}
