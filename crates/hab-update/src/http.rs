//! HTTP client construction and response classification

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use tracing::warn;

use crate::config::UpdaterConfig;
use crate::error::{Error, Result};

/// Media type GitHub recommends for REST API requests
pub(crate) const GITHUB_ACCEPT: &str = "application/vnd.github+json";

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Build the shared client; timeouts are applied per request
pub(crate) fn build_client(config: &UpdaterConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| Error::Transport {
            url: config.api_url.clone(),
            source: e,
        })
}

/// Map a non-success response onto an engine error
///
/// 403 with an exhausted rate limit is [`Error::RateLimited`], 404 is
/// [`Error::NotFound`], anything else outside 2xx is [`Error::DownloadFailed`].
pub(crate) fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();

    if status == StatusCode::FORBIDDEN {
        if let Some(err) = rate_limit_error(response.headers()) {
            warn!("GitHub API rate limit exhausted");
            return Err(err);
        }
    }

    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound {
            url,
            status: status.as_u16(),
        });
    }

    Err(Error::download_failed(url, status.as_u16()))
}

fn rate_limit_error(headers: &HeaderMap) -> Option<Error> {
    let remaining: u32 = header_str(headers, RATE_LIMIT_REMAINING)?.trim().parse().ok()?;
    if remaining != 0 {
        return None;
    }

    let reset = header_str(headers, RATE_LIMIT_RESET)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Some(Error::RateLimited { reset, remaining })
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
