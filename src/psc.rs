//! Polar Science Center remote collaborators: the HTML file index, the grid
//! resource, and raw file downloads.
//!
//! The data host serves a self-signed certificate, so TLS verification is
//! disabled on purpose. File names are discovered by pattern matching on the
//! anchor text of the index page; there is no structured directory API.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{DownloadTask, Resolution, SkipReason};
use crate::error::PiomasError;

pub const DEFAULT_BASE_URL: &str =
    "https://pscfiles.apl.washington.edu/zhang/PIOMAS/data/v2.1";
pub const GRID_URL: &str =
    "https://pscfiles.apl.washington.edu/zhang/PIOMAS/utilities/grid.dat";

/// A fetched index page; non-success statuses are data, not errors, because
/// an unreachable folder only skips the tasks that needed it.
#[derive(Debug, Clone)]
pub struct IndexPage {
    pub status: u16,
    pub body: String,
}

pub trait PscClient: Send + Sync {
    fn fetch_index(&self, index_url: &str) -> Result<IndexPage, PiomasError>;
    fn fetch_grid(&self) -> Result<String, PiomasError>;
    fn download(&self, url: &str, destination: &Path) -> Result<(), PiomasError>;
}

/// Resolve the actual file name for a task against a fetched index page.
///
/// Data files come in two spellings, `heff.H2019.gz` and `heff.H2020` (the
/// latter freshly generated and not yet compressed), so the pattern accepts
/// any suffix. Exactly one match resolves; zero or several skip the task.
pub fn resolve_download_url(index_url: &str, page: &IndexPage, task: &DownloadTask) -> Resolution {
    let pattern = format!(
        ">({}\\.H{}[^<]*)<",
        regex::escape(task.variable.as_str()),
        task.year
    );

    if !(200..300).contains(&page.status) {
        return Resolution::Skipped(SkipReason::IndexUnavailable {
            url: index_url.to_string(),
            status: page.status,
        });
    }

    let regex = Regex::new(&pattern).expect("file pattern is valid");
    let matches: Vec<&str> = regex
        .captures_iter(&page.body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    match matches.as_slice() {
        [] => Resolution::Skipped(SkipReason::NoMatch {
            pattern,
            url: index_url.to_string(),
        }),
        [file_name] => Resolution::Url(format!("{index_url}/{file_name}")),
        _ => Resolution::Skipped(SkipReason::AmbiguousMatch {
            pattern,
            url: index_url.to_string(),
            count: matches.len(),
        }),
    }
}

#[derive(Clone)]
pub struct PscHttpClient {
    client: Client,
}

impl PscHttpClient {
    pub fn new() -> Result<Self, PiomasError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("piomas-dl/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PiomasError::Http(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| PiomasError::Http(err.to_string()))?;

        Ok(Self { client })
    }

    fn fetch_text(&self, url: &str) -> Result<String, PiomasError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| PiomasError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PiomasError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        response.text().map_err(|err| PiomasError::Http(err.to_string()))
    }
}

impl PscClient for PscHttpClient {
    fn fetch_index(&self, index_url: &str) -> Result<IndexPage, PiomasError> {
        let response = self
            .client
            .get(index_url)
            .send()
            .map_err(|err| PiomasError::Http(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Ok(IndexPage { status, body })
    }

    fn fetch_grid(&self) -> Result<String, PiomasError> {
        self.fetch_text(GRID_URL)
    }

    fn download(&self, url: &str, destination: &Path) -> Result<(), PiomasError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| PiomasError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(PiomasError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = File::create(destination)
            .map_err(|err| PiomasError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut file)
            .map_err(|err| PiomasError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const INDEX_URL: &str = "https://example.invalid/data/v2.1/heff";

    fn task(variable: &str, year: i32) -> DownloadTask {
        DownloadTask {
            variable: variable.parse().unwrap(),
            year,
        }
    }

    fn page(body: &str) -> IndexPage {
        IndexPage {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn single_match_resolves_full_url() {
        let body = r#"<a href="heff.H2019.gz">heff.H2019.gz</a>"#;
        let resolution = resolve_download_url(INDEX_URL, &page(body), &task("heff", 2019));
        assert_eq!(
            resolution,
            Resolution::Url(format!("{INDEX_URL}/heff.H2019.gz"))
        );
    }

    #[test]
    fn uncompressed_spelling_resolves() {
        let body = r#"<a href="heff.H2020">heff.H2020</a>"#;
        let resolution = resolve_download_url(INDEX_URL, &page(body), &task("heff", 2020));
        assert_eq!(resolution, Resolution::Url(format!("{INDEX_URL}/heff.H2020")));
    }

    #[test]
    fn zero_matches_skip() {
        let body = r#"<a href="heff.H2018.gz">heff.H2018.gz</a>"#;
        let resolution = resolve_download_url(INDEX_URL, &page(body), &task("heff", 2019));
        assert_matches!(
            resolution,
            Resolution::Skipped(SkipReason::NoMatch { .. })
        );
    }

    #[test]
    fn multiple_matches_skip() {
        let body = concat!(
            r#"<a href="heff.H2019.gz">heff.H2019.gz</a>"#,
            r#"<a href="heff.H2019">heff.H2019</a>"#,
        );
        let resolution = resolve_download_url(INDEX_URL, &page(body), &task("heff", 2019));
        assert_matches!(
            resolution,
            Resolution::Skipped(SkipReason::AmbiguousMatch { count: 2, .. })
        );
    }

    #[test]
    fn non_success_status_skips() {
        let page = IndexPage {
            status: 404,
            body: String::new(),
        };
        let resolution = resolve_download_url(INDEX_URL, &page, &task("heff", 2019));
        assert_matches!(
            resolution,
            Resolution::Skipped(SkipReason::IndexUnavailable { status: 404, .. })
        );
    }

    #[test]
    fn suffix_wildcard_accepts_trailing_characters() {
        // The pattern takes any suffix after the year, so a longer year
        // string still matches. The index never lists such names.
        let body = r#"<a href="heff.H20190.gz">heff.H20190.gz</a>"#;
        let resolution = resolve_download_url(INDEX_URL, &page(body), &task("heff", 2019));
        assert_matches!(resolution, Resolution::Url(_));
    }
}
