//! GitHub GraphQL fetch loop
//!
//! Pages through the viewer's starred repositories in starred-at order and
//! writes each page as one JSON line, ready for the ingestion driver. The
//! request timeout bounds every page fetch; the sink side has no timeout of
//! its own.

use std::io::Write;
use std::time::Duration;

use serde::Deserialize;

use crate::model::Page;
use crate::{Error, Result};

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const STARRED_QUERY: &str = r#"
query ($after: String, $pageSize: Int!, $includeReadme: Boolean!, $maxLanguages: Int!, $maxTopics: Int!) {
  viewer {
    starredRepositories(first: $pageSize, orderBy: {field: STARRED_AT, direction: ASC}, after: $after) {
      edges {
        starredAt
        node {
          description
          homepageUrl
          languages(first: $maxLanguages) {
            edges {
              size
              node { name }
            }
          }
          nameWithOwner
          object(expression: "HEAD:README.md") @include(if: $includeReadme) {
            ... on Blob { text }
          }
          pushedAt
          repositoryTopics(first: $maxTopics) {
            nodes {
              url
              topic { name }
            }
          }
          stargazerCount
          updatedAt
          url
        }
      }
      pageInfo {
        endCursor
        hasNextPage
      }
    }
  }
}
"#;

#[derive(Debug, Clone)]
pub struct DownloadOptions {
    pub token: String,
    pub page_size: u32,
    pub max_pages: u32,
    /// Resume pagination after this cursor.
    pub after: Option<String>,
    pub include_readmes: bool,
    pub max_languages: u32,
    pub max_topics: u32,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Page>,
    #[serde(default)]
    errors: Vec<GraphQlMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    message: String,
}

impl GraphQlResponse {
    /// Extract the page, surfacing GraphQL-level errors with the cursor the
    /// request used so the run can be resumed.
    fn into_page(self, cursor: Option<&str>) -> Result<Page> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(Error::GraphQl(format!(
                "after cursor {:?}: {}",
                cursor,
                messages.join("; ")
            )));
        }
        self.data
            .ok_or_else(|| Error::GraphQl(format!("after cursor {:?}: empty response", cursor)))
    }
}

/// Fetch up to `max_pages` pages and write each as one JSON line to `out`.
pub fn download<W: Write>(mut out: W, options: &DownloadOptions) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(options.timeout)
        .build()?;
    let mut cursor = options.after.clone();

    for _ in 0..options.max_pages {
        let body = serde_json::json!({
            "query": STARRED_QUERY,
            "variables": {
                "after": &cursor,
                "pageSize": options.page_size,
                "includeReadme": options.include_readmes,
                "maxLanguages": options.max_languages,
                "maxTopics": options.max_topics,
            }
        });

        let response: GraphQlResponse = client
            .post(GITHUB_GRAPHQL_URL)
            .bearer_auth(&options.token)
            .header("User-Agent", concat!("starlog/", env!("CARGO_PKG_VERSION")))
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        let page = response.into_page(cursor.as_deref())?;

        serde_json::to_writer(&mut out, &page)?;
        out.write_all(b"\n")?;

        let info = &page.viewer.starred_repositories.page_info;
        tracing::info!(
            records = page.viewer.starred_repositories.edges.len(),
            cursor = info.end_cursor.as_deref().unwrap_or(""),
            has_next_page = info.has_next_page,
            "fetched page"
        );
        if !info.has_next_page {
            break;
        }
        cursor = info.end_cursor.clone();
    }

    out.flush()?;
    Ok(())
}
