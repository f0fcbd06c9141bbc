//! Record model for one page of starred repositories
//!
//! Field names mirror the page shape the fetch loop writes: one JSON object
//! per page, `Viewer.StarredRepositories.Edges[]` holding one starred item
//! each. The same types also deserialize the raw GraphQL API casing
//! (`viewer`, `starredRepositories`, ...) through serde aliases, so the
//! download path decodes API responses directly into them.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::date::{DateFormat, FormattedDate};

/// GitHub returns `null` for unset optional fields; the archive format uses
/// empty values instead.
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of results, as produced by the fetch loop.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "Viewer", alias = "viewer")]
    pub viewer: Viewer,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Viewer {
    #[serde(rename = "StarredRepositories", alias = "starredRepositories")]
    pub starred_repositories: StarredRepositories,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarredRepositories {
    #[serde(rename = "Edges", alias = "edges", default)]
    pub edges: Vec<StarredEdge>,
    #[serde(rename = "PageInfo", alias = "pageInfo", default)]
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "EndCursor", alias = "endCursor", default)]
    pub end_cursor: Option<String>,
    #[serde(rename = "HasNextPage", alias = "hasNextPage", default)]
    pub has_next_page: bool,
}

/// One starred item: the repository plus when it was starred.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StarredEdge {
    #[serde(rename = "StarredAt", alias = "starredAt")]
    pub starred_at: FormattedDate,
    #[serde(rename = "Node", alias = "node")]
    pub node: RepoNode,
}

impl StarredEdge {
    /// Apply one shared display format to every timestamp field.
    pub fn set_date_format(&mut self, format: Option<Arc<DateFormat>>) {
        self.starred_at.set_format("StarredAt", format.clone());
        self.node.pushed_at.set_format("PushedAt", format.clone());
        self.node.updated_at.set_format("UpdatedAt", format);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoNode {
    #[serde(
        rename = "Description",
        alias = "description",
        default,
        deserialize_with = "null_to_default"
    )]
    pub description: String,
    #[serde(
        rename = "HomepageURL",
        alias = "homepageUrl",
        default,
        deserialize_with = "null_to_default"
    )]
    pub homepage_url: String,
    #[serde(rename = "Languages", alias = "languages", default)]
    pub languages: Languages,
    #[serde(rename = "NameWithOwner", alias = "nameWithOwner")]
    pub name_with_owner: String,
    #[serde(
        rename = "Object",
        alias = "object",
        default,
        deserialize_with = "null_to_default"
    )]
    pub object: RepoObject,
    #[serde(rename = "PushedAt", alias = "pushedAt", default)]
    pub pushed_at: FormattedDate,
    #[serde(rename = "RepositoryTopics", alias = "repositoryTopics", default)]
    pub repository_topics: RepositoryTopics,
    #[serde(rename = "StargazerCount", alias = "stargazerCount", default)]
    pub stargazer_count: u64,
    #[serde(rename = "UpdatedAt", alias = "updatedAt", default)]
    pub updated_at: FormattedDate,
    #[serde(rename = "Url", alias = "url", default)]
    pub url: String,
}

impl RepoNode {
    /// Language names, space-joined in upstream order.
    pub fn language_names(&self) -> String {
        self.languages
            .edges
            .iter()
            .map(|e| e.node.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Topic names, space-joined in upstream order.
    pub fn topic_names(&self) -> String {
        self.repository_topics
            .nodes
            .iter()
            .map(|n| n.topic.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// README text (empty when not fetched or redacted).
    pub fn readme(&self) -> &str {
        &self.object.blob.text
    }

    pub fn redact_readme(&mut self) {
        self.object.blob.text.clear();
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Languages {
    #[serde(rename = "Edges", alias = "edges", default)]
    pub edges: Vec<LanguageEdge>,
}

/// `size` is the cumulative byte count of that language across the repo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageEdge {
    #[serde(rename = "Size", alias = "size", default)]
    pub size: u64,
    #[serde(rename = "Node", alias = "node")]
    pub node: LanguageNode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageNode {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
}

/// Holder for the README blob fetched via `object(expression: "HEAD:README.md")`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoObject {
    #[serde(rename = "Blob")]
    pub blob: Blob,
}

// Archive pages nest the blob (`{"Blob":{"Text":...}}`) while the GraphQL
// API flattens the inline fragment (`{"text":...}`). Accept both.
impl<'de> Deserialize<'de> for RepoObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize, Default)]
        struct Repr {
            #[serde(
                rename = "Blob",
                alias = "blob",
                default,
                deserialize_with = "null_to_default"
            )]
            blob: Option<Blob>,
            #[serde(rename = "Text", alias = "text", default)]
            text: Option<String>,
        }

        let repr = Repr::deserialize(deserializer)?;
        let blob = match (repr.blob, repr.text) {
            (Some(blob), _) => blob,
            (None, text) => Blob {
                text: text.unwrap_or_default(),
            },
        };
        Ok(RepoObject { blob })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blob {
    #[serde(
        rename = "Text",
        alias = "text",
        default,
        deserialize_with = "null_to_default"
    )]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryTopics {
    #[serde(rename = "Nodes", alias = "nodes", default)]
    pub nodes: Vec<TopicNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicNode {
    #[serde(rename = "URL", alias = "url", default)]
    pub url: String,
    #[serde(rename = "Topic", alias = "topic")]
    pub topic: Topic,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
}
