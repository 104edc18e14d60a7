use crate::{IdentityRegistry, RegistryConfig, RemoteError, RepoSummary, TreeEntry};
use serde::Deserialize;
use std::io::Read;

/// HTTP client for a hub-style identity registry.
///
/// Expects two read-only endpoints:
/// - `GET /api/models?search=<query>&sort=downloads&direction=-1`
///   returning a JSON array of `{id, author, likes, downloads}`
/// - `GET /api/models/<repo_id>/tree/main?recursive=true`
///   returning a JSON array of `{type, path, lfs: {oid}}`
pub struct HubClient {
    config: RegistryConfig,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct SearchModel {
    id: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    downloads: u64,
}

#[derive(Debug, Deserialize)]
struct TreeNode {
    path: String,
    #[serde(default)]
    lfs: Option<LfsPointer>,
}

#[derive(Debug, Deserialize)]
struct LfsPointer {
    oid: String,
}

impl HubClient {
    pub fn new(config: RegistryConfig) -> Self {
        let agent = ureq::Agent::new_with_defaults();
        Self { config, agent }
    }

    fn do_get(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        let mut req = self.agent.get(url);
        if let Some(ref token) = self.config.auth_token {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        let resp = match req.call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(RemoteError::NotFound(url.to_owned()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(RemoteError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => {
                return Err(RemoteError::Http(e.to_string()));
            }
        };

        let mut reader = resp.into_body().into_reader();
        let mut body = Vec::new();
        reader
            .read_to_end(&mut body)
            .map_err(|e| RemoteError::Http(e.to_string()))?;
        Ok(body)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        let body = self.do_get(url)?;
        serde_json::from_slice(&body).map_err(|e| RemoteError::Serialization(e.to_string()))
    }
}

impl IdentityRegistry for HubClient {
    fn search(&self, query: &str) -> Result<Vec<RepoSummary>, RemoteError> {
        let url = format!(
            "{}/api/models?search={}&sort=downloads&direction=-1",
            self.config.url,
            encode_query(query)
        );
        tracing::debug!("GET {url}");
        let models: Vec<SearchModel> = self.get_json(&url)?;
        Ok(models
            .into_iter()
            .map(|m| RepoSummary {
                id: m.id,
                author: m.author,
                likes: m.likes,
                downloads: m.downloads,
            })
            .collect())
    }

    fn list_tree(&self, repo_id: &str) -> Result<Vec<TreeEntry>, RemoteError> {
        let url = format!(
            "{}/api/models/{repo_id}/tree/main?recursive=true",
            self.config.url
        );
        tracing::debug!("GET {url}");
        let nodes: Vec<TreeNode> = self.get_json(&url)?;
        Ok(nodes
            .into_iter()
            .map(|n| TreeEntry {
                path: n.path,
                content_hash: n.lfs.map(|l| l.oid),
            })
            .collect())
    }
}

/// Percent-encode a search query for use in a URL query string.
fn encode_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for b in query.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
