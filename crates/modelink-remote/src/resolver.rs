use crate::{IdentityCache, IdentityRecord, IdentityRegistry, RemoteError};
use modelink_schema::Digest;
use tracing::{debug, warn};

/// Resolves content digests to human-readable identities, consulting and
/// updating the identity cache so each digest hits the network at most once
/// per lifetime of the cache.
pub struct Resolver<'a> {
    registry: &'a dyn IdentityRegistry,
    cache: &'a mut IdentityCache,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a dyn IdentityRegistry, cache: &'a mut IdentityCache) -> Self {
        Self { registry, cache }
    }

    /// Resolve a digest to an identity.
    ///
    /// Cache rules: a resolved record is returned as-is and never re-queried
    /// (resolved identities are permanently valid). A cached NOT_FOUND is
    /// returned without querying unless `refresh` is set. Outcomes of fresh
    /// queries are cached, except when the registry's search endpoint is
    /// unreachable: that run-scoped failure is reported as NOT_FOUND but
    /// left uncached so the next run retries.
    ///
    /// When two repositories contain byte-identical content, whichever the
    /// search ranking returns first wins; this nondeterminism is accepted.
    pub fn resolve(&mut self, digest: &Digest, search_hint: &str, refresh: bool) -> IdentityRecord {
        let key = digest.to_string();
        if let Some(record) = self.cache.get(&key) {
            if record.is_resolved() || !refresh {
                debug!("cache hit for {key}");
                return record.clone();
            }
        }

        match self.query(digest, search_hint) {
            Ok(record) => {
                self.cache.put(key, record.clone());
                record
            }
            Err(e) => {
                warn!("registry unreachable while resolving {key}: {e}");
                IdentityRecord::not_found()
            }
        }
    }

    /// Search candidates by hint and scan each file tree for the digest.
    /// Returns `Err` only when the search endpoint itself fails; candidate
    /// tree failures are best-effort skips.
    fn query(&self, digest: &Digest, search_hint: &str) -> Result<IdentityRecord, RemoteError> {
        let candidates = self.registry.search(search_hint)?;
        debug!(
            "{} candidate repositories for '{search_hint}'",
            candidates.len()
        );

        for candidate in candidates {
            let tree = match self.registry.list_tree(&candidate.id) {
                Ok(tree) => tree,
                Err(e) => {
                    warn!("skipping candidate '{}': {e}", candidate.id);
                    continue;
                }
            };

            for entry in tree {
                let Some(ref hash) = entry.content_hash else {
                    continue;
                };
                if hash.eq_ignore_ascii_case(digest.hex()) {
                    let filename = entry
                        .path
                        .rsplit('/')
                        .next()
                        .unwrap_or(entry.path.as_str())
                        .to_owned();
                    let author = candidate
                        .author
                        .clone()
                        .or_else(|| candidate.id.split('/').next().map(str::to_owned));
                    debug!("{digest} matched {}/{filename}", candidate.id);
                    return Ok(IdentityRecord {
                        repo_id: Some(candidate.id),
                        author,
                        filename: Some(filename),
                        resolved_at: chrono::Utc::now().to_rfc3339(),
                    });
                }
            }
        }

        Ok(IdentityRecord::not_found())
    }
}
