use crate::planner::{plan_link, LinkMode, LinkPlan};
use crate::platform::PlatformPolicy;
use crate::reconciler::{self, CleanReport, LinkReport};
use crate::CoreError;
use modelink_remote::{IdentityCache, IdentityRegistry, Resolver, CACHE_FILE_NAME};
use modelink_schema::{parse_manifest_file, Digest};
use modelink_store::{walk_manifests, StoreLayout};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Options for one sync run.
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub mode: LinkMode,
    /// Re-query digests previously cached as not-found. Resolved identities
    /// are never re-queried.
    pub refresh: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            mode: LinkMode::Plain,
            refresh: false,
        }
    }
}

/// Outcome counters for a sync run. A run succeeds when every resolvable
/// plan was attempted; individual failures show up here, not as errors.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub manifests_seen: usize,
    pub manifests_skipped: usize,
    pub layers_skipped: usize,
    pub identities_resolved: usize,
    pub identities_not_found: usize,
    pub clean: CleanReport,
    pub links: LinkReport,
    pub cache_entries: usize,
}

/// Orchestrates a full link synchronization run: walk, parse, validate,
/// resolve, plan, reconcile, persist the cache.
pub struct Engine {
    layout: StoreLayout,
    target_root: PathBuf,
    policy: PlatformPolicy,
}

impl Engine {
    pub fn new(store_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        Self {
            layout: StoreLayout::new(store_root),
            target_root: target_root.into(),
            policy: PlatformPolicy::native(),
        }
    }

    /// Override the platform policy (link kind and digest separator).
    #[must_use]
    pub fn with_policy(mut self, policy: PlatformPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn target_root(&self) -> &Path {
        &self.target_root
    }

    /// Path of the lock file guarding the target tree.
    pub fn lock_path(&self) -> PathBuf {
        self.target_root.join(".modelink.lock")
    }

    /// Synchronize the target tree against the model store.
    ///
    /// Fatal errors are a missing manifest root and a corrupt identity
    /// cache; everything else is per-entry, logged, and skipped. The
    /// identity cache is loaded before the walk and saved once at the end,
    /// only when identity lookups are enabled (non-plain mode with a
    /// registry present).
    pub fn sync(
        &self,
        options: SyncOptions,
        registry: Option<&dyn IdentityRegistry>,
    ) -> Result<SyncReport, CoreError> {
        let manifest_root = self.layout.manifests_dir();
        let records = walk_manifests(&manifest_root)?;
        info!(
            "found {} manifests under {}",
            records.len(),
            manifest_root.display()
        );

        let identity_enabled = registry.is_some() && options.mode != LinkMode::Plain;
        let cache_path = self.target_root.join(CACHE_FILE_NAME);
        let mut cache = if identity_enabled {
            IdentityCache::load(&cache_path)?
        } else {
            IdentityCache::new()
        };

        let mut report = SyncReport::default();
        let mut plans: Vec<LinkPlan> = Vec::new();
        {
            let mut resolver = match registry {
                Some(reg) if identity_enabled => Some(Resolver::new(reg, &mut cache)),
                _ => None,
            };

            for record in &records {
                report.manifests_seen += 1;
                let manifest = match parse_manifest_file(&record.path) {
                    Ok(manifest) => manifest,
                    Err(e) => {
                        warn!("skipping manifest {}: {e}", record.path.display());
                        report.manifests_skipped += 1;
                        continue;
                    }
                };

                for layer in manifest.model_layers() {
                    let digest = match Digest::parse(&layer.digest) {
                        Ok(digest) => digest,
                        Err(e) => {
                            warn!("skipping layer of {}: {e}", record.entry);
                            report.layers_skipped += 1;
                            continue;
                        }
                    };

                    let identity = resolver.as_mut().map(|resolver| {
                        let identity =
                            resolver.resolve(&digest, &record.entry.model, options.refresh);
                        if identity.is_resolved() {
                            report.identities_resolved += 1;
                        } else {
                            report.identities_not_found += 1;
                        }
                        identity
                    });

                    plans.push(plan_link(
                        &record.entry,
                        &digest,
                        identity.as_ref(),
                        options.mode,
                        &self.layout,
                        &self.target_root,
                        self.policy,
                    ));
                }
            }
        }
        debug!("{} links planned", plans.len());

        fs::create_dir_all(&self.target_root)?;
        report.clean = reconciler::clean(&self.target_root);
        report.links = reconciler::recreate(&plans);

        if identity_enabled {
            report.cache_entries = cache.len();
            if let Err(e) = cache.save(&cache_path) {
                warn!("failed to save identity cache: {e}");
            }
        }

        Ok(report)
    }

    /// Remove all managed links (and emptied directories) under the target
    /// root without recreating anything. Failures are counted in the report,
    /// never returned.
    pub fn clean(&self) -> CleanReport {
        reconciler::clean(&self.target_root)
    }
}
