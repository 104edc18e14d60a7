//! End-to-end sync runs over fabricated model stores.
#![cfg(unix)]

use modelink_core::{Engine, LinkKind, LinkMode, PlatformPolicy, SyncOptions};
use modelink_remote::{
    IdentityCache, IdentityRegistry, RemoteError, RepoSummary, TreeEntry, CACHE_FILE_NAME,
};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const HEX64: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

fn policy() -> PlatformPolicy {
    PlatformPolicy::new(LinkKind::Symbolic, ':')
}

fn write_manifest(store: &Path, namespace: &str, model: &str, tag: &str, layers_json: &str) {
    let dir = store
        .join("manifests/registry.ollama.ai")
        .join(namespace)
        .join(model);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(tag),
        format!(r#"{{"schemaVersion": 2, "layers": [{layers_json}]}}"#),
    )
    .unwrap();
}

fn model_layer(hex: &str) -> String {
    format!(
        r#"{{"mediaType": "application/vnd.ollama.image.model", "digest": "sha256:{hex}", "size": 10}}"#
    )
}

fn write_blob(store: &Path, hex: &str) -> PathBuf {
    let blobs = store.join("blobs");
    fs::create_dir_all(&blobs).unwrap();
    let path = blobs.join(format!("sha256:{hex}"));
    fs::write(&path, "weights").unwrap();
    path
}

/// Snapshot of every link under a root: relative path → link target.
fn link_snapshot(root: &Path) -> BTreeMap<String, PathBuf> {
    fn visit(root: &Path, dir: &Path, out: &mut BTreeMap<String, PathBuf>) {
        for entry in fs::read_dir(dir).unwrap().flatten() {
            let path = entry.path();
            let meta = fs::symlink_metadata(&path).unwrap();
            if meta.is_dir() {
                visit(root, &path, out);
            } else if meta.file_type().is_symlink() {
                let rel = path.strip_prefix(root).unwrap().to_string_lossy().into_owned();
                out.insert(rel, fs::read_link(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    visit(root, root, &mut out);
    out
}

#[test]
fn single_manifest_single_layer_creates_one_link() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    let blob = write_blob(store.path(), HEX64);

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let report = engine.sync(SyncOptions::default(), None).unwrap();

    assert_eq!(report.manifests_seen, 1);
    assert_eq!(report.links.attempted, 1);
    assert_eq!(report.links.created, 1);

    let links = link_snapshot(target.path());
    assert_eq!(links.len(), 1);
    assert_eq!(links.get("llama3-8b.gguf"), Some(&blob));
}

#[test]
fn sync_twice_is_idempotent() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    write_manifest(
        store.path(),
        "acme",
        "foo",
        "v1",
        &model_layer(&"b".repeat(64)),
    );
    write_blob(store.path(), HEX64);
    write_blob(store.path(), &"b".repeat(64));

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    engine.sync(SyncOptions::default(), None).unwrap();
    let first = link_snapshot(target.path());
    engine.sync(SyncOptions::default(), None).unwrap();
    let second = link_snapshot(target.path());

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert!(first.contains_key("acme-foo-v1.gguf"));
}

#[test]
fn n_model_layers_mean_n_attempts() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let layers = format!(
        r#"{}, {}, {{"mediaType": "application/vnd.ollama.image.params", "digest": "sha256:{}"}}"#,
        model_layer(HEX64),
        model_layer(&"b".repeat(64)),
        "c".repeat(64)
    );
    write_manifest(store.path(), "library", "llama3", "8b", &layers);
    write_blob(store.path(), HEX64);
    write_blob(store.path(), &"b".repeat(64));

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let report = engine.sync(SyncOptions::default(), None).unwrap();

    // Two model layers, the params layer is filtered out.
    assert_eq!(report.links.attempted, 2);
}

#[test]
fn stale_links_are_replaced_and_foreign_files_survive() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    let blob = write_blob(store.path(), HEX64);

    std::os::unix::fs::symlink(&blob, target.path().join("old-model.gguf")).unwrap();
    fs::create_dir(target.path().join("stale-author")).unwrap();
    fs::write(target.path().join("README.txt"), "keep").unwrap();

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let report = engine.sync(SyncOptions::default(), None).unwrap();

    assert_eq!(report.clean.links_removed, 1);
    assert_eq!(report.clean.dirs_removed, 1);
    assert!(!target.path().join("old-model.gguf").exists());
    assert!(!target.path().join("stale-author").exists());
    assert!(target.path().join("README.txt").exists());
    assert!(target.path().join("llama3-8b.gguf").exists());
}

#[test]
fn malformed_manifest_skipped_run_continues() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    write_blob(store.path(), HEX64);

    let broken_dir = store.path().join("manifests/registry.ollama.ai/library/broken");
    fs::create_dir_all(&broken_dir).unwrap();
    fs::write(broken_dir.join("latest"), "{not json").unwrap();

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let report = engine.sync(SyncOptions::default(), None).unwrap();

    assert_eq!(report.manifests_seen, 2);
    assert_eq!(report.manifests_skipped, 1);
    assert_eq!(report.links.created, 1);
}

#[test]
fn invalid_digest_skipped_before_planning() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let bad = r#"{"mediaType": "application/vnd.ollama.image.model", "digest": "sha256:short"}"#;
    write_manifest(store.path(), "library", "llama3", "8b", bad);

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let report = engine.sync(SyncOptions::default(), None).unwrap();

    assert_eq!(report.layers_skipped, 1);
    assert_eq!(report.links.attempted, 0);
    assert!(link_snapshot(target.path()).is_empty());
}

/// Registry double serving one known digest and counting search calls.
struct FakeHub {
    search_calls: Cell<usize>,
    known_hex: String,
}

impl FakeHub {
    fn new(known_hex: &str) -> Self {
        Self {
            search_calls: Cell::new(0),
            known_hex: known_hex.to_owned(),
        }
    }
}

impl IdentityRegistry for FakeHub {
    fn search(&self, _query: &str) -> Result<Vec<RepoSummary>, RemoteError> {
        self.search_calls.set(self.search_calls.get() + 1);
        Ok(vec![RepoSummary {
            id: "acme/llama3-gguf".to_owned(),
            author: Some("acme".to_owned()),
            likes: 3,
            downloads: 9000,
        }])
    }

    fn list_tree(&self, _repo_id: &str) -> Result<Vec<TreeEntry>, RemoteError> {
        Ok(vec![TreeEntry {
            path: "model-q4.gguf".to_owned(),
            content_hash: Some(self.known_hex.clone()),
        }])
    }
}

#[test]
fn identity_flat_names_links_after_identity() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    let blob = write_blob(store.path(), HEX64);

    let hub = FakeHub::new(HEX64);
    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let options = SyncOptions {
        mode: LinkMode::IdentityFlat,
        refresh: false,
    };
    let report = engine.sync(options, Some(&hub)).unwrap();

    assert_eq!(report.identities_resolved, 1);
    let links = link_snapshot(target.path());
    assert_eq!(links.get("acme-model-q4.gguf"), Some(&blob));
    assert!(target.path().join(CACHE_FILE_NAME).exists());
}

#[test]
fn second_run_hits_cache_not_network() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    write_blob(store.path(), HEX64);

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let options = SyncOptions {
        mode: LinkMode::IdentityFlat,
        refresh: false,
    };

    let hub = FakeHub::new(HEX64);
    engine.sync(options, Some(&hub)).unwrap();
    assert_eq!(hub.search_calls.get(), 1);

    let hub2 = FakeHub::new(HEX64);
    engine.sync(options, Some(&hub2)).unwrap();
    assert_eq!(hub2.search_calls.get(), 0);
}

#[test]
fn not_found_is_cached_until_refresh() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    write_blob(store.path(), HEX64);

    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let options = SyncOptions {
        mode: LinkMode::IdentityFlat,
        refresh: false,
    };

    // The hub knows a different digest, so resolution exhausts to not-found.
    let hub = FakeHub::new(&"f".repeat(64));
    let report = engine.sync(options, Some(&hub)).unwrap();
    assert_eq!(report.identities_not_found, 1);

    let cache = IdentityCache::load(&target.path().join(CACHE_FILE_NAME)).unwrap();
    assert!(!cache.get(&format!("sha256:{HEX64}")).unwrap().is_resolved());

    // Cached not-found suppresses the query entirely.
    let hub2 = FakeHub::new(HEX64);
    engine.sync(options, Some(&hub2)).unwrap();
    assert_eq!(hub2.search_calls.get(), 0);

    // Refresh re-queries and upgrades the entry.
    let refresh = SyncOptions {
        mode: LinkMode::IdentityFlat,
        refresh: true,
    };
    let hub3 = FakeHub::new(HEX64);
    let report = engine.sync(refresh, Some(&hub3)).unwrap();
    assert_eq!(hub3.search_calls.get(), 1);
    assert_eq!(report.identities_resolved, 1);
}

#[test]
fn identity_tree_mode_builds_repo_directories() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    // Unresolvable second entry falls back to a synthesized group.
    write_manifest(
        store.path(),
        "acme",
        "private",
        "v1",
        &model_layer(&"b".repeat(64)),
    );
    let blob = write_blob(store.path(), HEX64);
    write_blob(store.path(), &"b".repeat(64));

    let hub = FakeHub::new(HEX64);
    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    let options = SyncOptions {
        mode: LinkMode::IdentityTree,
        refresh: false,
    };
    engine.sync(options, Some(&hub)).unwrap();

    let links = link_snapshot(target.path());
    assert_eq!(
        links.get("acme/llama3-gguf/model-q4.gguf"),
        Some(&blob)
    );
    assert!(links.contains_key("acme/private/v1.gguf"));
}

#[test]
fn plain_mode_never_touches_registry_or_cache() {
    let store = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    write_manifest(store.path(), "library", "llama3", "8b", &model_layer(HEX64));
    write_blob(store.path(), HEX64);

    let hub = FakeHub::new(HEX64);
    let engine = Engine::new(store.path(), target.path()).with_policy(policy());
    engine.sync(SyncOptions::default(), Some(&hub)).unwrap();

    assert_eq!(hub.search_calls.get(), 0);
    assert!(!target.path().join(CACHE_FILE_NAME).exists());
}
