use super::{dim, json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use modelink_core::{Engine, LinkMode, SyncOptions, TargetLock};
use modelink_remote::{HubClient, IdentityRegistry, RegistryConfig};
use std::path::Path;

pub fn run(
    from: &Path,
    to: &Path,
    mode: LinkMode,
    refresh: bool,
    registry_url: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let engine = Engine::new(from, to);
    let _lock = TargetLock::acquire(&engine.lock_path())
        .map_err(|e| format!("target lock: {e}"))?;

    let client = if mode == LinkMode::Plain {
        None
    } else {
        let config = registry_url.map_or_else(RegistryConfig::load_default, RegistryConfig::new);
        Some(HubClient::new(config))
    };
    let registry = client.as_ref().map(|c| c as &dyn IdentityRegistry);

    let pb = if json { None } else { Some(spinner("synchronizing links...")) };
    let report = match engine.sync(SyncOptions { mode, refresh }, registry) {
        Ok(report) => report,
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "sync failed");
            }
            return Err(e.to_string());
        }
    };

    if let Some(ref pb) = pb {
        spin_ok(
            pb,
            &format!(
                "created {} of {} links",
                report.links.created, report.links.attempted
            ),
        );
    }

    if json {
        let payload = serde_json::json!({
            "manifests_seen": report.manifests_seen,
            "manifests_skipped": report.manifests_skipped,
            "layers_skipped": report.layers_skipped,
            "identities_resolved": report.identities_resolved,
            "identities_not_found": report.identities_not_found,
            "links_removed": report.clean.links_removed,
            "dirs_removed": report.clean.dirs_removed,
            "clean_failures": report.clean.failures,
            "links_attempted": report.links.attempted,
            "links_created": report.links.created,
            "links_failed": report.links.failed,
            "cache_entries": report.cache_entries,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "sync: {} manifests, {} links created, {} failed",
            report.manifests_seen, report.links.created, report.links.failed
        );
        if report.manifests_skipped > 0 || report.layers_skipped > 0 {
            println!(
                "{}",
                dim(&format!(
                    "skipped {} manifests, {} layers",
                    report.manifests_skipped, report.layers_skipped
                ))
            );
        }
        if report.identities_resolved > 0 || report.identities_not_found > 0 {
            println!(
                "{}",
                dim(&format!(
                    "identities: {} resolved, {} not found",
                    report.identities_resolved, report.identities_not_found
                ))
            );
        }
    }

    Ok(EXIT_SUCCESS)
}
