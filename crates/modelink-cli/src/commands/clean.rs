use super::{json_pretty, EXIT_SUCCESS};
use modelink_core::{Engine, TargetLock};
use std::path::Path;

pub fn run(to: &Path, json: bool) -> Result<u8, String> {
    // The store root is unused for a bare clean; only the target matters.
    let engine = Engine::new(Path::new("."), to);
    let _lock = TargetLock::acquire(&engine.lock_path())
        .map_err(|e| format!("target lock: {e}"))?;

    let report = engine.clean();
    if json {
        let payload = serde_json::json!({
            "links_removed": report.links_removed,
            "dirs_removed": report.dirs_removed,
            "failures": report.failures,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "clean: removed {} links, {} directories",
            report.links_removed, report.dirs_removed
        );
    }
    Ok(EXIT_SUCCESS)
}
