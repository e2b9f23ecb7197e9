use anyhow::Result;
use entcaps_core::{canonicalize, CapsConfig, CapsElement};
use serde_json::json;

use super::{algorithms_or_config, build_engine, load_profile};

/// `entcaps hash`: node identifiers and caps element for a profile.
pub fn run(profile_path: &str, algorithms: &[String], json: bool) -> Result<String> {
    let profile = load_profile(profile_path)?;
    let algorithms = algorithms_or_config(algorithms, &CapsConfig::from_env());
    let engine = build_engine()?;

    let vs = canonicalize(&profile)?;
    let record = engine.digest(vs.as_bytes(), &algorithms)?;
    let caps = CapsElement::from_record(&record).to_xml();
    tracing::debug!(record = %record, bytes = vs.len(), "hashed profile");

    if json {
        let nodes: Vec<String> = record.node_ids().into_iter().map(|(_, n)| n).collect();
        let value = json!({
            "hashes": record.iter().collect::<std::collections::BTreeMap<_, _>>(),
            "nodes": nodes,
            "caps": caps,
            "verification_string": vs.to_hex(),
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut out = String::new();
    for (algo, node) in record.node_ids() {
        out.push_str(&format!("{:<12} {}\n", algo, node));
    }
    out.push('\n');
    out.push_str(&caps);
    Ok(out)
}
