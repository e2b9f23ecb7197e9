use anyhow::{Context, Result};
use entcaps_core::{CapabilityRecord, CapsElement};
use serde::Serialize;

use super::{build_engine, load_profile, read_input};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Match,
    Mismatch,
    /// No provider in this build, or not allow-listed.
    Unsupported,
}

#[derive(Debug, Serialize)]
pub struct AlgorithmResult {
    pub algo: String,
    pub advertised: String,
    pub computed: Option<String>,
    pub status: Status,
}

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub results: Vec<AlgorithmResult>,
}

impl VerifyReport {
    /// Every advertised hash was recomputed and matched.
    pub fn verified(&self) -> bool {
        self.results.iter().all(|r| r.status == Status::Match)
    }

    pub fn render(&self, json: bool) -> Result<String> {
        if json {
            return Ok(serde_json::to_string_pretty(&serde_json::json!({
                "verified": self.verified(),
                "results": self.results,
            }))?);
        }
        let mut out = String::new();
        for r in &self.results {
            let status = match r.status {
                Status::Match => "ok",
                Status::Mismatch => "MISMATCH",
                Status::Unsupported => "unsupported",
            };
            out.push_str(&format!("{:<12} {:<11} {}\n", r.algo, status, r.advertised));
        }
        out.push_str(if self.verified() { "verified" } else { "not verified" });
        Ok(out)
    }
}

/// `entcaps verify`: recompute each advertised hash over the profile.
pub fn run(profile_path: &str, caps_path: &str) -> Result<VerifyReport> {
    let profile = load_profile(profile_path)?;
    let caps_xml = read_input(caps_path)?;
    let advertised: CapabilityRecord = CapsElement::parse(&caps_xml)
        .and_then(CapsElement::into_record)
        .with_context(|| format!("{} is not a urn:xmpp:caps element", caps_path))?;

    let engine = build_engine()?;
    let supported: Vec<&str> = advertised
        .algorithms()
        .filter(|a| engine.supports(a))
        .collect();
    let computed = if supported.is_empty() {
        None
    } else {
        Some(engine.hash_profile(&profile, &supported)?)
    };

    let results = advertised
        .iter()
        .map(|(algo, digest)| {
            let recomputed = computed
                .as_ref()
                .and_then(|c| c.digest(algo))
                .map(str::to_string);
            let status = match &recomputed {
                None => Status::Unsupported,
                Some(d) if d == digest => Status::Match,
                Some(_) => Status::Mismatch,
            };
            if status == Status::Mismatch {
                tracing::warn!(algo = %algo, "advertised hash does not match profile");
            }
            AlgorithmResult {
                algo: algo.to_string(),
                advertised: digest.to_string(),
                computed: recomputed,
                status,
            }
        })
        .collect();

    Ok(VerifyReport { results })
}
