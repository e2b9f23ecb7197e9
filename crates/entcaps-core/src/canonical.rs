//! Verification string (XEP-0390 §2.1): the deterministic byte form of a
//! discovery profile that every capability hash is computed over.
//!
//! Layout, with `US`=0x1f, `RS`=0x1e, `GS`=0x1d, `FS`=0x1c:
//!
//! ```text
//! features   := sorted(feature US)*                         FS
//! identities := sorted(category US type US lang US name US RS)* FS
//! forms      := sorted( sorted(var US sorted(value US)* RS)* GS )* FS
//! ```
//!
//! The FS after the forms block is always written, so a profile without
//! forms hashes differently from one with an empty form.

use std::collections::BTreeSet;

use crate::error::{CapsError, Result};
use crate::profile::{DataForm, DiscoveryProfile, Identity};

const UNIT_SEP: u8 = 0x1f;
const RECORD_SEP: u8 = 0x1e;
const GROUP_SEP: u8 = 0x1d;
const FILE_SEP: u8 = 0x1c;

/// Bytes fed to the digest engine for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VerificationString(Vec<u8>);

impl VerificationString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lowercase hex rendering, handy when comparing against published vectors.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for VerificationString {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Build the verification string for `profile`.
///
/// Fails with [`CapsError::MalformedProfile`] when an extended form carries
/// `<reported/>` or `<item/>` children.
pub fn canonicalize(profile: &DiscoveryProfile) -> Result<VerificationString> {
    for form in &profile.forms {
        if form.reported.is_some() {
            return Err(CapsError::MalformedProfile(
                "extended form must not contain a <reported/> element".to_string(),
            ));
        }
        if !form.items.is_empty() {
            return Err(CapsError::MalformedProfile(
                "extended form must not contain <item/> elements".to_string(),
            ));
        }
    }

    let mut out = Vec::with_capacity(estimate_len(profile));

    // BTreeSet<&[u8]> orders by raw UTF-8 bytes and folds duplicates.
    let features: BTreeSet<&[u8]> = profile.features.iter().map(|f| f.as_bytes()).collect();
    for feature in features {
        out.extend_from_slice(feature);
        out.push(UNIT_SEP);
    }
    out.push(FILE_SEP);

    let identities: BTreeSet<Vec<u8>> = profile.identities.iter().map(encode_identity).collect();
    for identity in identities {
        out.extend_from_slice(&identity);
    }
    out.push(FILE_SEP);

    let mut forms: Vec<Vec<u8>> = profile.forms.iter().map(encode_form).collect();
    forms.sort();
    for form in forms {
        out.extend_from_slice(&form);
    }
    out.push(FILE_SEP);

    Ok(VerificationString(out))
}

fn encode_identity(identity: &Identity) -> Vec<u8> {
    let mut buf = Vec::new();
    for part in [
        Some(identity.category.as_str()),
        Some(identity.kind.as_str()),
        identity.lang.as_deref(),
        identity.name.as_deref(),
    ] {
        buf.extend_from_slice(part.unwrap_or_default().as_bytes());
        buf.push(UNIT_SEP);
    }
    buf.push(RECORD_SEP);
    buf
}

fn encode_form(form: &DataForm) -> Vec<u8> {
    let mut fields: Vec<Vec<u8>> = form
        .fields
        .iter()
        .map(|field| {
            let mut values: Vec<&[u8]> = field.values.iter().map(|v| v.as_bytes()).collect();
            values.sort_unstable();

            let mut buf = Vec::new();
            buf.extend_from_slice(field.var.as_bytes());
            buf.push(UNIT_SEP);
            for value in values {
                buf.extend_from_slice(value);
                buf.push(UNIT_SEP);
            }
            buf.push(RECORD_SEP);
            buf
        })
        .collect();
    fields.sort_unstable();

    let mut out = fields.concat();
    out.push(GROUP_SEP);
    out
}

fn estimate_len(profile: &DiscoveryProfile) -> usize {
    let features: usize = profile.features.iter().map(|f| f.len() + 1).sum();
    features + profile.identities.len() * 32 + profile.forms.len() * 128 + 3
}
