//! `<c xmlns="urn:xmpp:caps">` with one `<hash/>` child per algorithm.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Writer};

use super::attr;
use crate::record::{CapabilityRecord, CAPS_NAMESPACE};

/// Namespace of the `<hash/>` children (XEP-0300).
pub const HASHES_NAMESPACE: &str = "urn:xmpp:hashes:2";

pub const CAPS_ELEMENT: &str = "c";
pub const HASH_ELEMENT: &str = "hash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashElement {
    pub algo: String,
    /// Base64 digest, as carried in the element text.
    pub digest: String,
}

/// The capability element as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapsElement {
    pub hashes: Vec<HashElement>,
}

impl CapsElement {
    pub fn from_record(record: &CapabilityRecord) -> Self {
        Self {
            hashes: record
                .iter()
                .map(|(algo, digest)| HashElement {
                    algo: algo.to_string(),
                    digest: digest.to_string(),
                })
                .collect(),
        }
    }

    /// `None` when the element carries no hashes.
    pub fn into_record(self) -> Option<CapabilityRecord> {
        CapabilityRecord::new(self.hashes.into_iter().map(|h| (h.algo, h.digest))).ok()
    }

    pub fn to_xml(&self) -> String {
        let mut writer = Writer::new(Vec::new());
        let mut root = BytesStart::new(CAPS_ELEMENT);
        root.push_attribute(("xmlns", CAPS_NAMESPACE));

        // Writing into a Vec cannot fail.
        let _ = writer.write_event(Event::Start(root));
        for hash in &self.hashes {
            let mut elem = BytesStart::new(HASH_ELEMENT);
            elem.push_attribute(("xmlns", HASHES_NAMESPACE));
            elem.push_attribute(("algo", hash.algo.as_str()));
            let _ = writer.write_event(Event::Start(elem));
            let _ = writer.write_event(Event::Text(BytesText::new(&hash.digest)));
            let _ = writer.write_event(Event::End(BytesEnd::new(HASH_ELEMENT)));
        }
        let _ = writer.write_event(Event::End(BytesEnd::new(CAPS_ELEMENT)));

        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    /// Parse a capability element.
    ///
    /// Returns `None` ("not recognized") instead of a partial element when the
    /// root is not `c` in `urn:xmpp:caps`, when any child is not a `hash`
    /// carrying an `algo`, when no hash is present, or when the XML is broken.
    /// The namespace is resolved, so a prefixed `<caps:c/>` is accepted.
    pub fn parse(xml: &str) -> Option<Self> {
        let mut reader = NsReader::from_str(xml);
        let empty = loop {
            let (ns, event) = reader.read_resolved_event().ok()?;
            let (root, empty) = match event {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::Eof => return None,
                _ => continue,
            };
            if root.local_name().as_ref() != CAPS_ELEMENT.as_bytes()
                || !matches!(ns, ResolveResult::Bound(Namespace(n)) if n == CAPS_NAMESPACE.as_bytes())
            {
                return None;
            }
            break empty;
        };
        if empty {
            return None;
        }

        let mut hashes = Vec::new();
        loop {
            match reader.read_event().ok()? {
                Event::Start(e) => {
                    if e.local_name().as_ref() != HASH_ELEMENT.as_bytes() {
                        return None;
                    }
                    let algo = attr(&e, b"algo").ok()??;
                    let digest = hash_text(&mut reader)?;
                    hashes.push(HashElement {
                        algo,
                        digest: digest.trim().to_string(),
                    });
                }
                // A self-closing child is either foreign or a hash without a digest.
                Event::Empty(_) => return None,
                Event::End(_) => break,
                Event::Eof => return None,
                _ => {}
            }
        }

        if hashes.is_empty() {
            None
        } else {
            Some(Self { hashes })
        }
    }
}

/// Text of the `<hash/>` just opened, up to its end tag.
fn hash_text(reader: &mut NsReader<&[u8]>) -> Option<String> {
    let mut text = String::new();
    loop {
        match reader.read_event().ok()? {
            Event::Text(t) => text.push_str(&t.unescape().ok()?),
            Event::CData(c) => text.push_str(std::str::from_utf8(&c.into_inner()).ok()?),
            Event::End(_) => return Some(text),
            Event::Start(_) | Event::Empty(_) | Event::Eof => return None,
            _ => {}
        }
    }
}
