//! XML codecs at the extension boundary.
//!
//! - `caps`: the `<c xmlns="urn:xmpp:caps"/>` element carried in presence and
//!   stream features
//! - `disco`: a `disco#info` `<query/>` document holding a full profile, used
//!   for the persistent cache and the CLI

pub mod caps;
pub mod disco;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{CapsError, Result};

pub use caps::{CapsElement, HashElement, HASHES_NAMESPACE};
pub use disco::{read_profile, write_profile, DATA_FORMS_NAMESPACE, DISCO_INFO_NAMESPACE};

fn xml_err(e: impl std::fmt::Display) -> CapsError {
    CapsError::Document(e.to_string())
}

/// Unescaped value of attribute `name` (qualified, e.g. `xml:lang`).
fn attr(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for a in e.attributes() {
        let a = a.map_err(xml_err)?;
        if a.key.as_ref() == name {
            return Ok(Some(a.unescape_value().map_err(xml_err)?.into_owned()));
        }
    }
    Ok(None)
}

/// Collect text up to the end tag of the element just opened.
///
/// Child elements are not allowed inside text-only elements.
fn read_text(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Text(t) => text.push_str(&t.unescape().map_err(xml_err)?),
            Event::CData(c) => {
                text.push_str(std::str::from_utf8(&c.into_inner()).map_err(xml_err)?)
            }
            Event::End(_) => return Ok(text),
            Event::Start(e) | Event::Empty(e) => {
                return Err(CapsError::Document(format!(
                    "unexpected <{}/> inside text element",
                    String::from_utf8_lossy(e.local_name().as_ref())
                )))
            }
            Event::Eof => return Err(CapsError::Document("unexpected end of document".into())),
            _ => {}
        }
    }
}

/// Skip the remainder of an element whose start tag was just read.
fn skip_element(reader: &mut Reader<&[u8]>) -> Result<()> {
    let mut depth = 1usize;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(CapsError::Document("unexpected end of document".into())),
            _ => {}
        }
    }
}

/// First element of the document, skipping prolog, comments and whitespace.
/// The flag is true for a self-closing element.
fn root_element<'a>(reader: &mut Reader<&'a [u8]>) -> Result<(BytesStart<'a>, bool)> {
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => return Ok((e, false)),
            Event::Empty(e) => return Ok((e, true)),
            Event::Eof => return Err(CapsError::Document("document has no root element".into())),
            _ => {}
        }
    }
}
