//! `disco#info` query documents.
//!
//! The persistent cache stores one of these per capability node and the CLI
//! reads them as input. Unknown child elements are skipped on read.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{attr, read_text, root_element, skip_element, xml_err};
use crate::error::{CapsError, Result};
use crate::profile::{DataForm, DiscoveryProfile, FormField, Identity};

pub const DISCO_INFO_NAMESPACE: &str = "http://jabber.org/protocol/disco#info";
pub const DATA_FORMS_NAMESPACE: &str = "jabber:x:data";

// ─── Writing ────────────────────────────────────────────────────────────────

/// Serialize `profile` as an indented `<query/>` document, with an optional
/// `node` attribute.
pub fn write_profile(profile: &DiscoveryProfile, node: Option<&str>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;

    let mut query = BytesStart::new("query");
    query.push_attribute(("xmlns", DISCO_INFO_NAMESPACE));
    if let Some(node) = node {
        query.push_attribute(("node", node));
    }
    let identities = &profile.identities;
    let empty = identities.is_empty() && profile.features.is_empty() && profile.forms.is_empty();
    if empty {
        writer.write_event(Event::Empty(query)).map_err(xml_err)?;
        return finish(writer);
    }
    writer.write_event(Event::Start(query)).map_err(xml_err)?;

    for identity in identities {
        let mut e = BytesStart::new("identity");
        e.push_attribute(("category", identity.category.as_str()));
        e.push_attribute(("type", identity.kind.as_str()));
        if let Some(lang) = &identity.lang {
            e.push_attribute(("xml:lang", lang.as_str()));
        }
        if let Some(name) = &identity.name {
            e.push_attribute(("name", name.as_str()));
        }
        writer.write_event(Event::Empty(e)).map_err(xml_err)?;
    }

    for feature in &profile.features {
        let mut e = BytesStart::new("feature");
        e.push_attribute(("var", feature.as_str()));
        writer.write_event(Event::Empty(e)).map_err(xml_err)?;
    }

    for form in &profile.forms {
        write_form(&mut writer, form)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("query")))
        .map_err(xml_err)?;
    finish(writer)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn write_form(writer: &mut Writer<Vec<u8>>, form: &DataForm) -> Result<()> {
    let mut x = BytesStart::new("x");
    x.push_attribute(("xmlns", DATA_FORMS_NAMESPACE));
    x.push_attribute(("type", form.form_type.as_str()));
    writer.write_event(Event::Start(x)).map_err(xml_err)?;

    write_fields(writer, &form.fields)?;
    if let Some(reported) = &form.reported {
        writer
            .write_event(Event::Start(BytesStart::new("reported")))
            .map_err(xml_err)?;
        write_fields(writer, reported)?;
        writer
            .write_event(Event::End(BytesEnd::new("reported")))
            .map_err(xml_err)?;
    }
    for item in &form.items {
        writer
            .write_event(Event::Start(BytesStart::new("item")))
            .map_err(xml_err)?;
        write_fields(writer, item)?;
        writer
            .write_event(Event::End(BytesEnd::new("item")))
            .map_err(xml_err)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("x")))
        .map_err(xml_err)?;
    Ok(())
}

fn write_fields(writer: &mut Writer<Vec<u8>>, fields: &[FormField]) -> Result<()> {
    for field in fields {
        let mut e = BytesStart::new("field");
        e.push_attribute(("var", field.var.as_str()));
        if let Some(t) = &field.field_type {
            e.push_attribute(("type", t.as_str()));
        }
        if field.values.is_empty() {
            writer.write_event(Event::Empty(e)).map_err(xml_err)?;
            continue;
        }
        writer.write_event(Event::Start(e)).map_err(xml_err)?;
        for value in &field.values {
            // An empty Text event would leave the indenter's line break in
            // place, so empty values are written self-closing.
            if value.is_empty() {
                writer
                    .write_event(Event::Empty(BytesStart::new("value")))
                    .map_err(xml_err)?;
            } else {
                writer
                    .write_event(Event::Start(BytesStart::new("value")))
                    .map_err(xml_err)?;
                writer
                    .write_event(Event::Text(BytesText::new(value)))
                    .map_err(xml_err)?;
                writer
                    .write_event(Event::End(BytesEnd::new("value")))
                    .map_err(xml_err)?;
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new("field")))
            .map_err(xml_err)?;
    }
    Ok(())
}

// ─── Reading ────────────────────────────────────────────────────────────────

/// Parse a `<query xmlns="http://jabber.org/protocol/disco#info"/>` document.
pub fn read_profile(xml: &str) -> Result<DiscoveryProfile> {
    let mut reader = Reader::from_str(xml);
    let (root, empty) = root_element(&mut reader)?;
    if root.local_name().as_ref() != b"query" {
        return Err(CapsError::Document(format!(
            "expected <query/>, found <{}/>",
            String::from_utf8_lossy(root.local_name().as_ref())
        )));
    }
    match attr(&root, b"xmlns")?.as_deref() {
        Some(DISCO_INFO_NAMESPACE) => {}
        other => {
            return Err(CapsError::Document(format!(
                "unexpected query namespace {:?}",
                other.unwrap_or_default()
            )))
        }
    }

    let mut profile = DiscoveryProfile::new();
    if empty {
        return Ok(profile);
    }

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"identity" => {
                    profile.identities.push(read_identity(&e)?);
                    skip_element(&mut reader)?;
                }
                b"feature" => {
                    profile.features.push(read_feature(&e)?);
                    skip_element(&mut reader)?;
                }
                b"x" if is_data_form(&e)? => profile.forms.push(read_form(&mut reader, &e)?),
                _ => skip_element(&mut reader)?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"identity" => profile.identities.push(read_identity(&e)?),
                b"feature" => profile.features.push(read_feature(&e)?),
                b"x" if is_data_form(&e)? => profile.forms.push(DataForm {
                    form_type: attr(&e, b"type")?.unwrap_or_else(|| "result".to_string()),
                    fields: Vec::new(),
                    reported: None,
                    items: Vec::new(),
                }),
                _ => {}
            },
            Event::End(_) => return Ok(profile),
            Event::Eof => return Err(CapsError::Document("unterminated <query/>".into())),
            _ => {}
        }
    }
}

fn read_identity(e: &BytesStart<'_>) -> Result<Identity> {
    let category = attr(e, b"category")?
        .ok_or_else(|| CapsError::Document("<identity/> without category".into()))?;
    let kind = attr(e, b"type")?
        .ok_or_else(|| CapsError::Document("<identity/> without type".into()))?;
    Ok(Identity {
        category,
        kind,
        lang: attr(e, b"xml:lang")?,
        name: attr(e, b"name")?,
    })
}

fn read_feature(e: &BytesStart<'_>) -> Result<String> {
    attr(e, b"var")?.ok_or_else(|| CapsError::Document("<feature/> without var".into()))
}

fn is_data_form(e: &BytesStart<'_>) -> Result<bool> {
    Ok(attr(e, b"xmlns")?.as_deref() == Some(DATA_FORMS_NAMESPACE))
}

fn read_form(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<DataForm> {
    let mut form = DataForm {
        form_type: attr(start, b"type")?.unwrap_or_else(|| "result".to_string()),
        fields: Vec::new(),
        reported: None,
        items: Vec::new(),
    };

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"field" => form.fields.push(read_field(reader, &e)?),
                b"reported" => form.reported = Some(read_field_group(reader)?),
                b"item" => form.items.push(read_field_group(reader)?),
                _ => skip_element(reader)?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"field" => form.fields.push(empty_field(&e)?),
                b"reported" => form.reported = Some(Vec::new()),
                b"item" => form.items.push(Vec::new()),
                _ => {}
            },
            Event::End(_) => return Ok(form),
            Event::Eof => return Err(CapsError::Document("unterminated <x/>".into())),
            _ => {}
        }
    }
}

/// Fields of a `<reported/>` or `<item/>` block.
fn read_field_group(reader: &mut Reader<&[u8]>) -> Result<Vec<FormField>> {
    let mut fields = Vec::new();
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.local_name().as_ref() == b"field" => {
                fields.push(read_field(reader, &e)?)
            }
            Event::Start(_) => skip_element(reader)?,
            Event::Empty(e) if e.local_name().as_ref() == b"field" => fields.push(empty_field(&e)?),
            Event::End(_) => return Ok(fields),
            Event::Eof => return Err(CapsError::Document("unterminated field group".into())),
            _ => {}
        }
    }
}

fn empty_field(e: &BytesStart<'_>) -> Result<FormField> {
    let var = attr(e, b"var")?.unwrap_or_default();
    Ok(FormField {
        var,
        field_type: attr(e, b"type")?,
        values: Vec::new(),
    })
}

fn read_field(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<FormField> {
    let mut field = empty_field(start)?;
    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(e) if e.local_name().as_ref() == b"value" => {
                field.values.push(read_text(reader)?)
            }
            Event::Start(_) => skip_element(reader)?,
            Event::Empty(e) if e.local_name().as_ref() == b"value" => {
                field.values.push(String::new())
            }
            Event::End(_) => return Ok(field),
            Event::Eof => return Err(CapsError::Document("unterminated <field/>".into())),
            _ => {}
        }
    }
}
