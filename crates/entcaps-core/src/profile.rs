//! Service-discovery profile: what an entity advertises through `disco#info`.
//!
//! The capability subsystem only ever reads these values. Ordering inside the
//! vectors carries no meaning; the verification string sorts everything.

use serde::{Deserialize, Serialize};

/// The `jabber:x:data` field that names a form's type.
pub const FORM_TYPE_VAR: &str = "FORM_TYPE";

/// One `<identity/>` of a discovery profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub category: String,
    /// The identity `type` attribute.
    #[serde(rename = "type")]
    pub kind: String,
    /// `xml:lang`, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Identity {
    pub fn new(category: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            kind: kind.into(),
            lang: None,
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }
}

/// A single data form field with its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub var: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl FormField {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            field_type: None,
            values: Vec::new(),
        }
    }

    /// The hidden `FORM_TYPE` field carrying `namespace`.
    pub fn form_type(namespace: impl Into<String>) -> Self {
        Self::new(FORM_TYPE_VAR)
            .of_type("hidden")
            .with_value(namespace)
    }

    #[must_use]
    pub fn of_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.values.push(value.into());
        self
    }
}

/// An extended-information data form (XEP-0128) attached to a profile.
///
/// `reported` and `items` exist so that a received form can be represented
/// faithfully; the verification string rejects forms that carry either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataForm {
    /// The form `type` attribute, normally `result`.
    pub form_type: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<Vec<FormField>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Vec<FormField>>,
}

impl DataForm {
    pub fn result() -> Self {
        Self {
            form_type: "result".to_string(),
            fields: Vec::new(),
            reported: None,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: FormField) -> Self {
        self.fields.push(field);
        self
    }

    /// Value of the `FORM_TYPE` field, if the form declares one.
    pub fn namespace(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.var == FORM_TYPE_VAR)
            .and_then(|f| f.values.first())
            .map(String::as_str)
    }
}

/// Features, identities and extended forms advertised by one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryProfile {
    #[serde(default)]
    pub identities: Vec<Identity>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub forms: Vec<DataForm>,
}

impl DiscoveryProfile {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identities.push(identity);
        self
    }

    #[must_use]
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    #[must_use]
    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(features.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_form(mut self, form: DataForm) -> Self {
        self.forms.push(form);
        self
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// A disco#info answer with neither identities nor features carries no
    /// usable information and is treated like no answer at all.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty() && self.features.is_empty()
    }
}
