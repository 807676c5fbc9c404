//! Account record types

use serde::{Deserialize, Serialize};

/// Handle for a stored account: the account name in encoded form.
///
/// Callers treat it as opaque and pass it back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn from_encoded(encoded_name: impl Into<String>) -> Self {
        Self(encoded_name.into())
    }

    pub fn as_encoded(&self) -> &str {
        &self.0
    }
}

/// Columns of an account, in declared order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    Email,
    Username,
    Password,
    AccessCode,
    Website,
    Address,
    PhoneNumber,
    MiscellaneousInfo,
    PendingTasks,
    SearchTags,
    DateModified,
}

impl Field {
    /// Every field, in declared order
    pub const ALL: [Field; 13] = [
        Field::Name,
        Field::Description,
        Field::Email,
        Field::Username,
        Field::Password,
        Field::AccessCode,
        Field::Website,
        Field::Address,
        Field::PhoneNumber,
        Field::MiscellaneousInfo,
        Field::PendingTasks,
        Field::SearchTags,
        Field::DateModified,
    ];

    /// Fields a caller supplies on create/update
    pub const EDITABLE: [Field; 12] = [
        Field::Name,
        Field::Description,
        Field::Email,
        Field::Username,
        Field::Password,
        Field::AccessCode,
        Field::Website,
        Field::Address,
        Field::PhoneNumber,
        Field::MiscellaneousInfo,
        Field::PendingTasks,
        Field::SearchTags,
    ];

    /// SQLite column name
    pub fn column(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Email => "email",
            Self::Username => "username",
            Self::Password => "password",
            Self::AccessCode => "access_code",
            Self::Website => "website",
            Self::Address => "address",
            Self::PhoneNumber => "phone_number",
            Self::MiscellaneousInfo => "miscellaneous_info",
            Self::PendingTasks => "pending_tasks",
            Self::SearchTags => "search_tags",
            Self::DateModified => "date_modified",
        }
    }

    /// Human-readable label for prompts and display
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Email => "Email",
            Self::Username => "Username",
            Self::Password => "Password",
            Self::AccessCode => "Access Code",
            Self::Website => "Website",
            Self::Address => "Address",
            Self::PhoneNumber => "Phone Number",
            Self::MiscellaneousInfo => "Miscellaneous Info",
            Self::PendingTasks => "Pending Tasks",
            Self::SearchTags => "Search Tags",
            Self::DateModified => "Date Modified",
        }
    }

    /// CSV header cell
    pub fn header(&self) -> String {
        self.column().to_uppercase()
    }
}

/// The caller-supplied part of an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub access_code: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub miscellaneous_info: String,
    #[serde(default)]
    pub pending_tasks: String,
    #[serde(default)]
    pub search_tags: String,
}

impl RecordFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Value of an editable field; `DateModified` has none and yields ""
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Description => &self.description,
            Field::Email => &self.email,
            Field::Username => &self.username,
            Field::Password => &self.password,
            Field::AccessCode => &self.access_code,
            Field::Website => &self.website,
            Field::Address => &self.address,
            Field::PhoneNumber => &self.phone_number,
            Field::MiscellaneousInfo => &self.miscellaneous_info,
            Field::PendingTasks => &self.pending_tasks,
            Field::SearchTags => &self.search_tags,
            Field::DateModified => "",
        }
    }

    /// Set an editable field; setting `DateModified` is ignored
    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Description => &mut self.description,
            Field::Email => &mut self.email,
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::AccessCode => &mut self.access_code,
            Field::Website => &mut self.website,
            Field::Address => &mut self.address,
            Field::PhoneNumber => &mut self.phone_number,
            Field::MiscellaneousInfo => &mut self.miscellaneous_info,
            Field::PendingTasks => &mut self.pending_tasks,
            Field::SearchTags => &mut self.search_tags,
            Field::DateModified => return,
        };
        *slot = value;
    }

    /// Apply `f` to every field value
    pub fn map_values(&self, f: impl Fn(&str) -> String) -> Self {
        let mut out = Self::default();
        for field in Field::EDITABLE {
            out.set(field, f(self.get(field)));
        }
        out
    }
}

/// A decoded account as read back from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub fields: RecordFields,
    /// Date stamp of the last create/update, e.g. "Oct 19, 2026"
    pub date_modified: String,
}

impl Record {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::DateModified => &self.date_modified,
            other => self.fields.get(other),
        }
    }

    /// Labelled, non-empty fields in declared order
    pub fn display_lines(&self) -> Vec<(&'static str, &str)> {
        Field::ALL
            .iter()
            .map(|f| (f.label(), self.value(*f)))
            .filter(|(_, v)| !v.is_empty())
            .collect()
    }
}
