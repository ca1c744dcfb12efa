//! Lead records as exchanged with the Lead Store and the Form Driver.
//!
//! Spreadsheet cells are loosely typed: a telephone column may come back as a
//! JSON number, an empty processed cell as `""`. Deserialization normalizes
//! all of that into a [`LeadRecord`] and applies the CRM field defaults.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default lead source.
pub const DEFAULT_SOURCE: &str = "Other";
/// Default area of law.
pub const DEFAULT_AREA_OF_LAW: &str = "Advice";
/// Default assignee, used for both assigned-to and assigned-by.
pub const DEFAULT_ASSIGNEE: &str = "Audrey";

/// One prospective client to be entered into the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawLead")]
pub struct LeadRecord {
    /// Position in the source store. Identifies the record for mark-as-processed.
    pub row_index: u32,
    pub title: String,
    pub given_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
    pub mobile: String,
    pub organization_name: String,
    pub position: String,
    pub source: String,
    pub source_notes: String,
    pub area_of_law: String,
    pub assigned_to: String,
    pub assigned_by: String,
    pub follow_up_due: String,
    /// Timestamp written back by the store once the lead has been entered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<String>,
}

impl LeadRecord {
    /// Create a lead with the CRM defaults applied.
    pub fn new(
        row_index: u32,
        given_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            row_index,
            title: String::new(),
            given_name: given_name.into(),
            last_name: last_name.into(),
            email: String::new(),
            telephone: String::new(),
            mobile: String::new(),
            organization_name: String::new(),
            position: String::new(),
            source: DEFAULT_SOURCE.to_string(),
            source_notes: String::new(),
            area_of_law: DEFAULT_AREA_OF_LAW.to_string(),
            assigned_to: DEFAULT_ASSIGNEE.to_string(),
            assigned_by: DEFAULT_ASSIGNEE.to_string(),
            follow_up_due: String::new(),
            processed: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.mobile = mobile.into();
        self
    }

    /// Name used in progress and failure logs.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.given_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_processed(&self) -> bool {
        self.processed.is_some()
    }
}

/// Wire shape accepted from the store before normalization.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLead {
    #[serde(deserialize_with = "row_index")]
    row_index: u32,
    #[serde(default, deserialize_with = "text")]
    title: String,
    #[serde(default, deserialize_with = "text")]
    given_name: String,
    #[serde(default, deserialize_with = "text")]
    last_name: String,
    #[serde(default, deserialize_with = "text")]
    email: String,
    #[serde(default, deserialize_with = "text")]
    telephone: String,
    #[serde(default, deserialize_with = "text")]
    mobile: String,
    #[serde(default, deserialize_with = "text")]
    organization_name: String,
    #[serde(default, deserialize_with = "text")]
    position: String,
    #[serde(default, deserialize_with = "text")]
    source: String,
    #[serde(default, deserialize_with = "text")]
    source_notes: String,
    #[serde(default, deserialize_with = "text")]
    area_of_law: String,
    #[serde(default, deserialize_with = "text")]
    assigned_to: String,
    #[serde(default, deserialize_with = "text")]
    assigned_by: String,
    #[serde(default, deserialize_with = "text")]
    follow_up_due: String,
    #[serde(default, deserialize_with = "text")]
    processed: String,
}

impl From<RawLead> for LeadRecord {
    fn from(raw: RawLead) -> Self {
        Self {
            row_index: raw.row_index,
            title: raw.title,
            given_name: raw.given_name,
            last_name: raw.last_name,
            email: raw.email,
            telephone: raw.telephone,
            mobile: raw.mobile,
            organization_name: raw.organization_name,
            position: raw.position,
            source: or_default(raw.source, DEFAULT_SOURCE),
            source_notes: raw.source_notes,
            area_of_law: or_default(raw.area_of_law, DEFAULT_AREA_OF_LAW),
            assigned_to: or_default(raw.assigned_to, DEFAULT_ASSIGNEE),
            assigned_by: or_default(raw.assigned_by, DEFAULT_ASSIGNEE),
            follow_up_due: raw.follow_up_due,
            processed: (!raw.processed.is_empty()).then_some(raw.processed),
        }
    }
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    })
}

fn row_index<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid rowIndex: {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid rowIndex: {}", s))),
        other => Err(D::Error::custom(format!("invalid rowIndex: {}", other))),
    }
}

/// Fields for appending a new lead to the store.
///
/// Blank fields are left to the store's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewLead {
    pub title: String,
    pub given_name: String,
    pub last_name: String,
    pub email: String,
    pub telephone: String,
    pub mobile: String,
    pub source: String,
    pub source_notes: String,
    pub organization_name: String,
    pub position: String,
    pub area_of_law: String,
    pub assigned_to: String,
    pub follow_up_due: String,
    pub assigned_by: String,
}

impl NewLead {
    /// Non-empty fields as `(wire name, value)` query pairs.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("title", &self.title),
            ("givenName", &self.given_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("telephone", &self.telephone),
            ("mobile", &self.mobile),
            ("source", &self.source),
            ("sourceNotes", &self.source_notes),
            ("organizationName", &self.organization_name),
            ("position", &self.position),
            ("areaOfLaw", &self.area_of_law),
            ("assignedTo", &self.assigned_to),
            ("followUpDue", &self.follow_up_due),
            ("assignedBy", &self.assigned_by),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k, v.as_str()))
        .collect()
    }

    /// Materialize as a stored record, filling the store-side defaults.
    ///
    /// A blank follow-up date becomes `today` in `M/D/YYYY` form.
    pub fn into_record(self, row_index: u32, today: NaiveDate) -> LeadRecord {
        let follow_up_due = if self.follow_up_due.is_empty() {
            today.format("%-m/%-d/%Y").to_string()
        } else {
            self.follow_up_due
        };

        LeadRecord {
            row_index,
            title: self.title,
            given_name: self.given_name,
            last_name: self.last_name,
            email: self.email,
            telephone: self.telephone,
            mobile: self.mobile,
            organization_name: self.organization_name,
            position: self.position,
            source: or_default(self.source, DEFAULT_SOURCE),
            source_notes: self.source_notes,
            area_of_law: or_default(self.area_of_law, DEFAULT_AREA_OF_LAW),
            assigned_to: or_default(self.assigned_to, DEFAULT_ASSIGNEE),
            assigned_by: or_default(self.assigned_by, DEFAULT_ASSIGNEE),
            follow_up_due,
            processed: None,
        }
    }
}

#[cfg(test)]
#[path = "lead_tests.rs"]
mod tests;
