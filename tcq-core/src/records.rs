//! Indicator and group records as returned by the backend.
//!
//! The wire format is flat: type-specific keys (hashes, email headers, event
//! dates) are present or absent depending on the record's type. Decoding goes
//! through a wire struct so that those keys land in typed sub-structures and
//! range checks run exactly once, at construction.

use crate::{RecordId, Timestamp, ValidationError};
use serde::{Deserialize, Serialize};

/// Well-known indicator type names.
pub mod indicator_types {
    pub const ADDRESS: &str = "Address";
    pub const EMAIL_ADDRESS: &str = "EmailAddress";
    pub const FILE: &str = "File";
    pub const HOST: &str = "Host";
    pub const URL: &str = "URL";
    pub const ASN: &str = "ASN";
    pub const CIDR: &str = "CIDR";
    pub const MUTEX: &str = "Mutex";
    pub const REGISTRY_KEY: &str = "Registry Key";
    pub const USER_AGENT: &str = "User Agent";
}

/// Well-known group type names.
pub mod group_types {
    pub const ADVERSARY: &str = "Adversary";
    pub const CAMPAIGN: &str = "Campaign";
    pub const DOCUMENT: &str = "Document";
    pub const EMAIL: &str = "Email";
    pub const EVENT: &str = "Event";
    pub const INCIDENT: &str = "Incident";
    pub const INTRUSION_SET: &str = "Intrusion Set";
    pub const REPORT: &str = "Report";
    pub const SIGNATURE: &str = "Signature";
    pub const THREAT: &str = "Threat";

    pub const ALL: &[&str] = &[
        ADVERSARY,
        CAMPAIGN,
        DOCUMENT,
        EMAIL,
        EVENT,
        INCIDENT,
        INTRUSION_SET,
        REPORT,
        SIGNATURE,
        THREAT,
    ];

    /// Case-insensitive membership in [`ALL`].
    pub fn is_group_type(name: &str) -> bool {
        ALL.iter().any(|t| t.eq_ignore_ascii_case(name.trim()))
    }
}

// ============================================================================
// SHARED TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
    pub date_added: Timestamp,
    pub last_modified: Timestamp,
}

/// A recorded relationship to another indicator or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub id: RecordId,
    /// "Indicator" or "Group".
    #[serde(rename = "type")]
    pub type_name: String,
    /// Concrete type of the associated object (Address, Adversary, ...).
    pub object_type: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// An organization, community or source that owns records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: RecordId,
    pub name: String,
    /// "Organization", "Community" or "Source".
    #[serde(rename = "type", default)]
    pub type_name: String,
}

/// Fields every indicator and group carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub type_name: String,
    pub date_added: Timestamp,
    pub last_modified: Timestamp,
    pub owner_name: String,
    pub owner_id: RecordId,
    pub web_link: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub associated_groups: Vec<Association>,
    #[serde(default)]
    pub associated_indicators: Vec<Association>,
}

// ============================================================================
// INDICATORS
// ============================================================================

/// File-indicator specifics. Present only when the backend sent any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndicatorFields {
    pub md5: Option<String>,
    pub sha1: Option<String>,
    pub sha256: Option<String>,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndicatorWire", rename_all = "camelCase")]
pub struct IndicatorRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub summary: String,
    pub rating: f64,
    pub confidence: u8,
    pub active: bool,
    /// Set by the owner when the indicator is known to be benign.
    pub false_positive_flag: bool,
    /// How many users reported the indicator as a false positive.
    pub false_positives: u32,
    pub observations: u32,
    pub source: Option<String>,
    pub file: Option<FileIndicatorFields>,
}

#[derive(Debug, Deserialize)]
struct IndicatorWire {
    #[serde(flatten)]
    meta: RecordMeta,
    summary: String,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    confidence: i64,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default, rename = "falsePositiveFlag")]
    false_positive_flag: bool,
    #[serde(default, rename = "falsePositives")]
    false_positives: u32,
    #[serde(default)]
    observations: u32,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    md5: Option<String>,
    #[serde(default)]
    sha1: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
}

fn default_active() -> bool {
    true
}

impl IndicatorRecord {
    /// Build a record from already-structured parts, enforcing score ranges.
    pub fn new(
        meta: RecordMeta,
        summary: impl Into<String>,
        rating: f64,
        confidence: i64,
    ) -> Result<Self, ValidationError> {
        ValidationError::check_range("rating", rating, 0.0, 5.0)?;
        ValidationError::check_range("confidence", confidence as f64, 0.0, 100.0)?;
        Ok(Self {
            meta,
            summary: summary.into(),
            rating,
            confidence: confidence as u8,
            active: true,
            false_positive_flag: false,
            false_positives: 0,
            observations: 0,
            source: None,
            file: None,
        })
    }

    pub fn with_file(mut self, file: FileIndicatorFields) -> Self {
        self.file = Some(file);
        self
    }

    pub fn id(&self) -> RecordId {
        self.meta.id
    }

    pub fn type_name(&self) -> &str {
        &self.meta.type_name
    }

    /// Flagged by its owner, or tagged "False Positive" by an analyst.
    pub fn is_false_positive(&self) -> bool {
        self.false_positive_flag
            || self
                .meta
                .tags
                .iter()
                .any(|tag| tag.name.eq_ignore_ascii_case(FALSE_POSITIVE_TAG))
    }
}

/// Tag analysts use to mark an indicator as benign.
pub const FALSE_POSITIVE_TAG: &str = "False Positive";

impl TryFrom<IndicatorWire> for IndicatorRecord {
    type Error = ValidationError;

    fn try_from(wire: IndicatorWire) -> Result<Self, Self::Error> {
        let has_file = wire.size.is_some()
            || wire.md5.is_some()
            || wire.sha1.is_some()
            || wire.sha256.is_some();
        let file = has_file.then(|| FileIndicatorFields {
            md5: wire.md5,
            sha1: wire.sha1,
            sha256: wire.sha256,
            size: wire.size,
        });

        let mut record = IndicatorRecord::new(wire.meta, wire.summary, wire.rating, wire.confidence)?;
        record.active = wire.active;
        record.false_positive_flag = wire.false_positive_flag;
        record.false_positives = wire.false_positives;
        record.observations = wire.observations;
        record.source = wire.source;
        record.file = file;
        Ok(record)
    }
}

// ============================================================================
// GROUPS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailGroupFields {
    pub subject: Option<String>,
    pub header: Option<String>,
    pub body: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Group specifics, selected by the group's type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum GroupDetails {
    Event {
        event_date: Option<Timestamp>,
        status: Option<String>,
    },
    /// Documents and reports.
    Document {
        file_name: Option<String>,
        file_size: Option<u64>,
        file_type: Option<String>,
    },
    Email(EmailGroupFields),
    Signature {
        signature_type: Option<String>,
    },
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GroupWire")]
pub struct GroupRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    pub details: GroupDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupWire {
    #[serde(flatten)]
    meta: RecordMeta,
    name: String,
    #[serde(default)]
    event_date: Option<Timestamp>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    file_size: Option<u64>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    header: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    signature_type: Option<String>,
}

impl GroupRecord {
    pub fn new(meta: RecordMeta, name: impl Into<String>, details: GroupDetails) -> Self {
        Self {
            meta,
            name: name.into(),
            details,
        }
    }

    pub fn id(&self) -> RecordId {
        self.meta.id
    }

    pub fn type_name(&self) -> &str {
        &self.meta.type_name
    }
}

impl TryFrom<GroupWire> for GroupRecord {
    type Error = ValidationError;

    fn try_from(wire: GroupWire) -> Result<Self, Self::Error> {
        if wire.name.trim().is_empty() {
            return Err(ValidationError::invalid("name", "group name must not be empty"));
        }
        let details = match wire.meta.type_name.as_str() {
            group_types::EVENT => GroupDetails::Event {
                event_date: wire.event_date,
                status: wire.status,
            },
            group_types::DOCUMENT | group_types::REPORT => GroupDetails::Document {
                file_name: wire.file_name,
                file_size: wire.file_size,
                file_type: wire.file_type,
            },
            group_types::EMAIL => GroupDetails::Email(EmailGroupFields {
                subject: wire.subject,
                header: wire.header,
                body: wire.body,
                from: wire.from,
                to: wire.to,
            }),
            group_types::SIGNATURE => GroupDetails::Signature {
                signature_type: wire.signature_type,
            },
            _ => GroupDetails::General,
        };
        Ok(GroupRecord::new(wire.meta, wire.name, details))
    }
}

// ============================================================================
// SEARCH ITEMS
// ============================================================================

/// One row of a search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SearchItem {
    Indicator(IndicatorRecord),
    Group(GroupRecord),
}

impl SearchItem {
    pub fn meta(&self) -> &RecordMeta {
        match self {
            SearchItem::Indicator(indicator) => &indicator.meta,
            SearchItem::Group(group) => &group.meta,
        }
    }

    pub fn id(&self) -> RecordId {
        self.meta().id
    }

    pub fn type_name(&self) -> &str {
        &self.meta().type_name
    }

    pub fn owner_name(&self) -> &str {
        &self.meta().owner_name
    }

    /// Summary for indicators, name for groups.
    pub fn label(&self) -> &str {
        match self {
            SearchItem::Indicator(indicator) => &indicator.summary,
            SearchItem::Group(group) => &group.name,
        }
    }

    pub fn as_indicator(&self) -> Option<&IndicatorRecord> {
        match self {
            SearchItem::Indicator(indicator) => Some(indicator),
            SearchItem::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupRecord> {
        match self {
            SearchItem::Group(group) => Some(group),
            SearchItem::Indicator(_) => None,
        }
    }
}

impl From<IndicatorRecord> for SearchItem {
    fn from(record: IndicatorRecord) -> Self {
        SearchItem::Indicator(record)
    }
}

impl From<GroupRecord> for SearchItem {
    fn from(record: GroupRecord) -> Self {
        SearchItem::Group(record)
    }
}

// =============================================================================
// TESTS
// =============================================================================
