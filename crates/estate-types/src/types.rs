use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{
    BookingStatus, LeadStatus, MemberStatus, NotificationCategory, NotificationStatus, Priority,
    PropertyStatus, PropertyType, ReportStatus, ReportType, StepPriority, StepStatus, TeamRole,
};
use crate::record::{FieldValue, Record, Resource};

fn text_or_missing(value: &Option<String>) -> FieldValue<'_> {
    value.as_deref().map_or(FieldValue::Missing, FieldValue::Text)
}

fn number_or_missing(value: Option<f64>) -> FieldValue<'static> {
    value.map_or(FieldValue::Missing, FieldValue::Number)
}

fn time_or_missing(value: Option<DateTime<Utc>>) -> FieldValue<'static> {
    value.map_or(FieldValue::Missing, FieldValue::Time)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    pub address: String,
    pub city: String,
    pub property_type: PropertyType,
    pub status: PropertyStatus,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_sqft: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Record for Property {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "title" => FieldValue::Text(&self.title),
            "address" => FieldValue::Text(&self.address),
            "city" => FieldValue::Text(&self.city),
            "propertyType" => FieldValue::Text(self.property_type.as_str()),
            "status" => FieldValue::Text(self.status.as_str()),
            "price" => FieldValue::Number(self.price),
            "bedrooms" => number_or_missing(self.bedrooms.map(f64::from)),
            "areaSqft" => number_or_missing(self.area_sqft),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["title", "address", "city"]
    }

    fn enum_values(field: &str) -> Option<&'static [&'static str]> {
        match field {
            "propertyType" => Some(PropertyType::WIRE_NAMES),
            "status" => Some(PropertyStatus::WIRE_NAMES),
            _ => None,
        }
    }
}

impl Resource for Property {
    const PATH: &'static str = "properties";
    const NAME: &'static str = "property";
}

/// A CRM lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub status: LeadStatus,
    #[serde(default)]
    pub source: String,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Record for Lead {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "name" => FieldValue::Text(&self.name),
            "phone" => FieldValue::Text(&self.phone),
            "email" => FieldValue::Text(&self.email),
            "address" => text_or_missing(&self.address),
            "status" => FieldValue::Text(self.status.as_str()),
            "source" => FieldValue::Text(&self.source),
            "priority" => FieldValue::Text(self.priority.as_str()),
            "budget" => number_or_missing(self.budget),
            "score" => number_or_missing(self.score),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["name", "phone", "email", "address"]
    }

    fn enum_values(field: &str) -> Option<&'static [&'static str]> {
        match field {
            "status" => Some(LeadStatus::WIRE_NAMES),
            "priority" => Some(Priority::WIRE_NAMES),
            _ => None,
        }
    }
}

impl Resource for Lead {
    const PATH: &'static str = "leads";
    const NAME: &'static str = "lead";
}

/// A site-visit booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub customer_name: String,
    pub phone: String,
    pub email: String,
    pub property_id: String,
    pub status: BookingStatus,
    pub scheduled_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Record for Booking {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "customerName" => FieldValue::Text(&self.customer_name),
            "phone" => FieldValue::Text(&self.phone),
            "email" => FieldValue::Text(&self.email),
            "propertyId" => FieldValue::Text(&self.property_id),
            "status" => FieldValue::Text(self.status.as_str()),
            "scheduledAt" => FieldValue::Time(self.scheduled_at),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["customerName", "phone", "email"]
    }

    fn enum_values(field: &str) -> Option<&'static [&'static str]> {
        match field {
            "status" => Some(BookingStatus::WIRE_NAMES),
            _ => None,
        }
    }
}

impl Resource for Booking {
    const PATH: &'static str = "bookings";
    const NAME: &'static str = "booking";
}

/// A legal, engineering or valuation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    pub property_address: String,
    pub report_type: ReportType,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Record for Report {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "title" => FieldValue::Text(&self.title),
            "propertyAddress" => FieldValue::Text(&self.property_address),
            "reportType" => FieldValue::Text(self.report_type.as_str()),
            "status" => FieldValue::Text(self.status.as_str()),
            "riskScore" => number_or_missing(self.risk_score),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["title", "propertyAddress"]
    }

    fn enum_values(field: &str) -> Option<&'static [&'static str]> {
        match field {
            "reportType" => Some(ReportType::WIRE_NAMES),
            "status" => Some(ReportStatus::WIRE_NAMES),
            _ => None,
        }
    }
}

impl Resource for Report {
    const PATH: &'static str = "reports";
    const NAME: &'static str = "report";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: TeamRole,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
}

impl Record for TeamMember {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "name" => FieldValue::Text(&self.name),
            "email" => FieldValue::Text(&self.email),
            "phone" => text_or_missing(&self.phone),
            "role" => FieldValue::Text(self.role.as_str()),
            "status" => FieldValue::Text(self.status.as_str()),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["name", "email", "phone"]
    }

    fn enum_values(field: &str) -> Option<&'static [&'static str]> {
        match field {
            "role" => Some(TeamRole::WIRE_NAMES),
            "status" => Some(MemberStatus::WIRE_NAMES),
            _ => None,
        }
    }
}

impl Resource for TeamMember {
    const PATH: &'static str = "team-members";
    const NAME: &'static str = "team member";
}

/// Lifecycle position of a notification, derived from its stored fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationState {
    Unread,
    Read,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub category: NotificationCategory,
    pub priority: Priority,
    pub is_read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
    #[serde(default = "default_notification_status")]
    pub status: NotificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

fn default_notification_status() -> NotificationStatus {
    NotificationStatus::Active
}

impl Notification {
    pub fn is_archived(&self) -> bool {
        self.status == NotificationStatus::Archived
    }

    /// Counts toward the unread badge
    pub fn is_unread(&self) -> bool {
        !self.is_read && !self.is_archived()
    }

    pub fn state(&self) -> NotificationState {
        if self.is_archived() {
            NotificationState::Archived
        } else if self.is_read {
            NotificationState::Read
        } else {
            NotificationState::Unread
        }
    }
}

impl Record for Notification {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "userId" => FieldValue::Text(&self.user_id),
            "title" => FieldValue::Text(&self.title),
            "message" => FieldValue::Text(&self.message),
            "category" => FieldValue::Text(self.category.as_str()),
            "priority" => FieldValue::Text(self.priority.as_str()),
            "isRead" => FieldValue::Bool(self.is_read),
            "readAt" => time_or_missing(self.read_at),
            "status" => FieldValue::Text(self.status.as_str()),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["title", "message"]
    }

    fn enum_values(field: &str) -> Option<&'static [&'static str]> {
        match field {
            "category" => Some(NotificationCategory::WIRE_NAMES),
            "priority" => Some(Priority::WIRE_NAMES),
            "status" => Some(NotificationStatus::WIRE_NAMES),
            _ => None,
        }
    }
}

impl Resource for Notification {
    const PATH: &'static str = "notifications";
    const NAME: &'static str = "notification";
}

/// One unit of verification work inside a tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: StepStatus,
    pub priority: StepPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_verified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Legal due-diligence tracker for one property.
///
/// Progress is never stored here; it is derived from `steps` on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalTracker {
    pub id: String,
    pub property_id: String,
    pub title: String,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
}

impl LegalTracker {
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }
}

impl Record for LegalTracker {
    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Text(&self.id),
            "propertyId" => FieldValue::Text(&self.property_id),
            "title" => FieldValue::Text(&self.title),
            "stepCount" => FieldValue::Number(self.steps.len() as f64),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> &'static [&'static str] {
        &["title"]
    }
}

impl Resource for LegalTracker {
    const PATH: &'static str = "legal-trackers";
    const NAME: &'static str = "legal tracker";
}

/// Any domain record, tagged by kind, for mixed feeds such as global search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnyRecord {
    Property(Property),
    Lead(Lead),
    Booking(Booking),
    Report(Report),
    TeamMember(TeamMember),
    Notification(Notification),
    LegalTracker(LegalTracker),
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $body:expr) => {
        match $self {
            AnyRecord::Property($inner) => $body,
            AnyRecord::Lead($inner) => $body,
            AnyRecord::Booking($inner) => $body,
            AnyRecord::Report($inner) => $body,
            AnyRecord::TeamMember($inner) => $body,
            AnyRecord::Notification($inner) => $body,
            AnyRecord::LegalTracker($inner) => $body,
        }
    };
}

impl AnyRecord {
    /// Serde tag of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            AnyRecord::Property(_) => "property",
            AnyRecord::Lead(_) => "lead",
            AnyRecord::Booking(_) => "booking",
            AnyRecord::Report(_) => "report",
            AnyRecord::TeamMember(_) => "teamMember",
            AnyRecord::Notification(_) => "notification",
            AnyRecord::LegalTracker(_) => "legalTracker",
        }
    }
}

impl Record for AnyRecord {
    fn id(&self) -> &str {
        delegate!(self, r => r.id())
    }

    fn created_at(&self) -> DateTime<Utc> {
        delegate!(self, r => r.created_at())
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        if name == "kind" {
            return Some(FieldValue::Text(self.kind()));
        }
        delegate!(self, r => r.field(name))
    }

    fn search_fields(&self) -> &'static [&'static str] {
        delegate!(self, r => r.search_fields())
    }
}
