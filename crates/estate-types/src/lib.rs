//! Domain records, enums and errors shared by every estate desk crate.

#[macro_use]
mod macros;

pub mod enums;
pub mod error;
pub mod record;
pub mod types;

pub use enums::{
    BookingStatus, DisplayMeta, LeadStatus, MemberStatus, NotificationCategory, NotificationStatus,
    Priority, PropertyStatus, PropertyType, ReportStatus, ReportType, RiskLevel, StepPriority,
    StepStatus, TeamRole, Tone,
};
pub use error::{EstateError, Outcome, Result};
pub use record::{validate_unique_ids, FieldValue, Record, Resource};
pub use types::{
    AnyRecord, Booking, Lead, LegalTracker, Notification, NotificationState, Property, Report,
    Step, TeamMember,
};
