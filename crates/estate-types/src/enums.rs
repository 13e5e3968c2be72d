//! Centralized status, priority and level enums.
//!
//! Each enum carries its wire name (as sent by the REST backend), a human
//! label and a [`Tone`] used for badge colors.

use serde::{Deserialize, Serialize};

/// Badge color family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

impl Tone {
    /// Color token used by the badge components
    pub fn color(&self) -> &'static str {
        match self {
            Tone::Neutral => "gray",
            Tone::Info => "blue",
            Tone::Success => "green",
            Tone::Warning => "amber",
            Tone::Danger => "red",
        }
    }
}

/// Display metadata shared by every centralized enum
pub trait DisplayMeta {
    fn label(&self) -> &'static str;
    fn tone(&self) -> Tone;
}

string_enum! {
    /// Listing status of a property
    pub enum PropertyStatus {
        Available => "available", "Available", Success;
        Pending => "pending", "Under Offer", Warning;
        Sold => "sold", "Sold", Neutral;
        Rented => "rented", "Rented", Info;
    }
}

string_enum! {
    pub enum PropertyType {
        Apartment => "apartment", "Apartment", Neutral;
        Villa => "villa", "Villa", Neutral;
        Plot => "plot", "Plot", Neutral;
        Commercial => "commercial", "Commercial", Neutral;
    }
}

string_enum! {
    /// CRM pipeline stage of a lead
    pub enum LeadStatus {
        New => "new", "New", Info;
        Contacted => "contacted", "Contacted", Warning;
        Qualified => "qualified", "Qualified", Success;
        Converted => "converted", "Converted", Success;
        Closed => "closed", "Closed", Neutral;
    }
}

string_enum! {
    /// Priority shared by leads and notifications, ordered low to urgent
    pub enum Priority {
        Low => "low", "Low", Neutral;
        Medium => "medium", "Medium", Info;
        High => "high", "High", Warning;
        Urgent => "urgent", "Urgent", Danger;
    }
}

string_enum! {
    pub enum BookingStatus {
        Pending => "pending", "Pending", Warning;
        Confirmed => "confirmed", "Confirmed", Info;
        Completed => "completed", "Completed", Success;
        Cancelled => "cancelled", "Cancelled", Danger;
    }
}

string_enum! {
    pub enum ReportType {
        Legal => "legal", "Legal", Info;
        Engineering => "engineering", "Engineering", Info;
        Valuation => "valuation", "Valuation", Info;
    }
}

string_enum! {
    pub enum ReportStatus {
        Draft => "draft", "Draft", Neutral;
        InReview => "in-review", "In Review", Warning;
        Final => "final", "Final", Success;
    }
}

string_enum! {
    pub enum TeamRole {
        Admin => "admin", "Administrator", Danger;
        Manager => "manager", "Manager", Warning;
        Agent => "agent", "Agent", Info;
        Viewer => "viewer", "Viewer", Neutral;
    }
}

string_enum! {
    pub enum MemberStatus {
        Active => "active", "Active", Success;
        Inactive => "inactive", "Inactive", Neutral;
    }
}

string_enum! {
    pub enum NotificationCategory {
        Lead => "lead", "Lead", Info;
        Booking => "booking", "Booking", Info;
        Report => "report", "Report", Info;
        System => "system", "System", Neutral;
        Payment => "payment", "Payment", Warning;
    }
}

string_enum! {
    /// Server-side visibility of a notification. Archived is terminal.
    pub enum NotificationStatus {
        Active => "active", "Active", Neutral;
        Archived => "archived", "Archived", Neutral;
    }
}

string_enum! {
    /// Verification status of a due-diligence step
    pub enum StepStatus {
        Verified => "verified", "Verified", Success;
        Pending => "pending", "Pending", Warning;
        NotVerified => "not-verified", "Not Verified", Danger;
    }
}

string_enum! {
    pub enum StepPriority {
        Critical => "critical", "Critical", Danger;
        High => "high", "High", Warning;
        Medium => "medium", "Medium", Info;
    }
}

impl StepPriority {
    /// Weight of an unverified step of this priority in the outstanding risk score
    pub fn weight(&self) -> u32 {
        match self {
            StepPriority::Critical => 3,
            StepPriority::High => 2,
            StepPriority::Medium => 1,
        }
    }
}

string_enum! {
    /// Risk badge derived from a numeric score, ordered low to critical
    pub enum RiskLevel {
        Low => "low", "Low Risk", Success;
        Medium => "medium", "Medium Risk", Warning;
        High => "high", "High Risk", Danger;
        Critical => "critical", "Critical Risk", Danger;
    }
}
