// Fixed legal due-diligence template every new tracker is seeded from
use chrono::{DateTime, Utc};
use estate_types::{LegalTracker, Step, StepPriority, StepStatus};

pub struct StepTemplate {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub priority: StepPriority,
}

pub const LEGAL_STEP_TEMPLATE: &[StepTemplate] = &[
    StepTemplate {
        key: "title-deed",
        title: "Title Deed Verification",
        description: "Confirm the seller holds clear, marketable title to the property.",
        priority: StepPriority::Critical,
    },
    StepTemplate {
        key: "encumbrance",
        title: "Encumbrance Certificate",
        description: "Check for registered mortgages, liens or charges on the property.",
        priority: StepPriority::Critical,
    },
    StepTemplate {
        key: "deed-chain",
        title: "Chain of Sale Deeds",
        description: "Trace prior sale deeds for an unbroken ownership history.",
        priority: StepPriority::Critical,
    },
    StepTemplate {
        key: "building-plan",
        title: "Approved Building Plan",
        description: "Match the construction against the sanctioned plan.",
        priority: StepPriority::High,
    },
    StepTemplate {
        key: "occupancy",
        title: "Occupancy Certificate",
        description: "Verify the local authority has issued an occupancy certificate.",
        priority: StepPriority::High,
    },
    StepTemplate {
        key: "rera",
        title: "RERA Registration",
        description: "Confirm the project is registered with the real estate regulator.",
        priority: StepPriority::High,
    },
    StepTemplate {
        key: "power-of-attorney",
        title: "Power of Attorney Check",
        description: "Validate any power of attorney used in the transaction.",
        priority: StepPriority::High,
    },
    StepTemplate {
        key: "property-tax",
        title: "Property Tax Receipts",
        description: "Collect receipts showing property tax is paid up to date.",
        priority: StepPriority::Medium,
    },
    StepTemplate {
        key: "society-noc",
        title: "Society NOC",
        description: "Obtain a no-objection certificate from the housing society.",
        priority: StepPriority::Medium,
    },
    StepTemplate {
        key: "utility-bills",
        title: "Utility Bills",
        description: "Check electricity and water bills for outstanding dues.",
        priority: StepPriority::Medium,
    },
];

/// Fresh steps from the template, all pending
pub fn seed_steps() -> Vec<Step> {
    LEGAL_STEP_TEMPLATE
        .iter()
        .map(|t| Step {
            id: t.key.to_string(),
            title: t.title.to_string(),
            description: t.description.to_string(),
            status: StepStatus::Pending,
            priority: t.priority,
            date_verified: None,
            notes: None,
        })
        .collect()
}

pub fn seed_tracker(id: &str, property_id: &str, title: &str, now: DateTime<Utc>) -> LegalTracker {
    LegalTracker {
        id: id.to_string(),
        property_id: property_id.to_string(),
        title: title.to_string(),
        steps: seed_steps(),
        created_at: now,
    }
}
