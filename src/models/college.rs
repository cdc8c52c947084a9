//! College entity model
//!
//! This module contains the SeaORM entity model for the colleges table,
//! the central record of the outreach pipeline.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Position of a college in the outreach pipeline
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "kebab-case")]
pub enum CollegeStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "in-discussion")]
    InDiscussion,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
}

impl CollegeStatus {
    /// Every status, in pipeline order.
    pub const ALL: [CollegeStatus; 5] = [
        CollegeStatus::Pending,
        CollegeStatus::InDiscussion,
        CollegeStatus::Scheduled,
        CollegeStatus::Accepted,
        CollegeStatus::Rejected,
    ];

    /// Whether the outreach for this college has reached a final outcome.
    pub fn is_closed(self) -> bool {
        matches!(self, CollegeStatus::Accepted | CollegeStatus::Rejected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CollegeStatus::Pending => "pending",
            CollegeStatus::Accepted => "accepted",
            CollegeStatus::Rejected => "rejected",
            CollegeStatus::InDiscussion => "in-discussion",
            CollegeStatus::Scheduled => "scheduled",
        }
    }
}

/// College entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "colleges")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Institution name (required)
    pub name: String,

    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,

    /// Primary contact at the college
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,

    /// Free-form classification, e.g. "Engineering" or "Degree"
    pub college_type: Option<String>,

    pub status: CollegeStatus,
    pub last_contact_date: Option<Date>,
    pub next_followup_date: Option<Date>,

    /// Only meaningful when `status` is `rejected`
    pub rejection_reason: Option<String>,
    pub status_notes: Option<String>,
    pub description: Option<String>,

    /// User who created the record
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
