//! Interaction log entity model
//!
//! Append-only log of contact attempts with a college.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Channel used for an interaction
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ContactMethod {
    #[default]
    #[sea_orm(string_value = "Call")]
    Call,
    #[sea_orm(string_value = "Visit")]
    Visit,
    #[sea_orm(string_value = "Email")]
    Email,
    #[sea_orm(string_value = "WhatsApp")]
    WhatsApp,
    #[sea_orm(string_value = "SMS")]
    #[serde(rename = "SMS")]
    Sms,
}

/// Interaction log entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "interaction_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// College the interaction belongs to
    pub college_id: Uuid,

    /// Team member who made the contact
    pub executive_name: Option<String>,

    pub contact_method: ContactMethod,
    pub notes: String,
    pub interaction_date: Date,

    /// Optional attachment location
    pub file_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
