//! # Data Models
//!
//! This module contains all the data models used throughout the outreach CRM.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod college;
pub mod interaction_log;
pub mod session;
pub mod task;
pub mod team_member;
pub mod user;

pub use college::Entity as College;
pub use interaction_log::Entity as InteractionLog;
pub use session::Entity as Session;
pub use task::Entity as Task;
pub use team_member::Entity as TeamMember;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "outreach-crm".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
