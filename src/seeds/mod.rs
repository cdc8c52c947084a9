//! Database seeding functionality
//!
//! Populates data the service needs at startup. Currently this is the demo
//! account configured through `CRM_DEMO_EMAIL` / `CRM_DEMO_PASSWORD`.

pub mod demo_user;

pub use demo_user::seed_demo_user;
