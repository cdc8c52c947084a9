//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the CRM
//! entities. Each repository borrows the shared connection pool for the
//! duration of a request.

pub mod college;
pub mod interaction_log;
pub mod session;
pub mod task;
pub mod team_member;
pub mod user;

pub use college::CollegeRepository;
pub use interaction_log::InteractionLogRepository;
pub use session::SessionRepository;
pub use task::TaskRepository;
pub use team_member::TeamMemberRepository;
pub use user::UserRepository;

use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};

/// Normalize optional free text: surrounding whitespace is dropped and blank
/// values are stored as NULL.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

const LIKE_ESCAPE: char = '\\';

/// Escape LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

/// Case-insensitive literal substring match across `columns`.
pub(crate) fn search_condition<C>(term: &str, columns: &[C]) -> Option<Condition>
where
    C: ColumnTrait,
{
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    let condition = columns.iter().fold(Condition::any(), |condition, column| {
        let lowered: SimpleExpr = Func::lower(Expr::col(*column)).into();
        condition.add(Expr::expr(lowered).like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)))
    });

    Some(condition)
}
