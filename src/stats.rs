//! Dashboard statistics.
//!
//! Every figure is recomputed from the loaded records on each call; nothing
//! is cached or stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::college::{CollegeStatus, Model as CollegeModel};
use crate::models::task::{Model as TaskModel, TaskPriority, TaskStatus};
use crate::models::team_member::{MemberStatus, Model as MemberModel, TeamRole};

/// Pipeline figures for colleges
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CollegeStats {
    pub total: u64,
    pub pending: u64,
    pub in_discussion: u64,
    pub scheduled: u64,
    pub accepted: u64,
    pub rejected: u64,
    /// Open colleges whose next follow-up is today or earlier
    pub follow_ups_due: u64,
    /// Accepted share of all colleges, in percent with one decimal
    pub acceptance_rate: f64,
}

/// Task board figures; `all`/`pending`/`completed`/`overdue` double as tab counts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskStats {
    pub all: u64,
    pub pending: u64,
    pub completed: u64,
    pub overdue: u64,
    pub completion_rate: f64,
    pub high_priority_pending: u64,
    pub medium_priority_pending: u64,
    pub low_priority_pending: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TeamStats {
    pub total: u64,
    pub active: u64,
    pub managers: u64,
    pub field_executives: u64,
}

pub fn college_stats(colleges: &[CollegeModel], today: NaiveDate) -> CollegeStats {
    let mut stats = CollegeStats {
        total: colleges.len() as u64,
        ..Default::default()
    };

    for college in colleges {
        match college.status {
            CollegeStatus::Pending => stats.pending += 1,
            CollegeStatus::InDiscussion => stats.in_discussion += 1,
            CollegeStatus::Scheduled => stats.scheduled += 1,
            CollegeStatus::Accepted => stats.accepted += 1,
            CollegeStatus::Rejected => stats.rejected += 1,
        }

        if !college.status.is_closed()
            && college.next_followup_date.is_some_and(|date| date <= today)
        {
            stats.follow_ups_due += 1;
        }
    }

    stats.acceptance_rate = percentage(stats.accepted, stats.total);
    stats
}

pub fn task_stats(tasks: &[TaskModel], today: NaiveDate) -> TaskStats {
    let mut stats = TaskStats {
        all: tasks.len() as u64,
        ..Default::default()
    };

    for task in tasks {
        match task.status {
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::Pending => {
                stats.pending += 1;
                match task.priority {
                    TaskPriority::High => stats.high_priority_pending += 1,
                    TaskPriority::Medium => stats.medium_priority_pending += 1,
                    TaskPriority::Low => stats.low_priority_pending += 1,
                }
            }
        }

        if task.is_overdue(today) {
            stats.overdue += 1;
        }
    }

    stats.completion_rate = percentage(stats.completed, stats.all);
    stats
}

pub fn team_stats(members: &[MemberModel]) -> TeamStats {
    TeamStats {
        total: members.len() as u64,
        active: count(members, |m| m.status == MemberStatus::Active),
        managers: count(members, |m| m.role == TeamRole::Manager),
        field_executives: count(members, |m| m.role == TeamRole::FieldExecutive),
    }
}

fn count<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> u64 {
    items.iter().filter(|item| predicate(item)).count() as u64
}

/// `part / total` as a percentage rounded to one decimal; 0 when `total` is 0.
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / total as f64).round() / 10.0
}
