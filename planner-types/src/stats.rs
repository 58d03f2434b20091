//! Task completion statistics for the dashboard.

use crate::record::{Task, TaskStatus};
use serde::{Deserialize, Serialize};

/// Aggregate completion numbers over a set of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    /// Rounded percentage of completed tasks; 0 when there are no tasks.
    pub completion_rate: u8,
}

/// Computes statistics over a slice of tasks.
pub fn task_statistics(tasks: &[Task]) -> TaskStatistics {
    let total = tasks.len();
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    let pending = total - completed;
    let completion_rate = if total > 0 {
        ((completed as f64 / total as f64) * 100.0).round() as u8
    } else {
        0
    };
    TaskStatistics {
        total,
        completed,
        pending,
        completion_rate,
    }
}
