//! Dashboard aggregation.
//!
//! # Invariants
//! - `total == completed + pending` for every summary.
//! - The category histogram always covers the owner's full task set, even when
//!   the counts and listing are narrowed by a category filter.

use crate::model::task::{Category, Task};
use crate::model::user::Owner;
use crate::repo::task_repo::{TaskListQuery, TaskRepository};
use crate::repo::RepoResult;
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregated counts for one dashboard view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub completed: u64,
    pub pending: u64,
    /// Only categories with at least one task appear.
    pub category_histogram: BTreeMap<Category, u64>,
}

/// Task listing plus summary, as rendered by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub selected_category: Option<Category>,
    pub tasks: Vec<Task>,
    pub summary: Summary,
}

/// Read-only aggregator over an owner's tasks.
pub struct DashboardService<R: TaskRepository> {
    repo: R,
}

impl<R: TaskRepository> DashboardService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Computes counts, narrowed by `category_filter`, and the unfiltered
    /// category histogram.
    pub fn summarize(
        &self,
        owner: &Owner,
        category_filter: Option<Category>,
    ) -> RepoResult<Summary> {
        let counts = self.repo.count_tasks(owner.user_id(), category_filter)?;
        let category_histogram = self
            .repo
            .category_histogram(owner.user_id())?
            .into_iter()
            .collect::<BTreeMap<_, _>>();

        debug!(
            "event=dashboard_summarize module=service status=ok total={} completed={} categories={}",
            counts.total,
            counts.completed,
            category_histogram.len()
        );

        Ok(Summary {
            total: counts.total,
            completed: counts.completed,
            pending: counts.total.saturating_sub(counts.completed),
            category_histogram,
        })
    }

    /// Builds the full dashboard: filtered listing and summary.
    pub fn dashboard(
        &self,
        owner: &Owner,
        category_filter: Option<Category>,
    ) -> RepoResult<DashboardView> {
        let tasks = self.repo.list_tasks(
            owner.user_id(),
            &TaskListQuery {
                category: category_filter,
            },
        )?;
        let summary = self.summarize(owner, category_filter)?;

        Ok(DashboardView {
            selected_category: category_filter,
            tasks,
            summary,
        })
    }
}
