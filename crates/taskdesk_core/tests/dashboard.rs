mod common;

use common::register_owner;
use std::collections::BTreeMap;
use taskdesk_core::db::open_db_in_memory;
use taskdesk_core::{
    Category, CreateTaskRequest, DashboardService, Owner, SqliteTaskRepository, Summary, Task,
    TaskService,
};

fn create(
    service: &TaskService<SqliteTaskRepository<'_>>,
    owner: &Owner,
    title: &str,
    deadline: Option<&str>,
) -> Task {
    service
        .create(
            owner,
            &CreateTaskRequest {
                title: title.to_string(),
                deadline: deadline.map(str::to_string),
            },
        )
        .unwrap()
}

#[test]
fn empty_owner_has_zero_summary() {
    let conn = open_db_in_memory().unwrap();
    let owner = register_owner(&conn, "ada");
    let dashboard = DashboardService::new(SqliteTaskRepository::try_new(&conn).unwrap());

    let summary = dashboard.summarize(&owner, None).unwrap();
    assert_eq!(summary, Summary::default());
    assert!(summary.category_histogram.is_empty());
}

#[test]
fn three_task_scenario_matches_expected_dashboard() {
    let conn = open_db_in_memory().unwrap();
    let owner = register_owner(&conn, "ada");
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let dashboard = DashboardService::new(SqliteTaskRepository::try_new(&conn).unwrap());

    let moby = create(&tasks, &owner, "Read Moby Dick", None);
    create(&tasks, &owner, "Team meeting notes", Some("2025-01-01T10:00"));
    create(&tasks, &owner, "Play guitar", None);

    let view = dashboard.dashboard(&owner, None).unwrap();
    assert_eq!(view.tasks.len(), 3);
    assert_eq!(view.summary.total, 3);
    assert_eq!(view.summary.completed, 0);
    assert_eq!(view.summary.pending, 3);
    assert_eq!(
        view.summary.category_histogram,
        BTreeMap::from([
            (Category::Reading, 1),
            (Category::Writing, 1),
            (Category::Hobbies, 1),
        ])
    );

    let reading = dashboard.dashboard(&owner, Some(Category::Reading)).unwrap();
    assert_eq!(reading.selected_category, Some(Category::Reading));
    assert_eq!(reading.tasks.len(), 1);
    assert_eq!(reading.tasks[0].id, moby.id);
}

#[test]
fn filter_narrows_counts_but_not_histogram() {
    let conn = open_db_in_memory().unwrap();
    let owner = register_owner(&conn, "ada");
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let dashboard = DashboardService::new(SqliteTaskRepository::try_new(&conn).unwrap());

    let first = create(&tasks, &owner, "Read a book", None);
    create(&tasks, &owner, "Read a story", None);
    create(&tasks, &owner, "Dance practice", None);
    tasks.complete(&owner, first.id).unwrap();

    let summary = dashboard
        .summarize(&owner, Some(Category::Reading))
        .unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(
        summary.category_histogram,
        BTreeMap::from([(Category::Reading, 2), (Category::Hobbies, 1)])
    );
}

#[test]
fn totals_always_equal_completed_plus_pending() {
    let conn = open_db_in_memory().unwrap();
    let ada = register_owner(&conn, "ada");
    let bob = register_owner(&conn, "bob");
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let dashboard = DashboardService::new(SqliteTaskRepository::try_new(&conn).unwrap());

    let titles = ["Read", "Write", "Play", "Shop", "Novel", "Essay", "Cook"];
    for (index, title) in titles.iter().enumerate() {
        let task = create(&tasks, &ada, title, None);
        if index % 2 == 0 {
            tasks.complete(&ada, task.id).unwrap();
        }
        let summary = dashboard.summarize(&ada, None).unwrap();
        assert_eq!(summary.total, summary.completed + summary.pending);
        assert_eq!(summary.total, index as u64 + 1);
        for category in Category::ALL {
            let filtered = dashboard.summarize(&ada, Some(category)).unwrap();
            assert_eq!(filtered.total, filtered.completed + filtered.pending);
        }
    }

    let other = dashboard.summarize(&bob, None).unwrap();
    assert_eq!(other, Summary::default());
}

#[test]
fn summary_serializes_with_category_keys() {
    let conn = open_db_in_memory().unwrap();
    let owner = register_owner(&conn, "ada");
    let tasks = TaskService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    let dashboard = DashboardService::new(SqliteTaskRepository::try_new(&conn).unwrap());
    create(&tasks, &owner, "Play chess", None);

    let summary = dashboard.summarize(&owner, None).unwrap();
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "total": 1,
            "completed": 0,
            "pending": 1,
            "category_histogram": {"hobbies": 1}
        })
    );
}
