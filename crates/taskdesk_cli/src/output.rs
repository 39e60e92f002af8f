//! Text and JSON rendering for command results.

use serde::Serialize;
use taskdesk_core::{format_deadline, Category, DashboardView, Summary, Task};

use crate::error::CliError;

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// JSON body for commands that succeed without a result value.
pub fn acknowledgement() -> serde_json::Value {
    serde_json::json!({ "ok": true })
}

pub fn print_task(task: &Task) {
    println!("{}", task_line(task));
}

pub fn print_dashboard(view: &DashboardView) {
    match view.selected_category {
        Some(category) => println!("Tasks in {}", category.label()),
        None => println!("All tasks"),
    }
    if view.tasks.is_empty() {
        println!("  (none)");
    }
    for task in &view.tasks {
        println!("  {}", task_line(task));
    }
    println!();
    print_summary(&view.summary);
}

fn print_summary(summary: &Summary) {
    println!(
        "total={} completed={} pending={}",
        summary.total, summary.completed, summary.pending
    );
    for category in Category::ALL {
        if let Some(count) = summary.category_histogram.get(&category) {
            println!("  {:<8} {count}", category.as_str());
        }
    }
}

fn task_line(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!(
        "{} [{mark}] {:<6} {:<8} {}",
        task.id,
        task.priority.as_str(),
        task.category.as_str(),
        task.title
    );
    if let Some(deadline) = task.deadline.and_then(format_deadline) {
        line.push_str(&format!(" (due {deadline})"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{acknowledgement, task_line};
    use taskdesk_core::{Category, Priority, Task, TaskId, UserId};

    fn task(deadline: Option<i64>, completed: bool) -> Task {
        Task {
            id: TaskId::nil(),
            owner: UserId::nil(),
            title: "Read Moby Dick".to_string(),
            category: Category::Reading,
            priority: Priority::Medium,
            completed,
            created_at: 0,
            deadline,
        }
    }

    #[test]
    fn task_line_shows_state_and_deadline() {
        let open = task_line(&task(Some(1_735_725_600_000), false));
        assert!(open.contains("[ ]"));
        assert!(open.contains("reading"));
        assert!(open.ends_with("(due 2025-01-01T10:00:00Z)"));

        let done = task_line(&task(None, true));
        assert!(done.contains("[x]"));
        assert!(!done.contains("due"));
    }

    #[test]
    fn acknowledgement_is_ok_object() {
        assert_eq!(acknowledgement().to_string(), r#"{"ok":true}"#);
    }
}
