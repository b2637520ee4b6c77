use serde::{Deserialize, Serialize};

use super::error::{BeingError, Result};

/// Happiness granted when a task is checked off
pub const TASK_HAPPINESS_BONUS: i32 = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Task {
            id,
            text: text.into(),
            completed: false,
        }
    }
}

/// Checklist shown next to the being
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl Default for TaskList {
    fn default() -> Self {
        TaskList {
            tasks: vec![
                Task::new(1, "15分間本を読む"),
                Task::new(2, "パズルを解く"),
                Task {
                    id: 3,
                    text: "新しいスキルを練習する".to_string(),
                    completed: true,
                },
            ],
        }
    }
}

impl TaskList {
    /// Flip completion of `id`. Returns true when the task became completed.
    pub fn toggle(&mut self, id: u32) -> Result<bool> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(BeingError::TaskNotFound(id))?;

        task.completed = !task.completed;
        Ok(task.completed)
    }

    pub fn get(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_reports_completion() {
        let mut tasks = TaskList::default();

        assert!(tasks.toggle(1).unwrap());
        assert!(tasks.get(1).unwrap().completed);

        assert!(!tasks.toggle(1).unwrap());
        assert!(!tasks.get(1).unwrap().completed);
    }

    #[test]
    fn test_toggle_unknown_task() {
        let mut tasks = TaskList::default();
        assert!(matches!(tasks.toggle(99), Err(BeingError::TaskNotFound(99))));
    }

    #[test]
    fn test_default_tasks() {
        let tasks = TaskList::default();
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks.completed_count(), 1);
    }
}
