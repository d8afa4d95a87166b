//! ============================================================================
//! Task endpoints - list, create, update, delete
//! ============================================================================

use reqwest::Method;
use tracing::info;

use super::ApiClient;
use crate::types::{Result, Task, TaskDraft};

impl ApiClient {
    /// `GET /tasks/user/{userId}`
    pub async fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>> {
        let request = self.request(Method::GET, &format!("/tasks/user/{}", user_id));
        self.send_json(request, "list tasks").await
    }

    /// `POST /tasks/create?authorId=&executorId=`
    pub async fn create_task(&self, author_id: i64, executor_id: i64, draft: &TaskDraft) -> Result<Task> {
        info!("Creating task '{}' for executor {}", draft.title, executor_id);
        let request = self
            .request(Method::POST, "/tasks/create")
            .query(&[("authorId", author_id), ("executorId", executor_id)])
            .json(draft);
        self.send_json(request, "create task").await
    }

    /// `PUT /tasks/{id}?userID=` with the full task payload
    pub async fn update_task(&self, user_id: i64, task: &Task) -> Result<Task> {
        let request = self
            .request(Method::PUT, &format!("/tasks/{}", task.id))
            .query(&[("userID", user_id)])
            .json(task);
        self.send_json(request, "update task").await
    }

    /// `DELETE /tasks/{id}?userID=`
    pub async fn delete_task(&self, user_id: i64, task_id: i64) -> Result<()> {
        info!("Deleting task {}", task_id);
        let request = self
            .request(Method::DELETE, &format!("/tasks/{}", task_id))
            .query(&[("userID", user_id)]);
        self.send_empty(request, "delete task").await
    }
}
