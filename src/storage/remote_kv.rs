use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::achievement::Achievement;
use crate::models::task::{validate_task_set, Task};
use crate::models::user::User;

use super::{DataStore, StorageProvider, KEY_ACHIEVEMENTS, KEY_TASKS, KEY_USER};

/// Client for the edge KV API (`/kv/*`).
#[derive(Debug, Clone)]
pub struct RemoteKvStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct CompleteTaskBody<'a> {
    task: TaskRef<'a>,
    completed: bool,
}

#[derive(Debug, Serialize)]
struct TaskRef<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteTaskReply {
    #[serde(default)]
    xp_gained: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

impl RemoteKvStore {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|err| AppError::other(format!("failed to build KV HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/kv/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<T> {
        let response = self.send(Method::GET, key, None::<&()>).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::malformed(key, format!("unreadable KV payload: {err}")))
    }

    async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        self.send(Method::PUT, key, Some(value)).await.map(|_| ())
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> AppResult<reqwest::Response> {
        let url = self.endpoint(path);
        debug!(target: "app::storage::kv", %method, %url, "KV request");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::error_from_response(response).await)
    }

    async fn error_from_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let message = response
            .json::<ErrorReply>()
            .await
            .map(|reply| reply.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            });

        if status == StatusCode::NOT_FOUND && message == "Task not found" {
            return AppError::not_found();
        }
        AppError::remote(message, Some(status.as_u16()))
    }

    /// Server-side completion, for callers that want the KV API to own the
    /// read-modify-write.
    pub async fn complete_task(&self, task_id: &str, completed: bool) -> AppResult<i64> {
        let body = CompleteTaskBody {
            task: TaskRef { id: task_id },
            completed,
        };
        let response = self.send(Method::POST, "complete-task", Some(&body)).await?;
        let reply = response
            .json::<CompleteTaskReply>()
            .await
            .map_err(|err| AppError::remote(format!("unreadable completion reply: {err}"), None))?;
        Ok(reply.xp_gained)
    }
}

#[async_trait::async_trait]
impl DataStore for RemoteKvStore {
    async fn load_user(&self) -> AppResult<User> {
        let user: User = self.get_json(KEY_USER).await?;
        user.validate()?;
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> AppResult<()> {
        self.put_json(KEY_USER, user).await
    }

    async fn load_tasks(&self) -> AppResult<Vec<Task>> {
        let tasks: Vec<Task> = self.get_json(KEY_TASKS).await?;
        validate_task_set(&tasks)?;
        Ok(tasks)
    }

    async fn save_tasks(&self, tasks: &[Task]) -> AppResult<()> {
        self.put_json(KEY_TASKS, tasks).await
    }

    async fn load_achievements(&self) -> AppResult<Vec<Achievement>> {
        self.get_json(KEY_ACHIEVEMENTS).await
    }

    async fn save_achievements(&self, achievements: &[Achievement]) -> AppResult<()> {
        self.put_json(KEY_ACHIEVEMENTS, achievements).await
    }

    fn provider(&self) -> StorageProvider {
        StorageProvider::RemoteKv
    }
}
