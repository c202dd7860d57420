//! Remote data client.
//!
//! Four read operations over the project hierarchy. Every failure (transport
//! error, timeout, non-2xx status, malformed JSON) is logged and turned into
//! an empty list: callers treat empty as "no data this cycle" and the next
//! scheduled cycle is the retry.

use async_trait::async_trait;
use relay_models::{Comment, Project, Task, TaskList};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::BasecampConfig;
use crate::error::{RelayError, Result};

/// Read access to projects, to-do lists, to-dos and comments.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn list_projects(&self) -> Vec<Project>;

    async fn list_task_lists(&self, project_id: u64) -> Vec<TaskList>;

    async fn list_tasks(&self, project_id: u64, task_list_id: u64) -> Vec<Task>;

    async fn list_comments(&self, project_id: u64, task_id: u64) -> Vec<Comment>;
}

/// Endpoint path templates, relative to the API root.
///
/// Placeholders: `{project}`, `{todolist}`, `{todo}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub projects: String,
    pub task_lists: String,
    pub tasks: String,
    pub comments: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            projects: "projects.json".to_string(),
            task_lists: "buckets/{project}/todolists.json".to_string(),
            tasks: "buckets/{project}/todolists/{todolist}/todos.json".to_string(),
            comments: "buckets/{project}/todos/{todo}/comments.json".to_string(),
        }
    }
}

fn expand(template: &str, project: Option<u64>, todolist: Option<u64>, todo: Option<u64>) -> String {
    let mut path = template.to_string();
    if let Some(id) = project {
        path = path.replace("{project}", &id.to_string());
    }
    if let Some(id) = todolist {
        path = path.replace("{todolist}", &id.to_string());
    }
    if let Some(id) = todo {
        path = path.replace("{todo}", &id.to_string());
    }
    path
}

/// Basecamp 3 API client.
#[derive(Clone)]
pub struct BasecampClient {
    http: reqwest::Client,
    api_base: String,
    endpoints: Endpoints,
}

impl BasecampClient {
    /// Builds a client with bearer auth, User-Agent and request timeout baked in.
    pub fn new(config: &BasecampConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| RelayError::Http(format!("invalid user agent: {}", e)))?,
        );
        let auth = format!("Bearer {}", config.access_token.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| RelayError::Http(format!("invalid access token: {}", e)))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            endpoints: config.endpoints.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// One GET, parsed as a JSON array. Any failure yields an empty list.
    async fn get_list<T: DeserializeOwned>(&self, path: String) -> Vec<T> {
        let url = self.url(&path);
        match self.try_get_list(&url).await {
            Ok(items) => {
                debug!(url = %url, count = items.len(), "Fetched");
                items
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed, treating as empty");
                Vec::new()
            }
        }
    }

    async fn try_get_list<T: DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Http(format!("status {}", status)));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TaskSource for BasecampClient {
    async fn list_projects(&self) -> Vec<Project> {
        self.get_list(expand(&self.endpoints.projects, None, None, None))
            .await
    }

    async fn list_task_lists(&self, project_id: u64) -> Vec<TaskList> {
        self.get_list(expand(&self.endpoints.task_lists, Some(project_id), None, None))
            .await
    }

    async fn list_tasks(&self, project_id: u64, task_list_id: u64) -> Vec<Task> {
        self.get_list(expand(
            &self.endpoints.tasks,
            Some(project_id),
            Some(task_list_id),
            None,
        ))
        .await
    }

    async fn list_comments(&self, project_id: u64, task_id: u64) -> Vec<Comment> {
        self.get_list(expand(&self.endpoints.comments, Some(project_id), None, Some(task_id)))
            .await
    }
}
