use serde::{Deserialize, Serialize};

use super::error::{check, ApiError};

#[derive(Clone)]
pub struct TodoClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoResource {
    pub id: i32,
    pub title: String,
    pub completed: bool,
    pub order: i32,
    pub tags: Vec<String>,
    pub url: String,
}

#[derive(Debug, Default, Serialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Serialize)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct CreatedTodo {
    id: i32,
}

impl TodoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn list(&self, restrict_to_tag: Option<&str>) -> Result<Vec<TodoResource>, ApiError> {
        let mut request = self.http.get(format!("{}/todos/", self.base_url));
        if let Some(tag) = restrict_to_tag {
            request = request.query(&[("tag", tag)]);
        }
        let resp = check(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn get(&self, id: i32) -> Result<TodoResource, ApiError> {
        let request = self.http.get(format!("{}/todos/{}", self.base_url, id));
        let resp = check(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn create(&self, todo: &NewTodo) -> Result<i32, ApiError> {
        let request = self.http.post(format!("{}/todos/", self.base_url)).json(todo);
        let resp = check(request.send().await?).await?;
        let created: CreatedTodo = resp.json().await?;
        Ok(created.id)
    }

    pub async fn update(&self, id: i32, patch: &TodoPatch) -> Result<(), ApiError> {
        let request = self
            .http
            .patch(format!("{}/todos/{}", self.base_url, id))
            .json(patch);
        check(request.send().await?).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let request = self.http.delete(format!("{}/todos/{}", self.base_url, id));
        check(request.send().await?).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), ApiError> {
        let request = self.http.delete(format!("{}/todos/", self.base_url));
        check(request.send().await?).await?;
        Ok(())
    }
}
