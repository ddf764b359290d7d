use serde::{Deserialize, Serialize};

use super::error::{check, ApiError};

#[derive(Clone)]
pub struct TagClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagResource {
    pub id: i32,
    pub name: String,
}

#[derive(Serialize)]
struct SaveTag<'a> {
    name: &'a str,
}

impl TagClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn list(&self) -> Result<Vec<String>, ApiError> {
        let request = self.http.get(format!("{}/tags/", self.base_url));
        let resp = check(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn create(&self, name: &str) -> Result<TagResource, ApiError> {
        let request = self
            .http
            .post(format!("{}/tags/", self.base_url))
            .json(&SaveTag { name });
        let resp = check(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    pub async fn rename(&self, name: &str, new_name: &str) -> Result<(), ApiError> {
        let request = self
            .http
            .patch(format!("{}/tags/{}", self.base_url, name))
            .json(&SaveTag { name: new_name });
        check(request.send().await?).await?;
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<(), ApiError> {
        let request = self.http.delete(format!("{}/tags/{}", self.base_url, name));
        check(request.send().await?).await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), ApiError> {
        let request = self.http.delete(format!("{}/tags/", self.base_url));
        check(request.send().await?).await?;
        Ok(())
    }
}
