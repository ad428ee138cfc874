use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests; decorators such as [`crate::fetch::auth::BearerToken`]
/// wrap another client.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> Result<Response>;
}
