use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sends `Authorization: Bearer <token>` with
/// every request, for rosters hosted behind a token-protected share link.
pub struct BearerToken<C> {
    pub inner: C,
    pub token: String,
}

impl<C> BearerToken<C> {
    pub fn new(inner: C, token: String) -> Self {
        Self { inner, token }
    }

    /// Inserts the authorization header into `req`.
    pub fn authorize(&self, req: &mut reqwest::Request) -> Result<()> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .context("Bearer token contains characters not allowed in a header")?;
        value.set_sensitive(true);
        req.headers_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for BearerToken<C> {
    async fn execute(&self, mut req: reqwest::Request) -> Result<reqwest::Response> {
        self.authorize(&mut req)?;
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;

    fn request() -> reqwest::Request {
        reqwest::Request::new(
            reqwest::Method::GET,
            "https://example.org/roster.csv".parse().unwrap(),
        )
    }

    #[test]
    fn test_authorize_sets_header() {
        let client = BearerToken::new(BasicClient::new(), "s3cret".into());
        let mut req = request();
        client.authorize(&mut req).unwrap();

        let header = req.headers().get(AUTHORIZATION).unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer s3cret");
        assert!(header.is_sensitive());
    }

    #[test]
    fn test_authorize_rejects_newlines() {
        let client = BearerToken::new(BasicClient::new(), "bad\ntoken".into());
        let mut req = request();
        assert!(client.authorize(&mut req).is_err());
    }
}
