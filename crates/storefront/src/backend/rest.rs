//! HTTP implementation of [`Backend`].
//!
//! Table operations go to `{url}/rest/v1/{table}` using the operator query
//! syntax (`column=eq.value`); session operations go to `{url}/auth/v1/*`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use haneul_core::{Email, Price, UserId};

use super::{AuthSession, Backend, BackendError, Filter};
use crate::config::BackendConfig;
use crate::models::{Row, User};

/// Maximum characters of an error body kept in logs and errors.
const ERROR_BODY_LIMIT: usize = 300;

/// Client for the hosted backend.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    base: Url,
    api_key: SecretString,
}

/// User object returned by the auth service.
#[derive(Debug, Deserialize)]
struct AuthUserRecord {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    points: i64,
    #[serde(default)]
    coupons: i32,
    #[serde(default)]
    total_orders: i32,
    #[serde(default)]
    total_spent: Price,
}

impl From<AuthUserRecord> for User {
    fn from(record: AuthUserRecord) -> Self {
        let email = record.email.unwrap_or_default();
        let meta = record.user_metadata;
        let name = meta
            .name
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        Self {
            id: record.id,
            name,
            email,
            is_admin: meta.is_admin,
            points: meta.points,
            coupons: meta.coupons,
            total_orders: meta.total_orders,
            total_spent: meta.total_spent,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUserRecord,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

impl RestClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        // Trailing slash so `join` appends instead of replacing the last segment
        let base = Url::parse(&format!("{}/", config.url.trim_end_matches('/')))?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                base,
                api_key: config.api_key.clone(),
            }),
        })
    }

    fn table_url(&self, table: &str, filter: Option<&Filter>) -> Result<Url, BackendError> {
        let mut url = self.inner.base.join(&format!("rest/v1/{table}"))?;
        if let Some(filter) = filter {
            url.query_pairs_mut().extend_pairs(filter.query_pairs());
        }
        Ok(url)
    }

    /// Table calls pass no `bearer` and authenticate with the service key;
    /// auth calls pass the user's access token.
    fn request(&self, method: Method, url: Url, bearer: Option<&str>) -> RequestBuilder {
        let key = self.inner.api_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(bearer.unwrap_or(key))
            .header("Accept", "application/json")
    }

    /// Send a request and decode the JSON body.
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await?;
        let text = Self::checked_body(response).await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    /// Read the body, turning rate limits and error statuses into errors.
    async fn checked_body(response: Response) -> Result<String, BackendError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            let message: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            tracing::error!(status = %status, body = %message, "Backend returned non-success status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

impl Backend for RestClient {
    #[instrument(skip(self, filter), fields(table = T::TABLE))]
    async fn select<T: Row>(&self, filter: &Filter) -> Result<Vec<T>, BackendError> {
        let url = self.table_url(T::TABLE, Some(filter))?;
        debug!(%url, "select");
        self.execute(self.request(Method::GET, url, None)).await
    }

    #[instrument(skip(self, row), fields(table = T::TABLE))]
    async fn insert<T: Row, N: Serialize + Sync>(&self, row: &N) -> Result<T, BackendError> {
        let url = self.table_url(T::TABLE, None)?;
        let request = self
            .request(Method::POST, url, None)
            .header("Prefer", "return=representation")
            .json(row);

        let rows: Vec<T> = self.execute(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("insert into {} returned no row", T::TABLE)))
    }

    #[instrument(skip(self, rows), fields(table = T::TABLE, count = rows.len()))]
    async fn insert_many<T: Row, N: Serialize + Sync>(
        &self,
        rows: &[N],
    ) -> Result<Vec<T>, BackendError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.table_url(T::TABLE, None)?;
        let request = self
            .request(Method::POST, url, None)
            .header("Prefer", "return=representation")
            .json(rows);
        self.execute(request).await
    }

    #[instrument(skip(self, filter, patch), fields(table = T::TABLE))]
    async fn update<T: Row, P: Serialize + Sync>(
        &self,
        filter: &Filter,
        patch: &P,
    ) -> Result<Vec<T>, BackendError> {
        let url = self.table_url(T::TABLE, Some(filter))?;
        let request = self
            .request(Method::PATCH, url, None)
            .header("Prefer", "return=representation")
            .json(patch);
        self.execute(request).await
    }

    #[instrument(skip(self, filter), fields(table = T::TABLE))]
    async fn delete<T: Row>(&self, filter: &Filter) -> Result<usize, BackendError> {
        let url = self.table_url(T::TABLE, Some(filter))?;
        let request = self
            .request(Method::DELETE, url, None)
            .header("Prefer", "return=representation");
        let removed: Vec<serde_json::Value> = self.execute(request).await?;
        Ok(removed.len())
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.inner.base.join("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let request = self.request(Method::POST, url, None).json(&PasswordGrant {
            email: email.as_str(),
            password: password.expose_secret(),
        });

        let token: TokenResponse = match self.execute(request).await {
            Ok(token) => token,
            Err(BackendError::Status { status: 400 | 401, .. }) => {
                return Err(BackendError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user.into(),
        })
    }

    #[instrument(skip_all)]
    async fn session_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        let url = self.inner.base.join("auth/v1/user")?;
        match self
            .execute::<AuthUserRecord>(self.request(Method::GET, url, Some(access_token)))
            .await
        {
            Ok(record) => Ok(Some(record.into())),
            Err(BackendError::Status { status: 401 | 403, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.inner.base.join("auth/v1/logout")?;
        let response = self
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        Self::checked_body(response).await.map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        RestClient::new(&BackendConfig {
            url: "https://backend.test/".to_string(),
            api_key: SecretString::from("k"),
        })
        .unwrap()
    }

    #[test]
    fn test_table_url_with_filter() {
        let url = client()
            .table_url("favorites", Some(&Filter::new().eq("user_id", "u1").limit(1)))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://backend.test/rest/v1/favorites?select=*&user_id=eq.u1&limit=1"
        );
    }

    #[test]
    fn test_table_calls_use_service_key_as_bearer() {
        let client = client();
        let url = client.table_url("cart_items", None).unwrap();

        let table = client.request(Method::GET, url.clone(), None).build().unwrap();
        assert_eq!(table.headers()["apikey"], "k");
        assert_eq!(table.headers()["authorization"], "Bearer k");

        let auth = client.request(Method::GET, url, Some("user-token")).build().unwrap();
        assert_eq!(auth.headers()["apikey"], "k");
        assert_eq!(auth.headers()["authorization"], "Bearer user-token");
    }

    #[test]
    fn test_auth_user_record_conversion() {
        let record: AuthUserRecord = serde_json::from_value(serde_json::json!({
            "id": "00000000-0000-0000-0000-000000000001",
            "email": "minji@example.com",
            "user_metadata": { "is_admin": true, "points": 1200 }
        }))
        .unwrap();

        let user = User::from(record);
        assert_eq!(user.name, "minji");
        assert!(user.is_admin);
        assert_eq!(user.points, 1200);
        assert_eq!(user.coupons, 0);
    }
}
