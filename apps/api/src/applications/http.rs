use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{ApiError, ApplicationApi};
use crate::models::application::{Application, ApplicationPatch, ApplicationStatus, NewApplication};
use crate::session::Session;

/// `ApplicationApi` over this crate's REST surface, authenticated with the
/// bearer token of the injected session.
#[derive(Clone)]
pub struct HttpApplications {
    client: Client,
    base_url: String,
    session: Session,
}

#[derive(Debug, Serialize)]
struct MoveBody {
    status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpApplications {
    pub fn new(client: Client, base_url: impl Into<String>, session: Session) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/applications{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.session.access_token().ok_or(ApiError::Unauthenticated)?;
        Ok(self.client.request(method, self.url(path)).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder, id: Option<Uuid>) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        debug!("Applications API returned {status}");
        match (status, id) {
            (StatusCode::UNAUTHORIZED, _) => Err(ApiError::Unauthenticated),
            (StatusCode::NOT_FOUND, Some(id)) => Err(ApiError::NotFound(id)),
            _ => {
                let body = response.text().await.unwrap_or_default();
                // Prefer the structured message when the server sent one
                let message = serde_json::from_str::<ErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                Err(ApiError::Remote {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl ApplicationApi for HttpApplications {
    async fn list(&self) -> Result<Vec<Application>, ApiError> {
        let request = self.request(Method::GET, "")?;
        Ok(self.send(request, None).await?.json().await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>, ApiError> {
        let request = self.request(Method::GET, &format!("/{id}"))?;
        match self.send(request, Some(id)).await {
            Ok(response) => Ok(Some(response.json().await?)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, fields: NewApplication) -> Result<Application, ApiError> {
        let request = self.request(Method::POST, "")?.json(&fields);
        Ok(self.send(request, None).await?.json().await?)
    }

    async fn update(&self, id: Uuid, fields: ApplicationPatch) -> Result<Application, ApiError> {
        let request = self.request(Method::PATCH, &format!("/{id}"))?.json(&fields);
        Ok(self.send(request, Some(id)).await?.json().await?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, &format!("/{id}"))?;
        self.send(request, Some(id)).await?;
        Ok(())
    }

    async fn move_application(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Application, ApiError> {
        let request = self
            .request(Method::POST, &format!("/{id}/move"))?
            .json(&MoveBody { status });
        Ok(self.send(request, Some(id)).await?.json().await?)
    }
}
