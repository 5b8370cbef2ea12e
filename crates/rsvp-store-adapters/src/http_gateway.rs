use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use rsvp_contract::wire::{
    exists_from_value, family_status_from_value, invite_reply_from_value, profile_from_value,
    remote_family_from_value, username_match_from_value,
};
use rsvp_contract::{
    Credential, FamilyMember, FamilyState, GatewayError, GuestProfile, InviteReply, LinkStatus,
    ProfileGateway, RemoteFamily, Username, UsernameMatch, WireError,
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Serialize)]
struct UsernameBody<'a> {
    username: &'a str,
}

/// Profile gateway talking to the wedding backend over HTTP.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn request(&self, method: Method, path: &str, credential: &Credential) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(credential.header_name(), credential.value())
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        request.send().await.map_err(|e| {
            tracing::debug!(error = %e, "profile gateway request failed");
            GatewayError::Transport(e.to_string())
        })
    }

    /// Fetch a document that may legitimately be absent (404).
    async fn get_optional(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<Option<Value>, GatewayError> {
        let response = self.send(self.request(Method::GET, path, credential)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    async fn get_json(&self, path: &str, credential: &Credential) -> Result<Value, GatewayError> {
        let response = self.send(self.request(Method::GET, path, credential)).await?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        credential: &Credential,
        body: &B,
    ) -> Result<Value, GatewayError> {
        let response = self
            .send(self.request(Method::POST, path, credential).json(body))
            .await?;
        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, GatewayError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "profile gateway rejected request");
        return Err(GatewayError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Pull a human-readable message out of a structured error body:
/// `detail` (string or validation list), `error`, or `message`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let detail = match value.get("detail") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    detail
        .or_else(|| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty())
}

/// A refusal inside a successful response is surfaced like a rejection so
/// the server's explanation reaches the guest.
fn decode(e: WireError) -> GatewayError {
    match e {
        WireError::Refused { reason } => GatewayError::Rejected {
            status: 200,
            message: reason,
        },
        other => GatewayError::Decode(other.to_string()),
    }
}

#[async_trait]
impl ProfileGateway for HttpGateway {
    async fn get_profile(
        &self,
        credential: &Credential,
    ) -> Result<Option<GuestProfile>, GatewayError> {
        match self.get_optional("/api/profile", credential).await? {
            Some(value) => profile_from_value(value).map_err(decode),
            None => Ok(None),
        }
    }

    async fn save_profile(
        &self,
        credential: &Credential,
        profile: &GuestProfile,
    ) -> Result<(), GatewayError> {
        self.post_json("/api/profile", credential, profile).await?;
        Ok(())
    }

    async fn profile_exists(&self, credential: &Credential) -> Result<bool, GatewayError> {
        let value = self.get_json("/api/profile/exists", credential).await?;
        exists_from_value(value).map_err(decode)
    }

    async fn mark_welcome_seen(&self, credential: &Credential) -> Result<(), GatewayError> {
        self.post_json("/api/profile/welcome-seen", credential, &Value::Null)
            .await?;
        Ok(())
    }

    async fn load_family(
        &self,
        credential: &Credential,
    ) -> Result<Option<RemoteFamily>, GatewayError> {
        match self.get_optional("/api/family", credential).await? {
            Some(value) => remote_family_from_value(value).map_err(decode),
            None => Ok(None),
        }
    }

    async fn save_family(
        &self,
        credential: &Credential,
        family: &FamilyState,
    ) -> Result<(), GatewayError> {
        self.post_json("/api/family", credential, family).await?;
        Ok(())
    }

    async fn check_username(
        &self,
        credential: &Credential,
        username: &Username,
    ) -> Result<UsernameMatch, GatewayError> {
        let body = UsernameBody {
            username: username.as_str(),
        };
        let value = self
            .post_json("/api/family/check-username", credential, &body)
            .await?;
        username_match_from_value(value).map_err(decode)
    }

    async fn send_invite(
        &self,
        credential: &Credential,
        username: &Username,
    ) -> Result<InviteReply, GatewayError> {
        let body = UsernameBody {
            username: username.as_str(),
        };
        let value = self
            .post_json("/api/family/invite", credential, &body)
            .await?;
        invite_reply_from_value(value).map_err(decode)
    }

    async fn family_status(
        &self,
        credential: &Credential,
    ) -> Result<(LinkStatus, Vec<FamilyMember>), GatewayError> {
        let value = self.get_json("/api/family/status", credential).await?;
        family_status_from_value(value).map_err(decode)
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, error_message};
    use rsvp_contract::{GatewayError, WireError};

    #[test]
    fn extracts_structured_error_messages() {
        assert_eq!(
            error_message(r#"{"detail":"Invalid init data"}"#).as_deref(),
            Some("Invalid init data")
        );
        assert_eq!(
            error_message(r#"{"detail":[{"loc":["body","phone"],"msg":"bad phone"}]}"#).as_deref(),
            Some("bad phone")
        );
        assert_eq!(
            error_message(r#"{"error":"not allowed"}"#).as_deref(),
            Some("not allowed")
        );
        assert_eq!(
            error_message(r#"{"message":"try later"}"#).as_deref(),
            Some("try later")
        );
        assert_eq!(error_message("Internal Server Error"), None);
        assert_eq!(error_message(r#"{"detail":""}"#), None);
    }

    #[test]
    fn refusals_keep_the_server_reason() {
        let err = decode(WireError::Refused {
            reason: Some("Too many invites today".into()),
        });
        assert_eq!(err.user_message(), Some("Too many invites today"));

        let err = decode(WireError::Refused { reason: None });
        assert!(matches!(err, GatewayError::Rejected { .. }));
        assert_eq!(err.user_message(), None);

        assert!(matches!(decode(WireError::Empty), GatewayError::Decode(_)));
    }
}
