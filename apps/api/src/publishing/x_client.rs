use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::llm_client::prompts::MAX_STATEMENT_CHARS;
use crate::publishing::oauth::{authorization_header, OAuthCredentials, OAuthNonce};
use crate::publishing::{PublishError, PublishReceipt, Publisher};

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct CreatePost<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: CreatedPost,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: String,
}

/// Error bodies come in two shapes: problem-details (`detail`/`title`) and
/// the older `errors: [{message}]` list.
#[derive(Debug, Deserialize)]
struct ApiProblem {
    detail: Option<String>,
    title: Option<String>,
    #[serde(default)]
    errors: Vec<ApiProblemItem>,
}

#[derive(Debug, Deserialize)]
struct ApiProblemItem {
    message: String,
}

impl ApiProblem {
    fn message(self) -> Option<String> {
        self.detail
            .or_else(|| self.errors.into_iter().next().map(|e| e.message))
            .or(self.title)
    }
}

/// Posts statements to X on behalf of the configured account (OAuth 1.0a user context).
#[derive(Clone)]
pub struct XClient {
    client: Client,
    credentials: OAuthCredentials,
}

impl XClient {
    pub fn new(credentials: OAuthCredentials) -> Result<Self, PublishError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            credentials,
        })
    }
}

/// Rejects text the platform would refuse before spending a request on it.
pub fn check_postable(text: &str) -> Result<(), PublishError> {
    if text.trim().is_empty() {
        return Err(PublishError::Empty);
    }
    let chars = text.chars().count();
    if chars > MAX_STATEMENT_CHARS {
        return Err(PublishError::TooLong {
            chars,
            limit: MAX_STATEMENT_CHARS,
        });
    }
    Ok(())
}

#[async_trait]
impl Publisher for XClient {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError> {
        check_postable(text)?;

        let header = authorization_header(
            "POST",
            TWEETS_URL,
            &self.credentials,
            &OAuthNonce::generate(),
        )?;

        let response = self
            .client
            .post(TWEETS_URL)
            .header(reqwest::header::AUTHORIZATION, header)
            .json(&CreatePost { text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiProblem>(&body)
                .ok()
                .and_then(ApiProblem::message)
                .unwrap_or(body);
            error!("X API rejected post ({status}): {message}");
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatePostResponse = response.json().await?;
        info!("Posted to X: id={}", created.data.id);

        Ok(PublishReceipt {
            post_id: Some(created.data.id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_postable_limits() {
        assert!(check_postable("Small kindnesses compound.").is_ok());
        assert!(matches!(check_postable("   "), Err(PublishError::Empty)));

        let exactly = "a".repeat(MAX_STATEMENT_CHARS);
        assert!(check_postable(&exactly).is_ok());

        let over = "a".repeat(MAX_STATEMENT_CHARS + 1);
        assert!(matches!(
            check_postable(&over),
            Err(PublishError::TooLong { chars, .. }) if chars == MAX_STATEMENT_CHARS + 1
        ));
    }

    #[test]
    fn test_check_postable_counts_chars_not_bytes() {
        let accented = "é".repeat(MAX_STATEMENT_CHARS);
        assert!(check_postable(&accented).is_ok());
    }

    #[test]
    fn test_problem_message_prefers_detail() {
        let problem: ApiProblem = serde_json::from_str(
            r#"{"title":"Forbidden","detail":"You are not allowed to create a Tweet with duplicate content.","status":403}"#,
        )
        .unwrap();
        assert_eq!(
            problem.message().as_deref(),
            Some("You are not allowed to create a Tweet with duplicate content.")
        );

        let legacy: ApiProblem =
            serde_json::from_str(r#"{"errors":[{"message":"Unauthorized"}]}"#).unwrap();
        assert_eq!(legacy.message().as_deref(), Some("Unauthorized"));
    }
}
