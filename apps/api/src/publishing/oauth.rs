//! OAuth 1.0a request signing (HMAC-SHA1, RFC 5849) for user-context posting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

use crate::publishing::PublishError;

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 32;

/// Consumer (app) and access-token credentials for one account.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

/// Per-request values; random in production, fixed in tests.
#[derive(Debug, Clone)]
pub struct OAuthNonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuthNonce {
    pub fn generate() -> Self {
        let nonce = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect();
        Self {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// RFC 3986 percent-encoding (unreserved characters pass through).
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Computes the `oauth_signature` for a request.
/// `request_params` are query/form parameters; JSON bodies are not signed.
pub fn signature(
    method: &str,
    url: &str,
    request_params: &[(&str, &str)],
    credentials: &OAuthCredentials,
    nonce: &OAuthNonce,
) -> Result<String, PublishError> {
    let timestamp = nonce.timestamp.to_string();
    let mut params: Vec<(String, String)> = oauth_params(credentials, nonce, &timestamp)
        .into_iter()
        .chain(request_params.iter().copied())
        .map(|(k, v)| (encode(k), encode(v)))
        .collect();
    params.sort();

    let param_string = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.access_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| PublishError::Signing(e.to_string()))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Builds the full `Authorization: OAuth ...` header value.
pub fn authorization_header(
    method: &str,
    url: &str,
    credentials: &OAuthCredentials,
    nonce: &OAuthNonce,
) -> Result<String, PublishError> {
    let signature = signature(method, url, &[], credentials, nonce)?;
    let timestamp = nonce.timestamp.to_string();

    let mut fields = oauth_params(credentials, nonce, &timestamp);
    fields.push(("oauth_signature", signature.as_str()));
    fields.sort();

    let joined = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {joined}"))
}

fn oauth_params<'a>(
    credentials: &'a OAuthCredentials,
    nonce: &'a OAuthNonce,
    timestamp: &'a str,
) -> Vec<(&'a str, &'a str)> {
    vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ]
}
