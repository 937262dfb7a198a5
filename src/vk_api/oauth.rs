//! Обмен кода авторизации на токен пользователя.

use crate::credentials::UserActor;
use crate::domain::UserId;
use crate::error::ApiError;
use crate::utils::PrintErrorChain;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

const METHOD: &str = "oauth.access_token";

#[derive(Clone, Copy, Debug, Serialize)]
pub struct CodeExchange<'a> {
    pub client_id: i64,
    pub client_secret: &'a str,
    pub redirect_uri: &'a str,
    pub code: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Token { access_token: String, user_id: i64 },
    Error {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    },
}

pub async fn exchange_code(
    http: &reqwest::Client,
    oauth_server: &Url,
    exchange: &CodeExchange<'_>,
) -> Result<UserActor, ApiError> {
    let url = oauth_server
        .join("access_token")
        .map_err(|err| ApiError::protocol(METHOD, format!("building url: {err}")))?;

    let response = http
        .get(url)
        .query(exchange)
        .send()
        .await
        .map_err(|err| ApiError::transient(METHOD, PrintErrorChain(&err).to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ApiError::transient(METHOD, PrintErrorChain(&err).to_string()))?;

    if status.is_server_error() {
        return Err(ApiError::transient(METHOD, format!("http status {status}")));
    }

    parse_token(&body)
}

fn parse_token(body: &str) -> Result<UserActor, ApiError> {
    let response = serde_json::from_str::<TokenResponse>(body)
        .map_err(|err| ApiError::protocol(METHOD, format!("{err} in '{body}'")))?;

    match response {
        TokenResponse::Token {
            access_token,
            user_id,
        } => Ok(UserActor {
            user_id: UserId(user_id),
            access_token: SecretString::from(access_token),
        }),
        TokenResponse::Error {
            error,
            error_description,
        } => Err(ApiError::Auth {
            method: METHOD.to_owned(),
            message: match error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            },
        }),
    }
}
