use crate::config::{Auth, AuthType};
use crate::domain::UserId;
use crate::error::{ApiError, ConfigError};
use crate::vk_api::oauth;
use secrecy::{ExposeSecret, SecretString};
use std::{env, fmt};
use url::Url;

/// Права, которые запрашиваются при авторизации по коду: всё, кроме `messages`.
const SCOPE: &str = "268431359";

/// Учётные данные, загруженные при старте. Нигде не сохраняются.
pub enum Credentials {
    Token {
        user_id: UserId,
        access_token: SecretString,
    },
    AuthorizationCode {
        app_id: i64,
        secret_key: SecretString,
        redirect_uri: String,
        code: SecretString,
    },
}

/// Пользователь, от имени которого выполняются запросы.
pub struct UserActor {
    pub user_id: UserId,
    pub access_token: SecretString,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token { user_id, .. } => f
                .debug_struct("Token")
                .field("user_id", user_id)
                .finish_non_exhaustive(),
            Self::AuthorizationCode {
                app_id,
                redirect_uri,
                ..
            } => f
                .debug_struct("AuthorizationCode")
                .field("app_id", app_id)
                .field("redirect_uri", redirect_uri)
                .finish_non_exhaustive(),
        }
    }
}

impl fmt::Debug for UserActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserActor")
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Собирает учётные данные из конфига и переменных окружения `VK_POSTER_*`.
    ///
    /// Непустая переменная окружения важнее значения из файла.
    pub fn load(auth: &Auth, oauth_server: &Url) -> Result<Self, ConfigError> {
        Self::load_with(auth, oauth_server, |name| env::var(name).ok())
    }

    fn load_with(
        auth: &Auth,
        oauth_server: &Url,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |var: &str, file: Option<String>| {
            env(var)
                .filter(|value| !value.trim().is_empty())
                .or(file)
                .filter(|value| !value.trim().is_empty())
        };

        let number = |var: &str, field: &'static str, file: Option<i64>| {
            match env(var).filter(|value| !value.trim().is_empty()) {
                Some(raw) => raw
                    .trim()
                    .parse::<i64>()
                    .map(Some)
                    .map_err(|err| ConfigError::Malformed {
                        field,
                        reason: format!("{var}='{raw}': {err}"),
                    }),
                None => Ok(file),
            }
        };

        match auth.auth_type {
            AuthType::Token => {
                let user_id = number("VK_POSTER_USER_ID", "auth.user_id", auth.user_id)?
                    .ok_or_else(|| ConfigError::missing("auth.user_id"))?;

                let access_token =
                    lookup("VK_POSTER_ACCESS_TOKEN", auth.access_token.clone())
                        .ok_or_else(|| ConfigError::missing("auth.access_token"))?;

                Ok(Self::Token {
                    user_id: UserId(user_id),
                    access_token: SecretString::from(access_token),
                })
            }
            AuthType::CodeFlow => {
                let app_id = number("VK_POSTER_APP_ID", "auth.app_id", auth.app_id)?
                    .ok_or_else(|| ConfigError::missing("auth.app_id"))?;

                let secret_key = lookup("VK_POSTER_SECRET_KEY", auth.secret_key.clone())
                    .ok_or_else(|| ConfigError::missing("auth.secret_key"))?;

                if auth.redirect_uri.trim().is_empty() {
                    return Err(ConfigError::missing("auth.redirect_uri"));
                }

                let code = lookup(
                    "VK_POSTER_AUTHORIZATION_CODE",
                    auth.authorization_code.clone(),
                )
                .ok_or_else(|| ConfigError::MissingField {
                    field: "auth.authorization_code",
                    hint: format!(
                        ", request it at {url}",
                        url = authorize_url(oauth_server, app_id, &auth.redirect_uri)
                    ),
                })?;

                Ok(Self::AuthorizationCode {
                    app_id,
                    secret_key: SecretString::from(secret_key),
                    redirect_uri: auth.redirect_uri.clone(),
                    code: SecretString::from(code),
                })
            }
        }
    }

    /// Превращает учётные данные в пользователя API.
    ///
    /// Для кода авторизации выполняется обмен на токен, остальное не требует сети.
    pub async fn authorize(
        self,
        http: &reqwest::Client,
        oauth_server: &Url,
    ) -> Result<UserActor, ApiError> {
        match self {
            Self::Token {
                user_id,
                access_token,
            } => {
                log::info!("Authorizing by access token of user {}", user_id.0);

                Ok(UserActor {
                    user_id,
                    access_token,
                })
            }
            Self::AuthorizationCode {
                app_id,
                secret_key,
                redirect_uri,
                code,
            } => {
                log::info!("Authorizing by code flow for application {app_id}");

                oauth::exchange_code(
                    http,
                    oauth_server,
                    &oauth::CodeExchange {
                        client_id: app_id,
                        client_secret: secret_key.expose_secret(),
                        redirect_uri: &redirect_uri,
                        code: code.expose_secret(),
                    },
                )
                .await
            }
        }
    }
}

fn authorize_url(oauth_server: &Url, app_id: i64, redirect_uri: &str) -> String {
    let app_id = app_id.to_string();

    oauth_server
        .join("authorize")
        .and_then(|base| {
            Url::parse_with_params(
                base.as_str(),
                &[
                    ("client_id", app_id.as_str()),
                    ("redirect_uri", redirect_uri),
                    ("display", "page"),
                    ("scope", SCOPE),
                    ("response_type", "code"),
                ],
            )
        })
        .map(String::from)
        .unwrap_or_else(|_| oauth_server.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn oauth_server() -> Url {
        Url::parse("https://oauth.vk.com/").unwrap()
    }

    fn token_auth(user_id: Option<i64>, access_token: Option<&str>) -> Auth {
        Auth {
            auth_type: AuthType::Token,
            app_id: None,
            secret_key: None,
            redirect_uri: "https://oauth.vk.com/blank.html".to_owned(),
            authorization_code: None,
            user_id,
            access_token: access_token.map(str::to_owned),
        }
    }

    fn load(auth: &Auth, env: &[(&str, &str)]) -> Result<Credentials, ConfigError> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Credentials::load_with(auth, &oauth_server(), |name| env.get(name).cloned())
    }

    fn missing_field(result: Result<Credentials, ConfigError>) -> &'static str {
        match result {
            Err(ConfigError::MissingField { field, .. }) => field,
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn loads_token_from_file() {
        let credentials = load(&token_auth(Some(7), Some("abc")), &[]).unwrap();

        let Credentials::Token {
            user_id,
            access_token,
        } = credentials
        else {
            panic!("expected token credentials");
        };
        assert_eq!(user_id, UserId(7));
        assert_eq!(access_token.expose_secret(), "abc");
    }

    #[test]
    fn missing_token_is_config_error() {
        assert_eq!(
            missing_field(load(&token_auth(Some(7), None), &[])),
            "auth.access_token"
        );
        assert_eq!(
            missing_field(load(&token_auth(None, Some("abc")), &[])),
            "auth.user_id"
        );
    }

    #[test]
    fn blank_token_is_config_error() {
        assert_eq!(
            missing_field(load(&token_auth(Some(7), Some("  ")), &[])),
            "auth.access_token"
        );
    }

    #[test]
    fn environment_overrides_file() {
        let credentials = load(
            &token_auth(None, Some("from-file")),
            &[
                ("VK_POSTER_USER_ID", "99"),
                ("VK_POSTER_ACCESS_TOKEN", "from-env"),
            ],
        )
        .unwrap();

        let Credentials::Token {
            user_id,
            access_token,
        } = credentials
        else {
            panic!("expected token credentials");
        };
        assert_eq!(user_id, UserId(99));
        assert_eq!(access_token.expose_secret(), "from-env");
    }

    #[test]
    fn empty_environment_does_not_override() {
        let credentials = load(
            &token_auth(Some(1), Some("from-file")),
            &[("VK_POSTER_ACCESS_TOKEN", "")],
        )
        .unwrap();

        let Credentials::Token { access_token, .. } = credentials else {
            panic!("expected token credentials");
        };
        assert_eq!(access_token.expose_secret(), "from-file");
    }

    #[test]
    fn malformed_user_id_in_environment() {
        let result = load(&token_auth(None, Some("abc")), &[("VK_POSTER_USER_ID", "me")]);

        assert!(matches!(
            result,
            Err(ConfigError::Malformed {
                field: "auth.user_id",
                ..
            })
        ));
    }

    #[test]
    fn code_flow_requires_app_and_secret() {
        let mut auth = token_auth(None, None);
        auth.auth_type = AuthType::CodeFlow;

        assert_eq!(missing_field(load(&auth, &[])), "auth.app_id");

        auth.app_id = Some(51);
        assert_eq!(missing_field(load(&auth, &[])), "auth.secret_key");
    }

    #[test]
    fn missing_code_points_to_authorize_url() {
        let mut auth = token_auth(None, None);
        auth.auth_type = AuthType::CodeFlow;
        auth.app_id = Some(51);
        auth.secret_key = Some("secret".to_owned());

        match load(&auth, &[]) {
            Err(error @ ConfigError::MissingField { .. }) => {
                let message = error.to_string();
                assert!(message.contains("auth.authorization_code"));
                assert!(message.contains("https://oauth.vk.com/authorize?client_id=51"));
                assert!(message.contains("response_type=code"));
            }
            other => panic!("expected missing code, got {other:?}"),
        }
    }

    #[test]
    fn loads_code_flow() {
        let mut auth = token_auth(None, None);
        auth.auth_type = AuthType::CodeFlow;
        auth.app_id = Some(51);
        auth.secret_key = Some("secret".to_owned());

        let credentials = load(&auth, &[("VK_POSTER_AUTHORIZATION_CODE", "c0de")]).unwrap();

        assert!(matches!(
            credentials,
            Credentials::AuthorizationCode { app_id: 51, .. }
        ));
        assert!(!format!("{credentials:?}").contains("secret"));
    }

    #[test]
    #[serial_test::serial]
    fn load_reads_process_environment() {
        env::set_var("VK_POSTER_ACCESS_TOKEN", "process-env");
        let result = Credentials::load(&token_auth(Some(1), None), &oauth_server());
        env::remove_var("VK_POSTER_ACCESS_TOKEN");

        let Ok(Credentials::Token { access_token, .. }) = result else {
            panic!("expected token credentials");
        };
        assert_eq!(access_token.expose_secret(), "process-env");
    }

    #[tokio::test]
    async fn token_authorization_needs_no_network() {
        let credentials = load(&token_auth(Some(7), Some("abc")), &[]).unwrap();

        let actor = credentials
            .authorize(&reqwest::Client::new(), &oauth_server())
            .await
            .unwrap();

        assert_eq!(actor.user_id, UserId(7));
    }
}
