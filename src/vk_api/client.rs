use super::response;
use crate::captcha::CaptchaSolver;
use crate::config;
use crate::error::ApiError;
use crate::utils::PrintErrorChain;
use chrono::Utc;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use tokio::fs;
use url::Url;

/// Сколько раз подряд можно ввести капчу для одного запроса.
const MAX_CAPTCHA_ATTEMPTS: usize = 3;

/// Клиент для работы с API ВКонтакте от имени пользователя.
pub struct Client {
    client: reqwest::Client,
    server: Url,
    token: SecretString,
    api_version: String,
    language: String,
    debug: Option<ClientDebug>,
    captcha: Option<Box<dyn CaptchaSolver>>,
}

/// Параметры отладки клиента.
pub struct ClientDebug {
    /// Флаг сохранения ответов в `responses_dir_path`.
    pub save_responses: bool,

    /// Путь до директории, куда будут сохраняться ответы от ВК,
    /// если установлен флаг `save_responses`.
    ///
    /// Формат имени файла: `vk-response-method-timestamp.json`.
    pub responses_dir_path: PathBuf,
}

impl From<&config::VkDebug> for ClientDebug {
    fn from(debug: &config::VkDebug) -> Self {
        Self {
            save_responses: debug.save_responses,
            responses_dir_path: debug.responses_dir_path.clone(),
        }
    }
}

#[derive(Serialize)]
struct MethodParams<'a, P> {
    #[serde(rename = "v")]
    pub api_version: &'a str,

    #[serde(rename = "lang")]
    pub language: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_sid: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_key: Option<&'a str>,

    #[serde(flatten)]
    pub method_params: P,
}

struct SolvedCaptcha {
    sid: String,
    key: String,
}

impl Client {
    pub fn new(client: reqwest::Client, config: &config::Vk, token: SecretString) -> Self {
        Self {
            client,
            server: config.server.clone(),
            token,
            api_version: config.api_version.clone(),
            language: config.language.clone(),
            debug: config.debug.as_ref().map(ClientDebug::from),
            captcha: None,
        }
    }

    pub fn with_captcha_solver(mut self, solver: Box<dyn CaptchaSolver>) -> Self {
        self.captcha = Some(solver);
        self
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Вызывает метод API. Если ВК просит капчу и есть кому её решить,
    /// повторяет запрос с введённым кодом.
    pub(super) async fn call<P, R>(&self, method: &str, params: P) -> Result<R, ApiError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let mut captcha = None;
        let mut attempts = 0;

        loop {
            let (sid, img) = match self.call_once(method, &params, captcha.as_ref()).await {
                Err(ApiError::Captcha { sid, img, .. }) => (sid, img),
                other => return other,
            };

            let unsolved = |sid, img| ApiError::Captcha {
                method: method.to_owned(),
                sid,
                img,
            };

            let solver = match &self.captcha {
                Some(solver) if attempts < MAX_CAPTCHA_ATTEMPTS => solver,
                _ => return Err(unsolved(sid, img)),
            };
            attempts += 1;

            let Some(key) = solver.solve(&img).await else {
                return Err(unsolved(sid, img));
            };

            log::info!("Repeating '{method}' with captcha code, attempt {attempts}");

            captcha = Some(SolvedCaptcha { sid, key });
        }
    }

    async fn call_once<P, R>(
        &self,
        method: &str,
        params: &P,
        captcha: Option<&SolvedCaptcha>,
    ) -> Result<R, ApiError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = serde_urlencoded::to_string(MethodParams {
            api_version: &self.api_version,
            language: &self.language,
            captcha_sid: captcha.map(|c| c.sid.as_str()),
            captcha_key: captcha.map(|c| c.key.as_str()),
            method_params: params,
        })
        .map_err(|err| ApiError::protocol(method, format!("serializing params: {err}")))?;

        let url = self
            .server
            .join(&format!("method/{method}"))
            .map_err(|err| ApiError::protocol(method, format!("building url: {err}")))?;

        log::debug!("Calling '{method}'");

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.expose_secret())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(params)
            .send()
            .await
            .map_err(|err| ApiError::transient(method, PrintErrorChain(&err).to_string()))?;

        let status = response.status();

        let response = response
            .text()
            .await
            .map_err(|err| ApiError::transient(method, PrintErrorChain(&err).to_string()))?;

        log::trace!("Response from '{method}': {response}");

        self.dump_response(method, &response).await;

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::transient(method, format!("http status {status}")));
        }

        if !status.is_success() {
            return Err(ApiError::protocol(method, format!("http status {status}")));
        }

        response::parse(method, &response)
    }

    async fn dump_response(&self, method: &str, response: &str) {
        let Some(debug) = &self.debug else {
            return;
        };

        if !debug.save_responses {
            return;
        }

        let dump_path = debug.responses_dir_path.join(format!(
            "vk-response-{method}-{timestamp}.json",
            timestamp = Utc::now().timestamp_millis()
        ));

        match fs::write(&dump_path, response).await {
            Ok(()) => log::debug!(
                "Successfully save vk response into file '{path}'",
                path = dump_path.display(),
            ),
            Err(err) => log::error!(
                "Failed to save vk response into file '{path}': {err}",
                path = dump_path.display(),
                err = err,
            ),
        }
    }
}
