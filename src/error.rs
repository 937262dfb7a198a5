use std::{io, path::PathBuf};
use thiserror::Error;

/// Ошибка загрузки конфигурации. Всегда фатальна: сервис не стартует.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("deserializing config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid values in config '{path}':\n{report}")]
    Invalid { path: PathBuf, report: String },

    #[error("missing required field '{field}'{hint}")]
    MissingField { field: &'static str, hint: String },

    #[error("malformed field '{field}': {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField {
            field,
            hint: String::new(),
        }
    }
}

/// Ошибка обращения к API ВКонтакте.
///
/// Разделение на виды определяет политику повторов: повторяются только
/// [`ApiError::Transient`], остальные сразу возвращаются вызывающему.
#[derive(Clone, Debug, Error)]
pub enum ApiError {
    /// Токен недействителен, истёк или приложение не авторизовано.
    #[error("authorization failed in '{method}': {message}")]
    Auth { method: String, message: String },

    /// Запрос отклонён локальной проверкой или самим ВК.
    #[error("'{method}' rejected{}: {message}", .code.map(|c| format!(" with code {c}")).unwrap_or_default())]
    Validation {
        method: String,
        code: Option<i64>,
        message: String,
    },

    /// Сетевая ошибка, таймаут или временная ошибка сервера.
    #[error("transient failure in '{method}': {message}")]
    Transient { method: String, message: String },

    /// ВК требует ввести капчу, а решить её некому.
    #[error("captcha required by '{method}', image: {img}")]
    Captcha {
        method: String,
        sid: String,
        img: String,
    },

    /// Ответ не удалось разобрать.
    #[error("unexpected response from '{method}': {message}")]
    Protocol { method: String, message: String },
}

impl ApiError {
    pub fn validation(method: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            method: method.to_owned(),
            code: None,
            message: message.into(),
        }
    }

    pub fn transient(method: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            method: method.to_owned(),
            message: message.into(),
        }
    }

    pub fn protocol(method: &str, message: impl Into<String>) -> Self {
        Self::Protocol {
            method: method.to_owned(),
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    pub fn method(&self) -> &str {
        match self {
            Self::Auth { method, .. }
            | Self::Validation { method, .. }
            | Self::Transient { method, .. }
            | Self::Captcha { method, .. }
            | Self::Protocol { method, .. } => method,
        }
    }
}
