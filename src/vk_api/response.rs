use crate::error::ApiError;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};

/// Код ошибки «Требуется ввод кода с картинки».
pub const CAPTCHA_NEEDED: i64 = 14;

/// Конверт ответа ВК: либо `response`, либо `error`.
#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<serde_json::Value>,
    error: Option<VkError>,
}

/// Ошибка из [https://dev.vk.com/ru/reference/errors].
#[derive(Clone, Debug, Deserialize)]
pub struct VkError {
    pub error_code: i64,

    #[serde(default)]
    pub error_msg: String,

    #[serde(default, deserialize_with = "string_or_number")]
    pub captcha_sid: Option<String>,

    #[serde(default)]
    pub captcha_img: Option<String>,
}

impl VkError {
    pub fn into_api_error(self, method: &str) -> ApiError {
        let method = method.to_owned();
        let message = self.error_msg;

        match self.error_code {
            CAPTCHA_NEEDED => match self.captcha_sid {
                Some(sid) => ApiError::Captcha {
                    method,
                    sid,
                    img: self.captcha_img.unwrap_or_default(),
                },
                None => ApiError::Protocol {
                    method,
                    message: format!("captcha required without captcha_sid: {message}"),
                },
            },
            // Неверный токен, требуется валидация пользователя, неверный ключ сообщества
            // или приложения.
            5 | 17 | 27 | 28 => ApiError::Auth { method, message },
            // Неизвестная ошибка, слишком много запросов в секунду, внутренняя ошибка сервера.
            1 | 6 | 10 => ApiError::Transient { method, message },
            code => ApiError::Validation {
                method,
                code: Some(code),
                message,
            },
        }
    }
}

/// Разбирает ответ метода `method`.
pub fn parse<R: DeserializeOwned>(method: &str, raw: &str) -> Result<R, ApiError> {
    let envelope = serde_json::from_str::<Envelope>(raw)
        .map_err(|err| ApiError::protocol(method, format!("{err} in '{raw}'")))?;

    if let Some(error) = envelope.error {
        return Err(error.into_api_error(method));
    }

    let Some(response) = envelope.response else {
        return Err(ApiError::protocol(
            method,
            format!("neither response nor error in '{raw}'"),
        ));
    };

    serde_json::from_value::<R>(response)
        .map_err(|err| ApiError::protocol(method, format!("{err} in '{raw}'")))
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::String(value) => value,
        Raw::Number(value) => value.to_string(),
    }))
}
