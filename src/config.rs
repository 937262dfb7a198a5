use crate::config_validators as validators;
use crate::domain::{AttachmentRef, GroupId, Post, TopicId};
use crate::error::ConfigError;
use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Deserializer};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

#[derive(Debug, Deserialize, Validate)]
pub struct Config {
    #[garde(dive)]
    pub vk: Vk,

    #[garde(dive)]
    pub auth: Auth,

    #[garde(dive)]
    pub post: PostConfig,

    #[garde(dive)]
    pub targets: Targets,

    #[serde(default)]
    #[garde(dive)]
    pub retry: Retry,

    #[serde(default)]
    #[garde(dive)]
    pub schedule: Option<Schedule>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Vk {
    #[serde(default = "default_server")]
    #[garde(custom(validators::is_base_url))]
    pub server: Url,

    #[serde(default = "default_oauth_server")]
    #[garde(custom(validators::is_base_url))]
    pub oauth_server: Url,

    #[serde(default = "default_api_version")]
    #[garde(length(min = 1))]
    pub api_version: String,

    #[serde(default = "default_language")]
    #[garde(length(min = 1))]
    pub language: String,

    /// Таймаут одного HTTP запроса.
    #[serde(default = "default_timeout", deserialize_with = "duration")]
    #[garde(custom(validators::non_zero_duration))]
    pub timeout: Duration,

    /// Пауза между запросами к API.
    #[serde(default = "default_query_interval", deserialize_with = "duration")]
    #[garde(custom(validators::is_query_interval))]
    pub query_interval: Duration,

    /// Спрашивать код капчи в терминале.
    #[serde(default)]
    #[garde(skip)]
    pub interactive_captcha: bool,

    #[serde(default)]
    #[garde(dive)]
    pub debug: Option<VkDebug>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct VkDebug {
    #[garde(skip)]
    pub save_responses: bool,

    #[garde(custom(validators::is_directory_and_exists))]
    pub responses_dir_path: PathBuf,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// Готовый токен пользователя.
    #[default]
    Token,

    /// Обмен кода авторизации на токен.
    CodeFlow,
}

/// Учётные данные в том виде, в каком они лежат в файле.
///
/// Проверка обязательности полей происходит в [`crate::credentials::Credentials::load`],
/// после подстановки переменных окружения.
#[derive(Clone, Deserialize, Validate)]
pub struct Auth {
    #[serde(default, rename = "type")]
    #[garde(skip)]
    pub auth_type: AuthType,

    #[serde(default)]
    #[garde(skip)]
    pub app_id: Option<i64>,

    #[serde(default)]
    #[garde(skip)]
    pub secret_key: Option<String>,

    #[serde(default = "default_redirect_uri")]
    #[garde(skip)]
    pub redirect_uri: String,

    #[serde(default)]
    #[garde(skip)]
    pub authorization_code: Option<String>,

    #[serde(default)]
    #[garde(skip)]
    pub user_id: Option<i64>,

    #[serde(default)]
    #[garde(skip)]
    pub access_token: Option<String>,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const REDACTED: &str = "[REDACTED]";

        let redact = |value: &Option<String>| value.as_ref().map(|_| REDACTED);

        f.debug_struct("Auth")
            .field("auth_type", &self.auth_type)
            .field("app_id", &self.app_id)
            .field("secret_key", &redact(&self.secret_key))
            .field("redirect_uri", &self.redirect_uri)
            .field("authorization_code", &redact(&self.authorization_code))
            .field("user_id", &self.user_id)
            .field("access_token", &redact(&self.access_token))
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PostConfig {
    /// Текст публикации.
    #[garde(custom(validators::is_not_blank))]
    pub message: String,

    /// Подстрока, по которой ищется уже опубликованное сообщение.
    /// По умолчанию совпадает с `message`.
    #[serde(default)]
    #[garde(skip)]
    pub query: Option<String>,

    #[serde(default)]
    #[garde(custom(validators::are_attachments))]
    pub attachments: Vec<String>,

    #[serde(default)]
    #[garde(custom(validators::are_files_and_exist))]
    pub photos: Vec<PathBuf>,

    /// Время отложенной публикации в формате RFC 3339.
    #[serde(default)]
    #[garde(skip)]
    pub publish_at: Option<DateTime<Utc>>,
}

impl PostConfig {
    pub fn match_query(&self) -> &str {
        match &self.query {
            Some(query) if !query.trim().is_empty() => query,
            _ => &self.message,
        }
    }

    pub fn to_post(&self) -> Result<Post, ConfigError> {
        let attachments = self
            .attachments
            .iter()
            .map(|raw| raw.parse::<AttachmentRef>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| ConfigError::Malformed {
                field: "post.attachments",
                reason,
            })?;

        Ok(Post {
            attachments,
            photos: self.photos.clone(),
            publish_at: self.publish_at,
            ..Post::new(self.message.clone())
        })
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Targets {
    /// Метки закладок, сообщества из которых получают публикацию.
    #[garde(length(min = 1))]
    pub tags: Vec<String>,

    #[serde(default = "default_true")]
    #[garde(skip)]
    pub post_to_groups: bool,

    #[serde(default)]
    #[garde(skip)]
    pub post_to_groups_topics: bool,

    #[serde(default = "default_tag_pages_query_size")]
    #[garde(range(min = 1, max = 100))]
    pub tag_pages_query_size: u32,

    #[serde(default = "default_group_post_query_size")]
    #[garde(range(min = 1, max = 100))]
    pub group_post_query_size: u32,

    #[serde(default = "default_group_topic_query_size")]
    #[garde(range(min = 1, max = 100))]
    pub group_topic_query_size: u32,

    #[serde(default)]
    #[garde(skip)]
    pub excluded_groups: Vec<i64>,

    #[serde(default)]
    #[garde(skip)]
    pub excluded_topics: Vec<ExcludedTopics>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExcludedTopics {
    pub group_id: i64,
    pub topics: Vec<i64>,
}

impl Targets {
    pub fn is_group_excluded(&self, group: GroupId) -> bool {
        self.excluded_groups.contains(&group.0)
    }

    pub fn is_topic_excluded(&self, group: GroupId, topic: TopicId) -> bool {
        self.excluded_topics
            .iter()
            .filter(|excluded| excluded.group_id == group.0)
            .any(|excluded| excluded.topics.contains(&topic.0))
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Retry {
    /// Сколько раз повторять запрос после временной ошибки.
    #[serde(default = "default_max_retries")]
    #[garde(range(max = 10))]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff", deserialize_with = "duration")]
    #[garde(custom(validators::non_zero_duration))]
    pub initial_backoff: Duration,

    #[serde(default = "default_max_backoff", deserialize_with = "duration")]
    #[garde(custom(validators::non_zero_duration))]
    pub max_backoff: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct Schedule {
    /// Интервал между запусками.
    #[serde(deserialize_with = "duration")]
    #[garde(custom(validators::non_zero_duration))]
    pub every: Duration,
}

impl Config {
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
        let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;

        config
            .validate(&())
            .map_err(|errors| ConfigError::Invalid {
                path: path.to_owned(),
                report: errors.to_string(),
            })?;

        Ok(config)
    }
}

fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

fn default_server() -> Url {
    Url::parse("https://api.vk.com/").expect("url should be valid")
}

fn default_oauth_server() -> Url {
    Url::parse("https://oauth.vk.com/").expect("url should be valid")
}

fn default_api_version() -> String {
    "5.131".to_owned()
}

fn default_language() -> String {
    "ru".to_owned()
}

fn default_redirect_uri() -> String {
    "https://oauth.vk.com/blank.html".to_owned()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_query_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_true() -> bool {
    true
}

fn default_tag_pages_query_size() -> u32 {
    100
}

fn default_group_post_query_size() -> u32 {
    20
}

fn default_group_topic_query_size() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> Duration {
    Duration::from_secs(1)
}

fn default_max_backoff() -> Duration {
    Duration::from_secs(30)
}
