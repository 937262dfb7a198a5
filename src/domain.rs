use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{fmt::Display, path::PathBuf, str::FromStr};

/// Идентификатор пользователя ВКонтакте.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(pub i64);

/// Идентификатор сообщества. Всегда положительный.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(pub i64);

/// Владелец стены: пользователь (положительный id) или сообщество (отрицательный).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(pub i64);

impl From<GroupId> for OwnerId {
    fn from(group: GroupId) -> Self {
        Self(-group.0)
    }
}

impl From<UserId> for OwnerId {
    fn from(user: UserId) -> Self {
        Self(user.0)
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("https://vk.com/club")?;
        self.0.fmt(f)
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 < 0 {
            GroupId(-self.0).fmt(f)
        } else {
            f.write_str("https://vk.com/id")?;
            self.0.fmt(f)
        }
    }
}

/// Публикация, которую нужно разослать.
#[derive(Clone, Debug, Default)]
pub struct Post {
    /// Текст публикации.
    pub text: String,

    /// Уже загруженные в ВК медиавложения.
    pub attachments: Vec<AttachmentRef>,

    /// Локальные фотографии, которые загружаются на стену каждого сообщества.
    pub photos: Vec<PathBuf>,

    /// Время отложенной публикации.
    pub publish_at: Option<DateTime<Utc>>,
}

impl Post {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Успешно созданная запись на стене.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Published {
    pub owner_id: OwnerId,
    pub post_id: i64,
}

impl Display for Published {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "https://vk.com/wall{}_{}", self.owner_id.0, self.post_id)
    }
}

/// Ключ идемпотентности ВК: повторный запрос с тем же `guid` не создаёт дубль.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guid(pub String);

impl Guid {
    pub fn wall(user: UserId, group: GroupId) -> Self {
        Self(format!("{}{}", user.0, group.0))
    }

    pub fn comment(user: UserId, group: GroupId, topic: TopicId) -> Self {
        Self(format!("{}{}{}", user.0, group.0, topic.0))
    }
}

/// Ссылка на медиавложение в формате ВК, например `photo-1_456239017`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttachmentRef {
    pub kind: String,
    pub owner_id: i64,
    pub media_id: i64,
}

static ATTACHMENT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(photo|video|audio|doc|wall|market|poll)(-?\d+)_(\d+)$")
        .expect("regex should be valid")
});

impl FromStr for AttachmentRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = ATTACHMENT_REGEX
            .captures(s)
            .ok_or_else(|| format!("'{s}' is not an attachment, e.g. photo-1_456239017"))?;

        let parse = |idx: usize| {
            captures[idx]
                .parse::<i64>()
                .map_err(|err| format!("'{s}' has invalid id: {err}"))
        };

        Ok(Self {
            kind: captures[1].to_owned(),
            owner_id: parse(2)?,
            media_id: parse(3)?,
        })
    }
}

impl Display for AttachmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}_{}", self.kind, self.owner_id, self.media_id)
    }
}
