use super::{wall::join_attachments, Client};
use crate::domain::{AttachmentRef, GroupId, Guid, TopicId};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct Topics {
    pub items: Vec<Topic>,
}

/// Обсуждение в сообществе.
#[derive(Clone, Debug, Deserialize)]
pub struct Topic {
    pub id: i64,

    #[serde(default)]
    pub title: String,

    /// Закрыто ли обсуждение: `1`, если в нём нельзя оставлять сообщения.
    #[serde(default)]
    pub is_closed: u8,
}

impl Topic {
    pub fn topic_id(&self) -> TopicId {
        TopicId(self.id)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Comments {
    pub count: u64,
    pub items: Vec<Comment>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Comment {
    pub id: i64,

    #[serde(default)]
    pub text: String,
}

/// Новое сообщение в обсуждении.
#[derive(Clone, Copy, Debug)]
pub struct NewComment<'a> {
    pub message: &'a str,
    pub attachments: &'a [AttachmentRef],
    pub guid: &'a Guid,
}

impl Client {
    pub async fn get_topics(&self, group: GroupId) -> Result<Vec<Topic>, ApiError> {
        #[derive(Serialize)]
        struct Params {
            group_id: i64,
            extended: u8,
            count: u32,
        }

        self.call::<_, Topics>(
            "board.getTopics",
            Params {
                group_id: group.0,
                extended: 0,
                count: 100,
            },
        )
        .await
        .map(|topics| topics.items)
    }

    pub async fn get_comments(
        &self,
        group: GroupId,
        topic: TopicId,
        offset: u64,
        count: u32,
    ) -> Result<Comments, ApiError> {
        #[derive(Serialize)]
        struct Params {
            group_id: i64,
            topic_id: i64,
            offset: u64,
            count: u32,
        }

        self.call(
            "board.getComments",
            Params {
                group_id: group.0,
                topic_id: topic.0,
                offset,
                count,
            },
        )
        .await
    }

    /// Оставляет сообщение в обсуждении от имени пользователя.
    ///
    /// Возвращает идентификатор созданного сообщения.
    pub async fn create_comment(
        &self,
        group: GroupId,
        topic: TopicId,
        comment: &NewComment<'_>,
    ) -> Result<i64, ApiError> {
        #[derive(Serialize)]
        struct Params<'a> {
            group_id: i64,
            topic_id: i64,
            from_group: u8,
            guid: &'a str,
            message: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            attachments: Option<String>,
        }

        let comment_id: i64 = self
            .call(
                "board.createComment",
                Params {
                    group_id: group.0,
                    topic_id: topic.0,
                    from_group: 0,
                    guid: &comment.guid.0,
                    message: comment.message,
                    attachments: join_attachments(comment.attachments),
                },
            )
            .await?;

        if comment_id <= 0 {
            return Err(ApiError::protocol(
                "board.createComment",
                format!("comment id {comment_id} is not positive"),
            ));
        }

        Ok(comment_id)
    }
}
