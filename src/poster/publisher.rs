use crate::domain::{AttachmentRef, GroupId, Guid, OwnerId, Post, Published, TopicId, UserId};
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use crate::vk_api::{NewComment, NewWallPost, VkApi};
use chrono::Utc;

/// Отправляет публикации от имени пользователя, к которому привязан API.
pub struct Publisher<'a> {
    api: &'a dyn VkApi,
    user: UserId,
    retry: RetryPolicy,
}

impl<'a> Publisher<'a> {
    pub fn new(api: &'a dyn VkApi, user: UserId, retry: RetryPolicy) -> Self {
        Self { api, user, retry }
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Публикует `post` на стене сообщества `group`.
    ///
    /// Проверяет публикацию до обращения к ВК: пустой текст и время
    /// отложенной публикации в прошлом дают [`ApiError::Validation`].
    /// Локальные фотографии загружаются на стену сообщества перед публикацией.
    pub async fn submit(&self, group: GroupId, post: &Post) -> Result<Published, ApiError> {
        validate("wall.post", post)?;

        let owner = OwnerId::from(group);
        let attachments = self.attachments_for(group, post).await?;
        let guid = Guid::wall(self.user, group);
        let request = NewWallPost {
            message: &post.text,
            attachments: &attachments,
            publish_at: post.publish_at,
            guid: &guid,
        };

        let post_id = self
            .retry
            .run("wall.post", || self.api.post_to_wall(owner, &request))
            .await?;

        Ok(Published {
            owner_id: owner,
            post_id,
        })
    }

    /// Оставляет текст публикации в обсуждении. Фотографии в обсуждения не загружаются.
    pub async fn comment(
        &self,
        group: GroupId,
        topic: TopicId,
        post: &Post,
    ) -> Result<i64, ApiError> {
        validate("board.createComment", post)?;

        let guid = Guid::comment(self.user, group, topic);
        let request = NewComment {
            message: &post.text,
            attachments: &post.attachments,
            guid: &guid,
        };

        self.retry
            .run("board.createComment", || {
                self.api.create_comment(group, topic, &request)
            })
            .await
    }

    async fn attachments_for(
        &self,
        group: GroupId,
        post: &Post,
    ) -> Result<Vec<AttachmentRef>, ApiError> {
        let mut attachments = post.attachments.clone();

        for path in &post.photos {
            let photo = self
                .retry
                .run("photos.upload", || self.api.upload_wall_photo(group, path))
                .await?;
            attachments.push(photo);
        }

        Ok(attachments)
    }
}

fn validate(method: &str, post: &Post) -> Result<(), ApiError> {
    if post.text.trim().is_empty() {
        return Err(ApiError::validation(method, "post body is empty"));
    }

    if let Some(publish_at) = post.publish_at {
        if publish_at <= Utc::now() {
            return Err(ApiError::validation(
                method,
                format!("publish time {publish_at} is not in the future"),
            ));
        }
    }

    Ok(())
}
