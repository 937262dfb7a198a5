use super::{
    board::{Comments, NewComment, Topic},
    fave::{Group, Tag},
    wall::{NewWallPost, WallFilter, WallPost},
    Client,
};
use crate::domain::{AttachmentRef, GroupId, OwnerId, TagId, TopicId};
use crate::error::ApiError;
use async_trait::async_trait;
use std::path::Path;

/// Методы ВК, которые нужны рассыльщику.
#[async_trait]
pub trait VkApi: Send + Sync {
    async fn get_tags(&self) -> Result<Vec<Tag>, ApiError>;

    async fn get_tag_pages(&self, tag: TagId, count: u32) -> Result<Vec<Group>, ApiError>;

    async fn get_topics(&self, group: GroupId) -> Result<Vec<Topic>, ApiError>;

    async fn get_comments(
        &self,
        group: GroupId,
        topic: TopicId,
        offset: u64,
        count: u32,
    ) -> Result<Comments, ApiError>;

    async fn create_comment(
        &self,
        group: GroupId,
        topic: TopicId,
        comment: &NewComment<'_>,
    ) -> Result<i64, ApiError>;

    async fn get_wall(
        &self,
        owner: OwnerId,
        filter: WallFilter,
        count: u32,
    ) -> Result<Vec<WallPost>, ApiError>;

    async fn post_to_wall(&self, owner: OwnerId, post: &NewWallPost<'_>)
        -> Result<i64, ApiError>;

    async fn upload_wall_photo(
        &self,
        group: GroupId,
        path: &Path,
    ) -> Result<AttachmentRef, ApiError>;
}

#[async_trait]
impl VkApi for Client {
    async fn get_tags(&self) -> Result<Vec<Tag>, ApiError> {
        Client::get_tags(self).await
    }

    async fn get_tag_pages(&self, tag: TagId, count: u32) -> Result<Vec<Group>, ApiError> {
        Client::get_tag_pages(self, tag, count).await
    }

    async fn get_topics(&self, group: GroupId) -> Result<Vec<Topic>, ApiError> {
        Client::get_topics(self, group).await
    }

    async fn get_comments(
        &self,
        group: GroupId,
        topic: TopicId,
        offset: u64,
        count: u32,
    ) -> Result<Comments, ApiError> {
        Client::get_comments(self, group, topic, offset, count).await
    }

    async fn create_comment(
        &self,
        group: GroupId,
        topic: TopicId,
        comment: &NewComment<'_>,
    ) -> Result<i64, ApiError> {
        Client::create_comment(self, group, topic, comment).await
    }

    async fn get_wall(
        &self,
        owner: OwnerId,
        filter: WallFilter,
        count: u32,
    ) -> Result<Vec<WallPost>, ApiError> {
        Client::get_wall(self, owner, filter, count).await
    }

    async fn post_to_wall(
        &self,
        owner: OwnerId,
        post: &NewWallPost<'_>,
    ) -> Result<i64, ApiError> {
        Client::post_to_wall(self, owner, post).await
    }

    async fn upload_wall_photo(
        &self,
        group: GroupId,
        path: &Path,
    ) -> Result<AttachmentRef, ApiError> {
        Client::upload_wall_photo(self, group, path).await
    }
}
