//! Заглушка API для тестов рассыльщика. Запоминает все вызовы.

use super::{
    board::{Comment, Comments, NewComment, Topic},
    fave::{Group, Tag},
    wall::{NewWallPost, WallFilter, WallPost},
    VkApi,
};
use crate::domain::{AttachmentRef, GroupId, OwnerId, TagId, TopicId};
use crate::error::ApiError;
use async_trait::async_trait;
use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Mutex,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    GetTags,
    GetTagPages(TagId),
    GetTopics(GroupId),
    GetComments {
        group: GroupId,
        topic: TopicId,
        offset: u64,
        count: u32,
    },
    CreateComment {
        group: GroupId,
        topic: TopicId,
        message: String,
        guid: String,
    },
    GetWall(OwnerId, WallFilter),
    PostToWall {
        owner: OwnerId,
        message: String,
        attachments: Vec<String>,
        guid: String,
    },
    UploadPhoto(GroupId, PathBuf),
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::CreateComment { .. } | Self::PostToWall { .. } | Self::UploadPhoto(..)
        )
    }
}

#[derive(Default)]
pub struct MockApi {
    tags: Vec<Tag>,
    pages: HashMap<TagId, Vec<Group>>,
    topics: HashMap<GroupId, Vec<Topic>>,
    comments: HashMap<(GroupId, TopicId), Vec<Comment>>,
    walls: HashMap<(OwnerId, WallFilter), Vec<WallPost>>,
    failures: Mutex<HashMap<&'static str, VecDeque<ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, id: i64, name: &str) -> Self {
        self.tags.push(Tag {
            id,
            name: name.to_owned(),
        });
        self
    }

    pub fn with_group(mut self, tag: i64, id: i64) -> Self {
        self.pages.entry(TagId(tag)).or_default().push(Group {
            id,
            name: format!("group {id}"),
        });
        self
    }

    pub fn with_topic(mut self, group: i64, id: i64) -> Self {
        self.topics.entry(GroupId(group)).or_default().push(Topic {
            id,
            title: format!("topic {id}"),
            is_closed: 0,
        });
        self
    }

    pub fn with_closed_topic(mut self, group: i64, id: i64) -> Self {
        self.topics.entry(GroupId(group)).or_default().push(Topic {
            id,
            title: format!("topic {id}"),
            is_closed: 1,
        });
        self
    }

    pub fn with_comment(mut self, group: i64, topic: i64, text: &str) -> Self {
        let comments = self.comments.entry((GroupId(group), TopicId(topic))).or_default();
        comments.push(Comment {
            id: comments.len() as i64 + 1,
            text: text.to_owned(),
        });
        self
    }

    pub fn with_wall_post(mut self, group: i64, filter: WallFilter, text: &str) -> Self {
        let owner = OwnerId::from(GroupId(group));
        let posts = self.walls.entry((owner, filter)).or_default();
        posts.push(WallPost {
            id: posts.len() as i64 + 1,
            text: text.to_owned(),
        });
        self
    }

    /// Следующий вызов `method` вернёт `error`. Ошибки выдаются по очереди.
    pub fn fail(mut self, method: &'static str, error: ApiError) -> Self {
        self.failures
            .get_mut()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    fn record(&self, method: &'static str, call: Call) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);

        match self
            .failures
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VkApi for MockApi {
    async fn get_tags(&self) -> Result<Vec<Tag>, ApiError> {
        self.record("fave.getTags", Call::GetTags)?;
        Ok(self.tags.clone())
    }

    async fn get_tag_pages(&self, tag: TagId, count: u32) -> Result<Vec<Group>, ApiError> {
        self.record("fave.getPages", Call::GetTagPages(tag))?;
        let groups = self.pages.get(&tag).cloned().unwrap_or_default();
        Ok(groups.into_iter().take(count as usize).collect())
    }

    async fn get_topics(&self, group: GroupId) -> Result<Vec<Topic>, ApiError> {
        self.record("board.getTopics", Call::GetTopics(group))?;
        Ok(self.topics.get(&group).cloned().unwrap_or_default())
    }

    async fn get_comments(
        &self,
        group: GroupId,
        topic: TopicId,
        offset: u64,
        count: u32,
    ) -> Result<Comments, ApiError> {
        self.record(
            "board.getComments",
            Call::GetComments {
                group,
                topic,
                offset,
                count,
            },
        )?;

        let all = self.comments.get(&(group, topic)).cloned().unwrap_or_default();
        Ok(Comments {
            count: all.len() as u64,
            items: all
                .into_iter()
                .skip(offset as usize)
                .take(count as usize)
                .collect(),
        })
    }

    async fn create_comment(
        &self,
        group: GroupId,
        topic: TopicId,
        comment: &NewComment<'_>,
    ) -> Result<i64, ApiError> {
        self.record(
            "board.createComment",
            Call::CreateComment {
                group,
                topic,
                message: comment.message.to_owned(),
                guid: comment.guid.0.clone(),
            },
        )?;
        Ok(100 + topic.0)
    }

    async fn get_wall(
        &self,
        owner: OwnerId,
        filter: WallFilter,
        count: u32,
    ) -> Result<Vec<WallPost>, ApiError> {
        self.record("wall.get", Call::GetWall(owner, filter))?;
        let posts = self.walls.get(&(owner, filter)).cloned().unwrap_or_default();
        Ok(posts.into_iter().take(count as usize).collect())
    }

    async fn post_to_wall(
        &self,
        owner: OwnerId,
        post: &NewWallPost<'_>,
    ) -> Result<i64, ApiError> {
        self.record(
            "wall.post",
            Call::PostToWall {
                owner,
                message: post.message.to_owned(),
                attachments: post.attachments.iter().map(ToString::to_string).collect(),
                guid: post.guid.0.clone(),
            },
        )?;
        Ok(12345)
    }

    async fn upload_wall_photo(
        &self,
        group: GroupId,
        path: &Path,
    ) -> Result<AttachmentRef, ApiError> {
        self.record("photos.upload", Call::UploadPhoto(group, path.to_owned()))?;
        Ok(AttachmentRef {
            kind: "photo".to_owned(),
            owner_id: -group.0,
            media_id: 1,
        })
    }
}
