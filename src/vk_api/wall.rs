use super::Client;
use crate::domain::{AttachmentRef, Guid, OwnerId};
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct Posts {
    pub items: Vec<WallPost>,
}

/// Структура публикации на стене, взятая из [https://dev.vk.com/ru/reference/objects/post].
///
/// Она не содержит все поля. Только необходимые для поиска уже опубликованного.
#[derive(Clone, Debug, Deserialize)]
pub struct WallPost {
    /// Идентификатор записи.
    pub id: i64,

    /// Текст записи.
    #[serde(default)]
    pub text: String,
}

/// Какие записи запрашивать со стены.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WallFilter {
    /// Предложенные записи. Доступны только руководителям сообщества и их автору.
    Suggests,
    All,
}

/// Новая запись на стене.
#[derive(Clone, Copy, Debug)]
pub struct NewWallPost<'a> {
    pub message: &'a str,
    pub attachments: &'a [AttachmentRef],
    pub publish_at: Option<DateTime<Utc>>,
    pub guid: &'a Guid,
}

#[derive(Deserialize)]
struct PostResponse {
    post_id: i64,
}

pub(super) fn join_attachments(attachments: &[AttachmentRef]) -> Option<String> {
    if attachments.is_empty() {
        return None;
    }

    Some(
        attachments
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    )
}

impl Client {
    /// Возвращает список публикаций со стены пользователя или сообщества.
    ///
    /// # Параметры
    ///
    /// * `owner` - Владелец стены.
    /// * `filter` - Какие записи нужны.
    /// * `count` - Количество записей, которое необходимо получить. Максимальное значение: 100.
    pub async fn get_wall(
        &self,
        owner: OwnerId,
        filter: WallFilter,
        count: u32,
    ) -> Result<Vec<WallPost>, ApiError> {
        #[derive(Serialize)]
        struct Params {
            owner_id: i64,
            filter: WallFilter,
            count: u32,
        }

        self.call::<_, Posts>(
            "wall.get",
            Params {
                owner_id: owner.0,
                filter,
                count,
            },
        )
        .await
        .map(|posts| posts.items)
    }

    /// Публикует запись на стене от имени пользователя с подписью.
    ///
    /// Возвращает идентификатор созданной записи.
    pub async fn post_to_wall(
        &self,
        owner: OwnerId,
        post: &NewWallPost<'_>,
    ) -> Result<i64, ApiError> {
        #[derive(Serialize)]
        struct Params<'a> {
            owner_id: i64,
            from_group: u8,
            friends_only: u8,
            signed: u8,
            mark_as_ads: u8,
            guid: &'a str,
            message: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            attachments: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            publish_date: Option<i64>,
        }

        let response = self
            .call::<_, PostResponse>(
                "wall.post",
                Params {
                    owner_id: owner.0,
                    from_group: 0,
                    friends_only: 0,
                    signed: 1,
                    mark_as_ads: 0,
                    guid: &post.guid.0,
                    message: post.message,
                    attachments: join_attachments(post.attachments),
                    publish_date: post.publish_at.map(|at| at.timestamp()),
                },
            )
            .await?;

        if response.post_id <= 0 {
            return Err(ApiError::protocol(
                "wall.post",
                format!("post id {id} is not positive", id = response.post_id),
            ));
        }

        Ok(response.post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vk_api::test_server::{self, TestServer};

    #[test]
    fn parses_wall_posts() {
        let raw = r#"{"count":2,"items":[
            {"id":10,"owner_id":-1,"from_id":5,"date":1700000000,"text":"Hello","post_type":"post"},
            {"id":11,"owner_id":-1,"from_id":6,"date":1700000100,"post_type":"copy"}
        ]}"#;

        let posts: Posts = serde_json::from_str(raw).unwrap();

        assert_eq!(posts.items.len(), 2);
        assert_eq!(posts.items[0].id, 10);
        assert_eq!(posts.items[0].text, "Hello");
        assert_eq!(posts.items[1].text, "");
    }

    #[tokio::test]
    async fn posts_signed_message_with_guid() {
        let server = TestServer::start(vec![test_server::ok(r#"{"response":{"post_id":12345}}"#)]).await;
        let client = test_server::client(&server, None);
        let guid = Guid("1-1".to_owned());
        let attachments: Vec<AttachmentRef> =
            vec!["photo-1_2".parse().unwrap(), "doc3_4".parse().unwrap()];

        let post_id = client
            .post_to_wall(
                OwnerId(-1),
                &NewWallPost {
                    message: "Hello",
                    attachments: &attachments,
                    publish_at: DateTime::from_timestamp(1900000000, 0),
                    guid: &guid,
                },
            )
            .await
            .unwrap();

        assert_eq!(post_id, 12345);

        let form = server.requests()[0].form();
        for pair in [
            ("owner_id", "-1"),
            ("from_group", "0"),
            ("signed", "1"),
            ("guid", "1-1"),
            ("message", "Hello"),
            ("attachments", "photo-1_2,doc3_4"),
            ("publish_date", "1900000000"),
        ] {
            assert!(
                form.contains(&(pair.0.to_owned(), pair.1.to_owned())),
                "missing {pair:?} in {form:?}"
            );
        }
    }

    #[tokio::test]
    async fn omits_empty_attachments() {
        let server = TestServer::start(vec![test_server::ok(r#"{"response":{"post_id":1}}"#)]).await;
        let client = test_server::client(&server, None);
        let guid = Guid("1".to_owned());

        client
            .post_to_wall(
                OwnerId(-1),
                &NewWallPost {
                    message: "Hello",
                    attachments: &[],
                    publish_at: None,
                    guid: &guid,
                },
            )
            .await
            .unwrap();

        let form = server.requests()[0].form();
        assert!(form.iter().all(|(key, _)| key != "attachments" && key != "publish_date"));
    }

    #[tokio::test]
    async fn requests_suggested_posts() {
        let server = TestServer::start(vec![test_server::ok(r#"{"response":{"count":0,"items":[]}}"#)]).await;
        let client = test_server::client(&server, None);

        let posts = client.get_wall(OwnerId(-7), WallFilter::Suggests, 20).await.unwrap();

        assert!(posts.is_empty());
        let form = server.requests()[0].form();
        assert!(form.contains(&("filter".to_owned(), "suggests".to_owned())));
        assert!(form.contains(&("count".to_owned(), "20".to_owned())));
    }
}
