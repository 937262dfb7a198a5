use super::Client;
use crate::domain::{GroupId, TagId};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize)]
pub struct Tags {
    pub items: Vec<Tag>,
}

/// Метка закладок.
#[derive(Clone, Debug, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    pub fn tag_id(&self) -> TagId {
        TagId(self.id)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Pages {
    pub items: Vec<Page>,
}

/// Закладка на страницу. Для сообществ заполнено поле `group`.
#[derive(Clone, Debug, Deserialize)]
pub struct Page {
    pub group: Option<Group>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Group {
    pub id: i64,

    #[serde(default)]
    pub name: String,
}

impl Group {
    pub fn group_id(&self) -> GroupId {
        GroupId(self.id)
    }
}

impl Client {
    pub async fn get_tags(&self) -> Result<Vec<Tag>, ApiError> {
        #[derive(Serialize)]
        struct Params {}

        self.call::<_, Tags>("fave.getTags", Params {})
            .await
            .map(|tags| tags.items)
    }

    /// Возвращает сообщества из закладок, отмеченные меткой `tag`.
    pub async fn get_tag_pages(&self, tag: TagId, count: u32) -> Result<Vec<Group>, ApiError> {
        #[derive(Serialize)]
        struct Params {
            #[serde(rename = "type")]
            page_type: &'static str,
            tag_id: i64,
            count: u32,
            fields: &'static str,
        }

        self.call::<_, Pages>(
            "fave.getPages",
            Params {
                page_type: "groups",
                tag_id: tag.0,
                count,
                fields: "id,name",
            },
        )
        .await
        .map(|pages| pages.items.into_iter().filter_map(|page| page.group).collect())
    }
}
