//! Рассылка публикации по сообществам из закладок.

mod publisher;
mod report;

pub use publisher::Publisher;
pub use report::{Outcome, Report, Target};

use crate::config;
use crate::domain::{GroupId, OwnerId, Post};
use crate::error::ApiError;
use crate::retry::RetryPolicy;
use crate::vk_api::{Group, Topic, VkApi, WallFilter};
use anyhow::Context;
use std::time::Duration;
use tokio::time::sleep;

/// Максимальное количество сообщений, которое отдаёт `board.getComments`.
const MAX_COMMENTS_COUNT: u32 = 100;

pub struct Poster<'a> {
    api: &'a dyn VkApi,
    publisher: Publisher<'a>,
    targets: &'a config::Targets,
    post: &'a Post,
    query: &'a str,
    query_interval: Duration,
    dry_run: bool,
}

pub struct PosterSettings<'a> {
    pub targets: &'a config::Targets,
    pub post: &'a Post,
    pub query: &'a str,
    pub query_interval: Duration,
    pub dry_run: bool,
}

/// Результат обработки одной цели.
enum Handled {
    /// Запрос на запись выполнен или был бы выполнен в режиме `--dry-run`.
    Written(Outcome),
    /// Публикация уже есть, писать не пришлось.
    Skipped(Outcome),
}

impl<'a> Poster<'a> {
    pub fn new(api: &'a dyn VkApi, publisher: Publisher<'a>, settings: PosterSettings<'a>) -> Self {
        Self {
            api,
            publisher,
            targets: settings.targets,
            post: settings.post,
            query: settings.query,
            query_interval: settings.query_interval,
            dry_run: settings.dry_run,
        }
    }

    /// Обходит метки, сообщества и обсуждения и публикует то, чего там ещё нет.
    ///
    /// Ошибка авторизации прерывает весь обход. Остальные ошибки отмечают
    /// цель как неудачную, обход продолжается. Чтения, как и записи,
    /// повторяются после временных ошибок.
    pub async fn run(&self) -> anyhow::Result<Report> {
        // Пустая подстрока совпадает с любым текстом.
        anyhow::ensure!(!self.query.trim().is_empty(), "match query can not be blank");

        let mut report = Report::default();

        let tags = self
            .retry()
            .run("fave.getTags", || self.api.get_tags())
            .await
            .context("fetching bookmark tags")?;

        let tags: Vec<_> = tags
            .into_iter()
            .filter(|tag| self.targets.tags.contains(&tag.name))
            .collect();

        if tags.is_empty() {
            log::warn!(
                "None of the configured tags {:?} found in bookmarks",
                self.targets.tags
            );
        }

        for tag in tags {
            log::info!("Selected tag '{name}' ({id})", name = tag.name, id = tag.id);

            let groups = match self
                .retry()
                .run("fave.getPages", || {
                    self.api
                        .get_tag_pages(tag.tag_id(), self.targets.tag_pages_query_size)
                })
                .await
            {
                Ok(groups) => groups,
                Err(err) => {
                    let target = Target::Tag(tag.name.clone());
                    abort_on_auth(&err, &target)?;
                    log::error!("Failed to fetch communities of {target}: {err}");
                    report.push(target, Outcome::Failed(err.to_string()));
                    continue;
                }
            };

            for group in groups {
                log::info!(
                    "Selected community '{name}' {url}",
                    name = group.name,
                    url = group.group_id()
                );

                if self.targets.post_to_groups_topics {
                    self.comment_topics(&group, &mut report).await?;
                }

                if self.targets.post_to_groups {
                    self.post_to_wall(&group, &mut report).await?;
                }
            }
        }

        log::info!("Run finished: {report}");

        Ok(report)
    }

    async fn comment_topics(&self, group: &Group, report: &mut Report) -> anyhow::Result<()> {
        let group_id = group.group_id();

        let topics = match self
            .retry()
            .run("board.getTopics", || self.api.get_topics(group_id))
            .await
        {
            Ok(topics) => topics,
            Err(err) => {
                let target = Target::Board(group_id);
                abort_on_auth(&err, &target)?;
                log::error!("Failed to fetch topics of {target}: {err}");
                report.push(target, Outcome::Failed(err.to_string()));
                return Ok(());
            }
        };

        for topic in topics {
            let target = Target::Topic(group_id, topic.topic_id());

            if self.targets.is_topic_excluded(group_id, topic.topic_id()) {
                log::info!("Skipping excluded {target}");
                report.push(target, Outcome::Excluded);
            } else if topic.is_closed != 0 {
                log::info!("Skipping closed {target}");
                report.push(target, Outcome::Excluded);
            } else {
                log::info!("Selected topic '{title}' ({target})", title = topic.title);

                let handled = self.comment_topic(group_id, &topic).await;
                self.record(report, target, handled)?;
                sleep(self.query_interval * 3).await;
            }

            sleep(self.query_interval).await;
        }

        Ok(())
    }

    async fn comment_topic(&self, group: GroupId, topic: &Topic) -> Result<Handled, ApiError> {
        let size = self.targets.group_topic_query_size;
        let total = self
            .retry()
            .run("board.getComments", || {
                self.api.get_comments(group, topic.topic_id(), 0, 1)
            })
            .await?
            .count;
        let offset = latest_page_offset(total, size);

        let comments = self
            .retry()
            .run("board.getComments", || {
                self.api.get_comments(
                    group,
                    topic.topic_id(),
                    offset,
                    (size * 2).min(MAX_COMMENTS_COUNT),
                )
            })
            .await?;

        if let Some(comment) = comments
            .items
            .iter()
            .find(|comment| comment.text.contains(self.query))
        {
            log::info!("Comment {id} already in topic", id = comment.id);
            return Ok(Handled::Skipped(Outcome::AlreadyExists));
        }

        if self.dry_run {
            return Ok(Handled::Written(Outcome::DryRun));
        }

        let comment_id = self.publisher.comment(group, topic.topic_id(), self.post).await?;

        Ok(Handled::Written(Outcome::Posted(format!(
            "https://vk.com/topic-{group}_{topic}?post={comment_id}",
            group = group.0,
            topic = topic.id,
        ))))
    }

    async fn post_to_wall(&self, group: &Group, report: &mut Report) -> anyhow::Result<()> {
        let group_id = group.group_id();
        let target = Target::Wall(group_id);

        if self.targets.is_group_excluded(group_id) {
            log::info!("Skipping excluded {target}");
            report.push(target, Outcome::Excluded);
        } else {
            let handled = self.post_to_group_wall(group_id).await;
            self.record(report, target, handled)?;
            sleep(self.query_interval * 3).await;
        }

        sleep(self.query_interval).await;

        Ok(())
    }

    async fn post_to_group_wall(&self, group: GroupId) -> Result<Handled, ApiError> {
        let owner = OwnerId::from(group);

        for filter in [WallFilter::Suggests, WallFilter::All] {
            let posts = self
                .retry()
                .run("wall.get", || {
                    self.api
                        .get_wall(owner, filter, self.targets.group_post_query_size)
                })
                .await?;

            if let Some(post) = posts.iter().find(|post| post.text.contains(self.query)) {
                log::info!(
                    "Post https://vk.com/wall{owner}_{id} already exists",
                    owner = owner.0,
                    id = post.id
                );
                return Ok(Handled::Skipped(Outcome::AlreadyExists));
            }
        }

        if self.dry_run {
            return Ok(Handled::Written(Outcome::DryRun));
        }

        let published = self.publisher.submit(group, self.post).await?;

        Ok(Handled::Written(Outcome::Posted(published.to_string())))
    }

    fn retry(&self) -> &RetryPolicy {
        self.publisher.retry()
    }

    fn record(
        &self,
        report: &mut Report,
        target: Target,
        handled: Result<Handled, ApiError>,
    ) -> anyhow::Result<()> {
        match handled {
            Ok(Handled::Written(outcome)) => {
                match &outcome {
                    Outcome::Posted(link) => log::info!("Posted to {target}: {link}"),
                    _ => log::info!("Would post to {target}"),
                }
                report.push(target, outcome);
            }
            Ok(Handled::Skipped(outcome)) => {
                log::info!("Publication already exists in {target}");
                report.push(target, outcome);
            }
            Err(err) => {
                abort_on_auth(&err, &target)?;
                log::error!(
                    "Failed to handle {target} at '{method}': {err}",
                    method = err.method()
                );
                report.push(target, Outcome::Failed(err.to_string()));
            }
        }

        Ok(())
    }
}

fn abort_on_auth(err: &ApiError, target: &Target) -> anyhow::Result<()> {
    if err.is_auth() {
        return Err(anyhow::Error::new(err.clone()).context(format!("handling {target}")));
    }

    Ok(())
}

/// Смещение последней страницы сообщений обсуждения размером `size`.
fn latest_page_offset(total: u64, size: u32) -> u64 {
    let size = u64::from(size.max(1));
    total.saturating_sub(1) / size * size
}
