use crate::domain::{GroupId, TopicId};
use std::fmt::{self, Display};

/// Куда шла публикация.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Метка закладок, сообщества которой не удалось получить.
    Tag(String),
    /// Список обсуждений сообщества.
    Board(GroupId),
    Topic(GroupId, TopicId),
    Wall(GroupId),
}

impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(name) => write!(f, "tag '{name}'"),
            Self::Board(group) => write!(f, "board of {group}"),
            Self::Topic(group, topic) => {
                write!(f, "topic https://vk.com/topic-{}_{}", group.0, topic.0)
            }
            Self::Wall(group) => write!(f, "wall of {group}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Опубликовано, внутри ссылка на запись или сообщение.
    Posted(String),
    AlreadyExists,
    Excluded,
    /// Публикация нужна, но запуск был с `--dry-run`.
    DryRun,
    Failed(String),
}

/// Итоги одного обхода.
#[derive(Clone, Debug, Default)]
pub struct Report {
    entries: Vec<(Target, Outcome)>,
}

impl Report {
    pub fn push(&mut self, target: Target, outcome: Outcome) {
        self.entries.push((target, outcome));
    }

    pub fn entries(&self) -> &[(Target, Outcome)] {
        &self.entries
    }

    pub fn posted(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Posted(_)))
    }

    pub fn already_exists(&self) -> usize {
        self.count(|outcome| *outcome == Outcome::AlreadyExists)
    }

    pub fn excluded(&self) -> usize {
        self.count(|outcome| *outcome == Outcome::Excluded)
    }

    pub fn dry_run(&self) -> usize {
        self.count(|outcome| *outcome == Outcome::DryRun)
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, Outcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "posted {}, already exists {}, excluded {}, dry run {}, failed {}",
            self.posted(),
            self.already_exists(),
            self.excluded(),
            self.dry_run(),
            self.failed(),
        )
    }
}
