use crate::config;
use crate::error::ApiError;
use std::{future::Future, time::Duration};
use tokio_util::sync::CancellationToken;

/// Когда запускать рассылку.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Once,
    Every(Duration),
}

impl Trigger {
    pub fn new(schedule: Option<&config::Schedule>, once: bool) -> Self {
        match schedule {
            Some(schedule) if !once => Self::Every(schedule.every),
            _ => Self::Once,
        }
    }

    /// Запускает `job` по расписанию и возвращает результат последнего запуска.
    ///
    /// В режиме [`Trigger::Every`] ошибка авторизации останавливает цикл,
    /// остальные ошибки только логируются. Отмена `token` прерывает ожидание
    /// следующего запуска.
    pub async fn run<T, F, Fut>(self, token: CancellationToken, mut job: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let interval = match self {
            Self::Once => return job().await,
            Self::Every(interval) => interval,
        };

        let mut run = 1u64;

        loop {
            log::info!("Starting scheduled run {run}");

            let last = job().await;

            if let Err(err) = &last {
                if is_fatal(err) {
                    return last;
                }
                log::error!("Scheduled run {run} failed: {err:#}");
            }

            log::info!(
                "Next run in {interval}",
                interval = humantime::format_duration(interval)
            );

            tokio::select! {
                _ = token.cancelled() => {
                    log::info!("Schedule cancelled, stopping");
                    return last;
                }
                _ = tokio::time::sleep(interval) => {}
            }

            run += 1;
        }
    }
}

/// Ошибки, после которых повторный запуск бессмысленен.
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ApiError>().is_some_and(ApiError::is_auth)
}
