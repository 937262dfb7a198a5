use crate::config;
use crate::error::ApiError;
use std::{future::Future, time::Duration};
use tokio::time::sleep;

/// Политика повторов для временных ошибок API.
///
/// Повторяется только [`ApiError::Transient`]. Пауза перед `n`-м повтором
/// равна `initial_backoff * 2^n`, но не больше `max_backoff`.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl From<&config::Retry> for RetryPolicy {
    fn from(retry: &config::Retry) -> Self {
        Self {
            max_retries: retry.max_retries,
            initial_backoff: retry.initial_backoff,
            max_backoff: retry.max_backoff,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, retry: u32) -> Duration {
        2u32.checked_pow(retry)
            .and_then(|factor| self.initial_backoff.checked_mul(factor))
            .map_or(self.max_backoff, |backoff| backoff.min(self.max_backoff))
    }

    /// Выполняет `operation`, повторяя её после временных ошибок.
    ///
    /// Возвращает первый успех, первую невременную ошибку или последнюю
    /// временную, когда повторы закончились.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut retry = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if retry > 0 {
                        log::info!("{what} succeeded after {retry} retries");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && retry < self.max_retries => {
                    let backoff = self.backoff(retry);
                    retry += 1;

                    log::warn!(
                        "{what} failed ({retry}/{max}), retrying in {backoff}: {err}",
                        max = self.max_retries,
                        backoff = humantime::format_duration(backoff),
                    );

                    sleep(backoff).await;
                }
                Err(err) => {
                    if err.is_transient() {
                        log::warn!("{what} failed after {retry} retries: {err}");
                    }
                    return Err(err);
                }
            }
        }
    }
}
