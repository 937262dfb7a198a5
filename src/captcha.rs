use async_trait::async_trait;
use std::io::{self, BufRead, Write};

/// Источник кодов капчи.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Возвращает код с картинки или `None`, если его получить не удалось.
    async fn solve(&self, image_url: &str) -> Option<String>;
}

/// Спрашивает код у оператора в терминале.
pub struct TerminalSolver;

#[async_trait]
impl CaptchaSolver for TerminalSolver {
    async fn solve(&self, image_url: &str) -> Option<String> {
        log::warn!("Captcha image URL: {image_url}");

        let code = tokio::task::spawn_blocking(|| {
            read_code(io::stdin().lock(), io::stdout().lock())
        })
        .await;

        match code {
            Ok(code) => code,
            Err(err) => {
                log::error!("Failed to read captcha code: {err}");
                None
            }
        }
    }
}

fn read_code(mut input: impl BufRead, mut output: impl Write) -> Option<String> {
    _ = write!(output, "Enter captcha code: ");
    _ = output.flush();

    let mut line = String::new();
    input.read_line(&mut line).ok()?;

    let code = line.trim();
    (!code.is_empty()).then(|| code.to_owned())
}
