mod captcha;
mod config;
mod config_validators;
mod credentials;
mod domain;
mod error;
mod poster;
mod retry;
mod scheduler;
mod utils;
mod vk_api;

use anyhow::Context;
use argh::FromArgs;
use credentials::{Credentials, UserActor};
use domain::OwnerId;
use poster::{Outcome, Poster, PosterSettings, Publisher, Report};
use retry::RetryPolicy;
use scheduler::Trigger;
use std::{path::PathBuf, process};
use tokio_util::sync::CancellationToken;

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH_FAILED: i32 = 1;
const EXIT_FATAL: i32 = 2;
const EXIT_TARGETS_FAILED: i32 = 3;

/// Publishes a post to VK communities bookmarked under the configured tags.
#[derive(FromArgs)]
struct Args {
    /// path to the config file
    #[argh(option, short = 'c', default = "PathBuf::from(\"config.toml\")")]
    config: PathBuf,

    /// look for targets, but publish nothing
    #[argh(switch)]
    dry_run: bool,

    /// run a single time even if a schedule is configured
    #[argh(switch)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Args = argh::from_env();

    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
        .unwrap();

    hello();

    let result = run(args).await;

    match &result {
        Ok(report) => log_failures(report),
        Err(err) => log::error!("Fatal error: {err:#}"),
    }

    process::exit(exit_code(&result));
}

fn exit_code(result: &anyhow::Result<Report>) -> i32 {
    match result {
        Ok(report) if report.has_failures() => EXIT_TARGETS_FAILED,
        Ok(_) => EXIT_SUCCESS,
        Err(err) if scheduler::is_fatal(err) => EXIT_AUTH_FAILED,
        Err(_) => EXIT_FATAL,
    }
}

fn hello() {
    log::info!(
        "{name} version {version}",
        name = env!("CARGO_BIN_NAME"),
        version = env!("CARGO_PKG_VERSION")
    );
}

async fn run(args: Args) -> anyhow::Result<Report> {
    let config = config::Config::read_from(&args.config)?;
    let post = config.post.to_post()?;
    let credentials = Credentials::load(&config.auth, &config.vk.oauth_server)?;

    let http = reqwest::Client::builder()
        .timeout(config.vk.timeout)
        .build()
        .context("building http client")?;

    let UserActor {
        user_id,
        access_token,
    } = credentials
        .authorize(&http, &config.vk.oauth_server)
        .await
        .context("authorizing api requests")?;

    log::info!("Authorized as {user}", user = OwnerId::from(user_id));

    let mut client = vk_api::Client::new(http, &config.vk, access_token);
    if config.vk.interactive_captcha {
        client = client.with_captcha_solver(Box::new(captcha::TerminalSolver));
    }

    let publisher = Publisher::new(&client, user_id, RetryPolicy::from(&config.retry));
    let poster = Poster::new(
        &client,
        publisher,
        PosterSettings {
            targets: &config.targets,
            post: &post,
            query: config.post.match_query(),
            query_interval: config.vk.query_interval,
            dry_run: args.dry_run,
        },
    );

    if args.dry_run {
        log::warn!("Dry run, nothing will be published");
    }

    let trigger = Trigger::new(config.schedule.as_ref(), args.once);
    let token = CancellationToken::new();

    if let Trigger::Every(_) = trigger {
        tokio::spawn(cancel_on_ctrl_c(token.clone()));
    }

    trigger.run(token, || poster.run()).await
}

async fn cancel_on_ctrl_c(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            log::info!("Received Ctrl-C, finishing after the current run");
            token.cancel();
        }
        Err(err) => log::error!("Failed to listen for Ctrl-C: {err}"),
    }
}

fn log_failures(report: &Report) {
    for (target, outcome) in report.entries() {
        if let Outcome::Failed(reason) = outcome {
            log::warn!("Not published to {target}: {reason}");
        }
    }
}
