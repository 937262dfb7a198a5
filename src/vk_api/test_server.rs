//! Поддельный сервер ВК для тестов клиента.

use super::Client;
use crate::config;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    Router,
};
use secrecy::SecretString;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;
use url::Url;

#[derive(Clone, Debug)]
pub struct Canned {
    status: u16,
    body: String,
}

pub fn ok(body: &str) -> Canned {
    status(200, body)
}

pub fn status(status: u16, body: &str) -> Canned {
    Canned {
        status,
        body: body.to_owned(),
    }
}

#[derive(Clone, Debug)]
pub struct Recorded {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn form(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body)
            .into_owned()
            .collect()
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_deref().unwrap_or_default().as_bytes())
            .into_owned()
            .collect()
    }
}

#[derive(Default)]
struct Shared {
    responses: Mutex<VecDeque<Canned>>,
    requests: Mutex<Vec<Recorded>>,
}

pub struct TestServer {
    pub url: Url,
    shared: Arc<Shared>,
}

impl TestServer {
    pub async fn start(responses: Vec<Canned>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();

        let shared = Arc::new(Shared {
            responses: Mutex::new(responses.into()),
            requests: Mutex::default(),
        });

        let app = Router::new().fallback(handle).with_state(shared.clone());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self { url, shared }
    }

    pub fn push(&self, canned: Canned) {
        self.shared.responses.lock().unwrap().push_back(canned);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.requests.lock().unwrap().clone()
    }
}

async fn handle(
    State(shared): State<Arc<Shared>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    };

    shared.requests.lock().unwrap().push(Recorded {
        path: uri.path().to_owned(),
        query: uri.query().map(str::to_owned),
        authorization: header(header::AUTHORIZATION),
        content_type: header(header::CONTENT_TYPE),
        body: body.to_vec(),
    });

    match shared.responses.lock().unwrap().pop_front() {
        Some(canned) => (
            StatusCode::from_u16(canned.status).unwrap(),
            canned.body,
        ),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "no canned response left".to_owned(),
        ),
    }
}

pub fn vk_config(server: &str) -> config::Vk {
    config::Vk {
        server: Url::parse(server).unwrap(),
        oauth_server: Url::parse(server).unwrap(),
        api_version: "5.131".to_owned(),
        language: "ru".to_owned(),
        timeout: Duration::from_secs(5),
        query_interval: Duration::from_millis(100),
        interactive_captcha: false,
        debug: None,
    }
}

pub fn client(server: &TestServer, debug: Option<config::VkDebug>) -> Client {
    let mut config = vk_config(server.url.as_str());
    config.debug = debug;

    Client::new(
        reqwest::Client::new(),
        &config,
        SecretString::from("token".to_owned()),
    )
}
