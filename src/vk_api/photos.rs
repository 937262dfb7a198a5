use super::Client;
use crate::domain::{AttachmentRef, GroupId};
use crate::error::ApiError;
use crate::utils::PrintErrorChain;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::path::Path;

const UPLOAD: &str = "photos.upload";

#[derive(Deserialize)]
struct UploadServer {
    upload_url: String,
}

/// Ответ сервера загрузки, передаётся в `photos.saveWallPhoto` как есть.
#[derive(Debug, Deserialize)]
struct Uploaded {
    server: i64,
    photo: String,
    hash: String,
}

#[derive(Deserialize)]
struct SavedPhoto {
    id: i64,
    owner_id: i64,
}

impl Client {
    /// Загружает фотографию для публикации на стене сообщества.
    ///
    /// Возвращает вложение вида `photo{owner_id}_{id}`.
    pub async fn upload_wall_photo(
        &self,
        group: GroupId,
        path: &Path,
    ) -> Result<AttachmentRef, ApiError> {
        #[derive(Serialize)]
        struct ServerParams {
            group_id: i64,
        }

        let server: UploadServer = self
            .call(
                "photos.getWallUploadServer",
                ServerParams { group_id: group.0 },
            )
            .await?;

        let uploaded = self.upload_file(&server.upload_url, path).await?;

        #[derive(Serialize)]
        struct SaveParams<'a> {
            group_id: i64,
            server: i64,
            photo: &'a str,
            hash: &'a str,
        }

        let saved: Vec<SavedPhoto> = self
            .call(
                "photos.saveWallPhoto",
                SaveParams {
                    group_id: group.0,
                    server: uploaded.server,
                    photo: &uploaded.photo,
                    hash: &uploaded.hash,
                },
            )
            .await?;

        let photo = saved.into_iter().next().ok_or_else(|| {
            ApiError::protocol("photos.saveWallPhoto", "no photos in response")
        })?;

        log::debug!(
            "Uploaded photo '{path}' as photo{owner}_{id}",
            path = path.display(),
            owner = photo.owner_id,
            id = photo.id,
        );

        Ok(AttachmentRef {
            kind: "photo".to_owned(),
            owner_id: photo.owner_id,
            media_id: photo.id,
        })
    }

    async fn upload_file(&self, upload_url: &str, path: &Path) -> Result<Uploaded, ApiError> {
        let content = tokio::fs::read(path).await.map_err(|err| {
            ApiError::validation(
                UPLOAD,
                format!("reading '{path}': {err}", path = path.display()),
            )
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_owned());

        let form = Form::new().part("photo", Part::bytes(content).file_name(file_name));

        let response = self
            .http()
            .post(upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| ApiError::transient(UPLOAD, PrintErrorChain(&err).to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ApiError::transient(UPLOAD, PrintErrorChain(&err).to_string()))?;

        if status.is_server_error() {
            return Err(ApiError::transient(UPLOAD, format!("http status {status}")));
        }

        let uploaded: Uploaded = serde_json::from_str(&body)
            .map_err(|err| ApiError::protocol(UPLOAD, format!("{err} in '{body}'")))?;

        // Сервер загрузки отвечает пустым списком, если файл не принят.
        if uploaded.photo.is_empty() || uploaded.photo == "[]" {
            return Err(ApiError::validation(UPLOAD, "photo was not accepted"));
        }

        Ok(uploaded)
    }
}
