// Эти предупреждения конфликтуют с API валидатора Garde.
#![allow(clippy::trivially_copy_pass_by_ref, clippy::ptr_arg)]

use crate::domain::AttachmentRef;
use crate::utils::PrintErrorChain;
use std::time::Duration;
use std::{fs, io, path::PathBuf};
use url::Url;

/// Минимальная пауза между запросами, при которой ВК не начинает ругаться на частоту.
pub const MIN_QUERY_INTERVAL: Duration = Duration::from_millis(100);

pub fn is_base_url(url: &Url, _: &()) -> garde::Result {
    if url.cannot_be_a_base() {
        Err(garde::Error::new(
            "url should be base, e.g. https://api.vk.com/",
        ))
    } else {
        Ok(())
    }
}

pub fn non_zero_duration(duration: &Duration, _: &()) -> garde::Result {
    if *duration == Duration::ZERO {
        Err(garde::Error::new("value can not be zero"))
    } else {
        Ok(())
    }
}

pub fn is_query_interval(duration: &Duration, _: &()) -> garde::Result {
    if *duration < MIN_QUERY_INTERVAL {
        Err(garde::Error::new(format!(
            "value should be at least {}",
            humantime::format_duration(MIN_QUERY_INTERVAL)
        )))
    } else {
        Ok(())
    }
}

pub fn is_not_blank(value: &String, _: &()) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("value can not be blank"))
    } else {
        Ok(())
    }
}

pub fn are_attachments(attachments: &Vec<String>, _: &()) -> garde::Result {
    for attachment in attachments {
        attachment
            .parse::<AttachmentRef>()
            .map_err(garde::Error::new)?;
    }

    Ok(())
}

pub fn are_files_and_exist(paths: &Vec<PathBuf>, _: &()) -> garde::Result {
    for path in paths {
        is_file_and_exists(path)?;
    }

    Ok(())
}

fn is_file_and_exists(path: &PathBuf) -> garde::Result {
    let dpath = path.display();

    let is_exists = path.try_exists().map_err(IoValidationError)?;
    if !is_exists {
        return Err(garde::Error::new(format!("path '{dpath}' does not exists")));
    }

    let metadata = fs::metadata(path).map_err(IoValidationError)?;
    if !metadata.is_file() {
        return Err(garde::Error::new(format!("'{dpath}' is not a file")));
    }

    Ok(())
}

pub fn is_directory_and_exists(path: &PathBuf, _: &()) -> garde::Result {
    let dpath = path.display();

    let is_exists = path.try_exists().map_err(IoValidationError)?;
    if !is_exists {
        return Err(garde::Error::new(format!("path '{dpath}' does not exists")));
    }

    let metadata = fs::metadata(path).map_err(IoValidationError)?;
    if !metadata.is_dir() {
        return Err(garde::Error::new(format!("'{dpath}' is not a directory")));
    }

    Ok(())
}

struct IoValidationError(io::Error);

impl From<IoValidationError> for garde::Error {
    fn from(error: IoValidationError) -> Self {
        garde::Error::new(format!(
            "io error during validation: {err}",
            err = PrintErrorChain(&error.0)
        ))
    }
}
