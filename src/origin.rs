use crate::errors::{Error, Result};
use crate::ui;
use axum::body::Bytes;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const VERSION_FILE: &str = "VERSION";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub body: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone)]
pub struct Origin {
    asset_dir: Option<PathBuf>,
    client: reqwest::Client,
}

impl Origin {
    pub fn new(asset_dir: Option<PathBuf>, client: reqwest::Client) -> Self {
        Self { asset_dir, client }
    }

    /// Fetches an app-relative path such as `assets/main.js`.
    pub async fn fetch_local(&self, path: &str) -> Result<Resource> {
        let relative = sanitize(path).ok_or_else(|| Error::NotFound(path.to_string()))?;

        if let Some(dir) = &self.asset_dir {
            match fs::read(dir.join(&relative)).await {
                Ok(bytes) => {
                    return Ok(Resource {
                        body: Bytes::from(bytes),
                        content_type: content_type_for(path).to_string(),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!("{path} not in asset dir, trying embedded assets");
                }
                Err(err) => return Err(err.into()),
            }
        }

        ui::embedded(path)
            .map(|text| Resource {
                body: Bytes::from_static(text.as_bytes()),
                content_type: content_type_for(path).to_string(),
            })
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    pub async fn fetch_remote(&self, url: &str) -> Result<Resource> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = resp.bytes().await?;
        Ok(Resource { body, content_type })
    }

    /// The deployable version: the asset directory's `VERSION` file, or the
    /// crate version when there is none.
    pub async fn version(&self) -> String {
        if let Some(dir) = &self.asset_dir {
            if let Ok(text) = fs::read_to_string(dir.join(VERSION_FILE)).await {
                let version = text.trim();
                if !version.is_empty() {
                    return version.to_string();
                }
            }
        }
        env!("CARGO_PKG_VERSION").to_string()
    }
}

fn sanitize(path: &str) -> Option<PathBuf> {
    let path = Path::new(path);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!clean.as_os_str().is_empty()).then_some(clean)
}

pub fn content_type_for(path: &str) -> &'static str {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match extension {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "webmanifest" => "application/manifest+json",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "m4a" => "audio/mp4",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
