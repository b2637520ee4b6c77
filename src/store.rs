use std::path::PathBuf;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{Config, RemoteStoreConfig};
use crate::core::error::{BeingError, Result};
use crate::core::{Notification, NotificationKind, Snapshot};
use crate::session::Session;

/// One JSON document per being under `{data_dir}/beings/`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        JsonFileStore { dir }
    }

    pub fn path_for(&self, being_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", being_id))
    }

    pub async fn load(&self, being_id: &str) -> Result<Option<Snapshot>> {
        let path = self.path_for(being_id);
        match tokio::fs::read_to_string(&path).await {
            Ok(json) => Ok(Some(Snapshot::from_json(&json, Utc::now())?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, being_id: &str, snapshot: &Snapshot) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        // Write beside the target and rename so a crash never leaves half a file.
        let path = self.path_for(being_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, snapshot.to_json()?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// HTTP document store: `GET`/`PUT {base_url}/beings/{id}`.
pub struct RemoteStore {
    base_url: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl RemoteStore {
    pub fn new(config: &RemoteStoreConfig) -> Self {
        RemoteStore {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    fn url_for(&self, being_id: &str) -> String {
        format!("{}/beings/{}", self.base_url, being_id)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    pub async fn load(&self, being_id: &str) -> Result<Option<Snapshot>> {
        let response = self
            .authorized(self.http_client.get(self.url_for(being_id)))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BeingError::Remote { status, body });
        }

        let json = response.text().await?;
        Ok(Some(Snapshot::from_json(&json, Utc::now())?))
    }

    pub async fn save(&self, being_id: &str, snapshot: &Snapshot) -> Result<()> {
        let response = self
            .authorized(self.http_client.put(self.url_for(being_id)))
            .json(snapshot)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BeingError::Remote { status, body });
        }
        Ok(())
    }
}

pub enum StateStore {
    Remote(RemoteStore),
    Local(JsonFileStore),
}

impl StateStore {
    /// Remote when fully configured, otherwise the local file.
    pub fn from_config(config: &Config) -> Self {
        match config.remote_store() {
            Some(remote) => {
                debug!(base_url = %remote.base_url, "using remote store");
                StateStore::Remote(RemoteStore::new(remote))
            }
            None => {
                debug!(dir = %config.beings_dir().display(), "remote store not configured, using local files");
                StateStore::Local(JsonFileStore::new(config.beings_dir()))
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, StateStore::Remote(_))
    }

    pub async fn load(&self, being_id: &str) -> Result<Option<Snapshot>> {
        match self {
            StateStore::Remote(store) => store.load(being_id).await,
            StateStore::Local(store) => store.load(being_id).await,
        }
    }

    pub async fn save(&self, being_id: &str, snapshot: &Snapshot) -> Result<()> {
        match self {
            StateStore::Remote(store) => store.save(being_id, snapshot).await,
            StateStore::Local(store) => store.save(being_id, snapshot).await,
        }
    }

    /// Load a session, degrading to a fresh one if the store is unreachable
    /// or the document is unreadable.
    pub async fn open_session(&self, being_id: &str, dropping_delay: chrono::Duration) -> (Session, Option<Notification>) {
        match self.load(being_id).await {
            Ok(Some(snapshot)) => {
                info!(being_id, "loaded saved being");
                (Session::new(snapshot, dropping_delay), None)
            }
            Ok(None) => {
                info!(being_id, "no saved being, hatching a new one");
                (Session::new(Snapshot::new(Utc::now()), dropping_delay), None)
            }
            Err(e) => {
                warn!(being_id, error = %e, "failed to load being");
                let notification = Notification::new(
                    NotificationKind::LoadFailed,
                    "データの読み込みに失敗しました",
                    if self.is_remote() {
                        "クラウドから記録を読み込めませんでした。"
                    } else {
                        "ローカルの記録を読み込めませんでした。"
                    },
                );
                (Session::new(Snapshot::new(Utc::now()), dropping_delay), Some(notification))
            }
        }
    }

    /// Save and describe the outcome; failures never abort the caller.
    pub async fn save_with_notice(&self, being_id: &str, snapshot: &Snapshot) -> Notification {
        match self.save(being_id, snapshot).await {
            Ok(()) if self.is_remote() => Notification::new(
                NotificationKind::Saved,
                "セーブしました！",
                format!("{}の記録をクラウドに保存しました。", snapshot.being.name),
            ),
            Ok(()) => Notification::new(
                NotificationKind::Saved,
                "ローカルに保存しました",
                format!("{}の記録をローカルに保存しました。", snapshot.being.name),
            ),
            Err(e) => {
                warn!(being_id, error = %e, "failed to save being");
                Notification::new(
                    NotificationKind::SaveFailed,
                    "セーブに失敗しました",
                    if self.is_remote() {
                        "記録をクラウドに保存できませんでした。"
                    } else {
                        "ローカルに記録を保存できませんでした。"
                    },
                )
            }
        }
    }
}
