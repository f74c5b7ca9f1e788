//! Session image cache.
//!
//! An uploaded search image lives here between the upload and the search
//! page reading it back out of the URL. The cache is scoped to one session:
//! a new session (a page reload) starts empty, and every id from before the
//! reload misses, which the presenter turns into a re-upload prompt.
//!
//! There is a single slot. Storing a new image evicts the previous one.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use parking_lot::Mutex;
use storefront_config::ImageConfig;
use storefront_model::ImageId;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::error::ImageCacheError;
use crate::infra::services::api::ImageUpload;

const KEY_PREFIX: &str = "search-images/v1/";

/// A stored upload: the id that goes into the URL and the data URL kept in
/// the cache.
#[derive(Clone, PartialEq, Eq)]
pub struct SearchImage {
    pub id: ImageId,
    pub data_url: String,
}

impl fmt::Debug for SearchImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchImage")
            .field("id", &self.id)
            .field("data_url_len", &self.data_url.len())
            .finish()
    }
}

/// One storage tier of the cache.
#[async_trait]
pub trait ImageSlotStore: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    async fn put(
        &self,
        id: &ImageId,
        data_url: &str,
    ) -> Result<(), ImageCacheError>;

    async fn get(&self, id: &ImageId) -> Result<Option<String>, ImageCacheError>;

    async fn evict(&self, id: &ImageId) -> Result<(), ImageCacheError>;
}

/// On-disk content cache under a session-scoped directory, bounded by a
/// byte quota.
#[derive(Debug)]
pub struct SessionStore {
    root: PathBuf,
    quota: u64,
    // Removes the directory when the session ends.
    _scratch: Option<TempDir>,
}

impl SessionStore {
    /// Use `dir` when given, otherwise a fresh temporary directory that lives
    /// as long as the store.
    pub fn new(dir: Option<&Path>, quota: u64) -> Result<Self, ImageCacheError> {
        let (root, scratch) = match dir {
            Some(dir) => (dir.to_path_buf(), None),
            None => {
                let scratch = tempfile::Builder::new()
                    .prefix("storefront-search-")
                    .tempdir()
                    .map_err(|err| ImageCacheError::Store(err.to_string()))?;
                (scratch.path().to_path_buf(), Some(scratch))
            }
        };
        debug!("[ImageCache] Session store at {}", root.display());
        Ok(Self {
            root,
            quota,
            _scratch: scratch,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key(id: &ImageId) -> String {
        format!("{KEY_PREFIX}{id}")
    }
}

#[async_trait]
impl ImageSlotStore for SessionStore {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn put(
        &self,
        id: &ImageId,
        data_url: &str,
    ) -> Result<(), ImageCacheError> {
        let size = data_url.len() as u64;
        if size > self.quota {
            return Err(ImageCacheError::QuotaExceeded {
                size,
                quota: self.quota,
            });
        }
        cacache::write(&self.root, Self::key(id), data_url.as_bytes()).await?;
        Ok(())
    }

    async fn get(&self, id: &ImageId) -> Result<Option<String>, ImageCacheError> {
        match cacache::read(&self.root, Self::key(id)).await {
            Ok(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| ImageCacheError::MalformedDataUrl),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn evict(&self, id: &ImageId) -> Result<(), ImageCacheError> {
        cacache::index::RemoveOpts::new()
            .remove_fully(true)
            .remove(&self.root, Self::key(id))
            .await?;
        Ok(())
    }
}

/// In-memory fallback holding a single image.
#[derive(Debug, Default)]
pub struct MemorySlot {
    slot: Mutex<Option<(ImageId, String)>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageSlotStore for MemorySlot {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put(
        &self,
        id: &ImageId,
        data_url: &str,
    ) -> Result<(), ImageCacheError> {
        *self.slot.lock() = Some((id.clone(), data_url.to_string()));
        Ok(())
    }

    async fn get(&self, id: &ImageId) -> Result<Option<String>, ImageCacheError> {
        Ok(self
            .slot
            .lock()
            .as_ref()
            .filter(|(stored, _)| stored == id)
            .map(|(_, data_url)| data_url.clone()))
    }

    async fn evict(&self, id: &ImageId) -> Result<(), ImageCacheError> {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|(stored, _)| stored == id) {
            *slot = None;
        }
        Ok(())
    }
}

/// Primary store with a fallback, plus upload validation and id minting.
#[derive(Debug)]
pub struct SessionImageCache {
    primary: Box<dyn ImageSlotStore>,
    fallback: Box<dyn ImageSlotStore>,
    max_upload_bytes: u64,
    current: Mutex<Option<ImageId>>,
}

impl SessionImageCache {
    /// Session store on disk with the memory slot behind it.
    pub fn new(config: &ImageConfig) -> Result<Self, ImageCacheError> {
        let primary =
            SessionStore::new(config.cache_dir.as_deref(), config.session_quota_bytes)?;
        Ok(Self::with_stores(
            Box::new(primary),
            Box::new(MemorySlot::new()),
            config.max_upload_bytes,
        ))
    }

    pub fn with_stores(
        primary: Box<dyn ImageSlotStore>,
        fallback: Box<dyn ImageSlotStore>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            primary,
            fallback,
            max_upload_bytes,
            current: Mutex::new(None),
        }
    }

    /// Validate and store an upload, replacing whatever was stored before.
    pub async fn store(&self, bytes: &[u8]) -> Result<SearchImage, ImageCacheError> {
        let data_url = encode_data_url(bytes, self.max_upload_bytes)?;
        let id = ImageId::generated(
            chrono::Utc::now().timestamp_millis(),
            rand::random::<u16>(),
        );

        let previous = self.current.lock().replace(id.clone());
        if let Some(previous) = previous {
            self.evict(&previous).await;
        }

        match self.primary.put(&id, &data_url).await {
            Ok(()) => {
                debug!("[ImageCache] Stored {} in {} store", id, self.primary.name());
            }
            Err(err) => {
                warn!(
                    "[ImageCache] {} store rejected {}: {}; using {} store",
                    self.primary.name(),
                    id,
                    err,
                    self.fallback.name()
                );
                self.fallback.put(&id, &data_url).await?;
            }
        }

        info!("[ImageCache] Search image {} ready ({} bytes)", id, bytes.len());
        Ok(SearchImage { id, data_url })
    }

    /// Data URL for `id`, or `None` when this session never stored it or it
    /// was evicted.
    pub async fn retrieve(&self, id: &ImageId) -> Option<String> {
        match self.primary.get(id).await {
            Ok(Some(data_url)) => return Some(data_url),
            Ok(None) => {}
            Err(err) => {
                warn!("[ImageCache] {} store read failed: {}", self.primary.name(), err)
            }
        }
        match self.fallback.get(id).await {
            Ok(found) => found,
            Err(err) => {
                warn!("[ImageCache] {} store read failed: {}", self.fallback.name(), err);
                None
            }
        }
    }

    pub async fn evict(&self, id: &ImageId) {
        for store in [&self.primary, &self.fallback] {
            if let Err(err) = store.evict(id).await {
                warn!("[ImageCache] Could not evict {} from {} store: {}", id, store.name(), err);
            }
        }
        let mut current = self.current.lock();
        if current.as_ref() == Some(id) {
            *current = None;
        }
    }

    pub async fn clear(&self) {
        let current = self.current.lock().take();
        if let Some(id) = current {
            self.evict(&id).await;
        }
    }

    pub fn current(&self) -> Option<ImageId> {
        self.current.lock().clone()
    }
}

fn accepted_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes).ok()? {
        format @ (ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::Gif
        | ImageFormat::WebP) => Some(format),
        _ => None,
    }
}

/// `data:<mime>;base64,<payload>` for a validated upload.
pub fn encode_data_url(
    bytes: &[u8],
    max_upload_bytes: u64,
) -> Result<String, ImageCacheError> {
    if bytes.is_empty() {
        return Err(ImageCacheError::Empty);
    }
    let size = bytes.len() as u64;
    if size > max_upload_bytes {
        return Err(ImageCacheError::TooLarge {
            size,
            limit: max_upload_bytes,
        });
    }
    let format = accepted_format(bytes).ok_or(ImageCacheError::UnsupportedFormat)?;
    Ok(format!(
        "data:{};base64,{}",
        format.to_mime_type(),
        STANDARD.encode(bytes)
    ))
}

impl ImageUpload {
    /// Decode a cached data URL back into upload bytes.
    pub fn from_data_url(data_url: &str) -> Result<Self, ImageCacheError> {
        let rest = data_url
            .strip_prefix("data:")
            .ok_or(ImageCacheError::MalformedDataUrl)?;
        let (header, payload) =
            rest.split_once(',').ok_or(ImageCacheError::MalformedDataUrl)?;
        let mime = header
            .strip_suffix(";base64")
            .filter(|mime| !mime.is_empty())
            .ok_or(ImageCacheError::MalformedDataUrl)?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|_| ImageCacheError::MalformedDataUrl)?;

        let extension = ImageFormat::from_mime_type(mime)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("bin");

        Ok(Self {
            bytes,
            mime: mime.to_string(),
            file_name: format!("search-image.{extension}"),
        })
    }
}
