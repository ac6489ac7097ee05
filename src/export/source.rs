//! Loading background images by URL.

use async_trait::async_trait;
use image::DynamicImage;
use std::collections::{HashMap, VecDeque};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::DiplomaError;

/// Anything that can turn a background URL into pixels.
#[async_trait]
pub trait BackgroundSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, DiplomaError>;
}

/// Decoded backgrounds kept per source.
const CACHE_CAPACITY: usize = 16;

/// Decoded images by URL, oldest evicted first.
#[derive(Default)]
struct ImageCache {
    images: HashMap<String, DynamicImage>,
    order: VecDeque<String>,
}

impl ImageCache {
    fn get(&self, url: &str) -> Option<&DynamicImage> {
        self.images.get(url)
    }

    fn insert(&mut self, url: String, image: DynamicImage) {
        if self.images.contains_key(&url) {
            return;
        }
        while self.order.len() >= CACHE_CAPACITY {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.images.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(url.clone());
        self.images.insert(url, image);
    }
}

/// Fetches `http(s)://` URLs over the network and paths under the public
/// upload prefix (or bare relative paths) from the local uploads directory.
/// Paths that would leave the uploads directory are refused, and `file://`
/// URLs are only read when enabled with [`HttpBackgroundSource::allow_file_urls`].
pub struct HttpBackgroundSource {
    client: reqwest::Client,
    uploads_dir: PathBuf,
    public_base: String,
    file_urls: bool,
    cache: Arc<RwLock<ImageCache>>,
}

impl HttpBackgroundSource {
    pub fn new(config: &Config) -> Result<Self, DiplomaError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("diploma/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DiplomaError::Transport(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            uploads_dir: config.uploads_dir.clone(),
            public_base: config.public_base_url.trim_end_matches('/').to_string(),
            file_urls: false,
            cache: Arc::new(RwLock::new(ImageCache::default())),
        })
    }

    /// Also read `file://` URLs. For local tools only, never for a server
    /// that takes URLs from its clients.
    pub fn allow_file_urls(mut self) -> Self {
        self.file_urls = true;
        self
    }

    /// Local file a non-HTTP URL refers to.
    fn local_path(&self, url: &str) -> Result<PathBuf, DiplomaError> {
        if let Some(path) = url.strip_prefix("file://") {
            if self.file_urls {
                return Ok(PathBuf::from(path));
            }
            return Err(DiplomaError::Transport(format!(
                "file URLs are not accepted: {}",
                url
            )));
        }
        let relative = Path::new(
            url.strip_prefix(&self.public_base)
                .filter(|_| !self.public_base.is_empty())
                .unwrap_or(url)
                .trim_start_matches('/'),
        );
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside || relative.as_os_str().is_empty() {
            return Err(DiplomaError::Transport(format!(
                "background path outside the uploads directory: {}",
                url
            )));
        }
        Ok(self.uploads_dir.join(relative))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, DiplomaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DiplomaError::Transport(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(DiplomaError::Transport(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DiplomaError::Transport(format!("Failed to read {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, DiplomaError> {
    tokio::fs::read(path).await.map_err(|e| {
        DiplomaError::Transport(format!("Failed to read {}: {}", path.display(), e))
    })
}

#[async_trait]
impl BackgroundSource for HttpBackgroundSource {
    async fn fetch(&self, url: &str) -> Result<DynamicImage, DiplomaError> {
        if let Some(image) = self.cache.read().await.get(url) {
            return Ok(image.clone());
        }

        let bytes = if url.starts_with("http://") || url.starts_with("https://") {
            self.download(url).await?
        } else {
            read_local(&self.local_path(url)?).await?
        };
        let image = image::load_from_memory(&bytes)
            .map_err(|e| DiplomaError::Image(format!("Failed to decode {}: {}", url, e)))?;

        self.cache
            .write()
            .await
            .insert(url.to_string(), image.clone());
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    fn source(dir: &Path) -> HttpBackgroundSource {
        let config = Config {
            uploads_dir: dir.to_path_buf(),
            ..Config::default()
        };
        HttpBackgroundSource::new(&config).unwrap()
    }

    fn secret_png(dir: &Path) -> PathBuf {
        let path = dir.join("secret.png");
        RgbImage::new(4, 4)
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_local_path_mapping() {
        let s = source(Path::new("/srv/uploads"));
        assert_eq!(s.local_path("/uploads/a.png").unwrap(), PathBuf::from("/srv/uploads/a.png"));
        assert_eq!(s.local_path("b.jpg").unwrap(), PathBuf::from("/srv/uploads/b.jpg"));
        assert!(s.local_path("/uploads/../etc/passwd").is_err());
        assert!(s.local_path("sub/../../x.png").is_err());
        assert!(s.local_path("/uploads/").is_err());
        assert!(s.local_path("file:///tmp/c.png").is_err());

        let cli = source(Path::new("/srv/uploads")).allow_file_urls();
        assert_eq!(cli.local_path("file:///tmp/c.png").unwrap(), PathBuf::from("/tmp/c.png"));
    }

    #[tokio::test]
    async fn test_files_outside_uploads_are_refused() {
        let root = tempfile::tempdir().unwrap();
        let uploads = root.path().join("uploads");
        std::fs::create_dir_all(&uploads).unwrap();
        let secret = secret_png(root.path());
        let s = source(&uploads);

        let err = s.fetch("/uploads/../secret.png").await.unwrap_err();
        assert!(matches!(err, DiplomaError::Transport(_)));
        let file_url = format!("file://{}", secret.display());
        assert!(s.fetch(&file_url).await.is_err());
    }

    #[test]
    fn test_cache_is_bounded() {
        let mut cache = ImageCache::default();
        for i in 0..CACHE_CAPACITY + 5 {
            cache.insert(format!("/uploads/{}.png", i), DynamicImage::new_rgb8(1, 1));
        }
        assert_eq!(cache.images.len(), CACHE_CAPACITY);
        assert!(cache.get("/uploads/0.png").is_none());
        assert!(cache.get(&format!("/uploads/{}.png", CACHE_CAPACITY + 4)).is_some());
    }

    #[tokio::test]
    async fn test_fetch_local_upload() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::new(8, 6)
            .save_with_format(dir.path().join("bg.png"), ImageFormat::Png)
            .unwrap();
        let s = source(dir.path());
        let img = s.fetch("/uploads/bg.png").await.unwrap();
        assert_eq!((img.width(), img.height()), (8, 6));
    }

    #[tokio::test]
    async fn test_missing_file_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = source(dir.path()).fetch("/uploads/none.png").await.unwrap_err();
        assert!(matches!(err, DiplomaError::Transport(_)));
    }
}
