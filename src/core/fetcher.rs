use std::collections::HashMap;
use std::path::PathBuf;

use image::RgbaImage;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::utils::error::{CardsError, Result};
use crate::utils::validation;

/// Downloads sprite sheets with a persistent disk cache and an in-run memo.
/// Every card in a deck shares the same sheet URL, so the memo saves repeated
/// disk reads and decodes within one conversion.
pub struct ImageFetcher {
    client: Client,
    cache_dir: PathBuf,
    memo: Mutex<HashMap<String, RgbaImage>>,
}

impl ImageFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            cache_dir: cache_dir.into(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// 下載或讀取快取的圖片;黑名單中的 URL 回傳 None
    pub async fn fetch(&self, url: &str, blacklist: &[String]) -> Result<Option<RgbaImage>> {
        if blacklist.iter().any(|entry| entry == url) {
            tracing::debug!("Skipping URL (blacklisted): {}", url);
            return Ok(None);
        }

        {
            let memo = self.memo.lock().await;
            if let Some(image) = memo.get(url) {
                return Ok(Some(image.clone()));
            }
        }

        let image = match self.load_cached(url)? {
            Some(image) => image,
            None => self.download(url).await?,
        };

        let mut memo = self.memo.lock().await;
        memo.insert(url.to_string(), image.clone());
        Ok(Some(image))
    }

    /// Cache file name is the URL with separator characters stripped.
    fn cache_file_stem(url: &str) -> String {
        url.chars()
            .filter(|c| !matches!(c, ':' | '/' | '.' | '-'))
            .collect()
    }

    fn load_cached(&self, url: &str) -> Result<Option<RgbaImage>> {
        let stem = Self::cache_file_stem(url);
        for ext in ["png", "jpg"] {
            let path = self.cache_dir.join(format!("{}.{}", stem, ext));
            if path.exists() {
                tracing::debug!("Using cached image: {}", path.display());
                return Ok(Some(image::open(&path)?.to_rgba8()));
            }
        }
        Ok(None)
    }

    async fn download(&self, url: &str) -> Result<RgbaImage> {
        validation::validate_url("image_url", url)?;

        tracing::debug!("Downloading image: {}", url);
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CardsError::ProcessingError {
                message: format!(
                    "image download failed with status {} for {}",
                    response.status(),
                    url
                ),
            });
        }
        let bytes = response.bytes().await?;
        let image = image::load_from_memory(&bytes)?.to_rgba8();

        std::fs::create_dir_all(&self.cache_dir)?;
        let cache_path = self
            .cache_dir
            .join(format!("{}.png", Self::cache_file_stem(url)));
        image.save_with_format(&cache_path, image::ImageFormat::Png)?;
        tracing::info!("Saved PNG image to cache: {}", cache_path.display());

        Ok(image)
    }
}
