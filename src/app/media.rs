use anyhow::{anyhow, Result};
use image::ImageFormat;
use sha2::{Digest, Sha256};

use crate::infra::storage::ObjectStorage;

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub image_key: String,
    pub image_url: Option<String>,
}

#[derive(Clone)]
pub struct MediaService {
    storage: ObjectStorage,
}

impl MediaService {
    pub fn new(storage: ObjectStorage) -> Self {
        Self { storage }
    }

    /// Validate an uploaded payload as an image and store it under a
    /// content-addressed key, so re-uploads of the same bytes are free.
    pub async fn store_image(&self, data: Vec<u8>) -> Result<StoredImage> {
        let format =
            image::guess_format(&data).map_err(|_| anyhow!("unsupported image format"))?;
        let (ext, content_type) = match format {
            ImageFormat::Jpeg => ("jpg", "image/jpeg"),
            ImageFormat::Png => ("png", "image/png"),
            ImageFormat::WebP => ("webp", "image/webp"),
            ImageFormat::Gif => ("gif", "image/gif"),
            _ => return Err(anyhow!("unsupported image format")),
        };

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let digest = hex::encode(hasher.finalize());
        let image_key = format!("posts/{}.{}", digest, ext);

        self.storage.put_object(&image_key, data, content_type).await?;

        let image_url = self.storage.public_url(&image_key);
        Ok(StoredImage {
            image_key,
            image_url,
        })
    }
}
