//! Token image blobs
//!
//! Uploaded logos are kept as data-URI strings under `token-image-<id>` and
//! handed out as `/api/images/tokens/<id>` references. The id is the
//! sanitized label plus the upload time in milliseconds.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::error::{LaunchpadError, Result};
use crate::models::token::{slugify, PLACEHOLDER_IMAGE};
use crate::storage::{KeyValueStore, IMAGE_KEY_PREFIX};

/// Path prefix of references produced by [`ImageStore::upload`]
pub const IMAGE_REFERENCE_PREFIX: &str = "/api/images/tokens/";

pub struct ImageStore {
    store: Arc<dyn KeyValueStore>,
}

impl ImageStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store `content` and return a reference to it.
    ///
    /// If the store refuses the write the content itself is returned, so the
    /// caller still ends up with something displayable.
    pub fn upload(&self, content: &str, label: &str) -> Result<String> {
        if content.is_empty() {
            return Err(LaunchpadError::MissingInput("No file provided".to_string()));
        }

        let id = format!("{}-{}", slugify(label), Utc::now().timestamp_millis());
        let key = format!("{}{}", IMAGE_KEY_PREFIX, id);

        if let Err(e) = self.store.set(&key, content) {
            error!("Error storing image: {}", e);
            return Ok(content.to_string());
        }

        info!("🖼️ Stored image {} ({} bytes)", id, content.len());
        Ok(format!("{}{}", IMAGE_REFERENCE_PREFIX, id))
    }

    /// Delete the blob behind one of our references. Anything else, including
    /// content handed back by a failed upload, is left alone.
    pub fn discard(&self, reference: &str) {
        let Some(rest) = reference.strip_prefix(IMAGE_REFERENCE_PREFIX) else {
            return;
        };
        let id = rest.rsplit('/').next().unwrap_or_default();
        if id.is_empty() {
            return;
        }

        match self.store.remove(&format!("{}{}", IMAGE_KEY_PREFIX, id)) {
            Ok(()) => debug!("Discarded image {}", id),
            Err(e) => error!("Error removing image {}: {}", id, e),
        }
    }

    /// Encode raw image bytes as a base64 data URI and upload it.
    pub fn upload_bytes(&self, bytes: &[u8], mime: &str, label: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(LaunchpadError::MissingInput("No file provided".to_string()));
        }
        if !mime.starts_with("image/") {
            return Err(LaunchpadError::InvalidInput(format!("Not an image type: {}", mime)));
        }
        let content = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
        self.upload(&content, label)
    }

    /// Stored content for a reference, or the placeholder image path when
    /// the reference is foreign, malformed or unknown.
    pub fn resolve(&self, reference: &str) -> String {
        let Some(rest) = reference.strip_prefix(IMAGE_REFERENCE_PREFIX) else {
            return PLACEHOLDER_IMAGE.to_string();
        };
        let id = rest.rsplit('/').next().unwrap_or_default();
        if id.is_empty() {
            return PLACEHOLDER_IMAGE.to_string();
        }

        match self.store.get(&format!("{}{}", IMAGE_KEY_PREFIX, id)) {
            Ok(Some(content)) => content,
            Ok(None) => PLACEHOLDER_IMAGE.to_string(),
            Err(e) => {
                error!("Error retrieving image: {}", e);
                PLACEHOLDER_IMAGE.to_string()
            }
        }
    }

    /// What to show for a token's `image_url`: stored content for our own
    /// references, anything else passed through unchanged.
    pub fn display_url(&self, image_url: &str) -> String {
        if image_url.starts_with(IMAGE_REFERENCE_PREFIX) {
            self.resolve(image_url)
        } else {
            image_url.to_string()
        }
    }
}

/// Split a `data:<mime>;base64,<payload>` string into its type and bytes.
pub fn decode_data_uri(content: &str) -> Option<(String, Vec<u8>)> {
    let rest = content.strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;

    match STANDARD.decode(payload.trim()) {
        Ok(bytes) => Some((mime.to_string(), bytes)),
        Err(e) => {
            warn!("Stored image is not valid base64: {}", e);
            None
        }
    }
}
