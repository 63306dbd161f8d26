//! Image presence check and pull

use std::sync::Arc;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use crate::config::normalize_reference;
use crate::runtime::{ensure_active, RuntimeGateway};
use crate::{Error, Result};
use crate::error::ClientError;

/// Makes sure an image is available locally before a container needs it.
pub struct ImageResolver<G> {
    gateway: Arc<G>,
}

impl<G: RuntimeGateway> ImageResolver<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Return once `image` is present locally, pulling it if needed.
    pub async fn ensure_image(&self, cancel: &CancellationToken, image: &str) -> Result<()> {
        ensure_active(cancel, "image check")?;

        let wanted = normalize_reference(image);
        let local = self.gateway.list_images(cancel).await?;
        if local.iter().any(|tag| normalize_reference(tag) == wanted) {
            tracing::debug!(image, "Image present locally");
            return Ok(());
        }

        ensure_active(cancel, "image pull")?;
        tracing::info!(image, "Pulling image");

        // TODO: pass registry credentials for private repositories
        let mut stream = self.gateway.pull_image(cancel, image).await?;
        let mut records = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!(image, records, "Received shutdown command during pull");
                    return Err(Error::cancelled("image pull"));
                }
                next = stream.next() => next,
            };

            let Some(item) = next else { break };
            let progress = item.map_err(|source| pull_error(image, source))?;
            records += 1;

            if let Some(message) = progress.error {
                return Err(pull_error(image, ClientError::Other(message)));
            }
            tracing::debug!(
                image,
                layer = progress.layer.as_deref().unwrap_or("-"),
                status = progress.status.as_deref().unwrap_or(""),
                progress = progress.progress.as_deref().unwrap_or(""),
                "Pull progress"
            );
        }

        tracing::info!(image, records, "Image pulled");
        Ok(())
    }
}

fn pull_error(image: &str, source: ClientError) -> Error {
    Error::ImageResolution {
        op: "pull",
        image: Some(image.to_string()),
        source,
    }
}
