use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{ColorScheme, Image, RandomImage};
use crate::repository::ImageStore;
use crate::storage::BlobStore;

/// Public gallery
pub struct GalleryService;

impl GalleryService {
    /// Pick one published image at random.
    /// Query errors and an empty pool are logged and yield `None`.
    pub async fn show_random_published(
        images: &dyn ImageStore,
        blobs: &dyn BlobStore,
    ) -> Option<RandomImage> {
        let published = match images.list_published().await {
            Ok(published) => published,
            Err(e) => {
                tracing::error!("Error loading published images: {}", e);
                return None;
            }
        };

        let picked = Self::pick(&published, &mut rand::thread_rng());
        match picked {
            Some(image) => Some(Self::display(image, blobs)),
            None => {
                tracing::info!("No published images to show");
                None
            }
        }
    }

    /// Uniform choice over `images`
    pub fn pick<'a, R: Rng + ?Sized>(images: &'a [Image], rng: &mut R) -> Option<&'a Image> {
        images.choose(rng)
    }

    pub fn display(image: &Image, blobs: &dyn BlobStore) -> RandomImage {
        RandomImage {
            id: image.id.clone(),
            url: blobs.public_url(&image.storage_path),
            filename: image.filename.clone(),
            color_scheme: if image.dark {
                ColorScheme::Dark
            } else {
                ColorScheme::Light
            },
        }
    }
}
