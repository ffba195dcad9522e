//! "Add vehicle" flow: create the listing, then upload its photos.
//!
//! The two calls are sequential. A photo failure does not undo the
//! vehicle; it is reported on its own so the panel can offer a retry from
//! the vehicle's edit page.

use crate::api::{CreatedVehicle, ListingApi, PhotoFile, UploadedPhotos};
use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoOutcome {
    /// No photos were picked.
    Skipped,
    Uploaded(UploadedPhotos),
    /// The vehicle exists but its photos did not make it.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingOutcome {
    pub vehicle: CreatedVehicle,
    pub photos: PhotoOutcome,
}

impl ListingOutcome {
    pub fn is_complete(&self) -> bool {
        !matches!(self.photos, PhotoOutcome::Failed(_))
    }
}

/// Create a vehicle and attach `photos` to it. Fails only when the vehicle
/// itself could not be created.
pub async fn create_listing<A: ListingApi + ?Sized>(
    api: &A,
    vehicle: &serde_json::Value,
    photos: &[PhotoFile],
) -> Result<ListingOutcome, ClientError> {
    let created = api.create_vehicle(vehicle).await?;
    tracing::info!(vehicle_id = created.id, vin = %created.vin, "Vehicle created");

    let photos = if photos.is_empty() {
        PhotoOutcome::Skipped
    } else {
        match api.upload_photos(created.id, photos).await {
            Ok(uploaded) => PhotoOutcome::Uploaded(uploaded),
            Err(e) => {
                tracing::warn!(vehicle_id = created.id, error = %e, "Photo upload failed after vehicle creation");
                PhotoOutcome::Failed(e.user_message())
            }
        }
    };

    Ok(ListingOutcome {
        vehicle: created,
        photos,
    })
}
