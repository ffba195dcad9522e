//! Selection state for a vehicle photo gallery.
//!
//! Selection is tracked by image id, never by position, so replacing the
//! image list can never leave the selection pointing at the wrong photo.

use crate::images::{primary_of, NormalizedImage};

/// Main-image selection over a list of normalized images.
#[derive(Debug, Clone, Default)]
pub struct GallerySelection {
    images: Vec<NormalizedImage>,
    selected: Option<String>,
}

impl GallerySelection {
    pub fn new(images: Vec<NormalizedImage>) -> Self {
        let mut gallery = Self::default();
        gallery.set_images(images);
        gallery
    }

    /// Replace the image list and reselect its primary image.
    pub fn set_images(&mut self, images: Vec<NormalizedImage>) {
        self.selected = primary_of(&images).map(|img| img.id.clone());
        self.images = images;
    }

    /// Select an image by id. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: &str) -> bool {
        if self.images.iter().any(|img| img.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) {
        self.step(1);
    }

    pub fn prev(&mut self) {
        self.step(-1);
    }

    fn step(&mut self, delta: isize) {
        let len = self.images.len();
        if len <= 1 {
            return;
        }
        let current = self.current_index().unwrap_or(0) as isize;
        let target = (current + delta).rem_euclid(len as isize) as usize;
        self.selected = Some(self.images[target].id.clone());
    }

    fn current_index(&self) -> Option<usize> {
        let id = self.selected.as_deref()?;
        self.images.iter().position(|img| img.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_image(&self) -> Option<&NormalizedImage> {
        self.current_index().map(|i| &self.images[i])
    }

    /// 1-based position of the selection and the total, e.g. `(3, 12)`.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current_index().map(|i| (i + 1, self.images.len()))
    }

    pub fn images(&self) -> &[NormalizedImage] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
