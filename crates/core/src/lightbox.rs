//! Full-screen lightbox over a [`GallerySelection`].
//!
//! Keyboard handling is scoped to the open lightbox: opening acquires a
//! [`KeyListenerGuard`] from the shared [`KeyEventChannel`], and the guard
//! releases the channel when it is dropped, whichever way the lightbox goes
//! away.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::gallery::GallerySelection;

/// Keys the lightbox reacts to. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowRight,
    ArrowLeft,
    Other,
}

impl Key {
    /// Map a DOM-style key name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" => Self::Escape,
            "ArrowRight" => Self::ArrowRight,
            "ArrowLeft" => Self::ArrowLeft,
            _ => Self::Other,
        }
    }
}

/// What a click landed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Backdrop,
    Content,
    CloseButton,
    Thumbnail(String),
}

/// A document-level key event source. Counts live listeners.
#[derive(Debug, Clone, Default)]
pub struct KeyEventChannel {
    listeners: Arc<AtomicUsize>,
}

impl KeyEventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the guard is dropped.
    pub fn attach(&self) -> KeyListenerGuard {
        self.listeners.fetch_add(1, Ordering::SeqCst);
        KeyListenerGuard {
            listeners: Arc::clone(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }
}

/// Keeps a key listener registered on its channel while alive.
#[derive(Debug)]
pub struct KeyListenerGuard {
    listeners: Arc<AtomicUsize>,
}

impl Drop for KeyListenerGuard {
    fn drop(&mut self) {
        self.listeners.fetch_sub(1, Ordering::SeqCst);
    }
}

/// What the overlay should currently render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxView<'a> {
    pub full_url: &'a str,
    pub position: usize,
    pub total: usize,
}

/// Lightbox overlay. Navigation operates on the wrapped gallery so the
/// inline gallery and the overlay always agree on the selection.
#[derive(Debug, Default)]
pub struct Lightbox {
    listener: Option<KeyListenerGuard>,
}

impl Lightbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.listener.is_some()
    }

    /// Open over the gallery's current selection. Returns `false` (and stays
    /// closed) when the gallery is empty.
    pub fn open(&mut self, gallery: &GallerySelection, channel: &KeyEventChannel) -> bool {
        if gallery.is_empty() {
            return false;
        }
        if self.listener.is_none() {
            self.listener = Some(channel.attach());
        }
        true
    }

    pub fn close(&mut self) {
        self.listener = None;
    }

    pub fn handle_key(&mut self, gallery: &mut GallerySelection, key: Key) {
        if !self.is_open() {
            return;
        }
        match key {
            Key::Escape => self.close(),
            Key::ArrowRight => gallery.next(),
            Key::ArrowLeft => gallery.prev(),
            Key::Other => {}
        }
    }

    pub fn handle_click(&mut self, gallery: &mut GallerySelection, target: ClickTarget) {
        if !self.is_open() {
            return;
        }
        match target {
            ClickTarget::Backdrop | ClickTarget::CloseButton => self.close(),
            ClickTarget::Content => {}
            ClickTarget::Thumbnail(id) => {
                gallery.select(&id);
            }
        }
    }

    /// Full-size URL and counter for the current selection, while open.
    pub fn view<'g>(&self, gallery: &'g GallerySelection) -> Option<LightboxView<'g>> {
        if !self.is_open() {
            return None;
        }
        let image = gallery.selected_image()?;
        let (position, total) = gallery.position()?;
        Some(LightboxView {
            full_url: &image.full_url,
            position,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{normalize_images, RawImage};

    fn gallery(ids: &[&str]) -> GallerySelection {
        let raw = ids.iter().map(|id| RawImage::Url(format!("/{id}.jpg")));
        GallerySelection::new(normalize_images(raw).images)
    }

    #[test]
    fn open_requires_images() {
        let channel = KeyEventChannel::new();
        let mut lb = Lightbox::new();
        assert!(!lb.open(&gallery(&[]), &channel));
        assert!(!lb.is_open());
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn listener_lives_only_while_open() {
        let channel = KeyEventChannel::new();
        let mut g = gallery(&["a", "b"]);
        let mut lb = Lightbox::new();

        assert!(lb.open(&g, &channel));
        assert_eq!(channel.listener_count(), 1);
        // Reopening does not stack listeners.
        lb.open(&g, &channel);
        assert_eq!(channel.listener_count(), 1);

        lb.handle_key(&mut g, Key::Escape);
        assert!(!lb.is_open());
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn dropping_open_lightbox_releases_listener() {
        let channel = KeyEventChannel::new();
        let g = gallery(&["a"]);
        {
            let mut lb = Lightbox::new();
            lb.open(&g, &channel);
            assert_eq!(channel.listener_count(), 1);
        }
        assert_eq!(channel.listener_count(), 0);
    }

    #[test]
    fn arrow_keys_navigate_and_view_tracks_selection() {
        let channel = KeyEventChannel::new();
        let mut g = gallery(&["a", "b", "c"]);
        let mut lb = Lightbox::new();
        lb.open(&g, &channel);

        let view = lb.view(&g).unwrap();
        assert_eq!((view.full_url, view.position, view.total), ("/a.jpg", 1, 3));

        lb.handle_key(&mut g, Key::ArrowLeft);
        assert_eq!(lb.view(&g).unwrap().full_url, "/c.jpg");
        lb.handle_key(&mut g, Key::ArrowRight);
        lb.handle_key(&mut g, Key::ArrowRight);
        assert_eq!(lb.view(&g).unwrap().position, 2);
        lb.handle_key(&mut g, Key::from_name("Enter"));
        assert_eq!(g.selected_id(), Some("/b.jpg"));
    }

    #[test]
    fn keys_ignored_while_closed() {
        let mut g = gallery(&["a", "b"]);
        let mut lb = Lightbox::new();
        lb.handle_key(&mut g, Key::ArrowRight);
        assert_eq!(g.selected_id(), Some("/a.jpg"));
        assert!(lb.view(&g).is_none());
    }

    #[test]
    fn clicks() {
        let channel = KeyEventChannel::new();
        let mut g = gallery(&["a", "b"]);
        let mut lb = Lightbox::new();
        lb.open(&g, &channel);

        lb.handle_click(&mut g, ClickTarget::Content);
        assert!(lb.is_open());

        lb.handle_click(&mut g, ClickTarget::Thumbnail("/b.jpg".into()));
        assert_eq!(g.selected_id(), Some("/b.jpg"));

        lb.handle_click(&mut g, ClickTarget::Backdrop);
        assert!(!lb.is_open());

        lb.open(&g, &channel);
        lb.handle_click(&mut g, ClickTarget::CloseButton);
        assert!(!lb.is_open());
        assert_eq!(channel.listener_count(), 0);
    }
}
