//! Vehicle image ingestion and normalization.
//!
//! Image records reach us in several shapes: bare URL strings from the
//! legacy `photo_urls` column and CSV imports, and objects whose URL keys
//! vary by producer (`clean`/`display`/`full` from the cleaning pipeline,
//! `url`/`thumbnail_url` from admin uploads). Each record is resolved once
//! into an [`ImageSource`] and then flattened into a [`NormalizedImage`]
//! with one URL per rendering role and a stable identifier.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

// ── Raw wire shapes ──────────────────────────────────────────────────

/// An image record exactly as it arrives: a URL string or a loose object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawImage {
    Url(String),
    Record(RawImageRecord),
}

/// Loose object form of an image. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawImageRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub clean: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub full: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// Accept `"id": 17` as well as `"id": "17"`.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ── Resolved source ──────────────────────────────────────────────────

/// Candidate URLs of a rich image record. Blank strings are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUrls {
    pub url: Option<String>,
    pub clean: Option<String>,
    pub display: Option<String>,
    pub full: Option<String>,
    pub thumb: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// An image record after ingestion. The shape check happens here, once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A bare URL string.
    Legacy { url: String },
    /// An object with any subset of identity and URL keys.
    Rich {
        id: Option<String>,
        upload_id: Option<String>,
        urls: ImageUrls,
        is_primary: bool,
    },
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn first_of<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates.iter().find_map(|c| c.as_deref())
}

impl From<RawImage> for ImageSource {
    fn from(raw: RawImage) -> Self {
        match raw {
            RawImage::Url(url) => Self::Legacy {
                url: url.trim().to_string(),
            },
            RawImage::Record(rec) => Self::Rich {
                id: non_blank(rec.id),
                upload_id: non_blank(rec.upload_id),
                urls: ImageUrls {
                    url: non_blank(rec.url),
                    clean: non_blank(rec.clean),
                    display: non_blank(rec.display),
                    full: non_blank(rec.full),
                    thumb: non_blank(rec.thumb),
                    thumbnail_url: non_blank(rec.thumbnail_url),
                },
                is_primary: rec.is_primary,
            },
        }
    }
}

impl ImageSource {
    /// Card-sized URL: `clean > display > full > url > thumb > thumbnail_url`.
    pub fn display_url(&self) -> Option<&str> {
        match self {
            Self::Legacy { url } => Some(url.as_str()).filter(|u| !u.is_empty()),
            Self::Rich { urls, .. } => first_of(&[
                &urls.clean,
                &urls.display,
                &urls.full,
                &urls.url,
                &urls.thumb,
                &urls.thumbnail_url,
            ]),
        }
    }

    /// Thumbnail URL: `thumb > thumbnail_url > clean > url`.
    pub fn thumb_url(&self) -> Option<&str> {
        match self {
            Self::Legacy { .. } => self.display_url(),
            Self::Rich { urls, .. } => {
                first_of(&[&urls.thumb, &urls.thumbnail_url, &urls.clean, &urls.url])
            }
        }
    }

    /// Lightbox URL: `full > clean > display > url`.
    pub fn full_url(&self) -> Option<&str> {
        match self {
            Self::Legacy { .. } => self.display_url(),
            Self::Rich { urls, .. } => {
                first_of(&[&urls.full, &urls.clean, &urls.display, &urls.url])
            }
        }
    }

    /// Stable identity: `id > upload_id > url > clean > "img-<index>"`.
    pub fn resolve_id(&self, index: usize) -> String {
        let resolved = match self {
            Self::Legacy { url } => Some(url.as_str()).filter(|u| !u.is_empty()),
            Self::Rich {
                id,
                upload_id,
                urls,
                ..
            } => first_of(&[id, upload_id, &urls.url, &urls.clean]),
        };
        resolved
            .map(str::to_string)
            .unwrap_or_else(|| format!("img-{index}"))
    }

    /// Whether the record itself claims to be primary. A legacy string is
    /// primary only when it is the first entry of its list.
    pub fn is_flagged_primary(&self, index: usize) -> bool {
        match self {
            Self::Legacy { .. } => index == 0,
            Self::Rich { is_primary, .. } => *is_primary,
        }
    }
}

// ── Normalized output ────────────────────────────────────────────────

/// One image with a URL per rendering role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedImage {
    pub id: String,
    pub thumb_url: String,
    pub display_url: String,
    pub full_url: String,
    pub is_primary: bool,
}

/// Result of normalizing an image list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedImages {
    pub images: Vec<NormalizedImage>,
    /// Entries discarded because no display URL could be resolved.
    pub dropped: usize,
}

impl NormalizedImages {
    /// First image flagged primary, else the first image.
    pub fn primary(&self) -> Option<&NormalizedImage> {
        primary_of(&self.images)
    }
}

/// First image flagged primary, else the first image.
pub fn primary_of(images: &[NormalizedImage]) -> Option<&NormalizedImage> {
    images
        .iter()
        .find(|img| img.is_primary)
        .or_else(|| images.first())
}

/// Normalize a list of raw image records.
///
/// Entries without a usable display URL are dropped and counted. Ids that
/// would collide with an earlier entry get a `#<index>` suffix so every
/// key in the output is unique.
pub fn normalize_images<I>(raw: I) -> NormalizedImages
where
    I: IntoIterator<Item = RawImage>,
{
    let sources: Vec<ImageSource> = raw.into_iter().map(ImageSource::from).collect();
    normalize_sources(&sources)
}

/// Normalize already-ingested sources. See [`normalize_images`].
pub fn normalize_sources(sources: &[ImageSource]) -> NormalizedImages {
    let mut out = NormalizedImages::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, source) in sources.iter().enumerate() {
        let Some(display) = source.display_url() else {
            out.dropped += 1;
            continue;
        };

        let mut id = source.resolve_id(index);
        if !seen.insert(id.clone()) {
            id = format!("{id}#{index}");
            seen.insert(id.clone());
        }

        out.images.push(NormalizedImage {
            thumb_url: source.thumb_url().unwrap_or(display).to_string(),
            full_url: source.full_url().unwrap_or(display).to_string(),
            display_url: display.to_string(),
            is_primary: source.is_flagged_primary(index),
            id,
        });
    }

    if out.dropped > 0 {
        tracing::warn!(
            dropped = out.dropped,
            kept = out.images.len(),
            "Dropped image records with no resolvable URL"
        );
    }

    out
}

// ── Persisted shape ──────────────────────────────────────────────────

/// The image shape persisted in the `vehicles.images` JSONB column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub upload_id: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub original_filename: Option<String>,
}

impl StoredImage {
    /// A stored image for a plain URL (CSV import, legacy migration).
    pub fn from_url(url: impl Into<String>, is_primary: bool) -> Self {
        Self {
            upload_id: uuid::Uuid::new_v4().to_string(),
            url: url.into(),
            thumbnail_url: None,
            is_primary,
            original_filename: None,
        }
    }
}

impl From<&StoredImage> for RawImage {
    fn from(img: &StoredImage) -> Self {
        RawImage::Record(RawImageRecord {
            upload_id: Some(img.upload_id.clone()),
            url: Some(img.url.clone()),
            thumbnail_url: img.thumbnail_url.clone(),
            is_primary: img.is_primary,
            ..Default::default()
        })
    }
}

/// Convert a legacy `photo_urls` string array into stored images. The
/// first URL becomes primary.
pub fn migrate_legacy_photo_urls(photo_urls: &[String]) -> Vec<StoredImage> {
    photo_urls
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .enumerate()
        .map(|(i, url)| StoredImage::from_url(url, i == 0))
        .collect()
}
