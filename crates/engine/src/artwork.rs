//! Keeps the displayed cover in step with the current track without
//! re-downloading it on every poll.

use async_trait::async_trait;
use image::ImageReader;
use playdeck_core::{ArtworkRef, AssetsConfig, PlaybackSnapshot, TrackId};
use playdeck_surface::ArtworkImage;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait ArtworkFetcher: Send + Sync {
    /// Downloads and decodes the image behind `url`.
    async fn fetch(&self, url: &str) -> Result<ArtworkImage, String>;
}

pub struct HttpArtworkFetcher {
    http: reqwest::Client,
}

impl HttpArtworkFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(request_timeout).build()?,
        })
    }
}

#[async_trait]
impl ArtworkFetcher for HttpArtworkFetcher {
    async fn fetch(&self, url: &str) -> Result<ArtworkImage, String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?
            .error_for_status()
            .map_err(|e| e.to_string())?;
        let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
        decode_image(&bytes)
    }
}

fn decode_image(bytes: &[u8]) -> Result<ArtworkImage, String> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())?;
    let rgba = decoded.to_rgba8();
    Ok(ArtworkImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Displayed {
    Placeholder,
    Rendered(TrackId),
}

/// Decides per poll whether the display needs a different image.
///
/// The identity slot (`rendered`) remembers the last track whose artwork was
/// fetched successfully; it is only ever overwritten by the next successful
/// fetch, so a failed download for a track leaves that track eligible for a
/// retry on the following poll.
pub struct ArtworkResolver<F> {
    fetcher: F,
    placeholder: ArtworkImage,
    min_edge: u32,
    rendered: Option<(TrackId, ArtworkImage)>,
    displayed: Displayed,
}

impl<F: ArtworkFetcher> ArtworkResolver<F> {
    pub fn new(assets: &AssetsConfig, fetcher: F) -> Self {
        Self {
            fetcher,
            placeholder: load_placeholder(assets),
            min_edge: assets.min_artwork_edge,
            rendered: None,
            displayed: Displayed::Placeholder,
        }
    }

    pub fn placeholder(&self) -> &ArtworkImage {
        &self.placeholder
    }

    pub fn last_rendered_id(&self) -> Option<&TrackId> {
        self.rendered.as_ref().map(|(id, _)| id)
    }

    /// Returns the image to put on screen when it should change, `None` when
    /// the current display is already right.
    pub async fn resolve(&mut self, snapshot: &PlaybackSnapshot) -> Option<ArtworkImage> {
        let track = match &snapshot.track {
            Some(track) if !track.artwork.is_empty() => track,
            _ => return self.show_placeholder(),
        };

        if let Some((id, image)) = &self.rendered {
            if *id == track.id {
                // Cache hit: no download; re-show the stored image if the
                // placeholder took over in between.
                if self.displayed == Displayed::Rendered(track.id.clone()) {
                    return None;
                }
                let image = image.clone();
                self.displayed = Displayed::Rendered(track.id.clone());
                return Some(image);
            }
        }

        let chosen = pick_artwork(&track.artwork, self.min_edge)?;
        match self.fetcher.fetch(&chosen.url).await {
            Ok(image) => {
                debug!(track = %track.id, "rendered new artwork");
                self.rendered = Some((track.id.clone(), image.clone()));
                self.displayed = Displayed::Rendered(track.id.clone());
                Some(image)
            }
            Err(err) => {
                warn!(track = %track.id, error = %err, "artwork fetch failed; showing placeholder");
                self.show_placeholder()
            }
        }
    }

    fn show_placeholder(&mut self) -> Option<ArtworkImage> {
        if self.displayed == Displayed::Placeholder {
            return None;
        }
        self.displayed = Displayed::Placeholder;
        Some(self.placeholder.clone())
    }
}

/// Smallest candidate that still meets the minimum edge; the largest
/// available when none does; first listed when no dimensions are reported.
fn pick_artwork(refs: &[ArtworkRef], min_edge: u32) -> Option<&ArtworkRef> {
    if refs.is_empty() {
        return None;
    }

    let edge = |r: &ArtworkRef| match (r.width, r.height) {
        (Some(w), Some(h)) => Some(w.min(h)),
        (Some(w), None) => Some(w),
        (None, Some(h)) => Some(h),
        (None, None) => None,
    };

    refs.iter()
        .filter(|r| edge(r).is_some_and(|e| e >= min_edge))
        .min_by_key(|r| edge(r).unwrap_or(u32::MAX))
        // max_by_key keeps the last of equal candidates; reverse so ties go
        // to the first listed.
        .or_else(|| refs.iter().rev().max_by_key(|r| edge(r).unwrap_or(0)))
}

fn load_placeholder(assets: &AssetsConfig) -> ArtworkImage {
    if let Some(path) = &assets.placeholder_path {
        match load_placeholder_file(path) {
            Ok(image) => return image,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "placeholder image unreadable; using built-in");
            }
        }
    }
    ArtworkImage::solid(64, 64, [0, 0, 0, 255])
}

fn load_placeholder_file(path: &Path) -> Result<ArtworkImage, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    decode_image(&bytes)
}
