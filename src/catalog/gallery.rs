//! Image gallery cursor over a listing's photos.

use serde::Serialize;

/// A position in an image list. Navigation wraps around both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gallery<'a> {
    images: &'a [String],
    current: usize,
}

impl<'a> Gallery<'a> {
    /// Cursor at `index`, wrapped into range. Negative indices count from the end.
    pub fn at(images: &'a [String], index: i64) -> Self {
        let current = if images.is_empty() {
            0
        } else {
            index.rem_euclid(images.len() as i64) as usize
        };
        Self { images, current }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn current(&self) -> Option<&'a str> {
        self.images.get(self.current).map(String::as_str)
    }

    pub fn next(self) -> Self {
        Self::at(self.images, self.current as i64 + 1)
    }

    pub fn prev(self) -> Self {
        Self::at(self.images, self.current as i64 - 1)
    }

    pub fn view(&self) -> GalleryView {
        GalleryView {
            image: self.current().map(str::to_string),
            index: self.current,
            position: if self.is_empty() { 0 } else { self.current + 1 },
            total: self.len(),
            prev_index: self.prev().current,
            next_index: self.next().current,
        }
    }
}

/// Serialized gallery state returned to clients.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GalleryView {
    pub image: Option<String>,
    pub index: usize,
    /// 1-based position, 0 when there are no images
    pub position: usize,
    pub total: usize,
    pub prev_index: usize,
    pub next_index: usize,
}
