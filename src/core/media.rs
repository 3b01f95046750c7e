use serde::{Deserialize, Serialize};

/// Extensions treated as video when no configuration overrides them.
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "webm", "mov"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a URL by the extension of its path component.
    ///
    /// Query strings and fragments are ignored and the comparison is
    /// case-insensitive, so `clip.MP4?v=2#t=3` is a video.
    pub fn detect<S: AsRef<str>>(url: &str, video_extensions: &[S]) -> Self {
        let path = url
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or(url);
        let file_name = path.rsplit('/').next().unwrap_or(path);

        let extension = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return MediaKind::Image,
        };

        if video_extensions
            .iter()
            .any(|candidate| candidate.as_ref().eq_ignore_ascii_case(&extension))
        {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    url: String,
    kind: MediaKind,
}

impl MediaItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_extensions(url, &DEFAULT_VIDEO_EXTENSIONS)
    }

    pub fn with_extensions<S: AsRef<str>>(url: impl Into<String>, video_extensions: &[S]) -> Self {
        let url = url.into();
        let kind = MediaKind::detect(&url, video_extensions);
        Self { url, kind }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaListError {
    #[error("a media list needs at least one item")]
    Empty,
}

/// Ordered, non-empty list of media handed to one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaList {
    items: Vec<MediaItem>,
}

impl MediaList {
    pub fn new<I, S>(urls: I) -> Result<Self, MediaListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_extensions(urls, &DEFAULT_VIDEO_EXTENSIONS)
    }

    pub fn with_extensions<I, S, E>(urls: I, video_extensions: &[E]) -> Result<Self, MediaListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        E: AsRef<str>,
    {
        let items: Vec<MediaItem> = urls
            .into_iter()
            .map(|url| MediaItem::with_extensions(url, video_extensions))
            .collect();

        if items.is_empty() {
            return Err(MediaListError::Empty);
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaItem> {
        self.items.iter()
    }

    /// Wrap `index + step` into `[0, len)`. Negative steps retreat.
    pub fn wrap(&self, index: usize, step: isize) -> usize {
        let len = self.items.len() as isize;
        ((index as isize + step % len + len) % len) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_detection_by_extension() {
        assert_eq!(MediaItem::new("/media/reel.mp4").kind(), MediaKind::Video);
        assert_eq!(MediaItem::new("https://cdn.example.com/a/b/intro.webm").kind(), MediaKind::Video);
        assert_eq!(MediaItem::new("clips/party.MOV").kind(), MediaKind::Video);
        assert_eq!(MediaItem::new("gallery/stage.jpg").kind(), MediaKind::Image);
        assert_eq!(MediaItem::new("gallery/stage.png").kind(), MediaKind::Image);
    }

    #[test]
    fn test_query_and_fragment_are_ignored() {
        assert_eq!(MediaItem::new("/v/reel.mp4?token=abc").kind(), MediaKind::Video);
        assert_eq!(MediaItem::new("/v/reel.webm#t=10").kind(), MediaKind::Video);
        // The extension has to be on the path, not in the query
        assert_eq!(MediaItem::new("/image?src=reel.mp4").kind(), MediaKind::Image);
    }

    #[test]
    fn test_names_without_extension_are_images() {
        assert_eq!(MediaItem::new("https://cdn.example.com/photo").kind(), MediaKind::Image);
        assert_eq!(MediaItem::new("/media/.mp4").kind(), MediaKind::Image);
        assert_eq!(MediaItem::new("").kind(), MediaKind::Image);
    }

    #[test]
    fn test_custom_extensions() {
        let item = MediaItem::with_extensions("loop.mkv", &["mkv"]);
        assert!(item.is_video());
        let item = MediaItem::with_extensions("loop.mp4", &["mkv"]);
        assert!(!item.is_video());
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let result = MediaList::new(Vec::<String>::new());
        assert_eq!(result, Err(MediaListError::Empty));
    }

    #[test]
    fn test_wrap_is_cyclic_in_both_directions() {
        let list = MediaList::new(["a.jpg", "b.mp4", "c.jpg"]).unwrap();
        assert_eq!(list.wrap(2, 1), 0);
        assert_eq!(list.wrap(0, -1), 2);
        assert_eq!(list.wrap(1, 7), 2);
        assert_eq!(list.wrap(1, -7), 0);
    }
}
