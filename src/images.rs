/// Image CDN sizes used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Poster,
    Backdrop,
    Profile,
}

impl ImageSize {
    pub fn segment(&self) -> &'static str {
        match self {
            ImageSize::Poster => "w500",
            ImageSize::Backdrop => "original",
            ImageSize::Profile => "w185",
        }
    }
}

/// Builds absolute image URLs from the relative paths in API records
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
        }
    }

    /// `None` when the record has no image
    pub fn url(&self, size: ImageSize, path: Option<&str>) -> Option<String> {
        let path = path.map(str::trim).filter(|p| !p.is_empty())?;
        Some(format!(
            "{}/{}/{}",
            self.base,
            size.segment(),
            path.trim_start_matches('/')
        ))
    }

    pub fn poster(&self, path: Option<&str>) -> Option<String> {
        self.url(ImageSize::Poster, path)
    }

    pub fn backdrop(&self, path: Option<&str>) -> Option<String> {
        self.url(ImageSize::Backdrop, path)
    }

    pub fn profile(&self, path: Option<&str>) -> Option<String> {
        self.url(ImageSize::Profile, path)
    }
}
