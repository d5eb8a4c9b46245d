//! SEO metadata rendered into the shared page layout.

/// Site name used in titles and Open Graph tags.
pub const SITE_NAME: &str = "Beacon";

/// Per-page SEO metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMeta {
    /// Document title, without the site suffix.
    pub title: String,
    /// Meta description and `og:description`.
    pub description: String,
    /// Absolute canonical URL, when the public site URL is configured.
    pub canonical_url: Option<String>,
    /// `og:type` value.
    pub og_type: &'static str,
    /// Ask crawlers not to index the page.
    pub noindex: bool,
}

impl PageMeta {
    /// Create metadata for a regular indexable page.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            canonical_url: None,
            og_type: "website",
            noindex: false,
        }
    }

    /// Set the canonical URL from the site base URL and a path.
    #[must_use]
    pub fn with_canonical(mut self, site_url: Option<&str>, path: &str) -> Self {
        self.canonical_url =
            site_url.map(|base| format!("{}{path}", base.trim_end_matches('/')));
        self
    }

    /// Mark the page as not indexable.
    #[must_use]
    pub const fn noindex(mut self) -> Self {
        self.noindex = true;
        self
    }

    /// Full document title, e.g. `Pricing | Beacon`.
    #[must_use]
    pub fn full_title(&self) -> String {
        if self.title == SITE_NAME {
            return SITE_NAME.to_string();
        }
        format!("{} | {SITE_NAME}", self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_title() {
        assert_eq!(PageMeta::new("Pricing", "d").full_title(), "Pricing | Beacon");
        assert_eq!(PageMeta::new(SITE_NAME, "d").full_title(), "Beacon");
    }

    #[test]
    fn test_with_canonical() {
        let meta = PageMeta::new("Pricing", "d").with_canonical(Some("https://beacon.dev/"), "/pricing");
        assert_eq!(meta.canonical_url.as_deref(), Some("https://beacon.dev/pricing"));

        let meta = PageMeta::new("Pricing", "d").with_canonical(None, "/pricing");
        assert!(meta.canonical_url.is_none());
    }
}
