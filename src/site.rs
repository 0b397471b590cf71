//! URL layout of the Olympic reference site.

use crate::error::DiscoveryError;
use url::Url;

/// Default base of the Olympics section.
pub const DEFAULT_BASE_URL: &str = "https://www.sports-reference.com/olympics/";

/// Builds the fixed set of page URLs the scraper visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    base: Url,
}

impl Site {
    /// Site rooted at `base`. A trailing slash is added when missing so joins stay inside the
    /// Olympics section.
    pub fn new(base: &str) -> Result<Self, DiscoveryError> {
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let base = Url::parse(&normalized).map_err(|source| DiscoveryError::Url {
            url: normalized.clone(),
            source,
        })?;
        Ok(Self { base })
    }

    /// Base URL of the Olympics section.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// NOC entry page listing every Games appearance.
    pub fn entry_url(&self, noc: &str) -> String {
        format!("{}countries/{}/", self.base, noc.trim().to_ascii_uppercase())
    }

    /// Page listing the NOC's athletes at one Games.
    pub fn games_url(&self, noc: &str, season: &str, year: i32) -> String {
        format!("{}{season}/{year}", self.entry_url(noc))
    }

    /// Canonical athlete page from the two trailing segments of an athlete href.
    pub fn athlete_url(&self, bucket: &str, page: &str) -> String {
        format!("{}athletes/{bucket}/{page}", self.base)
    }

    /// Resolves an href found on a site page against the base.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.base.join(href).ok()
    }
}

impl Default for Site {
    fn default() -> Self {
        Self {
            base: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_site_urls() {
        let site = Site::default();
        assert_eq!(
            site.entry_url("afg"),
            "https://www.sports-reference.com/olympics/countries/AFG/"
        );
        assert_eq!(
            site.games_url("AFG", "summer", 1936),
            "https://www.sports-reference.com/olympics/countries/AFG/summer/1936"
        );
        assert_eq!(
            site.athlete_url("ab", "abdul-wahab-1.html"),
            "https://www.sports-reference.com/olympics/athletes/ab/abdul-wahab-1.html"
        );
    }

    #[test]
    fn adds_trailing_slash_to_base() {
        let site = Site::new("http://mirror.test/olympics").expect("valid base");
        assert_eq!(site.entry_url("KOR"), "http://mirror.test/olympics/countries/KOR/");
    }
}
