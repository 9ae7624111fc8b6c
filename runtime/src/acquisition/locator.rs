//! Resolves a subject's detail link to its requirements sub-page.

use std::sync::{Arc, LazyLock};

use handbook_requisites::text::{element_text, selector};
use scraper::{Html, Selector};
use url::Url;

use super::error::{HarvestError, HarvestResult};
use super::http_client::{resolve_url, Fetcher};

/// Path segment identifying a requirements sub-page.
pub const REQUIREMENTS_MARKER: &str = "eligibility-and-requirements";

/// Visible text of the overview page's link to the requirements sub-page.
pub const REQUIREMENTS_LINK_TEXT: &str = "Eligibility and requirements";

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

#[derive(Clone)]
pub struct RequirementLocator {
    fetcher: Arc<dyn Fetcher>,
    base: Url,
}

impl RequirementLocator {
    pub fn new(fetcher: Arc<dyn Fetcher>, base: Url) -> Self {
        Self { fetcher, base }
    }

    /// Href of the requirements page for the subject at `href`. Fetches the
    /// overview page only when `href` is not already a requirements page.
    pub async fn locate(&self, href: &str) -> HarvestResult<String> {
        if href.contains(REQUIREMENTS_MARKER) {
            return Ok(href.to_string());
        }
        let url = resolve_url(&self.base, href)?;
        let html = self.fetcher.fetch(&url).await?;
        find_requirements_href(&html)
            .ok_or_else(|| HarvestError::NotFound(format!("no requirements link on {href}")))
    }
}

/// Href of the first anchor whose text is exactly the requirements link text.
pub fn find_requirements_href(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&ANCHOR)
        .find(|a| element_text(a) == REQUIREMENTS_LINK_TEXT)
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::error::FetchError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct OnePage {
        body: String,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Fetcher for OnePage {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn locator(body: &str) -> (RequirementLocator, Arc<OnePage>) {
        let fetcher = Arc::new(OnePage {
            body: body.to_string(),
            requested: Mutex::new(Vec::new()),
        });
        let base = Url::parse("https://handbook.example.edu").unwrap();
        (RequirementLocator::new(fetcher.clone(), base), fetcher)
    }

    const OVERVIEW: &str = r#"
        <nav>
          <a href="/2024/subjects/comp10001">Overview</a>
          <a href="/2024/subjects/comp10001/eligibility-and-requirements">
            Eligibility and requirements
          </a>
          <a href="/2024/subjects/comp10001/assessment">Assessment</a>
        </nav>"#;

    #[test]
    fn test_find_requirements_href() {
        assert_eq!(
            find_requirements_href(OVERVIEW).as_deref(),
            Some("/2024/subjects/comp10001/eligibility-and-requirements")
        );
    }

    #[test]
    fn test_find_requirements_href_exact_text() {
        let html = r#"<a href="/x">Eligibility and requirements (2023)</a>"#;
        assert!(find_requirements_href(html).is_none());
    }

    #[tokio::test]
    async fn test_locate_passthrough_skips_fetch() {
        let (locator, fetcher) = locator(OVERVIEW);
        let href = "/2024/subjects/comp10001/eligibility-and-requirements";
        assert_eq!(locator.locate(href).await.unwrap(), href);
        assert!(fetcher.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_locate_follows_overview() {
        let (locator, fetcher) = locator(OVERVIEW);
        let found = locator.locate("/2024/subjects/comp10001").await.unwrap();
        assert_eq!(found, "/2024/subjects/comp10001/eligibility-and-requirements");
        assert_eq!(
            fetcher.requested.lock().unwrap().as_slice(),
            ["https://handbook.example.edu/2024/subjects/comp10001"]
        );
    }

    #[tokio::test]
    async fn test_locate_missing_link() {
        let (locator, _) = locator("<p>No links</p>");
        let err = locator.locate("/2024/subjects/comp10001").await.unwrap_err();
        assert!(matches!(err, HarvestError::NotFound(_)));
    }
}
