//! Paginated subject search listing.
//!
//! The search page carries a pagination indicator (`<span>of 313</span>`) and
//! one anchor per subject, with the title and code in the anchor's header and
//! the study period and level in its footer.

use std::sync::{Arc, LazyLock};

use handbook_requisites::text::{element_text, selector};
use handbook_requisites::SubjectStub;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::error::{HarvestError, HarvestResult};
use super::http_client::{resolve_url, Fetcher};

static PAGINATE: LazyLock<Selector> = LazyLock::new(|| selector(".search-results__paginate span"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| selector(".search-result-item__anchor"));
static TITLE: LazyLock<Selector> =
    LazyLock::new(|| selector(".search-result-item__header .search-result-item__name h3"));
static CODE: LazyLock<Selector> = LazyLock::new(|| {
    selector(".search-result-item__header .search-result-item__name span.search-result-item__code")
});
static PERIOD: LazyLock<Selector> =
    LazyLock::new(|| selector(".search-result-item__meta .search-result-item__meta-primary p"));
static LEVEL: LazyLock<Selector> =
    LazyLock::new(|| selector(".search-result-item__meta .search-result-item__meta-secondary p"));

/// Search path for subject listings; pages are 1-based.
pub fn listing_path(page: Option<u32>) -> String {
    match page {
        Some(n) => format!("/search?types[]=subject&page={n}"),
        None => "/search?types[]=subject".to_string(),
    }
}

/// Reads the subject search listing through a [`Fetcher`].
#[derive(Clone)]
pub struct ListingDiscoverer {
    fetcher: Arc<dyn Fetcher>,
    base: Url,
}

impl ListingDiscoverer {
    pub fn new(fetcher: Arc<dyn Fetcher>, base: Url) -> Self {
        Self { fetcher, base }
    }

    /// Total number of listing pages.
    pub async fn page_count(&self) -> HarvestResult<u32> {
        let url = resolve_url(&self.base, &listing_path(None))?;
        let html = self.fetcher.fetch(&url).await?;
        parse_page_count(&html)
    }

    /// Subject stubs on listing page `page`.
    pub async fn subjects_on_page(&self, page: u32) -> HarvestResult<Vec<SubjectStub>> {
        let url = resolve_url(&self.base, &listing_path(Some(page)))?;
        let html = self.fetcher.fetch(&url).await?;
        parse_listing(&html)
    }
}

pub fn parse_page_count(html: &str) -> HarvestResult<u32> {
    let doc = Html::parse_document(html);
    let span = doc
        .select(&PAGINATE)
        .next()
        .ok_or_else(|| HarvestError::Parse("pagination indicator not found".into()))?;
    let text = element_text(&span);
    text.strip_prefix("of")
        .and_then(|n| n.trim().parse::<u32>().ok())
        .ok_or_else(|| HarvestError::Parse(format!("unexpected pagination text {text:?}")))
}

pub fn parse_listing(html: &str) -> HarvestResult<Vec<SubjectStub>> {
    let doc = Html::parse_document(html);
    doc.select(&ITEM).map(parse_item).collect()
}

fn parse_item(item: ElementRef<'_>) -> HarvestResult<SubjectStub> {
    let href = item
        .value()
        .attr("href")
        .ok_or_else(|| HarvestError::Parse("result item without href".into()))?;
    Ok(SubjectStub {
        code: first_text(item, &CODE, "subject code")?,
        title: first_text(item, &TITLE, "subject title")?,
        href: href.to_string(),
        period: first_text(item, &PERIOD, "study period")?,
        level: first_text(item, &LEVEL, "subject level")?,
    })
}

fn first_text(item: ElementRef<'_>, sel: &Selector, what: &str) -> HarvestResult<String> {
    item.select(sel)
        .next()
        .map(|el| element_text(&el))
        .ok_or_else(|| HarvestError::Parse(format!("{what} not found in result item")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div class="search-results__paginate"><span>of 3</span></div>
          <ul>
            <li><a class="search-result-item__anchor" href="/2024/subjects/comp10001">
              <div class="search-result-item__header">
                <div class="search-result-item__name">
                  <h3>Foundations of Computing</h3>
                  <span class="search-result-item__code">COMP10001</span>
                </div>
              </div>
              <div class="search-result-item__meta">
                <div class="search-result-item__meta-primary"><p>Semester 1, Semester 2</p></div>
                <div class="search-result-item__meta-secondary"><p>Undergraduate Level 1, 12.5 credit points</p></div>
              </div>
            </a></li>
            <li><a class="search-result-item__anchor" href="/2024/subjects/comp10002">
              <div class="search-result-item__header">
                <div class="search-result-item__name">
                  <h3>Foundations of  Algorithms</h3>
                  <span class="search-result-item__code">COMP10002</span>
                </div>
              </div>
              <div class="search-result-item__meta">
                <div class="search-result-item__meta-primary"><p>Semester 2</p></div>
                <div class="search-result-item__meta-secondary"><p>Undergraduate Level 1, 12.5 credit points</p></div>
              </div>
            </a></li>
          </ul>
        </body></html>
    "#;

    #[test]
    fn test_listing_path() {
        assert_eq!(listing_path(None), "/search?types[]=subject");
        assert_eq!(listing_path(Some(7)), "/search?types[]=subject&page=7");
    }

    #[test]
    fn test_parse_page_count() {
        assert_eq!(parse_page_count(LISTING).unwrap(), 3);
        assert_eq!(
            parse_page_count(r#"<div class="search-results__paginate"><span> of 313 </span></div>"#)
                .unwrap(),
            313
        );
    }

    #[test]
    fn test_parse_page_count_missing_indicator() {
        let err = parse_page_count("<html><body><p>Maintenance</p></body></html>").unwrap_err();
        assert!(matches!(err, HarvestError::Parse(_)));
    }

    #[test]
    fn test_parse_page_count_bad_suffix() {
        let html = r#"<div class="search-results__paginate"><span>of many</span></div>"#;
        assert!(matches!(parse_page_count(html), Err(HarvestError::Parse(_))));
    }

    #[test]
    fn test_parse_listing() {
        let stubs = parse_listing(LISTING).unwrap();
        assert_eq!(stubs.len(), 2);
        assert_eq!(stubs[0].code, "COMP10001");
        assert_eq!(stubs[0].title, "Foundations of Computing");
        assert_eq!(stubs[0].href, "/2024/subjects/comp10001");
        assert_eq!(stubs[0].period, "Semester 1, Semester 2");
        assert_eq!(stubs[0].level, "Undergraduate Level 1, 12.5 credit points");
        assert_eq!(stubs[1].title, "Foundations of Algorithms");
    }

    #[test]
    fn test_parse_listing_missing_node_fails_page() {
        let html = r#"
            <a class="search-result-item__anchor" href="/2024/subjects/comp10001">
              <div class="search-result-item__header">
                <div class="search-result-item__name"><h3>Foundations of Computing</h3></div>
              </div>
            </a>"#;
        let err = parse_listing(html).unwrap_err();
        assert!(err.to_string().contains("subject code"));
    }

    #[test]
    fn test_parse_listing_empty_page() {
        assert!(parse_listing("<html><body></body></html>").unwrap().is_empty());
    }
}
