//! Split a requirements page into named sections of typed fragments.
//!
//! A requirements page body is a flat run of `<h3>` headings, each followed by
//! paragraphs, subject tables and bullet lists. The prerequisites block is
//! nested one level deeper in `div#prerequisites`, so the body is split twice:
//! once over the nested block and once over the remaining top-level children.
//! Both passes use [`split_sections`].

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::boilerplate::InherentBoilerplate;
use crate::text::{element_text, normalize_ws, selector};
use crate::types::{Fragment, RequisiteError, RequisiteResult, Sections};

pub const PREREQS: &str = "prereqs";
pub const COREQS: &str = "coreqs";
pub const ANTIREQS: &str = "antireqs";
pub const ADDREQS: &str = "addreqs";
pub const INHERENT: &str = "inherent";
pub const BACKGROUND: &str = "background";

const HEADING_ALIASES: [(&str, &str); 6] = [
    ("Prerequisites", PREREQS),
    ("Corequisites", COREQS),
    ("Non-allowed subjects", ANTIREQS),
    ("Additional Entry Requirements", ADDREQS),
    (
        "Inherent requirements (core participation requirements)",
        INHERENT,
    ),
    ("Recommended background knowledge", BACKGROUND),
];

static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));
static PANEL: LazyLock<Selector> =
    LazyLock::new(|| selector(".course__body__inner > .sidebar-tabs__panel"));
static LAST_UPDATED: LazyLock<Selector> = LazyLock::new(|| selector("p.last-updated"));
static PREREQ_BLOCK: LazyLock<Selector> = LazyLock::new(|| selector("div#prerequisites"));

/// Map a heading to its canonical section key. Unknown headings pass through.
pub fn canonical_name(heading: &str) -> String {
    HEADING_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(heading))
        .map(|(_, key)| key.to_string())
        .unwrap_or_else(|| heading.to_string())
}

/// A direct child of a body node: an element or a bare text run.
#[derive(Debug, Clone, Copy)]
pub enum Child<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
}

/// Direct element and text children of `el`, comments dropped.
pub fn children_of<'a>(el: ElementRef<'a>) -> impl Iterator<Item = Child<'a>> {
    el.children().filter_map(|node| match ElementRef::wrap(node) {
        Some(child) => Some(Child::Element(child)),
        None => node.value().as_text().map(|t| Child::Text(&**t)),
    })
}

/// Split a sequence of body children into sections.
///
/// `h3` starts a new section, `table` becomes a [`Fragment::SubjectTable`],
/// `ul`/`ol` a [`Fragment::BulletList`], `h2` is ignored and a `div` ends the
/// run. Anything else with text becomes a [`Fragment::TextLine`]. Content seen
/// before the first heading is discarded when a heading arrives; if no heading
/// ever arrives it is committed under the empty key.
pub fn split_sections<'a>(children: impl IntoIterator<Item = Child<'a>>) -> Sections {
    let mut sections = Sections::new();
    let mut heading = String::new();
    let mut content: Vec<Fragment> = Vec::new();

    for child in children {
        let el = match child {
            Child::Text(text) => {
                let text = normalize_ws(text);
                if !text.is_empty() {
                    content.push(Fragment::TextLine(text));
                }
                continue;
            }
            Child::Element(el) => el,
        };

        match el.value().name() {
            "h3" => {
                if !heading.is_empty() {
                    sections.insert(canonical_name(&heading), std::mem::take(&mut content));
                }
                heading = element_text(&el);
                content.clear();
            }
            "table" => content.push(Fragment::SubjectTable(table_codes(el))),
            "ul" | "ol" => content.push(Fragment::BulletList(list_items(el))),
            "div" => break,
            "h2" => {}
            _ => {
                let text = element_text(&el);
                if !text.is_empty() {
                    content.push(Fragment::TextLine(text));
                }
            }
        }
    }

    sections.insert(canonical_name(&heading), content);
    sections
}

/// First-column cell text of every body row.
fn table_codes(table: ElementRef<'_>) -> Vec<String> {
    table
        .select(&ROW)
        .filter_map(|row| row.select(&CELL).next())
        .map(|cell| element_text(&cell))
        .filter(|text| !text.is_empty())
        .collect()
}

fn list_items(list: ElementRef<'_>) -> Vec<String> {
    list.select(&ITEM)
        .map(|li| element_text(&li))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Result of parsing one requirements page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRequirements {
    pub last_updated: String,
    pub sections: Sections,
}

/// Requirements-page parser, configured with the inherent-requirement
/// boilerplate to strip.
#[derive(Debug, Clone, Default)]
pub struct SectionParser {
    boilerplate: InherentBoilerplate,
}

impl SectionParser {
    pub fn new(boilerplate: InherentBoilerplate) -> Self {
        Self { boilerplate }
    }

    pub fn boilerplate(&self) -> &InherentBoilerplate {
        &self.boilerplate
    }

    /// Parse a full requirements page document.
    pub fn parse_page(&self, html: &str) -> RequisiteResult<ParsedRequirements> {
        let document = Html::parse_document(html);
        let body = document.select(&PANEL).next().ok_or_else(|| {
            RequisiteError::Parse("requirements panel not found".to_string())
        })?;
        self.parse_body(body)
    }

    /// Parse the requirements panel element.
    pub fn parse_body(&self, body: ElementRef<'_>) -> RequisiteResult<ParsedRequirements> {
        let updated = body
            .select(&LAST_UPDATED)
            .next()
            .ok_or_else(|| RequisiteError::Parse("last-updated marker not found".to_string()))?;

        let prereq_block = body.select(&PREREQ_BLOCK).next();

        let mut sections = prereq_block
            .map(|block| split_sections(children_of(block)))
            .unwrap_or_default();

        let skipped = [Some(updated.id()), prereq_block.map(|b| b.id())];
        let top_level = children_of(body).filter(|child| match child {
            Child::Element(el) => !skipped.contains(&Some(el.id())),
            Child::Text(_) => true,
        });
        sections.extend(split_sections(top_level));

        if let Some(inherent) = sections.get_mut(INHERENT) {
            inherent.retain(|fragment| match fragment {
                Fragment::TextLine(line) => !self.boilerplate.contains(line),
                _ => true,
            });
        }

        Ok(ParsedRequirements {
            last_updated: element_text(&updated),
            sections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_fragment_children(html: &str) -> Sections {
        let fragment = Html::parse_fragment(&format!("<div id=\"root\">{html}</div>"));
        let root = fragment.select(&selector("div#root")).next().unwrap();
        split_sections(children_of(root))
    }

    fn text(s: &str) -> Fragment {
        Fragment::TextLine(s.to_string())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const PAGE: &str = r#"
    <html><body>
    <div class="course__body__inner">
      <div class="sidebar-tabs__panel">
        <h2>Eligibility and requirements</h2>
        <div id="prerequisites">
          <h3>Prerequisites</h3>
          <p>Students must have completed <b>both</b> of the following:</p>
          <table>
            <thead><tr><th>Code</th><th>Name</th><th>Teaching period</th></tr></thead>
            <tbody>
              <tr><td>COMP10001</td><td>Foundations of Computing</td><td>Semester 1</td></tr>
              <tr><td>COMP10002</td><td>Foundations of Algorithms</td><td>Semester 2</td></tr>
            </tbody>
          </table>
        </div>
        <h3>Corequisites</h3>
        <p>None</p>
        <h3>Non-allowed subjects</h3>
        <ul><li>COMP20003 <i>Algorithms and Data Structures</i></li></ul>
        <h3>Inherent requirements (core participation requirements)</h3>
        <p>The University of Melbourne is committed to providing students with reasonable adjustments.</p>
        <p>Students must be able to operate a microscope.</p>
        <h3>Recommended background knowledge</h3>
        <p>Familiarity with Python.</p>
        <p class="last-updated">Last updated: 3 November 2023</p>
        <div class="course__prev-next-buttons"><p>Next</p></div>
        <p>Never reached</p>
      </div>
    </div>
    </body></html>
    "#;

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("Prerequisites"), PREREQS);
        assert_eq!(canonical_name("Non-allowed subjects"), ANTIREQS);
        assert_eq!(canonical_name("Additional entry requirements"), ADDREQS);
        assert_eq!(canonical_name("Quotas apply"), "Quotas apply");
        assert_eq!(canonical_name(""), "");
    }

    #[test]
    fn test_split_sections_fragment_kinds() {
        let sections = parse_fragment_children(
            r#"
            <h2>Ignored</h2>
            <h3>Prerequisites</h3>
            <p>One of</p>
            <table><tr><td>MAST10005</td><td>Calculus 1</td></tr>
                   <tr><td>MAST10006</td><td>Calculus 2</td></tr></table>
            <h3>Corequisites</h3>
            <ul><li>First <b>item</b></li><li>Second</li></ul>
            "#,
        );
        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections[PREREQS],
            vec![
                text("One of"),
                Fragment::SubjectTable(strings(&["MAST10005", "MAST10006"])),
            ]
        );
        assert_eq!(
            sections[COREQS],
            vec![Fragment::BulletList(strings(&["First item", "Second"]))]
        );
    }

    #[test]
    fn test_split_sections_stops_at_div() {
        let sections = parse_fragment_children(
            "<h3>Corequisites</h3><p>None</p><div><h3>Prerequisites</h3></div><p>After</p>",
        );
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[COREQS], vec![text("None")]);
    }

    #[test]
    fn test_split_sections_without_heading_uses_empty_key() {
        let sections = parse_fragment_children("<p>Orphan line</p>");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[""], vec![text("Orphan line")]);
    }

    #[test]
    fn test_split_sections_discards_content_before_first_heading() {
        let sections = parse_fragment_children("<p>Intro</p><h3>Corequisites</h3><p>None</p>");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[COREQS], vec![text("None")]);
    }

    #[test]
    fn test_split_sections_bare_text_nodes() {
        let sections =
            parse_fragment_children("<h3>Corequisites</h3>  Loose text  <!-- note --><p>Para</p>");
        assert_eq!(sections[COREQS], vec![text("Loose text"), text("Para")]);
    }

    #[test]
    fn test_split_is_idempotent_on_rendered_sections() {
        let first = parse_fragment_children(
            r#"<h3>Prerequisites</h3><p>One of</p>
               <table><tr><td>MAST10005</td></tr><tr><td>MAST10006</td></tr></table>
               <h3>Quotas</h3><ul><li>A</li><li>B</li></ul>"#,
        );

        let mut rendered = String::new();
        for (key, fragments) in &first {
            rendered.push_str(&format!("<h3>{key}</h3>"));
            for fragment in fragments {
                match fragment {
                    Fragment::TextLine(line) => rendered.push_str(&format!("<p>{line}</p>")),
                    Fragment::SubjectTable(codes) => {
                        rendered.push_str("<table>");
                        for code in codes {
                            rendered.push_str(&format!("<tr><td>{code}</td></tr>"));
                        }
                        rendered.push_str("</table>");
                    }
                    Fragment::BulletList(items) => {
                        rendered.push_str("<ul>");
                        for item in items {
                            rendered.push_str(&format!("<li>{item}</li>"));
                        }
                        rendered.push_str("</ul>");
                    }
                }
            }
        }

        let second = parse_fragment_children(&rendered);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_page() {
        let parser = SectionParser::new(InherentBoilerplate::from_lines([
            "The University of Melbourne is committed to providing students with reasonable adjustments.",
        ]));
        let parsed = parser.parse_page(PAGE).unwrap();

        assert_eq!(parsed.last_updated, "Last updated: 3 November 2023");
        assert_eq!(
            parsed.sections[PREREQS],
            vec![
                text("Students must have completed both of the following:"),
                Fragment::SubjectTable(strings(&["COMP10001", "COMP10002"])),
            ]
        );
        assert_eq!(parsed.sections[COREQS], vec![text("None")]);
        assert_eq!(
            parsed.sections[ANTIREQS],
            vec![Fragment::BulletList(strings(&[
                "COMP20003 Algorithms and Data Structures"
            ]))]
        );
        assert_eq!(
            parsed.sections[INHERENT],
            vec![text("Students must be able to operate a microscope.")]
        );
        assert_eq!(
            parsed.sections[BACKGROUND],
            vec![text("Familiarity with Python.")]
        );
        assert!(!parsed.sections.contains_key(""));
    }

    #[test]
    fn test_parse_page_repeatedly_with_shared_selectors() {
        let parser = SectionParser::default();
        let first = parser.parse_page(PAGE).unwrap();
        for _ in 0..3 {
            assert_eq!(parser.parse_page(PAGE).unwrap(), first);
        }
        assert_eq!(
            first.sections[PREREQS][1],
            Fragment::SubjectTable(strings(&["COMP10001", "COMP10002"]))
        );
    }

    #[test]
    fn test_parse_page_without_prerequisite_block() {
        let html = r#"
        <div class="course__body__inner"><div class="sidebar-tabs__panel">
          <h3>Corequisites</h3><p>None</p>
          <p class="last-updated">Last updated: 1 May 2024</p>
        </div></div>"#;
        let parsed = SectionParser::default().parse_page(html).unwrap();
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.sections[COREQS], vec![text("None")]);
        assert_eq!(parsed.last_updated, "Last updated: 1 May 2024");
    }

    #[test]
    fn test_parse_page_missing_panel() {
        let err = SectionParser::default()
            .parse_page("<html><body><p>Moved</p></body></html>")
            .unwrap_err();
        assert!(matches!(err, RequisiteError::Parse(_)));
    }

    #[test]
    fn test_parse_page_missing_last_updated() {
        let html = r#"<div class="course__body__inner"><div class="sidebar-tabs__panel">
            <h3>Corequisites</h3><p>None</p></div></div>"#;
        let err = SectionParser::default().parse_page(html).unwrap_err();
        assert!(err.to_string().contains("last-updated"));
    }
}
