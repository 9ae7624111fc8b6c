//! Core data types for subject records and their requisite constraints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Section content keyed by canonical section name (`prereqs`, `coreqs`, ...).
///
/// Unknown headings are kept verbatim as their own key.
pub type Sections = BTreeMap<String, Vec<Fragment>>;

/// `SubjectSet` quantity meaning every listed subject is required.
pub const QUANTITY_ALL: i32 = 0;

/// `SubjectSet` quantity marking the listed subjects as disallowed.
pub const QUANTITY_DISALLOWED: i32 = -1;

/// One entry from a paginated subject listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStub {
    pub code: String,
    pub title: String,
    pub href: String,
    pub period: String,
    pub level: String,
}

/// A fully harvested subject: listing data, requirement sections, and the
/// constraints derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub code: String,
    pub title: String,
    pub href: String,
    pub period: String,
    pub level: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub sections: Sections,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Set when the record could not be fully harvested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubjectRecord {
    /// Create an empty record from a listing stub, splitting the listing's
    /// level text into level and credit points.
    pub fn from_stub(stub: SubjectStub) -> Self {
        let (level, points) = crate::level::split_level_points(&stub.level);
        Self {
            code: stub.code,
            title: stub.title,
            href: stub.href,
            period: stub.period,
            level,
            points,
            last_updated: String::new(),
            sections: Sections::new(),
            constraints: Vec::new(),
            error: None,
        }
    }

    /// Whether every stage of the harvest succeeded for this subject.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Fragments of a section, if the page had one.
    pub fn section(&self, key: &str) -> Option<&[Fragment]> {
        self.sections.get(key).map(Vec::as_slice)
    }
}

/// One parsed content unit within a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Fragment {
    TextLine(String),
    SubjectTable(Vec<String>),
    BulletList(Vec<String>),
}

impl Fragment {
    /// Plain-text lines of this fragment, one per entry.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Fragment::TextLine(text) => vec![text.clone()],
            Fragment::SubjectTable(codes) => vec![codes.join(", ")],
            Fragment::BulletList(items) => items.clone(),
        }
    }
}

/// Scope of a points-recency constraint. Only the final-points form occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsScope {
    #[serde(rename = "FINAL")]
    Final,
}

/// One normalised eligibility rule derived from requisite text.
///
/// Serialized with an internal `type` tag in snake_case; downstream
/// eligibility checks read these field names directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// `quantity` 0: all listed subjects; N > 0: any N of them; -1: none of them.
    SubjectSet {
        quantity: i32,
        subjects: Vec<String>,
        concurrent_allowed: bool,
    },
    /// Admission into any one of the named courses satisfies the rule.
    CourseAdmission { courses: Vec<String> },
    /// `subject_count` completed subjects at `year_level` in `fields`.
    FieldCredit {
        subject_count: u32,
        year_level: u32,
        fields: String,
    },
    /// The subject must fall within the final `point_value` points of the course.
    PointsRecency {
        scope: PointsScope,
        point_value: String,
    },
    MajorEnrollment { major_name: String },
    /// Unparsed free-text requirement (auditions, coordinator approval, ...).
    Additional { text: String },
}

impl Constraint {
    /// Whether this constraint lists subjects that must not have been taken.
    pub fn is_antirequisite(&self) -> bool {
        matches!(self, Constraint::SubjectSet { quantity, .. } if *quantity == QUANTITY_DISALLOWED)
    }

    /// Subject codes named by a `SubjectSet`; empty for every other kind.
    pub fn subjects(&self) -> &[String] {
        match self {
            Constraint::SubjectSet { subjects, .. } => subjects,
            _ => &[],
        }
    }
}

/// Errors raised while parsing requirement pages and requisite text.
#[derive(thiserror::Error, Debug)]
pub enum RequisiteError {
    /// An expected markup node was absent.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A token did not have the expected shape. Always recovered locally.
    #[error("Format error: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type.
pub type RequisiteResult<T> = Result<T, RequisiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn stub() -> SubjectStub {
        SubjectStub {
            code: "COMP10002".to_string(),
            title: "Foundations of Algorithms".to_string(),
            href: "/2024/subjects/comp10002".to_string(),
            period: "Semester 1, Semester 2".to_string(),
            level: "Undergraduate Level 1, 12.5 credit points".to_string(),
        }
    }

    #[test]
    fn test_record_from_stub_splits_level() {
        let record = SubjectRecord::from_stub(stub());
        assert_eq!(record.level, "Undergraduate Level 1");
        assert_eq!(record.points, 12.5);
        assert!(record.is_complete());
        assert!(record.sections.is_empty());
    }

    #[test]
    fn test_constraint_tagging() {
        let c = Constraint::SubjectSet {
            quantity: 1,
            subjects: vec!["MAST10005".to_string(), "MAST10006".to_string()],
            concurrent_allowed: true,
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "subject_set");
        assert_eq!(json["quantity"], 1);
        assert_eq!(json["concurrent_allowed"], true);

        let p = Constraint::PointsRecency {
            scope: PointsScope::Final,
            point_value: "100".to_string(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "points_recency");
        assert_eq!(json["scope"], "FINAL");
    }

    #[test]
    fn test_fragment_tagging() {
        let f = Fragment::SubjectTable(vec!["COMP10001".to_string()]);
        let json = serde_json::to_value(&f).unwrap();
        assert_eq!(json["kind"], "subject_table");
        assert_eq!(json["value"][0], "COMP10001");
    }

    #[test]
    fn test_error_marker_omitted_when_complete() {
        let record = SubjectRecord::from_stub(stub());
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("\"error\""));

        let mut failed = record;
        failed.error = Some("HTTP 500".to_string());
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"error\":\"HTTP 500\""));
    }

    #[test]
    fn test_antirequisite_detection() {
        let anti = Constraint::SubjectSet {
            quantity: QUANTITY_DISALLOWED,
            subjects: vec!["COMP20003".to_string()],
            concurrent_allowed: false,
        };
        assert!(anti.is_antirequisite());
        assert_eq!(anti.subjects(), ["COMP20003".to_string()]);
        let major = Constraint::MajorEnrollment {
            major_name: "Data Science".to_string(),
        };
        assert!(!major.is_antirequisite());
        assert!(major.subjects().is_empty());
    }
}
