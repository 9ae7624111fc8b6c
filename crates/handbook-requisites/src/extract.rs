//! Turn requisite sections into typed constraints.
//!
//! Each of the prerequisite, corequisite and non-allowed sections is folded
//! fragment by fragment. Tables and bullet lists always become a
//! [`Constraint::SubjectSet`] of their cleaned codes, even when none survive
//! cleaning; text lines do so only when they mention a code. Either way the
//! pending quantity/concurrency state is used and then resets to the section
//! default. Text lines additionally run through every pattern matcher in
//! [`MATCHERS`], and cue phrases ("one of", "may be taken concurrently")
//! adjust the pending state for the next fragment.
//!
//! # Matchers
//!
//! Matchers are independent pure functions; a line may produce a subject set
//! and any number of typed constraints. They run in a fixed order: major,
//! course, points, field credit.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::sections::{ADDREQS, ANTIREQS, COREQS, PREREQS};
use crate::text::{clean_subject_codes, find_subject_codes};
use crate::types::{
    Constraint, Fragment, PointsScope, RequisiteError, RequisiteResult, Sections, QUANTITY_ALL,
    QUANTITY_DISALLOWED,
};

/// Sections that yield subject-set constraints, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Prerequisite,
    Corequisite,
    Antirequisite,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [
        SectionKind::Prerequisite,
        SectionKind::Corequisite,
        SectionKind::Antirequisite,
    ];

    /// Canonical section key this kind reads from.
    pub fn key(self) -> &'static str {
        match self {
            SectionKind::Prerequisite => PREREQS,
            SectionKind::Corequisite => COREQS,
            SectionKind::Antirequisite => ANTIREQS,
        }
    }

    /// State every fold over this section starts from and resets to.
    pub fn defaults(self) -> Pending {
        match self {
            SectionKind::Prerequisite => Pending::new(QUANTITY_ALL, false),
            SectionKind::Corequisite => Pending::new(QUANTITY_ALL, true),
            SectionKind::Antirequisite => Pending::new(QUANTITY_DISALLOWED, false),
        }
    }
}

/// Quantity and concurrency applied to the next emitted subject set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending {
    pub quantity: i32,
    pub concurrent: bool,
}

impl Pending {
    pub const fn new(quantity: i32, concurrent: bool) -> Self {
        Self {
            quantity,
            concurrent,
        }
    }

    fn subject_set(self, subjects: Vec<String>) -> Constraint {
        Constraint::SubjectSet {
            quantity: self.quantity,
            subjects,
            concurrent_allowed: self.concurrent,
        }
    }
}

/// A typed-constraint matcher over one line of requisite text.
pub type Matcher = fn(&str) -> Option<Constraint>;

/// Every matcher, in precedence order.
pub const MATCHERS: [(&str, Matcher); 4] = [
    ("major", match_major),
    ("course", match_course),
    ("points", match_points),
    ("field", match_field_credit),
];

/// Derive all constraints for a subject from its sections.
pub fn extract_constraints(own_code: &str, sections: &Sections) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for kind in SectionKind::ALL {
        if let Some(fragments) = sections.get(kind.key()) {
            constraints.extend(extract_section(kind, fragments, own_code));
        }
    }

    if let Some(fragments) = sections.get(ADDREQS) {
        let text = fragments
            .iter()
            .flat_map(Fragment::lines)
            .collect::<Vec<_>>()
            .join("\n");
        constraints.push(Constraint::Additional { text });
    }

    constraints
}

/// Fold one section's fragments into constraints.
pub fn extract_section(
    kind: SectionKind,
    fragments: &[Fragment],
    own_code: &str,
) -> Vec<Constraint> {
    let defaults = kind.defaults();
    let (_, constraints) = fragments.iter().fold(
        (defaults, Vec::new()),
        |(pending, mut out), fragment| {
            let next = apply_fragment(pending, defaults, fragment, own_code, &mut out);
            (next, out)
        },
    );
    constraints
}

/// Emit the constraints for one fragment and return the pending state for
/// the next.
fn apply_fragment(
    pending: Pending,
    defaults: Pending,
    fragment: &Fragment,
    own_code: &str,
    out: &mut Vec<Constraint>,
) -> Pending {
    match fragment {
        Fragment::SubjectTable(entries) | Fragment::BulletList(entries) => {
            let codes = clean_subject_codes(entries, own_code);
            if codes.is_empty() {
                debug!("code list for {own_code} has no usable codes");
            }
            out.push(pending.subject_set(codes));
            defaults
        }
        Fragment::TextLine(line) => {
            let codes = codes_in_line(line, own_code);
            let mut next = pending;
            if !codes.is_empty() {
                out.push(pending.subject_set(codes));
                next = defaults;
            }
            out.extend(run_matchers(line));
            apply_cues(line, next)
        }
    }
}

fn codes_in_line(line: &str, own_code: &str) -> Vec<String> {
    find_subject_codes(line)
        .into_iter()
        .filter(|code| !code.eq_ignore_ascii_case(own_code))
        .collect()
}

/// Run every matcher over `line`, keeping each hit.
pub fn run_matchers(line: &str) -> Vec<Constraint> {
    MATCHERS
        .iter()
        .filter_map(|(name, matcher)| {
            let hit = matcher(line);
            if hit.is_some() {
                debug!("{name} matcher hit: {line:?}");
            }
            hit
        })
        .collect()
}

/// Update pending state from cue phrases in `line`.
fn apply_cues(line: &str, pending: Pending) -> Pending {
    let lower = line.to_lowercase();
    let mut next = pending;
    if lower.contains("one of") {
        next.quantity = 1;
    }
    if lower.contains("may be taken concurrently") {
        next.concurrent = true;
    }
    next
}

// ── Matchers ────────────────────────────────────────────────────────────────

/// Characters a captured clause may contain.
const CLAUSE: &str = r"[ \w\-():;,]+";

static MAJOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:only available to students in the |enrolled in the )({CLAUSE})(?: major within the| major of the)"
    ))
    .expect("major regex is valid")
});

static COURSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:entry into the |enrolled in the | points of the |admission to the )({CLAUSE})(?:\.|$)"
    ))
    .expect("course regex is valid")
});

static POINTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)must be in the (?:last|final) (\d+)").expect("points regex is valid")
});

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)have completed a minimum of (\w+) (\d)(?:st|nd|rd|th) year units in ({CLAUSE})(?:\.|$)"
    ))
    .expect("field credit regex is valid")
});

static OR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i) or ").expect("or regex is valid"));

const COURSE_SUFFIXES: [&str; 2] = [
    " to complete this subject",
    " to enrol in this capstone subject",
];

const MAJOR_MARKERS: [&str; 2] = [" major within the ", " major of the "];

const DEGREE_TYPES: [&str; 7] = [
    "Advanced", "Associate", "Bachelor", "Diploma", "Doctor", "Graduate", "Master",
];

/// "... enrolled in the Data Science major within the Bachelor of Science"
pub fn match_major(line: &str) -> Option<Constraint> {
    let caps = MAJOR_RE.captures(line)?;
    let major_name = caps[1].trim().to_string();
    if major_name.is_empty() {
        return None;
    }
    Some(Constraint::MajorEnrollment { major_name })
}

/// "Admission to the Master of Data Science or Master of Computer Science."
pub fn match_course(line: &str) -> Option<Constraint> {
    let caps = COURSE_RE.captures(line)?;
    let mut span = strip_suffix_ci(caps[1].trim_end(), &COURSE_SUFFIXES);

    // "X major within the Bachelor of Y" names the course after the marker.
    for marker in MAJOR_MARKERS {
        if let Some(idx) = find_ci(span, marker) {
            span = &span[idx + marker.len()..];
            break;
        }
    }

    let courses = split_courses(span);
    if courses.is_empty() {
        return None;
    }
    Some(Constraint::CourseAdmission { courses })
}

/// "... must be in the final 100 points of the course"
pub fn match_points(line: &str) -> Option<Constraint> {
    let caps = POINTS_RE.captures(line)?;
    Some(Constraint::PointsRecency {
        scope: PointsScope::Final,
        point_value: caps[1].to_string(),
    })
}

/// "have completed a minimum of two 3rd year units in Computer Science, or equivalent"
pub fn match_field_credit(line: &str) -> Option<Constraint> {
    let caps = FIELD_RE.captures(line)?;
    let subject_count = match count_word(&caps[1]) {
        Ok(n) => n,
        Err(e) => {
            warn!("failed to parse field credit requirement {line:?}: {e}");
            return None;
        }
    };
    let year_level = caps[2].parse::<u32>().ok()?;
    let fields = strip_suffix_ci(caps[3].trim_end(), &[", or equivalent"])
        .trim()
        .to_string();
    Some(Constraint::FieldCredit {
        subject_count,
        year_level,
        fields,
    })
}

/// Number words one through ten. Anything else is a format error.
fn count_word(word: &str) -> RequisiteResult<u32> {
    const WORDS: [&str; 10] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    ];
    WORDS
        .iter()
        .position(|w| w.eq_ignore_ascii_case(word))
        .map(|i| i as u32 + 1)
        .ok_or_else(|| RequisiteError::Format(format!("unknown quantity word {word:?}")))
}

/// Split a course span on " or " and on ", " that precedes a degree type.
fn split_courses(span: &str) -> Vec<String> {
    OR_RE
        .split(span)
        .flat_map(split_before_degrees)
        .map(str::trim)
        .filter(|course| !course.is_empty())
        .map(str::to_string)
        .collect()
}

fn split_before_degrees(part: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, sep) in part.match_indices(", ") {
        let next = &part[idx + sep.len()..];
        if DEGREE_TYPES.iter().any(|d| starts_with_ci(next, d)) {
            pieces.push(&part[start..idx]);
            start = idx + sep.len();
        }
    }
    pieces.push(&part[start..]);
    pieces
}

fn starts_with_ci(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_ascii_lowercase().find(&needle.to_ascii_lowercase())
}

fn strip_suffix_ci<'a>(s: &'a str, suffixes: &[&str]) -> &'a str {
    for suffix in suffixes {
        if s.len() >= suffix.len() {
            let split = s.len() - suffix.len();
            if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(suffix) {
                return &s[..split];
            }
        }
    }
    s
}
