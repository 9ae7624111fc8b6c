//! Handbook requisites: subject records, requirements-page section parsing,
//! and prerequisite constraint extraction.
//!
//! Everything in this crate is synchronous and network-free. The runtime
//! crate fetches documents and hands the markup to [`SectionParser`]; the
//! resulting sections are turned into [`Constraint`]s by [`extract_constraints`].

pub mod boilerplate;
pub mod extract;
pub mod graph;
pub mod level;
pub mod sections;
pub mod text;
pub mod types;

pub use boilerplate::InherentBoilerplate;
pub use extract::{extract_constraints, SectionKind};
pub use graph::{RequisiteGraph, TreeNode};
pub use level::split_level_points;
pub use sections::{ParsedRequirements, SectionParser};
pub use text::{clean_subject_codes, find_subject_codes, is_subject_code};
pub use types::*;
