//! Install source handling
//!
//! This module parses install target strings into typed sources:
//! - Index requirements: `simple`, `simple==2.0`
//! - Direct archives: `simple @ file:///data/simple-2.0.tar.gz`, `https://host/pkg-1.0.zip`
//! - VCS references: `git+https://host/repo@v1.0#egg=pkg`
//! - Local paths, editable or not: `./pkg`, `-e ./pkg`, `-e git+file:///tmp/pkg#egg=pkg`
//!
//! ## Module Organization
//!
//! - `descriptor.rs`: SourceDescriptor and the source variants
//! - `parser.rs`: Target string grammar
//! - `name.rs`: Project name validation and canonical forms
//! - `resolved.rs`: Sources after fetch or checkout

pub mod descriptor;
pub mod name;
pub mod parser;
pub mod resolved;

pub use descriptor::{
    DirectArchive, EditableSource, IndexRequirement, InstallTarget, SourceDescriptor, VcsKind,
    VcsReference,
};
pub use parser::{parse_target, parse_vcs_reference};
pub use resolved::ResolvedSource;
