//! DOCX package parsing module.

mod numbering;
mod options;
mod package;
mod properties;
mod rels;
pub mod xml;

pub use numbering::{LevelDef, NumberingDefs};
pub use options::ExtractOptions;
pub use package::{ContentParts, Package};
pub use properties::parse_core_properties;
pub use rels::{rels_path_for, resolve_target, RelMap, Relationship};
