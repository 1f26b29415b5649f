//! Core document properties (`docProps/core.xml`).
//!
//! A flat Dublin-Core-flavored part. Matching is by local tag name; the
//! namespaces (`dc:`, `cp:`, `dcterms:`) never collide on the names used.

use chrono::{DateTime, Utc};

use crate::model::CoreProperties;
use crate::parser::xml::XmlTree;
use crate::Result;

/// Parse a core-properties part.
pub fn parse_core_properties(part: &str, data: &[u8]) -> Result<CoreProperties> {
    let tree = XmlTree::parse(data, part)?;
    let mut props = CoreProperties::default();
    for &child in tree.children(tree.root()) {
        let value = tree.text(child).to_owned();
        let value = if value.is_empty() { None } else { Some(value) };
        match tree.local(child) {
            "title" => props.title = value,
            "subject" => props.subject = value,
            "creator" => props.creator = value,
            "keywords" => props.keywords = value,
            "description" => props.description = value,
            "lastModifiedBy" => props.last_modified_by = value,
            "revision" => props.revision = value,
            "created" => props.created = value.and_then(|v| parse_timestamp(part, "created", &v)),
            "modified" => props.modified = value.and_then(|v| parse_timestamp(part, "modified", &v)),
            other => {
                if let Some(value) = value {
                    props.extra.insert(other.to_owned(), value);
                }
            }
        }
    }
    Ok(props)
}

/// W3CDTF timestamps in their full form are RFC 3339; truncated forms
/// (date only) are rare and dropped with a warning.
fn parse_timestamp(part: &str, name: &str, value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(_) => {
            log::warn!("{}: cannot parse {} timestamp {:?}", part, name, value);
            None
        }
    }
}
