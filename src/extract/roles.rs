//! Namespace resolution: mapping qualified tag names to element roles.
//!
//! WordprocessingML exists in two dialects, the 2006 transitional namespaces
//! and the ISO strict ones. Both resolve to the same [`Role`] so the rest of
//! the engine never looks at a URI. Tags that live in a known namespace but
//! carry no registered meaning become [`Role::Container`] and are walked
//! through; tags from a foreign namespace become [`Role::Unknown`] and their
//! subtree is skipped with a warning rather than aborting extraction.

use crate::parser::xml::{NodeId, XmlTree};

/// Transitional and strict URIs for the main WordprocessingML namespace.
pub const NS_MAIN: [&str; 2] = [
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    "http://purl.oclc.org/ooxml/wordprocessingml/main",
];

/// Relationship-attribute namespace (`r:id`, `r:embed`).
pub const NS_REL: [&str; 2] = [
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships",
    "http://purl.oclc.org/ooxml/officeDocument/relationships",
];

/// DrawingML main namespace (`a:blip`).
pub const NS_DRAWING: [&str; 2] = [
    "http://schemas.openxmlformats.org/drawingml/2006/main",
    "http://purl.oclc.org/ooxml/drawingml/main",
];

/// WordprocessingDrawing namespace (`wp:docPr`).
pub const NS_WP_DRAWING: [&str; 2] = [
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
    "http://purl.oclc.org/ooxml/drawingml/wordprocessingDrawing",
];

/// Office math namespace (`m:oMath`, `m:t`).
pub const NS_MATH: [&str; 2] = [
    "http://schemas.openxmlformats.org/officeDocument/2006/math",
    "http://purl.oclc.org/ooxml/officeDocument/math",
];

/// Legacy VML namespace (`v:imagedata`).
pub const NS_VML: &str = "urn:schemas-microsoft-com:vml";

/// Markup-compatibility namespace (`mc:AlternateContent`).
pub const NS_MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

/// Namespaces whose unregistered tags are walked through silently. Extension
/// namespaces Word routinely emits land here; anything else is foreign.
const KNOWN_CONTAINER_NS: [&str; 6] = [
    "http://schemas.openxmlformats.org/drawingml/2006/picture",
    "urn:schemas-microsoft-com:office:office",
    "urn:schemas-microsoft-com:office:word",
    "http://schemas.microsoft.com/office/word/2010/wordml",
    "http://schemas.microsoft.com/office/word/2012/wordml",
    "http://schemas.microsoft.com/office/drawing/2014/chartex",
];

/// Logical role of a markup element.
///
/// A closed set: the tree walk dispatches on this, never on raw tag names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// `w:document`, `w:footnotes`, ... part roots: transparent for depth.
    Document,
    /// `w:body`: transparent for depth.
    Body,
    Table,
    TableRow,
    TableCell,
    Paragraph,
    Run,
    /// `w:t` text content.
    Text,
    /// `m:t` math text content.
    MathText,
    /// `w:br` hard line break.
    Break,
    /// `w:tab` tab character inside a run.
    Tab,
    /// `w:sym` symbol with explicit font.
    Symbol,
    /// `w:hyperlink` wrapper.
    Hyperlink,
    /// `w:bookmarkStart` / `w:bookmarkEnd` anchors; no content of their own.
    Bookmark,
    /// Property bags: `w:pPr`, `w:rPr`, `w:tcPr`, ... consumed by dedicated
    /// lookups, never walked (tab-stop definitions inside `w:pPr` would
    /// otherwise read as tab characters).
    Properties,
    /// `w:footnote` body inside the footnotes part.
    Footnote,
    /// `w:endnote` body inside the endnotes part.
    Endnote,
    /// `w:footnoteReference` inside body text.
    FootnoteReference,
    /// `w:endnoteReference` inside body text.
    EndnoteReference,
    CommentRangeStart,
    CommentRangeEnd,
    /// `w:checkBox` legacy form field.
    FormCheckBox,
    /// `w:ddList` legacy dropdown form field.
    FormDropDown,
    /// `m:oMath` inline equation.
    Math,
    /// `a:blip` image reference (`r:embed`).
    Image,
    /// `wp:docPr` drawing properties carrying alt text.
    ImageAlt,
    /// `v:imagedata` legacy image reference (`r:id`).
    ImageData,
    /// `mc:Fallback`: duplicate rendering of its sibling `mc:Choice`,
    /// skipped silently to keep text from appearing twice.
    Fallback,
    /// Known-namespace tag with no registered meaning; walked through.
    Container,
    /// Foreign-namespace tag; subtree skipped with a warning.
    Unknown,
}

impl Role {
    /// Whether an element of this role (or one of its descendants with a
    /// content role) counts as content for the run merger. Property bags and
    /// anonymous containers do not; everything that can put text, markers,
    /// or structure into the output does.
    pub fn is_content(self) -> bool {
        !matches!(
            self,
            Role::Properties | Role::Container | Role::Unknown | Role::Bookmark | Role::Fallback
        )
    }
}

/// Is this URI the main WordprocessingML namespace (either dialect)?
pub fn is_main_ns(uri: &str) -> bool {
    NS_MAIN.contains(&uri)
}

/// Is this URI the relationship-attribute namespace (either dialect)?
pub fn is_rel_ns(uri: &str) -> bool {
    NS_REL.contains(&uri)
}

/// Resolve a qualified name to its role.
pub fn role_of(ns: &str, local: &str) -> Role {
    if is_main_ns(ns) {
        return main_role(local);
    }
    if NS_MATH.contains(&ns) {
        return match local {
            "oMath" => Role::Math,
            "t" => Role::MathText,
            _ => Role::Container,
        };
    }
    if NS_DRAWING.contains(&ns) {
        return match local {
            "blip" => Role::Image,
            _ => Role::Container,
        };
    }
    if NS_WP_DRAWING.contains(&ns) {
        return match local {
            "docPr" => Role::ImageAlt,
            _ => Role::Container,
        };
    }
    if ns == NS_VML {
        return match local {
            "imagedata" => Role::ImageData,
            _ => Role::Container,
        };
    }
    if ns == NS_MC {
        return match local {
            "Fallback" => Role::Fallback,
            _ => Role::Container,
        };
    }
    if KNOWN_CONTAINER_NS.contains(&ns) {
        return Role::Container;
    }
    Role::Unknown
}

fn main_role(local: &str) -> Role {
    match local {
        "document" | "footnotes" | "endnotes" | "comments" | "hdr" | "ftr" => Role::Document,
        "body" => Role::Body,
        "tbl" => Role::Table,
        "tr" => Role::TableRow,
        "tc" => Role::TableCell,
        "p" => Role::Paragraph,
        "r" => Role::Run,
        "t" => Role::Text,
        "br" => Role::Break,
        "tab" => Role::Tab,
        "sym" => Role::Symbol,
        "hyperlink" => Role::Hyperlink,
        "bookmarkStart" | "bookmarkEnd" => Role::Bookmark,
        "pPr" | "rPr" | "tblPr" | "trPr" | "tcPr" | "sectPr" | "numPr" | "tblGrid" => {
            Role::Properties
        }
        "footnote" => Role::Footnote,
        "endnote" => Role::Endnote,
        "footnoteReference" => Role::FootnoteReference,
        "endnoteReference" => Role::EndnoteReference,
        "commentRangeStart" => Role::CommentRangeStart,
        "commentRangeEnd" => Role::CommentRangeEnd,
        "checkBox" => Role::FormCheckBox,
        "ddList" => Role::FormDropDown,
        _ => Role::Container,
    }
}

/// Role of a node in a parsed tree.
pub fn node_role(tree: &XmlTree, id: NodeId) -> Role {
    role_of(tree.ns(id), tree.local(id))
}

/// Attribute namespace selector for [`get_attr`].
#[derive(Debug, Clone, Copy)]
pub enum AttrScope {
    /// `w:`-namespaced attribute, either dialect.
    Main,
    /// `r:`-namespaced relationship attribute, either dialect.
    Rel,
    /// Unqualified attribute (e.g. `descr` on `wp:docPr`).
    Plain,
}

/// Qualified attribute lookup on a node.
pub fn get_attr<'a>(
    tree: &'a XmlTree,
    id: NodeId,
    scope: AttrScope,
    local: &str,
) -> Option<&'a str> {
    match scope {
        AttrScope::Main => tree.attr_where(id, is_main_ns, local),
        AttrScope::Rel => tree.attr_where(id, is_rel_ns, local),
        AttrScope::Plain => tree.attr_where(id, |ns| ns.is_empty(), local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitional_and_strict_agree() {
        for ns in NS_MAIN {
            assert_eq!(role_of(ns, "p"), Role::Paragraph);
            assert_eq!(role_of(ns, "tbl"), Role::Table);
            assert_eq!(role_of(ns, "hyperlink"), Role::Hyperlink);
        }
        for ns in NS_MATH {
            assert_eq!(role_of(ns, "oMath"), Role::Math);
            assert_eq!(role_of(ns, "t"), Role::MathText);
        }
    }

    #[test]
    fn test_text_tag_depends_on_namespace() {
        assert_eq!(role_of(NS_MAIN[0], "t"), Role::Text);
        assert_eq!(role_of(NS_MATH[0], "t"), Role::MathText);
    }

    #[test]
    fn test_unregistered_main_tag_is_container() {
        assert_eq!(role_of(NS_MAIN[0], "sdt"), Role::Container);
        assert_eq!(role_of(NS_MAIN[0], "smartTag"), Role::Container);
        assert_eq!(role_of(NS_MAIN[0], "proofErr"), Role::Container);
    }

    #[test]
    fn test_foreign_namespace_is_unknown() {
        assert_eq!(role_of("http://example.com/custom", "p"), Role::Unknown);
        assert_eq!(role_of("", "p"), Role::Unknown);
    }

    #[test]
    fn test_properties_are_not_content() {
        assert!(!Role::Properties.is_content());
        assert!(!Role::Container.is_content());
        assert!(!Role::Unknown.is_content());
        assert!(Role::Text.is_content());
        assert!(Role::Break.is_content());
        assert!(Role::CommentRangeStart.is_content());
    }

    #[test]
    fn test_fallback_is_skipped_role() {
        assert_eq!(role_of(NS_MC, "Fallback"), Role::Fallback);
        assert_eq!(role_of(NS_MC, "Choice"), Role::Container);
        assert!(!Role::Fallback.is_content());
    }
}
