//! Recipes for the locator tables.
//!
//! Every search node is created detached. Where a search ends up (under a
//! property, a compliance check, or another search) depends on the
//! consumer tables and on other locator rows, so placement is left to the
//! locator chain linker.

use msi_document::{Attributes, NodeKind};

use crate::diagnostics::DiagnosticCode;

use super::names::NamePair;
use super::{Decoded, NodeSpec, ParentRef, RowContext};

const REG_LOCATOR_TYPE_MASK: i64 = 0x0F;
const REG_LOCATOR_WIN64: i64 = 0x10;

fn registry_root(value: i64) -> Option<&'static str> {
    match value {
        0 => Some("HKCR"),
        1 => Some("HKCU"),
        2 => Some("HKLM"),
        3 => Some("HKU"),
        _ => None,
    }
}

fn search_type(value: i64, allow_raw: bool) -> Option<&'static str> {
    match value {
        0 => Some("directory"),
        1 => Some("file"),
        2 if allow_raw => Some("raw"),
        _ => None,
    }
}

fn search(kind: NodeKind, attrs: Attributes) -> NodeSpec {
    NodeSpec::new(kind, attrs, ParentRef::Deferred)
}

pub(super) fn comp_locator(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Signature_").unwrap_or_default());
    attrs.set_opt("Guid", cx.get("ComponentId"));
    if let Some(value) = cx.integer("Type", &mut out) {
        match search_type(value, false) {
            Some(name) => attrs.set("Type", name),
            None => out.warn(cx.unknown_enumerant("Type", value)),
        }
    }
    out.node = Some(search(NodeKind::ComponentSearch, attrs));
    out
}

pub(super) fn reg_locator(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Signature_").unwrap_or_default());
    if let Some(value) = cx.integer("Root", &mut out) {
        match registry_root(value) {
            Some(root) => attrs.set("Root", root),
            None => out.warn(cx.unknown_enumerant("Root", value)),
        }
    }
    attrs.set_opt("Key", cx.get("Key"));
    attrs.set_opt("Name", cx.get("Name"));
    if let Some(value) = cx.integer("Type", &mut out) {
        match search_type(value & REG_LOCATOR_TYPE_MASK, true) {
            Some(name) => attrs.set("Type", name),
            None => out.warn(cx.unknown_enumerant("Type", value & REG_LOCATOR_TYPE_MASK)),
        }
        if value & REG_LOCATOR_WIN64 != 0 {
            attrs.set("Win64", "yes");
        }
        let rest = value & !(REG_LOCATOR_TYPE_MASK | REG_LOCATOR_WIN64);
        if rest != 0 {
            out.warn(cx.warning(
                DiagnosticCode::UnknownBits,
                format!("column Type has unknown bits 0x{:x}", rest),
            ));
        }
    }
    out.node = Some(search(NodeKind::RegistrySearch, attrs));
    out
}

pub(super) fn ini_locator(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Signature_").unwrap_or_default());
    if let Some(file) = cx.get("FileName") {
        NamePair::parse(&file).apply(&mut attrs, "ShortName", "Name");
    }
    attrs.set_opt("Section", cx.get("Section"));
    attrs.set_opt("Key", cx.get("Key"));
    attrs.set_opt("Field", cx.integer("Field", &mut out).map(|f| f.to_string()));
    if let Some(value) = cx.integer("Type", &mut out) {
        match search_type(value, true) {
            Some(name) => attrs.set("Type", name),
            None => out.warn(cx.unknown_enumerant("Type", value)),
        }
    }
    out.node = Some(search(NodeKind::IniFileSearch, attrs));
    out
}

/// Directory searches are keyed by signature, parent and path, but other
/// rows name them by signature alone; they are also registered under that.
pub(super) fn dr_locator(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let signature = cx.get("Signature_").unwrap_or_default();
    let mut attrs = Attributes::new();
    attrs.set("Id", signature.as_str());
    attrs.set_opt("Path", cx.get("Path"));
    attrs.set_opt("Depth", cx.integer("Depth", &mut out).map(|d| d.to_string()));
    out.node = Some(search(NodeKind::DirectorySearch, attrs).with_partial_key(vec![signature]));
    out
}

pub(super) fn signature(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Signature").unwrap_or_default());
    if let Some(file) = cx.get("FileName") {
        NamePair::parse(&file).apply(&mut attrs, "ShortName", "Name");
    }
    attrs.set_opt("MinVersion", cx.get("MinVersion"));
    attrs.set_opt("MaxVersion", cx.get("MaxVersion"));
    for column in ["MinSize", "MaxSize", "MinDate", "MaxDate"] {
        attrs.set_opt(column, cx.integer(column, &mut out).map(|v| v.to_string()));
    }
    attrs.set_opt("Languages", cx.get("Languages"));
    out.node = Some(search(NodeKind::FileSearch, attrs));
    out
}
