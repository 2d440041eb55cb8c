//! Recipes for product-level data: properties, binary streams, custom
//! actions, dialogs, media and upgrade detection.

use msi_document::{Attributes, NodeKind};

use crate::diagnostics::DiagnosticCode;

use super::flags::{flag, BitFlag};
use super::{Decoded, NodeSpec, ParentRef, RowContext};

// ── Custom action type bits ──

const CA_TARGET_MASK: i64 = 0x7;
const CA_SOURCE_MASK: i64 = 0x30;
const CA_SOURCE_BINARY: i64 = 0x00;
const CA_SOURCE_FILE: i64 = 0x10;
const CA_SOURCE_DIRECTORY: i64 = 0x20;
const CA_SOURCE_PROPERTY: i64 = 0x30;
const CA_CONTINUE: i64 = 0x40;
const CA_ASYNC: i64 = 0x80;
const CA_SCHEDULE_MASK: i64 = 0x300;
const CA_IN_SCRIPT: i64 = 0x400;
const CA_NO_IMPERSONATE: i64 = 0x800;
const CA_KNOWN_BITS: i64 = 0xFFFF;

const CA_FLAGS: [BitFlag; 4] = [
    flag(0x1000, "Win64", "yes"),
    flag(0x2000, "HideTarget", "yes"),
    flag(0x4000, "TerminalServerAware", "yes"),
    flag(0x8000, "PatchUninstall", "yes"),
];

const UPGRADE_FLAGS: [BitFlag; 6] = [
    flag(0x1, "MigrateFeatures", "yes"),
    flag(0x2, "OnlyDetect", "yes"),
    flag(0x4, "IgnoreRemoveFailure", "yes"),
    flag(0x100, "IncludeMinimum", "yes"),
    flag(0x200, "IncludeMaximum", "yes"),
    flag(0x400, "ExcludeLanguages", "yes"),
];

pub(super) fn property(cx: &RowContext<'_>) -> Decoded {
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Property").unwrap_or_default());
    attrs.set_opt("Value", cx.get("Value"));
    Decoded::node(NodeSpec::new(NodeKind::Property, attrs, ParentRef::Root))
}

/// `Binary` and `Icon` rows; the stream itself is written by the extractor
/// under `<table>/<name>`.
pub(super) fn binary(cx: &RowContext<'_>, kind: NodeKind) -> Decoded {
    let name = cx.get("Name").unwrap_or_default();
    let mut attrs = Attributes::new();
    attrs.set("Id", name.as_str());
    attrs.set("SourceFile", format!("{}/{}", cx.table, name));
    Decoded::node(NodeSpec::new(kind, attrs, ParentRef::Root))
}

pub(super) fn custom_action(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Action").unwrap_or_default());
    let source = cx.get("Source");
    let target = cx.get("Target");

    let Some(kind) = cx.integer("Type", &mut out) else {
        out.node = Some(NodeSpec::new(NodeKind::CustomAction, attrs, ParentRef::Root));
        return out;
    };

    // Where the code or value comes from.
    let source_attr = match kind & CA_SOURCE_MASK {
        CA_SOURCE_BINARY => "BinaryKey",
        CA_SOURCE_FILE => "FileKey",
        CA_SOURCE_DIRECTORY => "Directory",
        _ => "Property",
    };
    // What kind of action it is.
    let target_attr = match (kind & CA_TARGET_MASK, kind & CA_SOURCE_MASK) {
        (1, _) => Some("DllEntry"),
        (2, _) => Some("ExeCommand"),
        (3, CA_SOURCE_FILE) => Some("Error"),
        (3, CA_SOURCE_DIRECTORY) | (3, CA_SOURCE_PROPERTY) => Some("Value"),
        (5, CA_SOURCE_DIRECTORY) => {
            attrs.set("Script", "jscript");
            Some("ScriptText")
        }
        (6, CA_SOURCE_DIRECTORY) => {
            attrs.set("Script", "vbscript");
            Some("ScriptText")
        }
        (5, _) => Some("JScriptCall"),
        (6, _) => Some("VBScriptCall"),
        _ => None,
    };

    match target_attr {
        Some(target_attr) => {
            // Inline scripts and error messages carry no source.
            if target_attr != "ScriptText" && target_attr != "Error" {
                attrs.set_opt(source_attr, source);
            }
            attrs.set_opt(target_attr, target);
        }
        None => {
            out.warn(cx.unknown_enumerant("Type", kind & (CA_TARGET_MASK | CA_SOURCE_MASK)));
            attrs.set_opt("Source", source);
            attrs.set_opt("Target", target);
        }
    }

    match (kind & CA_CONTINUE != 0, kind & CA_ASYNC != 0) {
        (true, true) => attrs.set("Return", "asyncNoWait"),
        (false, true) => attrs.set("Return", "asyncWait"),
        (true, false) => attrs.set("Return", "ignore"),
        (false, false) => {}
    }

    if kind & CA_IN_SCRIPT != 0 {
        match kind & CA_SCHEDULE_MASK {
            0 => attrs.set("Execute", "deferred"),
            0x100 => attrs.set("Execute", "rollback"),
            0x200 => attrs.set("Execute", "commit"),
            _ => out.warn(cx.warning(
                DiagnosticCode::AmbiguousBits,
                "column Type marks an action both rollback and commit",
            )),
        }
        if kind & CA_NO_IMPERSONATE != 0 {
            attrs.set("Impersonate", "no");
        }
    } else {
        match kind & CA_SCHEDULE_MASK {
            0x100 => attrs.set("Execute", "firstSequence"),
            0x200 => attrs.set("Execute", "oncePerProcess"),
            0x300 => attrs.set("Execute", "secondSequence"),
            _ => {}
        }
    }

    let consumed = CA_TARGET_MASK
        | CA_SOURCE_MASK
        | CA_CONTINUE
        | CA_ASYNC
        | CA_SCHEDULE_MASK
        | CA_IN_SCRIPT
        | CA_NO_IMPERSONATE;
    cx.apply_flags("Type", kind & CA_KNOWN_BITS, &CA_FLAGS, consumed, &mut attrs, &mut out);
    if kind & !CA_KNOWN_BITS != 0 {
        out.warn(cx.warning(
            DiagnosticCode::UnknownBits,
            format!("column Type has unknown bits 0x{:x}", kind & !CA_KNOWN_BITS),
        ));
    }

    out.node = Some(NodeSpec::new(NodeKind::CustomAction, attrs, ParentRef::Root));
    out
}

pub(super) fn dialog(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Dialog").unwrap_or_default());
    for (column, attr) in [
        ("HCentering", "X"),
        ("VCentering", "Y"),
        ("Width", "Width"),
        ("Height", "Height"),
    ] {
        attrs.set_opt(attr, cx.integer(column, &mut out).map(|v| v.to_string()));
    }
    attrs.set_opt("Title", cx.get("Title"));
    if let Some(bits) = cx.integer("Attributes", &mut out) {
        // Bit 0 is "visible"; its absence is what the document records.
        if bits & 0x1 == 0 {
            attrs.set("Hidden", "yes");
        }
        if bits & 0x2 == 0 {
            attrs.set("Modeless", "yes");
        }
    }
    out.node = Some(NodeSpec::new(NodeKind::Dialog, attrs, ParentRef::Root));
    out
}

pub(super) fn media(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set_opt("Id", cx.integer("DiskId", &mut out).map(|d| d.to_string()));
    if let Some(cabinet) = cx.get("Cabinet") {
        match cabinet.strip_prefix('#') {
            Some(embedded) => {
                attrs.set("Cabinet", embedded);
                attrs.set("EmbedCab", "yes");
            }
            None => attrs.set("Cabinet", cabinet.as_str()),
        }
    }
    attrs.set_opt("DiskPrompt", cx.get("DiskPrompt"));
    attrs.set_opt("VolumeLabel", cx.get("VolumeLabel"));
    attrs.set_opt("Source", cx.get("Source"));
    out.node = Some(NodeSpec::new(NodeKind::Media, attrs, ParentRef::Root));
    out
}

/// One `UpgradeVersion`; grouping under a shared `Upgrade` happens once
/// the whole table is known.
pub(super) fn upgrade(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set_opt("Minimum", cx.get("VersionMin"));
    attrs.set_opt("Maximum", cx.get("VersionMax"));
    attrs.set_opt("Language", cx.get("Language"));
    if let Some(bits) = cx.integer("Attributes", &mut out) {
        cx.apply_flags("Attributes", bits, &UPGRADE_FLAGS, 0, &mut attrs, &mut out);
    }
    attrs.set_opt("RemoveFeatures", cx.get("Remove"));
    attrs.set_opt("Property", cx.get("ActionProperty"));
    out.node = Some(NodeSpec::new(NodeKind::UpgradeVersion, attrs, ParentRef::Deferred));
    out
}
