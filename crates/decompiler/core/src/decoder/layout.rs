//! Recipes for the installation layout: directories, features,
//! components, files and folder operations.

use msi_document::{Attributes, NodeKind};

use super::flags::{flag, BitFlag};
use super::names::{DefaultDirNames, NamePair};
use super::{Decoded, NodeSpec, ParentRef, RowContext};

const FEATURE_FLAGS: [BitFlag; 6] = [
    flag(0x1, "InstallDefault", "source"),
    flag(0x2, "InstallDefault", "followParent"),
    flag(0x4, "TypicalDefault", "advertise"),
    flag(0x8, "AllowAdvertise", "no"),
    flag(0x10, "Absent", "disallow"),
    flag(0x20, "AllowAdvertise", "system"),
];

/// Location bits of a component.
const COMPONENT_SOURCE: i64 = 0x1;
const COMPONENT_EITHER: i64 = 0x2;
/// Key-path kind bits, read by the key-path linking unit.
pub(crate) const COMPONENT_REGISTRY_KEY_PATH: i64 = 0x4;
pub(crate) const COMPONENT_ODBC_KEY_PATH: i64 = 0x20;

const COMPONENT_FLAGS: [BitFlag; 10] = [
    flag(COMPONENT_SOURCE, "Location", "source"),
    flag(COMPONENT_EITHER, "Location", "either"),
    flag(0x8, "SharedDllRefCount", "yes"),
    flag(0x10, "Permanent", "yes"),
    flag(0x40, "Transitive", "yes"),
    flag(0x80, "NeverOverwrite", "yes"),
    flag(0x100, "Win64", "yes"),
    flag(0x200, "DisableRegistryReflection", "yes"),
    flag(0x400, "UninstallWhenSuperseded", "yes"),
    flag(0x800, "Shared", "yes"),
];

const FILE_FLAGS: [BitFlag; 7] = [
    flag(0x1, "ReadOnly", "yes"),
    flag(0x2, "Hidden", "yes"),
    flag(0x4, "System", "yes"),
    flag(0x200, "Vital", "yes"),
    flag(0x400, "Checksum", "yes"),
    flag(0x2000, "Compressed", "no"),
    flag(0x4000, "Compressed", "yes"),
];
/// Patch-added marker; carries no document attribute.
const FILE_PATCH_ADDED: i64 = 0x1000;

pub(super) fn directory(cx: &RowContext<'_>) -> Decoded {
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Directory").unwrap_or_default());
    if let Some(default_dir) = cx.get("DefaultDir") {
        DefaultDirNames::parse(&default_dir).apply(&mut attrs);
    }
    let parent = ParentRef::row_or_root("Directory", cx.get("Directory_Parent"));
    Decoded::node(NodeSpec::new(NodeKind::Directory, attrs, parent))
}

pub(super) fn feature(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Feature").unwrap_or_default());
    attrs.set_opt("Title", cx.get("Title"));
    attrs.set_opt("Description", cx.get("Description"));
    if let Some(display) = cx.integer("Display", &mut out) {
        let value = match display {
            0 => "hidden",
            n if n % 2 == 1 => "expand",
            _ => "collapse",
        };
        attrs.set("Display", value);
    }
    attrs.set_opt("Level", cx.integer("Level", &mut out).map(|l| l.to_string()));
    attrs.set_opt("ConfigurableDirectory", cx.get("Directory_"));
    if let Some(bits) = cx.integer("Attributes", &mut out) {
        cx.check_exclusive("Attributes", bits, &[0x1, 0x2], &mut out);
        cx.check_exclusive("Attributes", bits, &[0x8, 0x20], &mut out);
        cx.apply_flags("Attributes", bits, &FEATURE_FLAGS, 0, &mut attrs, &mut out);
    }

    let parent = match cx.get("Feature_Parent") {
        Some(key) => ParentRef::Row {
            table: "Feature".into(),
            key: vec![key],
            warn_on_self: true,
        },
        None => ParentRef::Root,
    };
    out.node = Some(NodeSpec::new(NodeKind::Feature, attrs, parent));
    out
}

pub(super) fn condition(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set_opt("Level", cx.integer("Level", &mut out).map(|l| l.to_string()));
    attrs.set_opt("Condition", cx.get("Condition"));
    let parent = ParentRef::row_or_root("Feature", cx.get("Feature_"));
    out.node = Some(NodeSpec::new(NodeKind::Condition, attrs, parent));
    out
}

pub(super) fn launch_condition(cx: &RowContext<'_>) -> Decoded {
    let mut attrs = Attributes::new();
    attrs.set_opt("Message", cx.get("Description"));
    attrs.set_opt("Condition", cx.get("Condition"));
    Decoded::node(NodeSpec::new(NodeKind::Condition, attrs, ParentRef::Root))
}

pub(super) fn component(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Component").unwrap_or_default());
    attrs.set("Guid", cx.get("ComponentId").unwrap_or_default());
    if let Some(bits) = cx.integer("Attributes", &mut out) {
        cx.check_exclusive("Attributes", bits, &[COMPONENT_SOURCE, COMPONENT_EITHER], &mut out);
        cx.check_exclusive(
            "Attributes",
            bits,
            &[COMPONENT_REGISTRY_KEY_PATH, COMPONENT_ODBC_KEY_PATH],
            &mut out,
        );
        cx.apply_flags(
            "Attributes",
            bits,
            &COMPONENT_FLAGS,
            COMPONENT_REGISTRY_KEY_PATH | COMPONENT_ODBC_KEY_PATH,
            &mut attrs,
            &mut out,
        );
    }
    attrs.set_opt("Condition", cx.get("Condition"));
    let parent = ParentRef::row_or_root("Directory", cx.get("Directory_"));
    out.node = Some(NodeSpec::new(NodeKind::Component, attrs, parent));
    out
}

pub(super) fn feature_components(cx: &RowContext<'_>) -> Decoded {
    let attrs = Attributes::from([("Id", cx.get("Component_").unwrap_or_default().as_str())]);
    let parent = ParentRef::row_or_root("Feature", cx.get("Feature_"));
    Decoded::node(NodeSpec::new(NodeKind::ComponentRef, attrs, parent))
}

pub(super) fn file(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("File").unwrap_or_default());
    if let Some(name) = cx.get("FileName") {
        NamePair::parse(&name).apply(&mut attrs, "ShortName", "Name");
    }
    // A version naming another file is turned into a companion reference
    // once every file is known.
    attrs.set_opt("DefaultVersion", cx.get("Version"));
    attrs.set_opt("DefaultLanguage", cx.get("Language"));
    if let Some(bits) = cx.integer("Attributes", &mut out) {
        cx.check_exclusive("Attributes", bits, &[0x2000, 0x4000], &mut out);
        cx.apply_flags("Attributes", bits, &FILE_FLAGS, FILE_PATCH_ADDED, &mut attrs, &mut out);
    }
    let parent = ParentRef::row_or_root("Component", cx.get("Component_"));
    out.node = Some(NodeSpec::new(NodeKind::File, attrs, parent));
    out
}

pub(super) fn create_folder(cx: &RowContext<'_>) -> Decoded {
    let directory = cx.get("Directory_");
    let component = cx.get("Component_");

    // The component's own directory is implied by nesting.
    let component_directory = component
        .as_deref()
        .and_then(|c| cx.index.get_one("Component", c))
        .and_then(|id| cx.tree.parent(id))
        .and_then(|dir| cx.tree.get(dir).ok())
        .filter(|node| node.kind == NodeKind::Directory)
        .and_then(|node| node.id().map(str::to_string));

    let mut attrs = Attributes::new();
    if directory != component_directory {
        attrs.set_opt("Directory", directory);
    }
    let parent = ParentRef::row_or_root("Component", component);
    Decoded::node(NodeSpec::new(NodeKind::CreateFolder, attrs, parent))
}

pub(super) fn remove_file(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("FileKey").unwrap_or_default());

    let file_name = cx.get("FileName");
    if let Some(name) = &file_name {
        NamePair::parse(name).apply(&mut attrs, "ShortName", "Name");
    }
    if let Some(mode) = cx.integer("InstallMode", &mut out) {
        match mode {
            1 => attrs.set("On", "install"),
            2 => attrs.set("On", "uninstall"),
            3 => attrs.set("On", "both"),
            other => out.warn(cx.unknown_enumerant("InstallMode", other)),
        }
    }

    let kind = if file_name.is_some() {
        NodeKind::RemoveFile
    } else {
        NodeKind::RemoveFolder
    };
    let parent = ParentRef::row_or_root("Component", cx.get("Component_"));
    out.node = Some(NodeSpec::new(kind, attrs, parent));
    out
}
