//! Recipes for machine state written by components: registry values,
//! environment variables, ODBC data sources and shortcuts.

use msi_document::{Attributes, NodeKind};

use super::names::NamePair;
use super::{Decoded, NodeSpec, ParentRef, RowContext};

const MULTI_STRING_MARKER: &str = "[~]";

fn root_name(root: i64) -> Option<&'static str> {
    match root {
        -1 => Some("HKMU"),
        0 => Some("HKCR"),
        1 => Some("HKCU"),
        2 => Some("HKLM"),
        3 => Some("HKU"),
        _ => None,
    }
}

/// Decoded form of a registry `Value` column.
#[derive(Debug, PartialEq, Eq)]
enum RegistryValue {
    Binary(String),
    Expandable(String),
    Integer(String),
    Text(String),
    MultiString { action: &'static str, values: Vec<String> },
}

fn decode_value(raw: &str) -> RegistryValue {
    if let Some(rest) = raw.strip_prefix("#x") {
        RegistryValue::Binary(rest.to_string())
    } else if let Some(rest) = raw.strip_prefix("#%") {
        RegistryValue::Expandable(rest.to_string())
    } else if let Some(rest) = raw.strip_prefix("##") {
        RegistryValue::Text(format!("#{}", rest))
    } else if let Some(rest) = raw.strip_prefix('#') {
        RegistryValue::Integer(rest.to_string())
    } else if raw.contains(MULTI_STRING_MARKER) {
        let leading = raw.starts_with(MULTI_STRING_MARKER);
        let trailing = raw.len() > MULTI_STRING_MARKER.len() && raw.ends_with(MULTI_STRING_MARKER);
        let action = match (leading, trailing) {
            (true, false) => "append",
            (false, true) => "prepend",
            _ => "write",
        };
        let values = raw
            .split(MULTI_STRING_MARKER)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        RegistryValue::MultiString { action, values }
    } else {
        RegistryValue::Text(raw.to_string())
    }
}

pub(super) fn registry(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Registry").unwrap_or_default());
    if let Some(root) = cx.integer("Root", &mut out) {
        match root_name(root) {
            Some(name) => attrs.set("Root", name),
            None => out.warn(cx.unknown_enumerant("Root", root)),
        }
    }
    attrs.set_opt("Key", cx.get("Key"));
    let parent = ParentRef::row_or_root("Component", cx.get("Component_"));

    let name = cx.get("Name");
    let value = cx.get("Value");

    // Key-only rows: a marker name and no value.
    if value.is_none() {
        let action = match name.as_deref() {
            Some("+") => Some("create"),
            Some("-") => Some("removeOnUninstall"),
            Some("*") => Some("createAndRemoveOnUninstall"),
            _ => None,
        };
        if let Some(action) = action {
            attrs.set("Action", action);
            out.node = Some(NodeSpec::new(NodeKind::RegistryKey, attrs, parent));
            return out;
        }
    }

    attrs.set_opt("Name", name);
    let mut spec_children = Vec::new();
    match value.as_deref().map(decode_value) {
        None => attrs.set("Type", "string"),
        Some(RegistryValue::Binary(v)) => {
            attrs.set("Type", "binary");
            attrs.set("Value", v);
        }
        Some(RegistryValue::Expandable(v)) => {
            attrs.set("Type", "expandable");
            attrs.set("Value", v);
        }
        Some(RegistryValue::Integer(v)) => {
            attrs.set("Type", "integer");
            attrs.set("Value", v);
        }
        Some(RegistryValue::Text(v)) => {
            attrs.set("Type", "string");
            attrs.set("Value", v);
        }
        Some(RegistryValue::MultiString { action, values }) => {
            attrs.set("Type", "multiString");
            attrs.set("Action", action);
            spec_children = values;
        }
    }

    let mut spec = NodeSpec::new(NodeKind::RegistryValue, attrs, parent);
    for value in spec_children {
        spec = spec.with_child(
            NodeKind::MultiStringValue,
            Attributes::from([("Value", value.as_str())]),
        );
    }
    out.node = Some(spec);
    out
}

pub(super) fn environment(cx: &RowContext<'_>) -> Decoded {
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Environment").unwrap_or_default());

    let raw_name = cx.get("Name").unwrap_or_default();
    let mut name = raw_name.as_str();
    let mut flags = Vec::new();
    while let Some(c) = name.chars().next().filter(|c| "=+-!*".contains(*c)) {
        flags.push(c);
        name = &name[c.len_utf8()..];
    }
    attrs.set("Name", name);
    for c in flags {
        match c {
            '=' => attrs.set("Action", "create"),
            '+' => attrs.set("Action", "set"),
            '!' => attrs.set("Action", "remove"),
            '-' => attrs.set("Permanent", "no"),
            '*' => attrs.set("System", "yes"),
            _ => {}
        }
    }

    if let Some(value) = cx.get("Value") {
        if let Some(rest) = value.strip_prefix("[~];") {
            attrs.set("Part", "last");
            attrs.set("Value", rest);
        } else if let Some(rest) = value.strip_suffix(";[~]") {
            attrs.set("Part", "first");
            attrs.set("Value", rest);
        } else if value != MULTI_STRING_MARKER {
            attrs.set("Value", value);
        }
    }

    let parent = ParentRef::row_or_root("Component", cx.get("Component_"));
    Decoded::node(NodeSpec::new(NodeKind::Environment, attrs, parent))
}

pub(super) fn odbc_data_source(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("DataSource").unwrap_or_default());
    attrs.set_opt("Name", cx.get("Description"));
    attrs.set_opt("DriverName", cx.get("DriverDescription"));
    match cx.integer("Registration", &mut out) {
        Some(0) => attrs.set("Registration", "machine"),
        Some(1) => attrs.set("Registration", "user"),
        Some(other) => out.warn(cx.unknown_enumerant("Registration", other)),
        None => {}
    }
    let parent = ParentRef::row_or_root("Component", cx.get("Component_"));
    out.node = Some(NodeSpec::new(NodeKind::OdbcDataSource, attrs, parent));
    out
}

pub(super) fn shortcut(cx: &RowContext<'_>) -> Decoded {
    let mut out = Decoded::default();
    let mut attrs = Attributes::new();
    attrs.set("Id", cx.get("Shortcut").unwrap_or_default());
    attrs.set_opt("Directory", cx.get("Directory_"));
    if let Some(name) = cx.get("Name") {
        NamePair::parse(&name).apply(&mut attrs, "ShortName", "Name");
    }
    // A formatted target names a path; a bare identifier names the
    // feature of an advertised shortcut.
    match cx.get("Target") {
        Some(target) if target.contains('[') => attrs.set("Target", target),
        Some(_) => attrs.set("Advertise", "yes"),
        None => {}
    }
    attrs.set_opt("Arguments", cx.get("Arguments"));
    attrs.set_opt("Description", cx.get("Description"));
    attrs.set_opt("Hotkey", cx.integer("Hotkey", &mut out).map(|h| h.to_string()));
    attrs.set_opt("Icon", cx.get("Icon_"));
    attrs.set_opt("IconIndex", cx.integer("IconIndex", &mut out).map(|i| i.to_string()));
    match cx.integer("ShowCmd", &mut out) {
        Some(1) => attrs.set("Show", "normal"),
        Some(3) => attrs.set("Show", "maximized"),
        Some(7) => attrs.set("Show", "minimized"),
        Some(other) => out.warn(cx.unknown_enumerant("ShowCmd", other)),
        None => {}
    }
    attrs.set_opt("WorkingDirectory", cx.get("WkDir"));
    let parent = ParentRef::row_or_root("Component", cx.get("Component_"));
    out.node = Some(NodeSpec::new(NodeKind::Shortcut, attrs, parent));
    out
}
