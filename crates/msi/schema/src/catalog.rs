//! Built-in table definitions.
//!
//! Definitions for every table the decompiler ships a recipe for, plus the
//! tables those reference. Extraction steps that read real packages supply
//! their own definitions; these are what tests and embedders use when they
//! build table dumps by hand.

use crate::column::{ColumnCategory as C, ColumnDefinition as Col};
use crate::table::{SchemaSet, TableDefinition};

/// Tables whose rows describe one execution phase each.
pub const SEQUENCE_TABLES: [&str; 5] = [
    "AdminExecuteSequence",
    "AdminUISequence",
    "AdvtExecuteSequence",
    "InstallExecuteSequence",
    "InstallUISequence",
];

/// Tables holding one search each, keyed by signature.
pub const LOCATOR_TABLES: [&str; 5] = [
    "CompLocator",
    "RegLocator",
    "IniLocator",
    "DrLocator",
    "Signature",
];

fn id(name: &str) -> Col {
    Col::new(name, C::Identifier)
}

fn key(name: &str) -> Col {
    Col::new(name, C::Identifier).primary()
}

fn int(name: &str) -> Col {
    Col::new(name, C::Integer)
}

fn text(name: &str, category: C) -> Col {
    Col::new(name, category)
}

const SEARCH_TARGETS: [&str; 5] = ["Signature", "RegLocator", "IniLocator", "DrLocator", "CompLocator"];

fn sequence_table(name: &str) -> TableDefinition {
    TableDefinition::new(
        name,
        vec![
            key("Action"),
            text("Condition", C::Condition).nullable(),
            int("Sequence").nullable(),
        ],
    )
}

/// Every built-in table definition.
pub fn standard_tables() -> Vec<TableDefinition> {
    let mut tables = vec![
        TableDefinition::new(
            "Property",
            vec![key("Property"), text("Value", C::Text)],
        ),
        TableDefinition::new("Binary", vec![key("Name"), text("Data", C::Binary)]),
        TableDefinition::new("Icon", vec![key("Name"), text("Data", C::Binary)]),
        TableDefinition::new(
            "Directory",
            vec![
                key("Directory"),
                id("Directory_Parent").nullable().references(&["Directory"]),
                text("DefaultDir", C::DefaultDir),
            ],
        ),
        TableDefinition::new(
            "Feature",
            vec![
                key("Feature"),
                id("Feature_Parent").nullable().references(&["Feature"]),
                text("Title", C::Text).nullable(),
                text("Description", C::Text).nullable(),
                int("Display").nullable(),
                int("Level"),
                id("Directory_").nullable().references(&["Directory"]),
                int("Attributes"),
            ],
        ),
        TableDefinition::new(
            "Condition",
            vec![
                key("Feature_").references(&["Feature"]),
                int("Level").primary(),
                text("Condition", C::Condition).nullable(),
            ],
        ),
        TableDefinition::new(
            "LaunchCondition",
            vec![
                text("Condition", C::Condition).primary(),
                text("Description", C::Formatted),
            ],
        ),
        TableDefinition::new(
            "Component",
            vec![
                key("Component"),
                text("ComponentId", C::Guid).nullable(),
                id("Directory_").references(&["Directory"]),
                int("Attributes"),
                text("Condition", C::Condition).nullable(),
                id("KeyPath")
                    .nullable()
                    .references(&["File", "Registry", "ODBCDataSource"]),
            ],
        ),
        TableDefinition::new(
            "FeatureComponents",
            vec![
                key("Feature_").references(&["Feature"]),
                key("Component_").references(&["Component"]),
            ],
        ),
        TableDefinition::new(
            "File",
            vec![
                key("File"),
                id("Component_").references(&["Component"]),
                text("FileName", C::Filename),
                Col::new("FileSize", C::DoubleInteger),
                text("Version", C::Version).nullable().references(&["File"]),
                text("Language", C::Language).nullable(),
                int("Attributes").nullable(),
                int("Sequence"),
            ],
        ),
        TableDefinition::new(
            "CreateFolder",
            vec![
                key("Directory_").references(&["Directory"]),
                key("Component_").references(&["Component"]),
            ],
        ),
        TableDefinition::new(
            "RemoveFile",
            vec![
                key("FileKey"),
                id("Component_").references(&["Component"]),
                text("FileName", C::WildCardFilename).nullable(),
                id("DirProperty"),
                int("InstallMode"),
            ],
        ),
        TableDefinition::new(
            "Registry",
            vec![
                key("Registry"),
                int("Root"),
                text("Key", C::RegPath),
                text("Name", C::Formatted).nullable(),
                text("Value", C::Formatted).nullable(),
                id("Component_").references(&["Component"]),
            ],
        ),
        TableDefinition::new(
            "ODBCDataSource",
            vec![
                key("DataSource"),
                id("Component_").references(&["Component"]),
                text("Description", C::Text),
                text("DriverDescription", C::Text),
                int("Registration"),
            ],
        ),
        TableDefinition::new(
            "Environment",
            vec![
                key("Environment"),
                text("Name", C::Text),
                text("Value", C::Formatted).nullable(),
                id("Component_").references(&["Component"]),
            ],
        ),
        TableDefinition::new(
            "Shortcut",
            vec![
                key("Shortcut"),
                id("Directory_").references(&["Directory"]),
                text("Name", C::Filename),
                id("Component_").references(&["Component"]),
                text("Target", C::Shortcut),
                text("Arguments", C::Formatted).nullable(),
                text("Description", C::Text).nullable(),
                int("Hotkey").nullable(),
                id("Icon_").nullable().references(&["Icon"]),
                int("IconIndex").nullable(),
                int("ShowCmd").nullable(),
                id("WkDir").nullable(),
            ],
        ),
        TableDefinition::new(
            "CustomAction",
            vec![
                key("Action"),
                int("Type"),
                text("Source", C::CustomSource).nullable(),
                text("Target", C::Formatted).nullable(),
            ],
        ),
        TableDefinition::new(
            "Dialog",
            vec![
                key("Dialog"),
                int("HCentering"),
                int("VCentering"),
                int("Width"),
                int("Height"),
                Col::new("Attributes", C::DoubleInteger).nullable(),
                text("Title", C::Formatted).nullable(),
                id("Control_First"),
                id("Control_Default").nullable(),
                id("Control_Cancel").nullable(),
            ],
        ),
        TableDefinition::new(
            "Media",
            vec![
                int("DiskId").primary(),
                int("LastSequence"),
                text("DiskPrompt", C::Text).nullable(),
                text("Cabinet", C::Cabinet).nullable(),
                text("VolumeLabel", C::Text).nullable(),
                text("Source", C::Property).nullable(),
            ],
        ),
        TableDefinition::new(
            "Upgrade",
            vec![
                text("UpgradeCode", C::Guid).primary(),
                text("VersionMin", C::Text).primary().nullable(),
                text("VersionMax", C::Text).primary().nullable(),
                text("Language", C::Language).primary().nullable(),
                int("Attributes").primary(),
                text("Remove", C::Formatted).nullable(),
                text("ActionProperty", C::UpperCase),
            ],
        ),
        TableDefinition::new(
            "AppSearch",
            vec![
                key("Property"),
                key("Signature_").references(&SEARCH_TARGETS),
            ],
        ),
        TableDefinition::new(
            "CCPSearch",
            vec![key("Signature_").references(&SEARCH_TARGETS)],
        ),
        TableDefinition::new(
            "CompLocator",
            vec![
                key("Signature_"),
                text("ComponentId", C::Guid),
                int("Type").nullable(),
            ],
        ),
        TableDefinition::new(
            "RegLocator",
            vec![
                key("Signature_"),
                int("Root"),
                text("Key", C::RegPath),
                text("Name", C::Formatted).nullable(),
                int("Type").nullable(),
            ],
        ),
        TableDefinition::new(
            "IniLocator",
            vec![
                key("Signature_"),
                text("FileName", C::Filename),
                text("Section", C::Text),
                text("Key", C::Text),
                int("Field").nullable(),
                int("Type").nullable(),
            ],
        ),
        TableDefinition::new(
            "DrLocator",
            vec![
                key("Signature_"),
                id("Parent").primary().nullable(),
                text("Path", C::AnyPath).primary().nullable(),
                int("Depth").nullable(),
            ],
        ),
        TableDefinition::new(
            "Signature",
            vec![
                key("Signature"),
                text("FileName", C::Text),
                text("MinVersion", C::Text).nullable(),
                text("MaxVersion", C::Text).nullable(),
                Col::new("MinSize", C::DoubleInteger).nullable(),
                Col::new("MaxSize", C::DoubleInteger).nullable(),
                Col::new("MinDate", C::DoubleInteger).nullable(),
                Col::new("MaxDate", C::DoubleInteger).nullable(),
                text("Languages", C::Language).nullable(),
            ],
        ),
    ];
    tables.extend(SEQUENCE_TABLES.iter().map(|name| sequence_table(name)));
    tables
}

/// Built-in definitions as a schema set.
pub fn standard_schema() -> SchemaSet {
    let mut set = SchemaSet::new();
    for definition in standard_tables() {
        // Built-in names are distinct.
        let _ = set.insert(definition);
    }
    set
}

/// Look up one built-in definition by name.
pub fn definition(name: &str) -> Option<TableDefinition> {
    standard_tables().into_iter().find(|t| t.name == name)
}
