//! Document node kinds.

use serde::{Deserialize, Serialize};

/// Kind of a document node.
///
/// One or more kinds exist per decoded table. `StandardAction` carries the
/// action name because each standard action is its own element;
/// `Extension` carries the element name chosen by an extension recipe.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    // ── Roots ──
    Product,
    Module,
    Patch,
    Fragment,

    // ── Layout ──
    Directory,
    Feature,
    Component,
    ComponentRef,
    File,
    CreateFolder,
    RemoveFile,
    RemoveFolder,
    RegistryKey,
    RegistryValue,
    MultiStringValue,
    OdbcDataSource,
    Environment,
    Shortcut,

    // ── Product data ──
    Property,
    Binary,
    Icon,
    Condition,
    CustomAction,
    Dialog,
    Media,
    Upgrade,
    UpgradeVersion,

    // ── Searches ──
    ComplianceCheck,
    ComplianceDrive,
    ComponentSearch,
    ComponentSearchRef,
    RegistrySearch,
    RegistrySearchRef,
    IniFileSearch,
    IniFileSearchRef,
    DirectorySearch,
    DirectorySearchRef,
    FileSearch,
    FileSearchRef,

    // ── Sequences ──
    InstallExecuteSequence,
    InstallUISequence,
    AdminExecuteSequence,
    AdminUISequence,
    AdvertiseExecuteSequence,
    Custom,
    Show,
    StandardAction(String),

    Extension(String),
}

impl NodeKind {
    /// Root kind for a declared root name.
    pub fn root_from_name(name: &str) -> Option<Self> {
        match name {
            "Product" => Some(Self::Product),
            "Module" => Some(Self::Module),
            "Patch" => Some(Self::Patch),
            "Fragment" => Some(Self::Fragment),
            _ => None,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(
            self,
            Self::Product | Self::Module | Self::Patch | Self::Fragment
        )
    }

    /// Element name of this kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Product => "Product",
            Self::Module => "Module",
            Self::Patch => "Patch",
            Self::Fragment => "Fragment",
            Self::Directory => "Directory",
            Self::Feature => "Feature",
            Self::Component => "Component",
            Self::ComponentRef => "ComponentRef",
            Self::File => "File",
            Self::CreateFolder => "CreateFolder",
            Self::RemoveFile => "RemoveFile",
            Self::RemoveFolder => "RemoveFolder",
            Self::RegistryKey => "RegistryKey",
            Self::RegistryValue => "RegistryValue",
            Self::MultiStringValue => "MultiStringValue",
            Self::OdbcDataSource => "ODBCDataSource",
            Self::Environment => "Environment",
            Self::Shortcut => "Shortcut",
            Self::Property => "Property",
            Self::Binary => "Binary",
            Self::Icon => "Icon",
            Self::Condition => "Condition",
            Self::CustomAction => "CustomAction",
            Self::Dialog => "Dialog",
            Self::Media => "Media",
            Self::Upgrade => "Upgrade",
            Self::UpgradeVersion => "UpgradeVersion",
            Self::ComplianceCheck => "ComplianceCheck",
            Self::ComplianceDrive => "ComplianceDrive",
            Self::ComponentSearch => "ComponentSearch",
            Self::ComponentSearchRef => "ComponentSearchRef",
            Self::RegistrySearch => "RegistrySearch",
            Self::RegistrySearchRef => "RegistrySearchRef",
            Self::IniFileSearch => "IniFileSearch",
            Self::IniFileSearchRef => "IniFileSearchRef",
            Self::DirectorySearch => "DirectorySearch",
            Self::DirectorySearchRef => "DirectorySearchRef",
            Self::FileSearch => "FileSearch",
            Self::FileSearchRef => "FileSearchRef",
            Self::InstallExecuteSequence => "InstallExecuteSequence",
            Self::InstallUISequence => "InstallUISequence",
            Self::AdminExecuteSequence => "AdminExecuteSequence",
            Self::AdminUISequence => "AdminUISequence",
            Self::AdvertiseExecuteSequence => "AdvertiseExecuteSequence",
            Self::Custom => "Custom",
            Self::Show => "Show",
            Self::StandardAction(name) => name,
            Self::Extension(name) => name,
        }
    }

    /// Whether this is a search element (not a reference to one).
    pub fn is_search(&self) -> bool {
        self.search_reference().is_some()
    }

    /// Whether this is a reference to a search authored elsewhere.
    pub fn is_search_reference(&self) -> bool {
        matches!(
            self,
            Self::ComponentSearchRef
                | Self::RegistrySearchRef
                | Self::IniFileSearchRef
                | Self::DirectorySearchRef
                | Self::FileSearchRef
        )
    }

    /// Reference kind standing in for a search kind.
    pub fn search_reference(&self) -> Option<Self> {
        match self {
            Self::ComponentSearch => Some(Self::ComponentSearchRef),
            Self::RegistrySearch => Some(Self::RegistrySearchRef),
            Self::IniFileSearch => Some(Self::IniFileSearchRef),
            Self::DirectorySearch => Some(Self::DirectorySearchRef),
            Self::FileSearch => Some(Self::FileSearchRef),
            _ => None,
        }
    }

    /// Whether a search of this kind can contain nested directory or file searches.
    pub fn is_search_container(&self) -> bool {
        matches!(
            self,
            Self::ComponentSearch
                | Self::RegistrySearch
                | Self::IniFileSearch
                | Self::DirectorySearch
                | Self::DirectorySearchRef
        )
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
