//! End-to-end test: sequence tables rebuilt as scheduled actions.
//!
//! Verifies that:
//! - A custom action between two standard actions is scheduled before the next one
//! - Tied positions force explicit numbers for the whole table
//! - Exit dialogs are shown on exit
//! - Placements in the document compile back to the original positions

use msi_decompiler::{
    DecompilerConfig, Placement, PlacedAction, SequencePhase, StandardActions,
};
use msi_decompiler_tests::*;
use msi_document::NodeView;
use msi_schema::FieldValue;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dialog(id: &str) -> Vec<FieldValue> {
    vec![
        id.into(),
        int(50),
        int(50),
        int(370),
        int(270),
        int(3),
        "[ProductName]".into(),
        "Finish".into(),
        "Finish".into(),
        null(),
    ]
}

fn execute_sequence(view: &NodeView) -> &NodeView {
    view.children_of_kind("InstallExecuteSequence").next().unwrap()
}

/// Placements read back from the authored sequence elements.
fn placements(sequence: &NodeView) -> Vec<PlacedAction> {
    sequence
        .children
        .iter()
        .map(|child| {
            let action = child
                .attribute("Action")
                .or_else(|| child.attribute("Dialog"))
                .unwrap_or(child.kind.as_str())
                .to_string();
            let placement = if let Some(n) = child.attribute("Sequence") {
                Placement::Absolute(n.parse().unwrap())
            } else if let Some(anchor) = child.attribute("Before") {
                Placement::Before(anchor.to_string())
            } else if let Some(anchor) = child.attribute("After") {
                Placement::After(anchor.to_string())
            } else {
                Placement::ConditionOnly
            };
            PlacedAction {
                action,
                condition: child.attribute("Condition").map(str::to_string),
                sequence: 0,
                placement,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn custom_action_before_next_standard_action() {
    let tables = dump(vec![
        table("CustomAction", vec![set_property_action("MyAction")]),
        table(
            "InstallExecuteSequence",
            vec![
                sequence("CostInitialize", None, 800),
                sequence("MyAction", None, 801),
                sequence("CostFinalize", None, 802),
            ],
        ),
    ]);
    let output = decompile(&tables);
    let view = output.view().unwrap();
    let sequence = execute_sequence(&view);

    let custom = sequence.children_of_kind("Custom").next().unwrap();
    assert_eq!(custom.attribute("Action"), Some("MyAction"));
    assert_eq!(custom.attribute("Before"), Some("CostFinalize"));
    assert_eq!(custom.attribute("After"), None);
    assert!(sequence.children_of_kind("CostInitialize").next().is_none());
}

#[test]
fn tied_positions_fall_back_to_numbers() {
    let tables = dump(vec![
        table(
            "CustomAction",
            vec![set_property_action("A"), set_property_action("B")],
        ),
        table(
            "InstallExecuteSequence",
            vec![sequence("A", None, 500), sequence("B", None, 500)],
        ),
    ]);
    let output = decompile(&tables);
    let view = output.view().unwrap();
    let sequence = execute_sequence(&view);

    let numbers: Vec<_> = sequence
        .children_of_kind("Custom")
        .map(|c| (c.attribute("Action"), c.attribute("Sequence")))
        .collect();
    assert_eq!(
        numbers,
        vec![(Some("A"), Some("500")), (Some("B"), Some("500"))]
    );
}

#[test]
fn exit_dialog_is_shown_on_exit() {
    let tables = dump(vec![
        table("Dialog", vec![dialog("FatalError"), dialog("WelcomeDlg")]),
        table(
            "InstallUISequence",
            vec![
                sequence("FatalError", None, -3),
                sequence("WelcomeDlg", Some("NOT Installed"), 1297),
            ],
        ),
    ]);
    let output = decompile(&tables);
    let view = output.view().unwrap();
    let ui = view.children_of_kind("InstallUISequence").next().unwrap();

    let shows: Vec<_> = ui.children_of_kind("Show").collect();
    assert_eq!(shows[0].attribute("Dialog"), Some("FatalError"));
    assert_eq!(shows[0].attribute("OnExit"), Some("error"));
    assert_eq!(shows[1].attribute("Dialog"), Some("WelcomeDlg"));
    assert_eq!(shows[1].attribute("Condition"), Some("NOT Installed"));
}

#[test]
fn authored_sequence_compiles_back() {
    let rows = [
        ("AppSearch", 50),
        ("LaunchConditions", 100),
        ("SetDefaults", 101),
        ("CostInitialize", 800),
        ("CheckDisk", 999),
        ("CostFinalize", 1000),
        ("LateAction", 1001),
        ("LaterAction", 1002),
    ];
    let tables = dump(vec![
        table(
            "CustomAction",
            vec![
                set_property_action("SetDefaults"),
                set_property_action("CheckDisk"),
                set_property_action("LateAction"),
                set_property_action("LaterAction"),
            ],
        ),
        table(
            "InstallExecuteSequence",
            rows.iter().map(|(a, n)| sequence(a, None, *n)).collect(),
        ),
    ]);
    let output = decompile(&tables);
    let view = output.view().unwrap();
    let authored = placements(execute_sequence(&view));

    let standard = StandardActions::from_config(&DecompilerConfig::default()).unwrap();
    let numbers = forward_schedule(SequencePhase::InstallExecute, &standard, &authored);
    for (action, position) in rows {
        let expected = match numbers.get(action) {
            Some(n) => *n,
            // Not authored: the action keeps its default position.
            None => standard
                .get(SequencePhase::InstallExecute, action)
                .unwrap()
                .sequence,
        };
        assert_eq!(expected, position, "{} moved", action);
    }
}

#[test]
fn forced_absolute_config_numbers_everything() {
    let config = DecompilerConfig::from_toml_str("force_absolute_sequencing = true").unwrap();
    let tables = dump(vec![
        table("CustomAction", vec![set_property_action("MyAction")]),
        table(
            "InstallExecuteSequence",
            vec![
                sequence("CostInitialize", None, 800),
                sequence("MyAction", None, 801),
            ],
        ),
    ]);
    let output = decompile_with(config, &tables);
    let view = output.view().unwrap();
    let sequence = execute_sequence(&view);
    assert_eq!(sequence.children.len(), 2);
    assert!(sequence
        .children
        .iter()
        .all(|c| c.attribute("Sequence").is_some()));
}
