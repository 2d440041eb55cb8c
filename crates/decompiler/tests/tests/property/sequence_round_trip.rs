//! Property tests: reconstructed placements compile back to the original
//! sequence numbers.

use std::collections::BTreeSet;

use msi_decompiler::{
    Placement, SequencePhase, SequenceReconstructor, SequenceRow, StandardActions,
};
use msi_decompiler_tests::forward_schedule;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

/// Standard install-execute actions and their default positions.
const STANDARD: [(&str, i64); 7] = [
    ("AppSearch", 50),
    ("LaunchConditions", 100),
    ("CostInitialize", 800),
    ("FileCost", 900),
    ("CostFinalize", 1000),
    ("InstallValidate", 1400),
    ("InstallInitialize", 1500),
];

/// How one standard action appears in the table.
#[derive(Clone, Debug)]
enum StandardUse {
    Absent,
    Default,
    Conditioned,
    Moved(i64),
}

fn arb_standard_use() -> impl Strategy<Value = StandardUse> {
    prop_oneof![
        3 => Just(StandardUse::Default),
        1 => Just(StandardUse::Absent),
        1 => Just(StandardUse::Conditioned),
        1 => (1i64..4).prop_map(StandardUse::Moved),
    ]
}

/// Custom actions: an anchor index into the standard list, an offset from
/// its default position, and whether the row carries a condition.
fn arb_customs() -> impl Strategy<Value = Vec<(usize, i64, bool)>> {
    prop::collection::vec((0..STANDARD.len(), -3i64..4, any::<bool>()), 0..10)
}

/// A tie-free sequence table.
fn build_rows(uses: &[StandardUse], customs: &[(usize, i64, bool)]) -> Vec<SequenceRow> {
    let mut rows = Vec::new();
    let mut taken = BTreeSet::new();
    for ((action, default), usage) in STANDARD.iter().zip(uses) {
        let (position, condition) = match usage {
            StandardUse::Absent => continue,
            StandardUse::Default => (*default, None),
            StandardUse::Conditioned => (*default, Some("NOT Installed")),
            StandardUse::Moved(by) => (default + by * 10, None),
        };
        if taken.insert(position) {
            rows.push(SequenceRow::new(action, condition, position));
        }
    }
    for (i, (anchor, offset, conditioned)) in customs.iter().enumerate() {
        let position = STANDARD[*anchor].1 + offset;
        if position > 0 && taken.insert(position) {
            let condition = conditioned.then_some("VersionNT");
            rows.push(SequenceRow::new(&format!("Custom{}", i), condition, position));
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Forward scheduling reproduces every row's original position.
    #[test]
    fn placements_round_trip(
        uses in prop::collection::vec(arb_standard_use(), STANDARD.len()),
        customs in arb_customs(),
    ) {
        let rows = build_rows(&uses, &customs);
        let standard = StandardActions::builtin();
        let placed = SequenceReconstructor::new(SequencePhase::InstallExecute, &standard)
            .reconstruct(&rows);
        prop_assert_eq!(placed.len(), rows.len());

        let numbers = forward_schedule(SequencePhase::InstallExecute, &standard, &placed);
        for row in &rows {
            prop_assert_eq!(
                numbers.get(&row.action).copied(),
                Some(row.sequence),
                "{} at {} was placed {:?}",
                &row.action,
                row.sequence,
                placed.iter().find(|p| p.action == row.action).map(|p| &p.placement)
            );
        }
    }

    /// Output rows are in ascending sequence order.
    #[test]
    fn placements_are_sorted(
        uses in prop::collection::vec(arb_standard_use(), STANDARD.len()),
        customs in arb_customs(),
    ) {
        let rows = build_rows(&uses, &customs);
        let standard = StandardActions::builtin();
        let placed = SequenceReconstructor::new(SequencePhase::InstallExecute, &standard)
            .reconstruct(&rows);
        prop_assert!(placed.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }

    /// Forcing absolute placement numbers every row.
    #[test]
    fn forced_absolute_keeps_numbers(
        uses in prop::collection::vec(arb_standard_use(), STANDARD.len()),
        customs in arb_customs(),
    ) {
        let rows = build_rows(&uses, &customs);
        let standard = StandardActions::builtin();
        let placed = SequenceReconstructor::new(SequencePhase::InstallExecute, &standard)
            .force_absolute(true)
            .reconstruct(&rows);
        for action in &placed {
            prop_assert_eq!(&action.placement, &Placement::Absolute(action.sequence));
        }
    }
}
