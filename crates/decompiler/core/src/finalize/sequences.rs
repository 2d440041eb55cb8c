//! Scheduled actions of every sequence table.

use msi_document::{Attributes, NodeKind};

use crate::error::DecompileResult;
use crate::sequence::{
    exit_dialog_kind, Placement, SequencePhase, SequenceReconstructor, SequenceRow, StandardActions,
};

use super::{LinkContext, LinkingUnit, UnitId, UnitReport};

/// Rebuilds each sequence table as a container of scheduled actions.
///
/// Custom actions become `Custom`, dialogs become `Show`, anything else is
/// scheduled as a standard action. Standard actions left at their default
/// scheduling produce no element at all.
pub struct ActionSequencesUnit;

impl LinkingUnit for ActionSequencesUnit {
    fn unit_id(&self) -> UnitId {
        UnitId::ActionSequences
    }

    fn link(&self, cx: &mut LinkContext<'_, '_>) -> DecompileResult<UnitReport> {
        let standard = StandardActions::from_config(cx.config)?;
        let root = cx.tree.root();
        let mut authored = 0u32;
        let mut phases = 0usize;

        for phase in SequencePhase::ALL {
            if phase.is_ui() && cx.config.suppress_ui_sequences {
                continue;
            }
            let mut rows = Vec::new();
            for row in cx.rows(phase.table()) {
                let Some(action) = row.get("Action") else {
                    continue;
                };
                let Some(sequence) = cx.integer(&row, "Sequence") else {
                    continue;
                };
                let condition = row.get("Condition");
                rows.push(SequenceRow::new(&action, condition.as_deref(), sequence));
            }
            if rows.is_empty() {
                continue;
            }

            let placed = SequenceReconstructor::new(phase, &standard)
                .force_absolute(cx.config.force_absolute_sequencing)
                .reconstruct(&rows);
            let mut container = None;
            for action in placed {
                if action.placement == Placement::Suppressed {
                    continue;
                }
                let (kind, mut attrs) = if cx.index.contains("CustomAction", &[action.action.as_str()]) {
                    (NodeKind::Custom, Attributes::from([("Action", action.action.as_str())]))
                } else if cx.index.contains("Dialog", &[action.action.as_str()]) {
                    (NodeKind::Show, Attributes::from([("Dialog", action.action.as_str())]))
                } else {
                    (NodeKind::StandardAction(action.action.clone()), Attributes::new())
                };
                match &action.placement {
                    Placement::Absolute(n) => match exit_dialog_kind(*n) {
                        Some(exit) => attrs.set("OnExit", exit),
                        None => attrs.set("Sequence", n.to_string()),
                    },
                    Placement::Before(anchor) => attrs.set("Before", anchor.as_str()),
                    Placement::After(anchor) => attrs.set("After", anchor.as_str()),
                    Placement::ConditionOnly | Placement::Suppressed => {}
                }
                attrs.set_opt("Condition", action.condition.as_deref());

                let parent = match container {
                    Some(parent) => parent,
                    None => {
                        let parent = cx
                            .tree
                            .create_child(root, phase.container_kind(), Attributes::new())?;
                        phases += 1;
                        container = Some(parent);
                        parent
                    }
                };
                cx.tree.create_child(parent, kind, attrs)?;
                authored += 1;
            }
        }

        Ok(UnitReport::new(
            UnitId::ActionSequences,
            authored,
            format!("{} actions authored in {} sequences", authored, phases),
        ))
    }
}
