// propagate.rs — Post-processing sweeps over the finished loop nest
//
// Fusion and collapse propagation copy the six optimization facts of a group
// representative onto every other member of its group, so members answer
// queries the way the representative does. OpenMP attribution applies the
// report-level OpenMP marks to the loops they name.
//
// Preconditions: parsing completed successfully.
// Postconditions: after `propagate_fusion`, each member named in a fused
//   representative's `fused_with` list (other than the representative itself)
//   holds the representative's propagated facts; same for collapse targets.
//   Running a sweep twice changes nothing further.
// Failure modes: a representative not marked fused/collapsed, or a group
//   member missing from the flat loop index (consistency errors).
// Side effects: none beyond mutating the nest.

use log::{debug, warn};

use crate::diag::{codes, Diagnostic};
use crate::error::{CompileError, GroupKind};
use crate::id::LoopId;
use crate::ir::{Classification, FactKind, LoopNest, PROPAGATED_FACTS};
use crate::token::loop_name;

/// Copy representative facts across fusion groups. Returns the number of
/// member loops updated.
pub fn propagate_fusion(nest: &mut LoopNest) -> Result<usize, CompileError> {
    let representatives: Vec<LoopId> = nest.fused_loops().iter().copied().collect();
    propagate_groups(nest, GroupKind::Fusion, &representatives)
}

/// Copy representative facts onto collapse targets. Returns the number of
/// member loops updated.
pub fn propagate_collapse(nest: &mut LoopNest) -> Result<usize, CompileError> {
    let representatives: Vec<LoopId> = nest.collapsed_loops().iter().copied().collect();
    propagate_groups(nest, GroupKind::Collapse, &representatives)
}

fn propagate_groups(
    nest: &mut LoopNest,
    group: GroupKind,
    representatives: &[LoopId],
) -> Result<usize, CompileError> {
    let mut updated = 0;
    for &rep in representatives {
        let record = nest.get(rep);
        let (marker, members) = match group {
            GroupKind::Fusion => (
                FactKind::Fused,
                record.classification.fused_with.clone().unwrap_or_default(),
            ),
            GroupKind::Collapse => (
                FactKind::Collapsed,
                record.classification.collapsed_with.into_iter().collect(),
            ),
        };
        if record.classification.get(marker) != Classification::Yes {
            return Err(CompileError::UnmarkedRepresentative {
                group,
                representative: record.name.clone(),
            });
        }

        let source = record.classification.clone();
        let representative = record.name.clone();
        let filename = record.filename.clone();
        let own_line = record.line;

        for line in members.into_iter().filter(|&l| l != own_line) {
            let target = loop_name(&filename, line);
            let member = nest.find(&target).ok_or_else(|| CompileError::MissingGroupMember {
                group,
                representative: representative.clone(),
                target: target.clone(),
            })?;
            nest.get_mut(member)
                .classification
                .copy_from(&source, &PROPAGATED_FACTS);
            debug!("{} group of {}: facts copied to {}", group, representative, target);
            updated += 1;
        }
    }
    Ok(updated)
}

/// Apply recorded OpenMP marks. Marks naming a loop the report never
/// describes become W0200 warnings.
pub fn attribute_openmp(nest: &mut LoopNest) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let marks = nest.openmp_marks().to_vec();
    for mark in marks {
        let name = mark.location.loop_name();
        match nest.find(&name) {
            Some(id) => {
                nest.get_mut(id).classification.observe(
                    FactKind::OpenMp,
                    Classification::Yes,
                    Some(mark.report_line),
                );
            }
            None => {
                warn!("line {}: OpenMP construct names unknown loop {}", mark.report_line, name);
                diagnostics.push(
                    Diagnostic::warning(
                        Some(mark.report_line),
                        format!("OpenMP construct names loop {} which has no loop report", name),
                    )
                    .with_code(codes::W0200)
                    .with_hint("the loop may only appear inlined, or the report was truncated"),
                );
            }
        }
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    fn parsed(text: &str) -> LoopNest {
        parse_str(text).unwrap().0
    }

    fn fact(nest: &LoopNest, name: &str, kind: FactKind) -> Classification {
        nest.get(nest.find(name).unwrap()).classification.get(kind)
    }

    const FUSED: &str = "\
LOOP BEGIN at f.c(10,3)
   remark #25045: Fused Loops: ( 10 20 30 )
   remark #17109: LOOP WAS AUTO-PARALLELIZED
   remark #15300: LOOP WAS VECTORIZED
LOOP END
LOOP BEGIN at f.c(20,3)
   remark #25046: Loop lost in Fusion
LOOP END
LOOP BEGIN at f.c(30,3)
   remark #25046: Loop lost in Fusion
LOOP END
";

    #[test]
    fn fusion_copies_representative_facts() {
        let mut nest = parsed(FUSED);
        assert_eq!(propagate_fusion(&mut nest).unwrap(), 2);
        for member in ["f.c(20)", "f.c(30)"] {
            assert_eq!(fact(&nest, member, FactKind::Parallel), Classification::Yes);
            assert_eq!(fact(&nest, member, FactKind::Vector), Classification::Yes);
            // not a propagated fact
            assert_eq!(fact(&nest, member, FactKind::Fused), Classification::Uninitialized);
            assert_eq!(fact(&nest, member, FactKind::FusedLost), Classification::Yes);
        }
    }

    #[test]
    fn fusion_is_idempotent() {
        let mut nest = parsed(FUSED);
        propagate_fusion(&mut nest).unwrap();
        let before = nest.to_string();
        propagate_fusion(&mut nest).unwrap();
        assert_eq!(nest.to_string(), before);
    }

    #[test]
    fn fusion_with_unknown_member_fails() {
        let mut nest = parsed(
            "LOOP BEGIN at f.c(10,3)\n   remark #25045: Fused Loops: ( 10 99 )\nLOOP END\n",
        );
        let err = propagate_fusion(&mut nest).unwrap_err();
        match err {
            CompileError::MissingGroupMember { group, target, .. } => {
                assert_eq!(group, GroupKind::Fusion);
                assert_eq!(target, "f.c(99)");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn collapse_copies_to_single_target() {
        let mut nest = parsed(
            "LOOP BEGIN at f.c(30,3)\n   remark #25567: Collapsed with loop at line 31\n   remark #17109: LOOP WAS AUTO-PARALLELIZED\n\
             LOOP BEGIN at f.c(31,5)\n   remark #25568: Loop eliminated in Collapsing\n   LOOP END\nLOOP END\n",
        );
        assert_eq!(propagate_collapse(&mut nest).unwrap(), 1);
        assert_eq!(fact(&nest, "f.c(31)", FactKind::Parallel), Classification::Yes);
        assert_eq!(
            fact(&nest, "f.c(31)", FactKind::CollapsedEliminated),
            Classification::Yes
        );
    }

    #[test]
    fn collapse_with_unknown_target_fails() {
        let mut nest = parsed(
            "LOOP BEGIN at f.c(30,3)\n   remark #25567: Collapsed with loop at line 31\nLOOP END\n",
        );
        assert!(matches!(
            propagate_collapse(&mut nest),
            Err(CompileError::MissingGroupMember {
                group: GroupKind::Collapse,
                ..
            })
        ));
    }

    #[test]
    fn openmp_marks_attributed_or_reported() {
        let mut nest = parsed(
            "OpenMP Construct at f.c(5,1)\n   remark #16200: OpenMP DEFINED LOOP WAS PARALLELIZED\n\
             OpenMP Construct at f.c(50,1)\n   remark #16200: OpenMP DEFINED LOOP WAS PARALLELIZED\n\
             LOOP BEGIN at f.c(5,3)\nLOOP END\n",
        );
        let diags = attribute_openmp(&mut nest);
        assert_eq!(fact(&nest, "f.c(5)", FactKind::OpenMp), Classification::Yes);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(codes::W0200));
        assert_eq!(diags[0].line, Some(4));
    }
}
