// pass.rs — Pass descriptor module: metadata and dependency resolution
//
// Declares the compiler's passes (parsing plus the post-processing sweeps)
// and their dependency edges. Used by the pipeline runner to compute the
// minimal pass subset for each --emit target.

use std::collections::HashSet;

// ── Pass identifiers ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassId {
    Parse,
    FusionPropagation,
    CollapsePropagation,
    OpenMpAttribution,
}

// ── Pass descriptor ────────────────────────────────────────────────────────

/// Static metadata about a compiler pass.
pub struct PassDescriptor {
    /// Human-readable name for diagnostics/verbose output.
    pub name: &'static str,
    /// Pass dependencies (other passes whose outputs this pass consumes).
    pub inputs: &'static [PassId],
}

/// Return the static descriptor for a given pass.
pub fn descriptor(id: PassId) -> PassDescriptor {
    match id {
        PassId::Parse => PassDescriptor {
            name: "parse",
            inputs: &[],
        },
        PassId::FusionPropagation => PassDescriptor {
            name: "fusion_propagation",
            inputs: &[PassId::Parse],
        },
        PassId::CollapsePropagation => PassDescriptor {
            name: "collapse_propagation",
            inputs: &[PassId::Parse],
        },
        PassId::OpenMpAttribution => PassDescriptor {
            name: "openmp_attribution",
            inputs: &[PassId::Parse],
        },
    }
}

// ── Dependency resolution ──────────────────────────────────────────────────

/// All pass IDs in declaration order (used for iteration).
pub const ALL_PASSES: [PassId; 4] = [
    PassId::Parse,
    PassId::FusionPropagation,
    PassId::CollapsePropagation,
    PassId::OpenMpAttribution,
];

/// Passes that complete the model (every post-processing sweep).
pub const POST_PASSES: [PassId; 3] = [
    PassId::FusionPropagation,
    PassId::CollapsePropagation,
    PassId::OpenMpAttribution,
];

/// Compute the minimal ordered set of passes needed to produce every
/// pass in `terminals`. Returns passes in topological (execution) order.
pub fn required_passes(terminals: &[PassId]) -> Vec<PassId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    for &terminal in terminals {
        visit(terminal, &mut visited, &mut order);
    }
    order
}

fn visit(id: PassId, visited: &mut HashSet<PassId>, order: &mut Vec<PassId>) {
    if !visited.insert(id) {
        return;
    }
    for &dep in descriptor(id).inputs {
        visit(dep, visited, order);
    }
    order.push(id);
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_alone_is_minimal() {
        assert_eq!(required_passes(&[PassId::Parse]), vec![PassId::Parse]);
    }

    #[test]
    fn post_pass_pulls_in_parse() {
        assert_eq!(
            required_passes(&[PassId::CollapsePropagation]),
            vec![PassId::Parse, PassId::CollapsePropagation]
        );
    }

    #[test]
    fn all_post_passes_share_one_parse() {
        let passes = required_passes(&POST_PASSES);
        assert_eq!(passes.len(), 4);
        assert_eq!(passes[0], PassId::Parse);
        assert_eq!(&passes[1..], &POST_PASSES);
    }

    #[test]
    fn pass_names_are_unique() {
        let names: HashSet<&str> = ALL_PASSES.iter().map(|p| descriptor(*p).name).collect();
        assert_eq!(names.len(), ALL_PASSES.len());
    }

    #[test]
    fn dependency_edges_are_consistent() {
        for pass in &ALL_PASSES {
            let desc = descriptor(*pass);
            for dep in desc.inputs {
                let order = required_passes(&[*pass]);
                let dep_pos = order.iter().position(|p| p == dep);
                let self_pos = order.iter().position(|p| p == pass);
                assert!(
                    dep_pos.unwrap() < self_pos.unwrap(),
                    "{:?} depends on {:?} but it comes later in topological order",
                    pass,
                    dep
                );
            }
        }
    }
}
