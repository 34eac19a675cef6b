// nest_query.rs — Read-only query helpers over a compiled loop nest
//
// Consumers (statistics, the CLI summary) only ever see loops through
// `LoopView`, which borrows the nest and reports never-stated facts as
// `Unstated`.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::id::LoopId;
use crate::ir::{Classification, FactKind, Loop, LoopNest, LoopType};
use crate::token::LoopForm;

// ── Classification snapshot ────────────────────────────────────────────────

/// Settled copy of a loop's facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassificationSnapshot {
    pub parallel: Classification,
    pub parallel_potential: Classification,
    pub vector: Classification,
    pub vector_potential: Classification,
    pub parallel_dependence: Classification,
    pub vector_dependence: Classification,
    pub openmp: Classification,
    pub mem_call: Classification,
    pub fused: Classification,
    pub fused_lost: Classification,
    pub distributed: Classification,
    pub collapsed: Classification,
    pub collapsed_eliminated: Classification,
    pub distr_parts_n: Option<u32>,
    pub collapsed_with: Option<u32>,
    pub parallel_form: Option<LoopForm>,
    pub vector_form: Option<LoopForm>,
}

impl ClassificationSnapshot {
    pub fn get(&self, kind: FactKind) -> Classification {
        match kind {
            FactKind::Parallel => self.parallel,
            FactKind::ParallelPotential => self.parallel_potential,
            FactKind::Vector => self.vector,
            FactKind::VectorPotential => self.vector_potential,
            FactKind::ParallelDependence => self.parallel_dependence,
            FactKind::VectorDependence => self.vector_dependence,
            FactKind::OpenMp => self.openmp,
            FactKind::MemCall => self.mem_call,
            FactKind::Fused => self.fused,
            FactKind::FusedLost => self.fused_lost,
            FactKind::Distributed => self.distributed,
            FactKind::Collapsed => self.collapsed,
            FactKind::CollapsedEliminated => self.collapsed_eliminated,
        }
    }
}

// ── Loop view ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
pub struct LoopView<'a> {
    nest: &'a LoopNest,
    record: &'a Loop,
}

impl<'a> LoopView<'a> {
    pub fn new(nest: &'a LoopNest, id: LoopId) -> Self {
        Self {
            nest,
            record: nest.get(id),
        }
    }

    pub fn id(&self) -> LoopId {
        self.record.id
    }

    /// Canonical `filename(line)` name; parts answer with their main loop's.
    pub fn name(&self) -> String {
        crate::token::loop_name(&self.record.filename, self.record.line)
    }

    pub fn display_name(&self) -> &'a str {
        &self.record.name
    }

    pub fn filename(&self) -> &'a str {
        &self.record.filename
    }

    pub fn line(&self) -> u32 {
        self.record.line
    }

    pub fn depth(&self) -> u32 {
        self.record.depth
    }

    pub fn loop_type(&self) -> LoopType {
        self.record.loop_type
    }

    pub fn discriminator(&self) -> u32 {
        self.record.discriminator
    }

    pub fn tiling_count(&self) -> u32 {
        self.record.tiling_count
    }

    pub fn classification(&self) -> ClassificationSnapshot {
        let c = &self.record.classification;
        ClassificationSnapshot {
            parallel: c.parallel.value.settled(),
            parallel_potential: c.parallel_potential.value.settled(),
            vector: c.vector.value.settled(),
            vector_potential: c.vector_potential.value.settled(),
            parallel_dependence: c.parallel_dependence.value.settled(),
            vector_dependence: c.vector_dependence.value.settled(),
            openmp: c.openmp.value.settled(),
            mem_call: c.mem_call.value.settled(),
            fused: c.fused.value.settled(),
            fused_lost: c.fused_lost.value.settled(),
            distributed: c.distributed.value.settled(),
            collapsed: c.collapsed.value.settled(),
            collapsed_eliminated: c.collapsed_eliminated.value.settled(),
            distr_parts_n: c.distr_parts_n,
            collapsed_with: c.collapsed_with,
            parallel_form: c.parallel_form,
            vector_form: c.vector_form,
        }
    }

    pub fn fact(&self, kind: FactKind) -> Classification {
        self.record.classification.get(kind).settled()
    }

    /// Fused line numbers; empty unless this loop is a fusion representative.
    pub fn fused_with(&self) -> &'a [u32] {
        self.record
            .classification
            .fused_with
            .as_deref()
            .unwrap_or(&[])
    }

    pub fn parent(&self) -> Option<LoopView<'a>> {
        self.record.parent.map(|id| LoopView::new(self.nest, id))
    }

    pub fn main(&self) -> Option<LoopView<'a>> {
        self.record.main.map(|id| LoopView::new(self.nest, id))
    }

    pub fn inner_loop_names(&self) -> impl Iterator<Item = &'a str> {
        self.record.inner_loops.keys().map(String::as_str)
    }

    pub fn inner_loops(&self) -> impl Iterator<Item = LoopView<'a>> + 'a {
        let nest = self.nest;
        self.record
            .inner_loops
            .values()
            .map(move |&id| LoopView::new(nest, id))
    }

    pub fn distr_chunk_indices(&self) -> impl Iterator<Item = u32> + 'a {
        self.record.distr_chunks.keys().copied()
    }

    pub fn distr_chunk(&self, n: u32) -> Option<LoopView<'a>> {
        self.record
            .distr_chunks
            .get(&n)
            .map(|&id| LoopView::new(self.nest, id))
    }

    pub fn peel(&self) -> Option<LoopView<'a>> {
        self.record.peel.map(|id| LoopView::new(self.nest, id))
    }

    pub fn vector_remainder(&self) -> Option<LoopView<'a>> {
        self.record
            .vector_remainder
            .map(|id| LoopView::new(self.nest, id))
    }

    pub fn remainder(&self) -> Option<LoopView<'a>> {
        self.record.remainder.map(|id| LoopView::new(self.nest, id))
    }

    pub fn has_peel(&self) -> bool {
        self.record.peel.is_some()
    }

    pub fn has_vector_remainder(&self) -> bool {
        self.record.vector_remainder.is_some()
    }

    pub fn has_remainder(&self) -> bool {
        self.record.remainder.is_some()
    }
}

impl fmt::Debug for LoopView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopView")
            .field("name", &self.record.name)
            .field("depth", &self.record.depth)
            .field("type", &self.record.loop_type)
            .finish()
    }
}

// ── Free queries ───────────────────────────────────────────────────────────

/// Report entry points, in name order.
pub fn top_level_loops(nest: &LoopNest) -> Vec<LoopView<'_>> {
    nest.top_level_loops()
        .values()
        .map(|&id| LoopView::new(nest, id))
        .collect()
}

/// Every main loop, in name order.
pub fn all_loops(nest: &LoopNest) -> Vec<LoopView<'_>> {
    nest.loops()
        .values()
        .map(|&id| LoopView::new(nest, id))
        .collect()
}

pub fn find_loop<'a>(nest: &'a LoopNest, name: &str) -> Option<LoopView<'a>> {
    nest.find(name).map(|id| LoopView::new(nest, id))
}

fn loops_where(nest: &LoopNest, kind: FactKind) -> Vec<LoopView<'_>> {
    all_loops(nest)
        .into_iter()
        .filter(|l| l.fact(kind) == Classification::Yes)
        .collect()
}

pub fn parallelized_loops(nest: &LoopNest) -> Vec<LoopView<'_>> {
    loops_where(nest, FactKind::Parallel)
}

pub fn vectorized_loops(nest: &LoopNest) -> Vec<LoopView<'_>> {
    loops_where(nest, FactKind::Vector)
}

pub fn loops_lost_in_fusion(nest: &LoopNest) -> Vec<LoopView<'_>> {
    loops_where(nest, FactKind::FusedLost)
}

pub fn loops_eliminated_by_collapse(nest: &LoopNest) -> Vec<LoopView<'_>> {
    loops_where(nest, FactKind::CollapsedEliminated)
}

// ── Summary ────────────────────────────────────────────────────────────────

/// Aggregate counts over main loops.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NestSummary {
    pub loops: usize,
    pub parts: usize,
    pub top_level: usize,
    pub fused_groups: usize,
    pub collapsed_groups: usize,
    pub tiled: usize,
    pub depth_histogram: BTreeMap<u32, usize>,
    pub parallel: usize,
    pub vector: usize,
    pub openmp: usize,
}

pub fn summarize(nest: &LoopNest) -> NestSummary {
    let mut summary = NestSummary {
        loops: nest.loops().len(),
        parts: nest.records().filter(|l| !l.is_main()).count(),
        top_level: nest.top_level_loops().len(),
        fused_groups: nest.fused_loops().len(),
        collapsed_groups: nest.collapsed_loops().len(),
        ..NestSummary::default()
    };
    for view in all_loops(nest) {
        *summary.depth_histogram.entry(view.depth()).or_insert(0) += 1;
        let facts = view.classification();
        summary.parallel += usize::from(facts.parallel == Classification::Yes);
        summary.vector += usize::from(facts.vector == Classification::Yes);
        summary.openmp += usize::from(facts.openmp == Classification::Yes);
        summary.tiled += usize::from(view.tiling_count() > 0);
    }
    summary
}

impl fmt::Display for NestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "loops: {} ({} top-level, {} parts)",
            self.loops, self.top_level, self.parts
        )?;
        for (depth, count) in &self.depth_histogram {
            writeln!(f, "  depth {}: {}", depth, count)?;
        }
        writeln!(f, "parallelized: {}", self.parallel)?;
        writeln!(f, "vectorized: {}", self.vector)?;
        writeln!(f, "openmp: {}", self.openmp)?;
        writeln!(f, "tiled: {}", self.tiled)?;
        writeln!(f, "fusion groups: {}", self.fused_groups)?;
        writeln!(f, "collapse groups: {}", self.collapsed_groups)
    }
}
