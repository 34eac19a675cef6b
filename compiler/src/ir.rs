// ir.rs — Loop nesting structure
//
// Arena of loop records plus the global lookup indices the parser and the
// post-processing passes work against. Loops are addressed by `LoopId`;
// parent/main back-references and the inner-loop / part maps hold handles,
// never records, so the arena is the single owner.
//
// Preconditions: none; an empty nest is valid.
// Postconditions: a main-loop name appears in `loops` at most once; every
//   part shares filename/line/depth with the main loop it was derived from;
//   `distr_chunks[1]`, when present, is the owning loop itself.
// Failure modes: none (mutation entry points are crate-private and total).
// Side effects: none.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::debug;
use serde::{Serialize, Serializer};

use crate::id::{IdAllocator, LoopId};
use crate::token::{Location, LoopForm, PartTag};

// ── Classification ──────────────────────────────────────────────────────────

/// State of one fact about a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    No,
    Yes,
    /// Never stated by the report (query-side view of `Uninitialized`).
    Unstated,
    Uninitialized,
}

impl Classification {
    /// Value as seen by consumers: facts never observed read as `Unstated`.
    pub fn settled(self) -> Classification {
        match self {
            Classification::Uninitialized => Classification::Unstated,
            other => other,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::No => write!(f, "no"),
            Classification::Yes => write!(f, "yes"),
            Classification::Unstated => write!(f, "unstated"),
            Classification::Uninitialized => write!(f, "uninitialized"),
        }
    }
}

/// Every per-loop fact the report can state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactKind {
    Parallel,
    ParallelPotential,
    Vector,
    VectorPotential,
    ParallelDependence,
    VectorDependence,
    OpenMp,
    MemCall,
    Fused,
    FusedLost,
    Distributed,
    Collapsed,
    CollapsedEliminated,
}

impl FactKind {
    pub const ALL: [FactKind; 13] = [
        FactKind::Parallel,
        FactKind::ParallelPotential,
        FactKind::Vector,
        FactKind::VectorPotential,
        FactKind::ParallelDependence,
        FactKind::VectorDependence,
        FactKind::OpenMp,
        FactKind::MemCall,
        FactKind::Fused,
        FactKind::FusedLost,
        FactKind::Distributed,
        FactKind::Collapsed,
        FactKind::CollapsedEliminated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FactKind::Parallel => "parallel",
            FactKind::ParallelPotential => "parallel-potential",
            FactKind::Vector => "vector",
            FactKind::VectorPotential => "vector-potential",
            FactKind::ParallelDependence => "parallel-dependence",
            FactKind::VectorDependence => "vector-dependence",
            FactKind::OpenMp => "openmp",
            FactKind::MemCall => "mem-call",
            FactKind::Fused => "fused",
            FactKind::FusedLost => "fused-lost",
            FactKind::Distributed => "distributed",
            FactKind::Collapsed => "collapsed",
            FactKind::CollapsedEliminated => "collapsed-eliminated",
        }
    }
}

impl fmt::Display for FactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Facts copied from a fusion/collapse representative onto its group members.
pub const PROPAGATED_FACTS: [FactKind; 6] = [
    FactKind::Parallel,
    FactKind::ParallelPotential,
    FactKind::Vector,
    FactKind::VectorPotential,
    FactKind::ParallelDependence,
    FactKind::VectorDependence,
];

/// One fact plus the report line where it was first observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fact {
    pub value: Classification,
    pub line: Option<usize>,
}

impl Default for Fact {
    fn default() -> Self {
        Fact {
            value: Classification::Uninitialized,
            line: None,
        }
    }
}

impl Serialize for Fact {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// Outcome of `ClassificationInfo::observe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// First observation; the value was stored.
    Recorded,
    /// Same value as already stored.
    Unchanged,
    /// A different value was proposed and dropped.
    Conflict {
        kept: Classification,
        first_line: Option<usize>,
    },
}

/// All facts gathered for one loop (or loop part).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationInfo {
    pub parallel: Fact,
    pub parallel_potential: Fact,
    pub vector: Fact,
    pub vector_potential: Fact,
    pub parallel_dependence: Fact,
    pub vector_dependence: Fact,
    pub openmp: Fact,
    pub mem_call: Fact,
    pub fused: Fact,
    pub fused_lost: Fact,
    pub distributed: Fact,
    pub collapsed: Fact,
    pub collapsed_eliminated: Fact,

    /// Fused line numbers, the representative's own line included.
    pub fused_with: Option<Vec<u32>>,
    /// Distribution fan-out.
    pub distr_parts_n: Option<u32>,
    /// Line of the loop this one was collapsed with.
    pub collapsed_with: Option<u32>,
    pub parallel_form: Option<LoopForm>,
    pub vector_form: Option<LoopForm>,
}

impl ClassificationInfo {
    pub fn fact(&self, kind: FactKind) -> Fact {
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

    pub fn get(&self, kind: FactKind) -> Classification {
        self.fact(kind).value
    }

    fn fact_mut(&mut self, kind: FactKind) -> &mut Fact {
        match kind {
            FactKind::Parallel => &mut self.parallel,
            FactKind::ParallelPotential => &mut self.parallel_potential,
            FactKind::Vector => &mut self.vector,
            FactKind::VectorPotential => &mut self.vector_potential,
            FactKind::ParallelDependence => &mut self.parallel_dependence,
            FactKind::VectorDependence => &mut self.vector_dependence,
            FactKind::OpenMp => &mut self.openmp,
            FactKind::MemCall => &mut self.mem_call,
            FactKind::Fused => &mut self.fused,
            FactKind::FusedLost => &mut self.fused_lost,
            FactKind::Distributed => &mut self.distributed,
            FactKind::Collapsed => &mut self.collapsed,
            FactKind::CollapsedEliminated => &mut self.collapsed_eliminated,
        }
    }

    /// First write wins: the first non-`Uninitialized` value is kept, a later
    /// different value is dropped and reported back as a conflict.
    pub fn observe(
        &mut self,
        kind: FactKind,
        value: Classification,
        line: Option<usize>,
    ) -> Observation {
        let fact = self.fact_mut(kind);
        if value == Classification::Uninitialized || fact.value == value {
            return Observation::Unchanged;
        }
        if fact.value == Classification::Uninitialized {
            *fact = Fact { value, line };
            return Observation::Recorded;
        }
        Observation::Conflict {
            kept: fact.value,
            first_line: fact.line,
        }
    }

    /// Overwrite `kinds` with the values held by `source`.
    pub fn copy_from(&mut self, source: &ClassificationInfo, kinds: &[FactKind]) {
        for &kind in kinds {
            *self.fact_mut(kind) = source.fact(kind);
        }
    }
}

/// Store `value` in an empty payload slot. Returns `false` when the slot
/// already holds a different value (which is kept).
pub fn set_payload_once<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    match slot {
        None => {
            *slot = Some(value);
            true
        }
        Some(existing) => *existing == value,
    }
}

// ── Loop ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopType {
    Main,
    DistrChunk,
    Peel,
    VectorRemainder,
    Remainder,
}

impl fmt::Display for LoopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopType::Main => write!(f, "main"),
            LoopType::DistrChunk => write!(f, "distr-chunk"),
            LoopType::Peel => write!(f, "peel"),
            LoopType::VectorRemainder => write!(f, "vector-remainder"),
            LoopType::Remainder => write!(f, "remainder"),
        }
    }
}

/// A source loop or a synthetic part of one.
#[derive(Debug, Clone, Serialize)]
pub struct Loop {
    pub id: LoopId,
    pub filename: String,
    pub line: u32,
    /// 0 for top-level loops.
    pub depth: u32,
    pub loop_type: LoopType,
    /// Chunk number for `DistrChunk`, 0 otherwise.
    pub discriminator: u32,
    /// `filename(line)` for main loops (the identity key); a derived display
    /// name such as `f.c(5)-2` or `f.c(5)v%` for parts.
    pub name: String,
    pub classification: ClassificationInfo,

    pub parent: Option<LoopId>,
    /// Main loop a part was derived from.
    pub main: Option<LoopId>,
    pub inner_loops: BTreeMap<String, LoopId>,
    pub distr_chunks: BTreeMap<u32, LoopId>,
    pub peel: Option<LoopId>,
    pub remainder: Option<LoopId>,
    pub vector_remainder: Option<LoopId>,

    /// Extra same-identity `LOOP BEGIN` scopes seen inside this loop.
    pub tiling_count: u32,
}

impl Loop {
    pub fn is_main(&self) -> bool {
        self.loop_type == LoopType::Main
    }

    pub fn location(&self) -> Location {
        Location::new(self.filename.clone(), self.line)
    }
}

/// OpenMP construct naming a loop, recorded at report level and attributed
/// after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenMpMark {
    pub location: Location,
    /// Report line of the construct.
    pub report_line: usize,
}

// ── Loop nesting structure ──────────────────────────────────────────────────

/// All loops of one compiled report.
#[derive(Debug, Default, Serialize)]
pub struct LoopNest {
    #[serde(rename = "arena")]
    records: Vec<Loop>,
    #[serde(skip)]
    ids: IdAllocator,
    top_level_loops: BTreeMap<String, LoopId>,
    loops: BTreeMap<String, LoopId>,
    fused_loops: BTreeSet<LoopId>,
    collapsed_loops: BTreeSet<LoopId>,
    openmp_marks: Vec<OpenMpMark>,
}

impl LoopNest {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read access ──

    pub fn get(&self, id: LoopId) -> &Loop {
        &self.records[id.index()]
    }

    /// Main loop by canonical name.
    pub fn find(&self, name: &str) -> Option<LoopId> {
        self.loops.get(name).copied()
    }

    pub fn top_level_loops(&self) -> &BTreeMap<String, LoopId> {
        &self.top_level_loops
    }

    /// Flat identity index of every main loop.
    pub fn loops(&self) -> &BTreeMap<String, LoopId> {
        &self.loops
    }

    pub fn fused_loops(&self) -> &BTreeSet<LoopId> {
        &self.fused_loops
    }

    pub fn collapsed_loops(&self) -> &BTreeSet<LoopId> {
        &self.collapsed_loops
    }

    pub fn openmp_marks(&self) -> &[OpenMpMark] {
        &self.openmp_marks
    }

    /// Every record, parts included, in creation order.
    pub fn records(&self) -> impl Iterator<Item = &Loop> {
        self.records.iter()
    }

    /// Number of records (main loops and parts).
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ── Mutation (parser and post-processing only) ──

    pub(crate) fn get_mut(&mut self, id: LoopId) -> &mut Loop {
        &mut self.records[id.index()]
    }

    fn push(&mut self, mut record: Loop) -> LoopId {
        let id = self.ids.alloc_loop();
        debug_assert_eq!(id.index(), self.records.len());
        record.id = id;
        self.records.push(record);
        id
    }

    /// Resolve a main loop through the flat index, creating it at `depth`
    /// under `parent` when unseen. Returns the handle and whether it is new.
    pub(crate) fn resolve_main(
        &mut self,
        location: &Location,
        depth: u32,
        parent: Option<LoopId>,
    ) -> (LoopId, bool) {
        let name = location.loop_name();
        if let Some(&id) = self.loops.get(&name) {
            return (id, false);
        }
        let id = self.push(Loop {
            id: LoopId(0),
            filename: location.filename.clone(),
            line: location.line,
            depth,
            loop_type: LoopType::Main,
            discriminator: 0,
            name: name.clone(),
            classification: ClassificationInfo::default(),
            parent,
            main: None,
            inner_loops: BTreeMap::new(),
            distr_chunks: BTreeMap::new(),
            peel: None,
            remainder: None,
            vector_remainder: None,
            tiling_count: 0,
        });
        debug!("loop {} created at depth {}", name, depth);
        self.loops.insert(name, id);
        (id, true)
    }

    /// Register a main loop as a report entry point (idempotent).
    pub(crate) fn register_top_level(&mut self, id: LoopId) {
        let name = self.get(id).name.clone();
        self.top_level_loops.entry(name).or_insert(id);
    }

    pub(crate) fn add_inner_loop(&mut self, parent: LoopId, child: LoopId) {
        let name = self.get(child).name.clone();
        self.get_mut(parent).inner_loops.entry(name).or_insert(child);
    }

    pub(crate) fn mark_fused(&mut self, id: LoopId) {
        self.fused_loops.insert(id);
    }

    pub(crate) fn mark_collapsed(&mut self, id: LoopId) {
        self.collapsed_loops.insert(id);
    }

    pub(crate) fn add_openmp_mark(&mut self, mark: OpenMpMark) {
        self.openmp_marks.push(mark);
    }

    /// Resolve the synthetic part of `owner` named by `tag`, creating it on
    /// first encounter. A second encounter returns the same record.
    pub(crate) fn resolve_part(&mut self, owner: LoopId, tag: PartTag) -> LoopId {
        match tag {
            PartTag::DistrChunk(n) => self.distr_chunk(owner, n),
            PartTag::DistrChunkVectorRemainder(n) => {
                let chunk = self.distr_chunk(owner, n);
                self.lazy_part(owner, chunk, LoopType::VectorRemainder)
            }
            PartTag::DistrChunkRemainder(n) => {
                let chunk = self.distr_chunk(owner, n);
                self.lazy_part(owner, chunk, LoopType::Remainder)
            }
            PartTag::Peel => self.lazy_part(owner, owner, LoopType::Peel),
            PartTag::VectorRemainder => self.lazy_part(owner, owner, LoopType::VectorRemainder),
            PartTag::Remainder => self.lazy_part(owner, owner, LoopType::Remainder),
        }
    }

    /// Chunk 1 is the owning loop itself; later chunks are separate records.
    fn distr_chunk(&mut self, owner: LoopId, n: u32) -> LoopId {
        if let Some(&chunk) = self.get(owner).distr_chunks.get(&n) {
            return chunk;
        }
        let chunk = if n == 1 {
            owner
        } else {
            let name = format!("{}-{}", self.get(owner).name, n);
            self.new_part(owner, LoopType::DistrChunk, n, name)
        };
        self.get_mut(owner).distr_chunks.insert(n, chunk);
        chunk
    }

    /// Peel / remainder slot of `holder` (the owner or one of its chunks).
    fn lazy_part(&mut self, owner: LoopId, holder: LoopId, loop_type: LoopType) -> LoopId {
        let existing = {
            let h = self.get(holder);
            match loop_type {
                LoopType::Peel => h.peel,
                LoopType::VectorRemainder => h.vector_remainder,
                LoopType::Remainder => h.remainder,
                LoopType::Main | LoopType::DistrChunk => None,
            }
        };
        if let Some(part) = existing {
            return part;
        }
        let suffix = match loop_type {
            LoopType::Peel => "/",
            LoopType::VectorRemainder => "v%",
            _ => "%",
        };
        let name = format!("{}{}", self.get(holder).name, suffix);
        let part = self.new_part(owner, loop_type, 0, name);
        let h = self.get_mut(holder);
        match loop_type {
            LoopType::Peel => h.peel = Some(part),
            LoopType::VectorRemainder => h.vector_remainder = Some(part),
            _ => h.remainder = Some(part),
        }
        part
    }

    fn new_part(&mut self, owner: LoopId, loop_type: LoopType, discriminator: u32, name: String) -> LoopId {
        let (filename, line, depth, parent) = {
            let o = self.get(owner);
            (o.filename.clone(), o.line, o.depth, o.parent)
        };
        debug!("part {} ({}) created", name, loop_type);
        self.push(Loop {
            id: LoopId(0),
            filename,
            line,
            depth,
            loop_type,
            discriminator,
            name,
            classification: ClassificationInfo::default(),
            parent,
            main: Some(owner),
            inner_loops: BTreeMap::new(),
            distr_chunks: BTreeMap::new(),
            peel: None,
            remainder: None,
            vector_remainder: None,
            tiling_count: 0,
        })
    }
}

// ── Display (tree dump) ─────────────────────────────────────────────────────

impl fmt::Display for LoopNest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &id in self.top_level_loops.values() {
            self.fmt_loop(f, id, 0)?;
        }
        Ok(())
    }
}

impl LoopNest {
    fn fmt_loop(&self, f: &mut fmt::Formatter<'_>, id: LoopId, indent: usize) -> fmt::Result {
        let record = self.get(id);
        self.fmt_record(f, record, indent)?;

        // chunk 1 aliases the owner
        for &chunk in record.distr_chunks.values().filter(|&&c| c != id) {
            self.fmt_record(f, self.get(chunk), indent + 1)?;
            self.fmt_parts(f, chunk, indent + 2)?;
        }
        self.fmt_parts(f, id, indent + 1)?;
        for &inner in record.inner_loops.values() {
            self.fmt_loop(f, inner, indent + 1)?;
        }
        Ok(())
    }

    fn fmt_parts(&self, f: &mut fmt::Formatter<'_>, holder: LoopId, indent: usize) -> fmt::Result {
        let h = self.get(holder);
        for part in [h.peel, h.vector_remainder, h.remainder].into_iter().flatten() {
            self.fmt_record(f, self.get(part), indent)?;
        }
        Ok(())
    }

    fn fmt_record(&self, f: &mut fmt::Formatter<'_>, record: &Loop, indent: usize) -> fmt::Result {
        write!(f, "{:width$}{}", "", record.name, width = indent * 2)?;
        match record.loop_type {
            LoopType::Main => write!(f, " depth={}", record.depth)?,
            LoopType::DistrChunk => write!(f, " [distr-chunk {}]", record.discriminator)?,
            other => write!(f, " [{}]", other)?,
        }
        if record.tiling_count > 0 {
            write!(f, " tiled={}", record.tiling_count)?;
        }
        let info = &record.classification;
        for kind in FactKind::ALL {
            let value = info.get(kind);
            if value != Classification::Uninitialized {
                write!(f, " {}={}", kind, value)?;
            }
        }
        if let Some(lines) = &info.fused_with {
            let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
            write!(f, " fused-with=[{}]", lines.join(" "))?;
        }
        if let Some(n) = info.distr_parts_n {
            write!(f, " distr-parts={}", n)?;
        }
        if let Some(line) = info.collapsed_with {
            write!(f, " collapsed-with={}", line)?;
        }
        writeln!(f)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: u32) -> Location {
        Location::new("f.c", line)
    }

    #[test]
    fn first_write_wins() {
        let mut info = ClassificationInfo::default();
        assert_eq!(info.get(FactKind::Parallel), Classification::Uninitialized);
        assert_eq!(
            info.observe(FactKind::Parallel, Classification::Yes, Some(3)),
            Observation::Recorded
        );
        assert_eq!(
            info.observe(FactKind::Parallel, Classification::Yes, Some(8)),
            Observation::Unchanged
        );
        assert_eq!(
            info.observe(FactKind::Parallel, Classification::No, Some(9)),
            Observation::Conflict {
                kept: Classification::Yes,
                first_line: Some(3),
            }
        );
        assert_eq!(info.get(FactKind::Parallel), Classification::Yes);
        assert_eq!(info.parallel.line, Some(3));
    }

    #[test]
    fn copy_overwrites_selected_facts_only() {
        let mut source = ClassificationInfo::default();
        source.observe(FactKind::Parallel, Classification::Yes, None);
        source.observe(FactKind::Fused, Classification::Yes, None);
        let mut target = ClassificationInfo::default();
        target.observe(FactKind::Parallel, Classification::No, None);
        target.copy_from(&source, &PROPAGATED_FACTS);
        assert_eq!(target.get(FactKind::Parallel), Classification::Yes);
        assert_eq!(target.get(FactKind::Fused), Classification::Uninitialized);
    }

    #[test]
    fn payload_slot_keeps_first_value() {
        let mut slot = None;
        assert!(set_payload_once(&mut slot, 3));
        assert!(set_payload_once(&mut slot, 3));
        assert!(!set_payload_once(&mut slot, 4));
        assert_eq!(slot, Some(3));
    }

    #[test]
    fn resolve_main_deduplicates() {
        let mut nest = LoopNest::new();
        let (a, created) = nest.resolve_main(&at(5), 0, None);
        assert!(created);
        let (b, created) = nest.resolve_main(&at(5), 3, None);
        assert!(!created);
        assert_eq!(a, b);
        assert_eq!(nest.get(a).depth, 0);
        assert_eq!(nest.loops().len(), 1);
        assert_eq!(nest.find("f.c(5)"), Some(a));
    }

    #[test]
    fn chunk_one_is_the_owner() {
        let mut nest = LoopNest::new();
        let (owner, _) = nest.resolve_main(&at(5), 0, None);
        let chunk = nest.resolve_part(owner, PartTag::DistrChunk(1));
        assert_eq!(chunk, owner);
        assert_eq!(nest.get(owner).distr_chunks.get(&1), Some(&owner));
        assert_eq!(nest.len(), 1);
    }

    #[test]
    fn later_chunks_are_parts() {
        let mut nest = LoopNest::new();
        let (owner, _) = nest.resolve_main(&at(5), 2, None);
        let chunk = nest.resolve_part(owner, PartTag::DistrChunk(2));
        let again = nest.resolve_part(owner, PartTag::DistrChunk(2));
        assert_eq!(chunk, again);
        let record = nest.get(chunk);
        assert_eq!(record.loop_type, LoopType::DistrChunk);
        assert_eq!(record.discriminator, 2);
        assert_eq!(record.depth, 2);
        assert_eq!(record.main, Some(owner));
        assert_eq!(record.name, "f.c(5)-2");
        // parts never enter the identity index
        assert_eq!(nest.loops().len(), 1);
    }

    #[test]
    fn chunk_remainder_attaches_to_chunk() {
        let mut nest = LoopNest::new();
        let (owner, _) = nest.resolve_main(&at(5), 0, None);
        let rem = nest.resolve_part(owner, PartTag::DistrChunkVectorRemainder(2));
        let chunk = nest.get(owner).distr_chunks[&2];
        assert_eq!(nest.get(chunk).vector_remainder, Some(rem));
        assert_eq!(nest.get(owner).vector_remainder, None);
        assert_eq!(nest.get(rem).loop_type, LoopType::VectorRemainder);
        assert_eq!(nest.get(rem).name, "f.c(5)-2v%");
        assert_eq!(nest.get(rem).main, Some(owner));
    }

    #[test]
    fn peel_and_remainders_are_lazy_singletons() {
        let mut nest = LoopNest::new();
        let (owner, _) = nest.resolve_main(&at(5), 0, None);
        let peel = nest.resolve_part(owner, PartTag::Peel);
        assert_eq!(nest.resolve_part(owner, PartTag::Peel), peel);
        let vrem = nest.resolve_part(owner, PartTag::VectorRemainder);
        let rem = nest.resolve_part(owner, PartTag::Remainder);
        assert_ne!(vrem, rem);
        let record = nest.get(owner);
        assert_eq!(record.peel, Some(peel));
        assert_eq!(record.vector_remainder, Some(vrem));
        assert_eq!(record.remainder, Some(rem));
        assert_eq!(nest.get(peel).name, "f.c(5)/");
        assert_eq!(nest.get(rem).name, "f.c(5)%");
    }

    #[test]
    fn tree_dump() {
        let mut nest = LoopNest::new();
        let (outer, _) = nest.resolve_main(&at(5), 0, None);
        nest.register_top_level(outer);
        let (inner, _) = nest.resolve_main(&at(6), 1, Some(outer));
        nest.add_inner_loop(outer, inner);
        nest.get_mut(inner)
            .classification
            .observe(FactKind::Vector, Classification::Yes, None);
        let rem = nest.resolve_part(inner, PartTag::VectorRemainder);
        nest.get_mut(rem)
            .classification
            .observe(FactKind::Vector, Classification::No, None);

        assert_eq!(
            nest.to_string(),
            "f.c(5) depth=0\n  f.c(6) depth=1 vector=yes\n    f.c(6)v% [vector-remainder] vector=no\n"
        );
    }
}
