//! Conflict graph over the students of one run.
//!
//! Vertices are roster positions (the stable input index); an edge joins any
//! two students that should not share a color class. Each edge keeps every
//! reason that produced it so callers can report severity, but coloring only
//! looks at adjacency.

use crate::data::{GenerationOptions, RelationshipEdge, RelationshipKind, Student, StudentId};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

// Edge weights per reason (higher = stronger separation)
const SAME_SUBJECT_WEIGHT: u32 = 10;
const RELATIONSHIP_WEIGHT: u32 = 5;
const SAME_SECTION_WEIGHT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Medium,
    High,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictReason {
    SameSubject,
    Relationship(RelationshipKind),
    SameSection,
}

impl ConflictReason {
    pub fn severity(self) -> Severity {
        match self {
            ConflictReason::SameSubject => Severity::Hard,
            ConflictReason::Relationship(_) => Severity::High,
            ConflictReason::SameSection => Severity::Medium,
        }
    }

    pub fn weight(self) -> u32 {
        match self {
            ConflictReason::SameSubject => SAME_SUBJECT_WEIGHT,
            ConflictReason::Relationship(_) => RELATIONSHIP_WEIGHT,
            ConflictReason::SameSection => SAME_SECTION_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictEdge {
    pub reasons: BTreeSet<ConflictReason>,
}

impl ConflictEdge {
    pub fn weight(&self) -> u32 {
        self.reasons.iter().map(|r| r.weight()).sum()
    }

    pub fn severity(&self) -> Option<Severity> {
        self.reasons.iter().map(|r| r.severity()).max()
    }
}

/// Active relationships restricted to one roster, keyed both ways.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    by_student: HashMap<StudentId, BTreeMap<StudentId, RelationshipKind>>,
    pairs: BTreeMap<(StudentId, StudentId), RelationshipKind>,
}

impl Relations {
    /// Keeps active edges whose endpoints are both on the roster. Self-pairs are
    /// dropped; when a pair is declared twice the first declaration wins.
    pub fn new(edges: &[RelationshipEdge], roster: &[Student]) -> Self {
        let ids: HashSet<StudentId> = roster.iter().map(|s| s.id).collect();
        let mut relations = Relations::default();
        for edge in edges.iter().filter(|e| e.active) {
            let (low, high) = edge.pair();
            if low == high || !ids.contains(&low) || !ids.contains(&high) {
                trace!("Ignoring relationship {}-{}", edge.student_a, edge.student_b);
                continue;
            }
            if relations.pairs.contains_key(&(low, high)) {
                continue;
            }
            relations.pairs.insert((low, high), edge.kind);
            relations.by_student.entry(low).or_default().insert(high, edge.kind);
            relations.by_student.entry(high).or_default().insert(low, edge.kind);
        }
        relations
    }

    pub fn kind(&self, a: StudentId, b: StudentId) -> Option<RelationshipKind> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.pairs.get(&key).copied()
    }

    pub fn are_related(&self, a: StudentId, b: StudentId) -> bool {
        self.kind(a, b).is_some()
    }

    /// Related students of `id`, ascending.
    pub fn related(&self, id: StudentId) -> impl Iterator<Item = StudentId> + '_ {
        self.by_student
            .get(&id)
            .into_iter()
            .flat_map(|m| m.keys().copied())
    }

    pub fn pairs(&self) -> impl Iterator<Item = ((StudentId, StudentId), RelationshipKind)> + '_ {
        self.pairs.iter().map(|(pair, kind)| (*pair, *kind))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConflictGraph {
    students: Vec<StudentId>,
    index: HashMap<StudentId, usize>,
    adjacency: Vec<BTreeSet<usize>>,
    edges: BTreeMap<(usize, usize), ConflictEdge>,
    relationship_pairs: usize,
}

impl ConflictGraph {
    /// Builds the graph for `roster`. Same subject always conflicts; relationships
    /// and shared sections conflict when enabled in `options`.
    pub fn build(roster: &[Student], relations: &Relations, options: &GenerationOptions) -> Self {
        let mut graph = ConflictGraph {
            students: roster.iter().map(|s| s.id).collect(),
            index: roster.iter().enumerate().map(|(i, s)| (s.id, i)).collect(),
            adjacency: vec![BTreeSet::new(); roster.len()],
            edges: BTreeMap::new(),
            relationship_pairs: 0,
        };

        for (i, a) in roster.iter().enumerate() {
            for (j, b) in roster.iter().enumerate().skip(i + 1) {
                if !a.subject.is_empty() && a.subject == b.subject {
                    graph.add_reason(i, j, ConflictReason::SameSubject);
                }
                if options.enable_section_separation
                    && !a.section.is_empty()
                    && a.section == b.section
                {
                    graph.add_reason(i, j, ConflictReason::SameSection);
                }
            }
        }

        if options.enable_friend_separation {
            for ((low, high), kind) in relations.pairs() {
                if let (Some(&i), Some(&j)) = (graph.index.get(&low), graph.index.get(&high)) {
                    graph.add_reason(i, j, ConflictReason::Relationship(kind));
                    graph.relationship_pairs += 1;
                }
            }
        }

        debug!(
            "Conflict graph: {} vertices, {} edges ({} relationship pairs)",
            graph.len(),
            graph.edge_count(),
            graph.relationship_pairs
        );
        graph
    }

    fn add_reason(&mut self, i: usize, j: usize, reason: ConflictReason) {
        let key = if i < j { (i, j) } else { (j, i) };
        self.edges.entry(key).or_default().reasons.insert(reason);
        self.adjacency[i].insert(j);
        self.adjacency[j].insert(i);
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Student id at vertex `v`.
    pub fn student(&self, v: usize) -> StudentId {
        self.students[v]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adjacency[v].len()
    }

    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(|n| n.len()).max().unwrap_or(0)
    }

    pub fn neighbors(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[v].iter().copied()
    }

    pub fn edge(&self, a: usize, b: usize) -> Option<&ConflictEdge> {
        let key = if a < b { (a, b) } else { (b, a) };
        self.edges.get(&key)
    }

    /// Whether two students (by id) are joined by an edge.
    pub fn conflicts(&self, a: StudentId, b: StudentId) -> bool {
        match (self.index.get(&a), self.index.get(&b)) {
            (Some(&i), Some(&j)) => self.adjacency[i].contains(&j),
            _ => false,
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = ((usize, usize), &ConflictEdge)> + '_ {
        self.edges.iter().map(|(k, e)| (*k, e))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn relationship_pairs(&self) -> usize {
        self.relationship_pairs
    }
}
