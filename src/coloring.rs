//! DSatur (degree of saturation) coloring of the conflict graph.

use crate::data::{ColorId, StudentId};
use crate::graph::ConflictGraph;
use itertools::Itertools;
use log::{debug, trace};
use std::cmp::Reverse;
use std::collections::BTreeSet;

/// Students sharing one color; never contains two adjacent vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorClass {
    pub color: ColorId,
    /// Members in ascending student id.
    pub students: Vec<StudentId>,
}

impl ColorClass {
    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

/// Colors every vertex and returns the color of each vertex, indexed like the graph.
///
/// Ties are broken by degree and then by the lowest vertex index, so the result
/// depends only on the graph.
pub fn dsatur(graph: &ConflictGraph) -> Vec<ColorId> {
    let n = graph.len();
    if n == 0 {
        return Vec::new();
    }

    let degrees: Vec<usize> = (0..n).map(|v| graph.degree(v)).collect();
    let mut colors: Vec<Option<ColorId>> = vec![None; n];
    let mut saturation: Vec<BTreeSet<ColorId>> = vec![BTreeSet::new(); n];

    let mut current = (0..n).min_by_key(|&v| (Reverse(degrees[v]), v));
    while let Some(v) = current {
        // saturation[v] holds exactly the colors of v's colored neighbors
        let color = (0..).find(|c| !saturation[v].contains(c)).unwrap_or(0);
        colors[v] = Some(color);
        trace!("Vertex {} (student {}) -> color {}", v, graph.student(v), color);

        for u in graph.neighbors(v) {
            if colors[u].is_none() {
                saturation[u].insert(color);
            }
        }

        current = (0..n)
            .filter(|&u| colors[u].is_none())
            .min_by_key(|&u| (Reverse(saturation[u].len()), Reverse(degrees[u]), u));
    }

    colors.into_iter().map(|c| c.unwrap_or(0)).collect()
}

/// Groups the vertex coloring into classes ordered by color id.
pub fn color_classes(graph: &ConflictGraph, colors: &[ColorId]) -> Vec<ColorClass> {
    let classes: Vec<ColorClass> = colors
        .iter()
        .enumerate()
        .map(|(v, &color)| (color, graph.student(v)))
        .into_group_map()
        .into_iter()
        .map(|(color, mut students)| {
            students.sort_unstable();
            ColorClass { color, students }
        })
        .sorted_by_key(|class| class.color)
        .collect();

    debug!(
        "DSatur used {} colors for {} students (max degree {})",
        classes.len(),
        graph.len(),
        graph.max_degree()
    );
    classes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GenerationOptions, RelationshipEdge, RelationshipKind, Student};
    use crate::graph::Relations;

    fn roster(n: u32) -> Vec<Student> {
        (1..=n)
            .map(|id| Student {
                id,
                year: 1,
                branch: "CSE".into(),
                section: String::new(),
                subject: format!("S{id}"),
                department: String::new(),
            })
            .collect()
    }

    fn graph_with(n: u32, pairs: &[(u32, u32)]) -> ConflictGraph {
        let students = roster(n);
        let edges: Vec<RelationshipEdge> = pairs
            .iter()
            .map(|&(a, b)| RelationshipEdge {
                student_a: a,
                student_b: b,
                kind: RelationshipKind::Friend,
                active: true,
            })
            .collect();
        let relations = Relations::new(&edges, &students);
        ConflictGraph::build(&students, &relations, &GenerationOptions::default())
    }

    fn assert_proper(graph: &ConflictGraph, colors: &[ColorId]) {
        for ((a, b), _) in graph.edges() {
            assert_ne!(colors[a], colors[b], "edge {a}-{b} shares a color");
        }
    }

    #[test]
    fn triangle_needs_three_colors() {
        let graph = graph_with(3, &[(1, 2), (2, 3), (1, 3)]);
        let colors = dsatur(&graph);
        assert_eq!(colors, vec![0, 1, 2]);
        let classes = color_classes(&graph, &colors);
        assert_eq!(classes.len(), 3);
        assert!(classes.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn starts_from_highest_degree_vertex() {
        // star centred on student 4
        let graph = graph_with(4, &[(4, 1), (4, 2), (4, 3)]);
        let colors = dsatur(&graph);
        assert_eq!(colors, vec![1, 1, 1, 0]);
        let classes = color_classes(&graph, &colors);
        assert_eq!(classes[0].students, vec![4]);
        assert_eq!(classes[1].students, vec![1, 2, 3]);
    }

    #[test]
    fn bipartite_graph_uses_two_colors() {
        let mut pairs = Vec::new();
        for a in 1..=6 {
            for b in 7..=10 {
                pairs.push((a, b));
            }
        }
        let graph = graph_with(10, &pairs);
        let colors = dsatur(&graph);
        assert_proper(&graph, &colors);
        let classes = color_classes(&graph, &colors);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].students, vec![7, 8, 9, 10]);
        assert_eq!(classes[1].students, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn odd_cycle_stays_proper_and_bounded() {
        let graph = graph_with(5, &[(1, 2), (2, 3), (3, 4), (4, 5), (5, 1)]);
        let colors = dsatur(&graph);
        assert_proper(&graph, &colors);
        let used: BTreeSet<_> = colors.iter().collect();
        assert_eq!(used.len(), 3);
        assert!(used.len() <= graph.max_degree() + 1);
    }

    #[test]
    fn isolated_vertices_share_color_zero() {
        let graph = graph_with(4, &[]);
        let colors = dsatur(&graph);
        assert_eq!(colors, vec![0; 4]);
        let classes = color_classes(&graph, &colors);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].students, vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_graph_has_no_classes() {
        let graph = graph_with(0, &[]);
        assert!(dsatur(&graph).is_empty());
        assert!(color_classes(&graph, &[]).is_empty());
    }
}
