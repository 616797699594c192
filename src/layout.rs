//! Post-drag overlap relaxation.
//!
//! After a drag ends, nodes closer than `2 * (radius + padding)` are pushed
//! apart along the line joining their centres. The dragged node keeps its
//! drop position; when it overlaps another node the other node absorbs the
//! full push. Otherwise both nodes move by half the overlap.

use serde::Serialize;

use crate::model::Position;

/// Golden angle in radians, used to spread coincident nodes deterministically
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Distance below which two nodes count as overlapping after resolution
pub const SEPARATION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutParams {
    pub node_radius: f64,
    pub padding: f64,
    pub max_iterations: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            node_radius: 40.0,
            padding: 20.0,
            max_iterations: 4,
        }
    }
}

impl LayoutParams {
    /// Minimum centre-to-centre distance between two nodes
    pub fn min_distance(&self) -> f64 {
        2.0 * (self.node_radius + self.padding)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePosition {
    pub id: String,
    pub position: Position,
}

impl NodePosition {
    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlapResolution {
    /// All nodes, in input order, with their resolved positions
    pub nodes: Vec<NodePosition>,
    /// Ids of nodes whose position changed, in input order
    pub moved: Vec<String>,
    /// Iterations that found at least one overlap
    pub iterations: usize,
    /// False when the iteration bound ran out with overlaps remaining
    pub converged: bool,
}

impl OverlapResolution {
    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.nodes
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.position)
    }
}

/// Push overlapping nodes apart. `dragged` is the node the user just
/// released, if any.
pub fn resolve_overlaps(
    nodes: &[NodePosition],
    dragged: Option<&str>,
    params: &LayoutParams,
) -> OverlapResolution {
    let min_distance = params.min_distance();
    let mut resolved: Vec<NodePosition> = nodes.to_vec();
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..params.max_iterations {
        let mut any_overlap = false;

        for i in 0..resolved.len() {
            for j in (i + 1)..resolved.len() {
                let a = resolved[i].position;
                let b = resolved[j].position;
                let distance = a.distance_to(&b);
                if distance >= min_distance {
                    continue;
                }
                any_overlap = true;

                let (angle, overlap) = if distance > 0.0 {
                    ((b.y - a.y).atan2(b.x - a.x), min_distance - distance)
                } else {
                    // Coincident centres have no direction; pick one from the pair index.
                    (GOLDEN_ANGLE * (i * resolved.len() + j + 1) as f64, min_distance)
                };
                let (sin, cos) = angle.sin_cos();

                let a_dragged = dragged == Some(resolved[i].id.as_str());
                let b_dragged = dragged == Some(resolved[j].id.as_str());
                let (push_a, push_b) = match (a_dragged, b_dragged) {
                    (true, false) => (0.0, overlap),
                    (false, true) => (overlap, 0.0),
                    _ => (overlap / 2.0, overlap / 2.0),
                };

                resolved[i].position.x -= cos * push_a;
                resolved[i].position.y -= sin * push_a;
                resolved[j].position.x += cos * push_b;
                resolved[j].position.y += sin * push_b;
            }
        }

        if !any_overlap {
            converged = true;
            break;
        }
        iterations += 1;
    }

    if !converged {
        converged = !has_overlap(&resolved, min_distance);
    }

    let moved: Vec<String> = nodes
        .iter()
        .zip(resolved.iter())
        .filter(|(before, after)| before.position != after.position)
        .map(|(_, after)| after.id.clone())
        .collect();

    tracing::debug!(
        nodes = nodes.len(),
        moved = moved.len(),
        iterations,
        converged,
        "resolved overlaps"
    );

    OverlapResolution {
        nodes: resolved,
        moved,
        iterations,
        converged,
    }
}

fn has_overlap(nodes: &[NodePosition], min_distance: f64) -> bool {
    for (i, a) in nodes.iter().enumerate() {
        for b in nodes.iter().skip(i + 1) {
            if a.position.distance_to(&b.position) < min_distance - SEPARATION_TOLERANCE {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64, y: f64) -> NodePosition {
        NodePosition::new(id, Position::new(x, y))
    }

    fn distance(result: &OverlapResolution, a: &str, b: &str) -> f64 {
        let a = result.position_of(a).expect("a");
        let b = result.position_of(b).expect("b");
        a.distance_to(&b)
    }

    #[test]
    fn undragged_pair_splits_overlap() {
        let nodes = vec![node("a", 0.0, 0.0), node("b", 60.0, 0.0)];
        let result = resolve_overlaps(&nodes, None, &LayoutParams::default());

        let a = result.position_of("a").unwrap();
        let b = result.position_of("b").unwrap();
        assert!((a.x + 30.0).abs() < 1e-9);
        assert!((b.x - 90.0).abs() < 1e-9);
        assert!((distance(&result, "a", "b") - 120.0).abs() < 1e-9);
        assert_eq!(result.moved, vec!["a".to_string(), "b".to_string()]);
        assert!(result.converged);
    }

    #[test]
    fn dragged_node_stays_put() {
        let nodes = vec![node("a", 0.0, 0.0), node("b", 0.0, 50.0)];
        let result = resolve_overlaps(&nodes, Some("a"), &LayoutParams::default());

        assert_eq!(result.position_of("a"), Some(Position::new(0.0, 0.0)));
        let b = result.position_of("b").unwrap();
        assert!(b.x.abs() < 1e-9);
        assert!((b.y - 120.0).abs() < 1e-9);
        assert_eq!(result.moved, vec!["b".to_string()]);
    }

    #[test]
    fn separated_nodes_are_untouched() {
        let nodes = vec![node("a", 0.0, 0.0), node("b", 200.0, 0.0)];
        let result = resolve_overlaps(&nodes, Some("a"), &LayoutParams::default());

        assert!(result.moved.is_empty());
        assert_eq!(result.iterations, 0);
        assert!(result.converged);
    }

    #[test]
    fn coincident_nodes_are_separated() {
        let nodes = vec![node("a", 10.0, 10.0), node("b", 10.0, 10.0)];
        let result = resolve_overlaps(&nodes, Some("a"), &LayoutParams::default());

        assert_eq!(result.position_of("a"), Some(Position::new(10.0, 10.0)));
        assert!(distance(&result, "a", "b") >= 120.0 - SEPARATION_TOLERANCE);
        assert_eq!(result.moved, vec!["b".to_string()]);
    }

    #[test]
    fn cluster_respects_iteration_bound() {
        let params = LayoutParams::default();
        let nodes: Vec<NodePosition> = (0..12)
            .map(|i| node(&format!("n{i}"), (i % 4) as f64 * 15.0, (i / 4) as f64 * 15.0))
            .collect();

        let result = resolve_overlaps(&nodes, Some("n5"), &params);
        assert!(result.iterations <= params.max_iterations);
        assert_eq!(result.nodes.len(), nodes.len());
        assert_eq!(result.position_of("n5"), Some(Position::new(15.0, 15.0)));

        if result.converged {
            for (i, a) in result.nodes.iter().enumerate() {
                for b in result.nodes.iter().skip(i + 1) {
                    assert!(
                        a.position.distance_to(&b.position)
                            >= params.min_distance() - SEPARATION_TOLERANCE
                    );
                }
            }
        }
    }

    #[test]
    fn generous_bound_separates_small_cluster() {
        let params = LayoutParams {
            max_iterations: 64,
            ..LayoutParams::default()
        };
        let nodes = vec![
            node("a", 0.0, 0.0),
            node("b", 30.0, 0.0),
            node("c", 0.0, 30.0),
        ];

        let result = resolve_overlaps(&nodes, None, &params);
        assert!(result.converged);
        assert!(distance(&result, "a", "b") >= 120.0 - SEPARATION_TOLERANCE);
        assert!(distance(&result, "a", "c") >= 120.0 - SEPARATION_TOLERANCE);
        assert!(distance(&result, "b", "c") >= 120.0 - SEPARATION_TOLERANCE);
    }
}
