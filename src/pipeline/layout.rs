//! Concept layout: place concept nodes in 3D space for the concept-map view.
//!
//! Nodes sit evenly on a circle of radius [`RADIUS`] in the x–z plane, in
//! input order. Height encodes importance: `y = (importance − 0.5) · 2`, so
//! an average concept sits on the plane and key concepts float above it.
//! Node size grows linearly with importance and colours cycle through
//! [`PALETTE`].

use crate::output::{ConceptEdge, ConceptMap, ConceptNode};
use crate::pipeline::normalize::scalar;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Circle radius in scene units.
pub const RADIUS: f64 = 3.0;

/// Importance assumed when the model omits it.
pub const DEFAULT_IMPORTANCE: f64 = 0.5;

/// Relationship strength assumed when the model omits it.
pub const DEFAULT_STRENGTH: f64 = 0.5;

/// Node colours, assigned cyclically by index.
pub const PALETTE: [&str; 6] = [
    "#2563eb", "#7c3aed", "#059669", "#dc2626", "#f59e0b", "#8b5cf6",
];

/// A concept as named by the model, before layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    #[serde(deserialize_with = "scalar::string")]
    pub id: String,
    #[serde(deserialize_with = "scalar::string")]
    pub label: String,
    #[serde(default)]
    pub importance: Option<f64>,
}

/// A relationship as named by the model, before layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(deserialize_with = "scalar::string")]
    pub from: String,
    #[serde(deserialize_with = "scalar::string")]
    pub to: String,
    #[serde(default)]
    pub strength: Option<f64>,
}

/// Colour for the node at `index`.
pub fn color_for(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Lay out `concepts` on the circle and pass `relationships` through.
///
/// An empty concept list yields an empty map (edges included), which also
/// keeps the angle computation from dividing by zero.
pub fn layout(concepts: &[Concept], relationships: &[Relationship]) -> ConceptMap {
    let n = concepts.len();
    if n == 0 {
        return ConceptMap::default();
    }

    let nodes = concepts
        .iter()
        .enumerate()
        .map(|(i, concept)| {
            let importance = concept.importance.unwrap_or(DEFAULT_IMPORTANCE);
            let angle = (i as f64 / n as f64) * TAU;
            ConceptNode {
                id: concept.id.clone(),
                label: concept.label.clone(),
                importance,
                position: [
                    RADIUS * angle.cos(),
                    (importance - 0.5) * 2.0,
                    RADIUS * angle.sin(),
                ],
                color: color_for(i).to_string(),
                size: importance * 1.5 + 0.5,
            }
        })
        .collect();

    let edges = relationships
        .iter()
        .map(|rel| ConceptEdge {
            from: rel.from.clone(),
            to: rel.to.clone(),
            strength: rel.strength.unwrap_or(DEFAULT_STRENGTH),
        })
        .collect();

    ConceptMap { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(id: &str, importance: Option<f64>) -> Concept {
        Concept {
            id: id.into(),
            label: id.to_uppercase(),
            importance,
        }
    }

    #[test]
    fn empty_concepts_give_empty_map() {
        let rels = vec![Relationship {
            from: "a".into(),
            to: "b".into(),
            strength: None,
        }];
        let map = layout(&[], &rels);
        assert!(map.nodes.is_empty());
        assert!(map.edges.is_empty());
    }

    #[test]
    fn nodes_lie_on_radius_three() {
        let concepts: Vec<Concept> = (0..7)
            .map(|i| concept(&format!("c{i}"), Some(0.1 * i as f64)))
            .collect();
        let map = layout(&concepts, &[]);
        assert_eq!(map.nodes.len(), 7);
        for node in &map.nodes {
            let [x, _, z] = node.position;
            assert!((x * x + z * z - 9.0).abs() < 1e-9, "{node:?}");
        }
    }

    #[test]
    fn first_node_on_positive_x_axis() {
        let map = layout(&[concept("a", None), concept("b", None)], &[]);
        let [x, y, z] = map.nodes[0].position;
        assert!((x - 3.0).abs() < 1e-12);
        assert_eq!(y, 0.0);
        assert!(z.abs() < 1e-12);
        // Second of two sits opposite.
        assert!((map.nodes[1].position[0] + 3.0).abs() < 1e-12);
    }

    #[test]
    fn importance_drives_height_and_size() {
        let map = layout(&[concept("a", Some(1.0)), concept("b", Some(0.1))], &[]);
        assert!((map.nodes[0].position[1] - 1.0).abs() < 1e-12);
        assert!((map.nodes[0].size - 2.0).abs() < 1e-12);
        assert!((map.nodes[1].position[1] + 0.8).abs() < 1e-12);
        assert!((map.nodes[1].size - 0.65).abs() < 1e-12);
    }

    #[test]
    fn importance_is_not_clamped() {
        let map = layout(&[concept("a", Some(3.0))], &[]);
        assert_eq!(map.nodes[0].importance, 3.0);
        assert!((map.nodes[0].size - 5.0).abs() < 1e-12);
    }

    #[test]
    fn palette_cycles() {
        let concepts: Vec<Concept> = (0..8).map(|i| concept(&i.to_string(), None)).collect();
        let map = layout(&concepts, &[]);
        assert_eq!(map.nodes[0].color, "#2563eb");
        assert_eq!(map.nodes[5].color, "#8b5cf6");
        assert_eq!(map.nodes[6].color, "#2563eb");
        assert_eq!(map.nodes[7].color, "#7c3aed");
    }

    #[test]
    fn dangling_edges_pass_through_with_default_strength() {
        let rels = vec![
            Relationship {
                from: "a".into(),
                to: "ghost".into(),
                strength: None,
            },
            Relationship {
                from: "a".into(),
                to: "a".into(),
                strength: Some(0.9),
            },
        ];
        let map = layout(&[concept("a", None)], &rels);
        assert_eq!(map.edges.len(), 2);
        assert_eq!(map.edges[0].to, "ghost");
        assert_eq!(map.edges[0].strength, 0.5);
        assert_eq!(map.edges[1].strength, 0.9);
    }

    #[test]
    fn numeric_ids_decode_as_text() {
        let concepts: Vec<Concept> =
            serde_json::from_str(r#"[{"id": 1, "label": "Energy", "importance": 0.8}]"#).unwrap();
        let rels: Vec<Relationship> =
            serde_json::from_str(r#"[{"from": 1, "to": 2.5}]"#).unwrap();
        assert_eq!(concepts[0].id, "1");
        assert_eq!(rels[0].from, "1");
        assert_eq!(rels[0].to, "2.5");

        let missing: Result<Vec<Concept>, _> = serde_json::from_str(r#"[{"id": 1}]"#);
        assert!(missing.is_err());
        let null_label: Result<Vec<Concept>, _> =
            serde_json::from_str(r#"[{"id": 1, "label": null}]"#);
        assert!(null_label.is_err());
    }
}
