use super::{ContainmentOracle, HierarchyTree, NodeId, ShellGenerator};

/// One boolean difference to perform: cut every `subtrahends` shell out of
/// the `minuend` shell so nested layers separate physically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtractionStep {
    pub minuend: NodeId,
    pub subtrahends: Vec<NodeId>,
}

impl<G: ShellGenerator, C: ContainmentOracle> HierarchyTree<G, C> {
    /// Lists, parent first, the child shells to subtract from every shelled
    /// node. The difference itself is left to an external solid modeller.
    #[must_use]
    pub fn subtraction_plan(&self) -> Vec<SubtractionStep> {
        self.preorder()
            .into_iter()
            .filter_map(|id| {
                let node = self.node(id).ok()?;
                node.shell()?;
                Some(SubtractionStep {
                    minuend: id,
                    subtrahends: node.children().to_vec(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::geometry::{Structure, TriangleMesh};
    use crate::hierarchy::{BoundingBoxShell, HierarchyTree, RayParityContainment};
    use crate::math::{Point3, Vector3};

    fn cube(name: &str, x: f64, half: f64) -> Structure {
        let c = Point3::new(x, 0.0, 0.0);
        let d = Vector3::repeat(half);
        Structure::new(name, TriangleMesh::cuboid(c - d, c + d))
    }

    #[test]
    fn plan_skips_unbounded_root() {
        let mut t = HierarchyTree::new(BoundingBoxShell::new(0.5, 0), RayParityContainment::default());
        let a = t.insert(cube("A", 0.0, 10.0)).unwrap();
        let b = t.insert(cube("B", 0.0, 1.0)).unwrap();
        let c = t.insert(cube("C", 5.0, 1.0)).unwrap();
        let d = t.insert(cube("D", 100.0, 1.0)).unwrap();

        let plan = t.subtraction_plan();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan[0].minuend, a);
        assert_eq!(plan[0].subtrahends, vec![b, c]);
        assert!(plan
            .iter()
            .filter(|s| s.minuend != a)
            .all(|s| s.subtrahends.is_empty()));
        assert!(plan.iter().any(|s| s.minuend == d));
    }
}
