//! Mesh entities: cells, boundary faces, boundary edges.

/// A tetrahedron. Valid iff its signed volume is positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Corner node indices, positively oriented.
    pub nodes: [usize; 4],
}

impl Cell {
    /// Whether `node` is a corner of this cell.
    #[must_use]
    pub fn has_node(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// The corner slot of `node`, if it is a corner.
    #[must_use]
    pub fn corner_of(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }
}

/// A boundary triangle on a geometry face.
///
/// Carries the `(u, v)` surface parameter of each corner. Valid iff its
/// signed parametric area is positive under the face's sign convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Corner node indices.
    pub nodes: [usize; 3],
    /// Owning geometry face id.
    pub face_id: usize,
    /// Per-corner surface parameters, `uv[i]` for `nodes[i]`.
    pub uv: [[f64; 2]; 3],
}

impl Face {
    /// The corner slot of `node`, if it is a corner.
    #[must_use]
    pub fn corner_of(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }
}

/// A boundary segment on a geometry edge.
///
/// Carries the `t` curve parameter of each corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    /// End node indices.
    pub nodes: [usize; 2],
    /// Owning geometry edge id.
    pub edge_id: usize,
    /// Per-corner curve parameters, `t[i]` for `nodes[i]`.
    pub t: [f64; 2],
}

impl Edge {
    /// The corner slot of `node`, if it is an end.
    #[must_use]
    pub fn corner_of(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// The node at the other end of the segment, if `node` is an end.
    #[must_use]
    pub fn other_node(&self, node: usize) -> Option<usize> {
        match self.corner_of(node)? {
            0 => Some(self.nodes[1]),
            _ => Some(self.nodes[0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_corner_lookup() {
        let cell = Cell { nodes: [5, 7, 2, 9] };
        assert!(cell.has_node(2));
        assert_eq!(cell.corner_of(9), Some(3));
        assert_eq!(cell.corner_of(4), None);
    }

    #[test]
    fn test_edge_other_node() {
        let edge = Edge {
            nodes: [3, 8],
            edge_id: 1,
            t: [0.0, 1.0],
        };
        assert_eq!(edge.other_node(3), Some(8));
        assert_eq!(edge.other_node(8), Some(3));
        assert_eq!(edge.other_node(5), None);
    }
}
