use super::DefinitionRegion;
use crate::bounding_box::BoundingBox;
use std::collections::{HashMap, VecDeque};

type Pos = (i32, i32, i32);

const NEIGHBOURS: [Pos; 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

/// Gap between two inclusive ranges: `<= 0` overlap, `1` touching.
#[inline]
fn gap(a_min: i32, a_max: i32, b_min: i32, b_max: i32) -> i64 {
    a_min.max(b_min) as i64 - a_max.min(b_max) as i64
}

/// Overlapping, or sharing a face: touching on one axis and overlapping on the other two.
fn boxes_connected(a: &BoundingBox, b: &BoundingBox) -> bool {
    let gaps = [
        gap(a.min.0, a.max.0, b.min.0, b.max.0),
        gap(a.min.1, a.max.1, b.min.1, b.max.1),
        gap(a.min.2, a.max.2, b.min.2, b.max.2),
    ];
    let touching = gaps.iter().filter(|&&g| g == 1).count();
    let overlapping = gaps.iter().filter(|&&g| g <= 0).count();
    overlapping == 3 || (touching == 1 && overlapping == 2)
}

impl DefinitionRegion {
    /// Adjacency over storage nodes: boxes first, then loose cells.
    fn adjacency(&self) -> Vec<Vec<usize>> {
        let box_count = self.boxes.len();
        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); box_count + self.points.len()];

        for i in 0..box_count {
            for j in i + 1..box_count {
                if boxes_connected(&self.boxes[i], &self.boxes[j]) {
                    edges[i].push(j);
                    edges[j].push(i);
                }
            }
        }

        let point_nodes: HashMap<Pos, usize> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, &p)| (p, box_count + i))
            .collect();
        for (&(x, y, z), &node) in &point_nodes {
            for (dx, dy, dz) in NEIGHBOURS {
                let (Some(nx), Some(ny), Some(nz)) =
                    (x.checked_add(dx), y.checked_add(dy), z.checked_add(dz))
                else {
                    continue;
                };
                let n = (nx, ny, nz);
                if let Some(&other) = point_nodes.get(&n) {
                    // Each point pair is seen from both sides.
                    if other > node {
                        edges[node].push(other);
                        edges[other].push(node);
                    }
                } else if let Some(b) = self.boxes.iter().position(|b| b.contains(n)) {
                    edges[node].push(b);
                    edges[b].push(node);
                }
            }
        }
        edges
    }

    fn component_labels(&self) -> (Vec<usize>, usize) {
        let edges = self.adjacency();
        let mut labels = vec![usize::MAX; edges.len()];
        let mut count = 0;
        let mut queue = VecDeque::new();
        for start in 0..edges.len() {
            if labels[start] != usize::MAX {
                continue;
            }
            labels[start] = count;
            queue.push_back(start);
            while let Some(node) = queue.pop_front() {
                for &next in &edges[node] {
                    if labels[next] == usize::MAX {
                        labels[next] = count;
                        queue.push_back(next);
                    }
                }
            }
            count += 1;
        }
        (labels, count)
    }

    /// True when every member is reachable from every other through face
    /// neighbours. An empty region counts as contiguous.
    pub fn is_contiguous(&self) -> bool {
        self.connected_components() <= 1
    }

    /// Number of 6-connected components.
    pub fn connected_components(&self) -> usize {
        self.component_labels().1
    }

    /// One canonical region per 6-connected component, ordered by each
    /// component's smallest member in canonical order. Metadata is copied to
    /// every component.
    pub fn components(&self) -> Vec<DefinitionRegion> {
        let (labels, count) = self.component_labels();
        let mut parts: Vec<Vec<BoundingBox>> = vec![Vec::new(); count];
        for (node, b) in self.as_boxes().into_iter().enumerate() {
            parts[labels[node]].push(b);
        }

        let mut components: Vec<(Pos, DefinitionRegion)> = parts
            .into_iter()
            .filter_map(|boxes| {
                let first = boxes
                    .iter()
                    .map(|b| (b.min.2, b.min.1, b.min.0))
                    .min()?;
                let mut region = DefinitionRegion {
                    boxes,
                    points: Default::default(),
                    metadata: self.metadata.clone(),
                };
                region.simplify();
                Some((first, region))
            })
            .collect();
        components.sort_by_key(|(first, _)| *first);
        components.into_iter().map(|(_, region)| region).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxes_connected() {
        let a = BoundingBox::new((0, 0, 0), (2, 2, 2));
        assert!(boxes_connected(&a, &BoundingBox::new((3, 0, 0), (4, 2, 2))));
        assert!(boxes_connected(&a, &BoundingBox::new((1, 1, 1), (4, 4, 4))));
        // Edge contact only.
        assert!(!boxes_connected(&a, &BoundingBox::new((3, 3, 0), (4, 4, 2))));
        assert!(!boxes_connected(&a, &BoundingBox::new((4, 0, 0), (5, 2, 2))));
    }

    #[test]
    fn test_is_contiguous() {
        assert!(DefinitionRegion::new().is_contiguous());
        assert!(DefinitionRegion::from_bounds((0, 0, 0), (5, 0, 0)).is_contiguous());

        let mut apart = DefinitionRegion::new();
        apart.add_point(0, 0, 0);
        apart.add_point(5, 5, 5);
        assert!(!apart.is_contiguous());

        let mut l_shape = DefinitionRegion::new();
        l_shape.add_bounds((0, 0, 0), (2, 0, 0));
        l_shape.add_bounds((2, 0, 0), (2, 2, 0));
        assert!(l_shape.is_contiguous());

        let mut diagonal = DefinitionRegion::new();
        diagonal.add_point(0, 0, 0);
        diagonal.add_point(1, 1, 0);
        assert_eq!(diagonal.connected_components(), 2);
    }

    #[test]
    fn test_cells_at_integer_limits() {
        let mut region = DefinitionRegion::new();
        region.add_point(i32::MAX, 0, 0);
        region.add_point(i32::MIN, i32::MIN, i32::MIN);
        assert_eq!(region.connected_components(), 2);

        region.add_point(i32::MAX - 1, 0, 0);
        region.add_point(i32::MIN, i32::MIN, i32::MIN + 1);
        assert_eq!(region.connected_components(), 2);
        assert_eq!(region.components().len(), 2);
        assert!(!region.is_contiguous());
    }

    #[test]
    fn test_point_joins_box() {
        let mut region = DefinitionRegion::from_bounds((0, 0, 0), (3, 3, 3));
        region.add_bounds((10, 0, 0), (12, 0, 0));
        assert_eq!(region.connected_components(), 2);
        region.add_point(4, 0, 0);
        assert_eq!(region.connected_components(), 2);
        for x in 5..10 {
            region.add_point(x, 0, 0);
        }
        assert_eq!(region.connected_components(), 1);
    }

    #[test]
    fn test_components_ordering() {
        let mut region = DefinitionRegion::new();
        region.add_bounds((10, 0, 0), (11, 0, 0));
        region.add_bounds((0, 0, 5), (1, 0, 5));
        region.add_point(20, 0, 0);
        region.with_metadata("label", "bus");

        let parts = region.components();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].bounds().unwrap().min, (10, 0, 0));
        assert_eq!(parts[1].bounds().unwrap().min, (20, 0, 0));
        assert_eq!(parts[2].bounds().unwrap().min, (0, 0, 5));
        assert!(parts.iter().all(|p| p.get_metadata("label") == Some(&"bus".to_string())));
        assert_eq!(parts.iter().map(|p| p.volume()).sum::<u64>(), region.volume());
    }
}
