//! Average-linkage (UPGMA) hierarchical clustering for heatmap ordering

use ndarray::ArrayView2;

/// One agglomeration step. Leaves are numbered `0..n`, the cluster formed by
/// merge `i` is numbered `n + i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    pub n_leaves: usize,
    pub merges: Vec<Merge>,
}

/// Line segment of a drawn dendrogram link: (position, height) pairs for
/// left foot, left shoulder, right shoulder, right foot. Leaf `k` of the
/// leaf order sits at position `k + 0.5`.
pub type LinkPath = [(f64, f64); 4];

fn euclidean(points: &ArrayView2<'_, f64>, a: usize, b: usize) -> f64 {
    points
        .row(a)
        .iter()
        .zip(points.row(b).iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Cluster the rows of `points` by average linkage on Euclidean distance
pub fn average_linkage(points: ArrayView2<'_, f64>) -> Dendrogram {
    let n = points.nrows();
    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&points, i, j);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    // Slot i holds cluster ids[i] while active[i].
    let mut ids: Vec<usize> = (0..n).collect();
    let mut sizes = vec![1usize; n];
    let mut active = vec![true; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for step in 0..n.saturating_sub(1) {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                if best.map_or(true, |(_, _, d)| dist[i][j] < d) {
                    best = Some((i, j, dist[i][j]));
                }
            }
        }
        let Some((i, j, height)) = best else { break };

        let (si, sj) = (sizes[i], sizes[j]);
        for k in 0..n {
            if active[k] && k != i && k != j {
                let d = (si as f64 * dist[i][k] + sj as f64 * dist[j][k]) / (si + sj) as f64;
                dist[i][k] = d;
                dist[k][i] = d;
            }
        }

        merges.push(Merge {
            left: ids[i].min(ids[j]),
            right: ids[i].max(ids[j]),
            height,
            size: si + sj,
        });
        ids[i] = n + step;
        sizes[i] = si + sj;
        active[j] = false;
    }

    Dendrogram { n_leaves: n, merges }
}

impl Dendrogram {
    /// Leaves in drawing order (left child before right child)
    pub fn leaf_order(&self) -> Vec<usize> {
        let n = self.n_leaves;
        if n == 0 {
            return Vec::new();
        }
        if self.merges.is_empty() {
            return (0..n).collect();
        }
        let mut order = Vec::with_capacity(n);
        let mut stack = vec![n + self.merges.len() - 1];
        while let Some(id) = stack.pop() {
            if id < n {
                order.push(id);
            } else {
                let m = &self.merges[id - n];
                stack.push(m.right);
                stack.push(m.left);
            }
        }
        order
    }

    pub fn max_height(&self) -> f64 {
        self.merges.iter().map(|m| m.height).fold(0.0, f64::max)
    }

    /// Link paths for drawing, in merge order
    pub fn link_paths(&self) -> Vec<LinkPath> {
        let n = self.n_leaves;
        let mut position = vec![0.0; n + self.merges.len()];
        let mut height = vec![0.0; n + self.merges.len()];
        for (rank, leaf) in self.leaf_order().into_iter().enumerate() {
            position[leaf] = rank as f64 + 0.5;
        }

        let mut paths = Vec::with_capacity(self.merges.len());
        for (i, m) in self.merges.iter().enumerate() {
            let (pl, hl) = (position[m.left], height[m.left]);
            let (pr, hr) = (position[m.right], height[m.right]);
            paths.push([(pl, hl), (pl, m.height), (pr, m.height), (pr, hr)]);
            position[n + i] = (pl + pr) / 2.0;
            height[n + i] = m.height;
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn merges_closest_pairs_first() {
        let pts = array![[0.0], [10.0], [1.0], [11.0]];
        let tree = average_linkage(pts.view());
        assert_eq!(tree.merges.len(), 3);
        assert_eq!((tree.merges[0].left, tree.merges[0].right), (0, 2));
        assert_eq!((tree.merges[1].left, tree.merges[1].right), (1, 3));
        assert_relative_eq!(tree.merges[0].height, 1.0);
        // average of |0-10|, |0-11|, |1-10|, |1-11|
        assert_relative_eq!(tree.merges[2].height, 10.0);
        assert_eq!(tree.merges[2].size, 4);
    }

    #[test]
    fn leaf_order_keeps_clusters_adjacent() {
        let pts = array![[0.0], [10.0], [1.0], [11.0]];
        let order = average_linkage(pts.view()).leaf_order();
        assert_eq!(order, vec![0, 2, 1, 3]);
    }

    #[test]
    fn degenerate_inputs() {
        let empty = ndarray::Array2::<f64>::zeros((0, 3));
        assert!(average_linkage(empty.view()).leaf_order().is_empty());

        let one = array![[0.5, 0.5]];
        let tree = average_linkage(one.view());
        assert_eq!(tree.leaf_order(), vec![0]);
        assert!(tree.link_paths().is_empty());
        assert_relative_eq!(tree.max_height(), 0.0);
    }

    #[test]
    fn link_paths_follow_leaf_positions() {
        let pts = array![[0.0], [4.0]];
        let paths = average_linkage(pts.view()).link_paths();
        assert_eq!(paths, vec![[(0.5, 0.0), (0.5, 4.0), (1.5, 4.0), (1.5, 0.0)]]);
    }
}
