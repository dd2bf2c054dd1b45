//! Ball pivoting surface reconstruction
//!
//! Reconstructs a triangle mesh from an oriented point cloud by rolling
//! a virtual ball over the points. A seed triangle is found wherever the
//! ball can rest on three points without enclosing any other; the ball
//! then pivots around each front edge of the growing mesh, and every
//! point it touches extends the triangulation. Edges over which no ball
//! of the current radius can pivot are parked as border edges and
//! revisited when a larger radius is supplied.

use std::collections::VecDeque;
use std::f64::consts::PI;

use pivotmesh_algorithms::intersection::{points_coplanar, segments_min_distance};
use pivotmesh_algorithms::nearest_neighbor::KdTree;
use pivotmesh_core::{
    Error, NearestNeighborSearch, Point3d, PointCloud, Result, TriangleMesh, Vector3d,
};
use tracing::{debug, info, trace};

type VertexId = usize;
type EdgeId = usize;
type TriangleId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VertexStatus {
    /// Not part of any triangle yet
    Orphan,
    /// At least one incident edge is still pivotable
    Front,
    /// Every incident edge is interior
    Inner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeStatus {
    /// Adjacent to one triangle, awaiting a pivot
    Front,
    /// Adjacent to two triangles, terminal
    Inner,
    /// No valid pivot at the current radius; may revive at a larger one
    Border,
}

struct Vertex {
    edges: Vec<EdgeId>,
    status: VertexStatus,
}

struct Edge {
    source: VertexId,
    target: VertexId,
    triangle0: Option<TriangleId>,
    triangle1: Option<TriangleId>,
    status: EdgeStatus,
}

struct Triangle {
    vertices: [VertexId; 3],
    ball_center: Point3d,
}

/// The ball-pivoting engine
///
/// Owns the vertex/edge/triangle arena built over a borrowed point
/// cloud and spatial index. The index must cover exactly the cloud's
/// points and is not mutated during a run.
struct BallPivoting<'a, S: NearestNeighborSearch> {
    points: &'a [Point3d],
    normals: &'a [Vector3d],
    search: &'a S,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    triangles: Vec<Triangle>,
    edge_front: VecDeque<EdgeId>,
    border_edges: Vec<EdgeId>,
    mesh: TriangleMesh,
}

impl<'a, S: NearestNeighborSearch> BallPivoting<'a, S> {
    fn new(cloud: &'a PointCloud, search: &'a S) -> Result<Self> {
        let normals = cloud.normals.as_deref().ok_or(Error::MissingNormals)?;
        if normals.len() != cloud.points.len() {
            return Err(Error::InvalidData(format!(
                "normal count {} does not match point count {}",
                normals.len(),
                cloud.points.len()
            )));
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(cloud.points.clone(), Vec::new());
        mesh.normals = Some(normals.to_vec());
        mesh.colors = cloud.colors.clone();
        mesh.face_normals = Some(Vec::new());

        Ok(Self {
            points: &cloud.points,
            normals,
            search,
            vertices: cloud
                .points
                .iter()
                .map(|_| Vertex {
                    edges: Vec::new(),
                    status: VertexStatus::Orphan,
                })
                .collect(),
            edges: Vec::new(),
            triangles: Vec::new(),
            edge_front: VecDeque::new(),
            border_edges: Vec::new(),
            mesh,
        })
    }

    /// Center of a ball of the given radius resting on three points, on
    /// the side their normals point to
    ///
    /// Computes the circumcenter from barycentric weights and lifts it
    /// along the triangle normal by the height given by the radius and
    /// the circumradius. Fails for degenerate triangles and for radii
    /// smaller than the circumradius.
    fn compute_ball_center(
        &self,
        vidx1: VertexId,
        vidx2: VertexId,
        vidx3: VertexId,
        radius: f64,
    ) -> Option<Point3d> {
        let v1 = self.points[vidx1];
        let v2 = self.points[vidx2];
        let v3 = self.points[vidx3];
        let c = (v2 - v1).norm_squared();
        let b = (v1 - v3).norm_squared();
        let a = (v3 - v2).norm_squared();

        let alpha = a * (b + c - a);
        let beta = b * (a + c - b);
        let gamma = c * (a + b - c);
        let abg = alpha + beta + gamma;
        if abg < 1e-16 {
            return None;
        }

        let alpha = alpha / abg;
        let beta = beta / abg;
        let gamma = gamma / abg;

        let circ_center = Point3d::from(alpha * v1.coords + beta * v2.coords + gamma * v3.coords);
        // Heron form of the circumradius
        let circ_radius2 = a * b * c;
        let a = a.sqrt();
        let b = b.sqrt();
        let c = c.sqrt();
        let circ_radius2 = circ_radius2 / ((a + b + c) * (b + c - a) * (c + a - b) * (a + b - c));

        let height2 = radius * radius - circ_radius2;
        if height2 < 0.0 {
            return None;
        }

        let tr_norm = (v2 - v1).cross(&(v3 - v1));
        let mut tr_norm = tr_norm / tr_norm.norm();
        let pt_norm = self.normals[vidx1] + self.normals[vidx2] + self.normals[vidx3];
        let pt_norm = pt_norm / pt_norm.norm();
        if tr_norm.dot(&pt_norm) < 0.0 {
            tr_norm = -tr_norm;
        }

        Some(circ_center + height2.sqrt() * tr_norm)
    }

    /// Whether three vertices can form a triangle whose orientation
    /// agrees with all three vertex normals
    fn is_compatible(&self, v0: VertexId, v1: VertexId, v2: VertexId) -> bool {
        let mut normal = compute_face_normal(
            &self.points[v0],
            &self.points[v1],
            &self.points[v2],
        );
        if normal.dot(&self.normals[v0]) < -1e-16 {
            normal = -normal;
        }
        normal.dot(&self.normals[v0]) > -1e-16
            && normal.dot(&self.normals[v1]) > -1e-16
            && normal.dot(&self.normals[v2]) > -1e-16
    }

    /// The existing edge between two vertices, if any
    fn find_edge(&self, u: VertexId, v: VertexId) -> Option<EdgeId> {
        self.vertices[u].edges.iter().copied().find(|&eid| {
            let edge = &self.edges[eid];
            (edge.source == u && edge.target == v) || (edge.source == v && edge.target == u)
        })
    }

    fn get_or_create_edge(&mut self, u: VertexId, v: VertexId) -> EdgeId {
        if let Some(eid) = self.find_edge(u, v) {
            return eid;
        }
        let eid = self.edges.len();
        self.edges.push(Edge {
            source: u,
            target: v,
            triangle0: None,
            triangle1: None,
            status: EdgeStatus::Front,
        });
        eid
    }

    /// The vertex of the edge's first adjacent triangle that is not an
    /// edge endpoint
    fn opposite_vertex(&self, eid: EdgeId) -> Option<VertexId> {
        let edge = &self.edges[eid];
        let tid = edge.triangle0?;
        self.triangles[tid]
            .vertices
            .iter()
            .copied()
            .find(|&w| w != edge.source && w != edge.target)
    }

    /// Record a triangle on one of the edge's two adjacency slots
    ///
    /// Filling the first slot fixes the edge orientation: source and
    /// target are swapped if needed so the winding of (source, target,
    /// opposite) agrees with the summed vertex normals. Filling the
    /// second slot makes the edge interior. A third adjacency claim is
    /// inconsistent topology; it is logged and ignored so that one bad
    /// neighborhood does not abort the run.
    fn add_adjacent_triangle(&mut self, eid: EdgeId, tid: TriangleId) {
        if self.edges[eid].triangle0 == Some(tid) || self.edges[eid].triangle1 == Some(tid) {
            return;
        }
        if self.edges[eid].triangle0.is_none() {
            self.edges[eid].triangle0 = Some(tid);
            self.edges[eid].status = EdgeStatus::Front;
            let (src, tgt) = (self.edges[eid].source, self.edges[eid].target);
            if let Some(opp) = self.opposite_vertex(eid) {
                let tr_norm = (self.points[tgt] - self.points[src])
                    .cross(&(self.points[opp] - self.points[src]));
                let tr_norm = tr_norm / tr_norm.norm();
                let pt_norm = self.normals[src] + self.normals[tgt] + self.normals[opp];
                let pt_norm = pt_norm / pt_norm.norm();
                if pt_norm.dot(&tr_norm) < 0.0 {
                    let edge = &mut self.edges[eid];
                    std::mem::swap(&mut edge.source, &mut edge.target);
                }
            } else {
                debug!("edge ({src}, {tgt}) has no opposite vertex");
            }
        } else if self.edges[eid].triangle1.is_none() {
            self.edges[eid].triangle1 = Some(tid);
            self.edges[eid].status = EdgeStatus::Inner;
        } else {
            let (src, tgt) = (self.edges[eid].source, self.edges[eid].target);
            debug!("edge ({src}, {tgt}) already has two adjacent triangles, ignoring a third");
        }
    }

    fn update_vertex_status(&mut self, v: VertexId) {
        let vertex = &self.vertices[v];
        let status = if vertex.edges.is_empty() {
            VertexStatus::Orphan
        } else if vertex
            .edges
            .iter()
            .any(|&eid| self.edges[eid].status != EdgeStatus::Inner)
        {
            VertexStatus::Front
        } else {
            VertexStatus::Inner
        };
        self.vertices[v].status = status;
    }

    /// Wire a new triangle into the arena and emit it to the mesh
    ///
    /// The emitted winding is chosen so the face normal points to the
    /// same hemisphere as the first vertex's normal; the unflipped face
    /// normal is appended to the mesh face-normal list either way.
    fn create_triangle(&mut self, v0: VertexId, v1: VertexId, v2: VertexId, center: Point3d) {
        trace!("creating triangle ({v0}, {v1}, {v2})");
        let tid = self.triangles.len();
        self.triangles.push(Triangle {
            vertices: [v0, v1, v2],
            ball_center: center,
        });

        for (a, b) in [(v0, v1), (v1, v2), (v2, v0)] {
            let eid = self.get_or_create_edge(a, b);
            self.add_adjacent_triangle(eid, tid);
            for w in [a, b] {
                if !self.vertices[w].edges.contains(&eid) {
                    self.vertices[w].edges.push(eid);
                }
            }
        }

        self.update_vertex_status(v0);
        self.update_vertex_status(v1);
        self.update_vertex_status(v2);

        let face_normal =
            compute_face_normal(&self.points[v0], &self.points[v1], &self.points[v2]);
        if face_normal.dot(&self.normals[v0]) > -1e-16 {
            self.mesh.faces.push([v0, v1, v2]);
        } else {
            self.mesh.faces.push([v0, v2, v1]);
        }
        if let Some(face_normals) = self.mesh.face_normals.as_mut() {
            face_normals.push(face_normal);
        }
    }

    /// Check whether three vertices can seed a new triangulation patch,
    /// returning the ball center if they can
    ///
    /// The candidate triangle must be normal-compatible, must not reuse
    /// an interior edge, must admit a ball of the given radius, and that
    /// ball must not enclose any other point of the neighborhood.
    fn try_triangle_seed(
        &self,
        v0: VertexId,
        v1: VertexId,
        v2: VertexId,
        neighbors: &[VertexId],
        radius: f64,
    ) -> Option<Point3d> {
        if !self.is_compatible(v0, v1, v2) {
            return None;
        }
        for (a, b) in [(v0, v2), (v1, v2)] {
            if let Some(eid) = self.find_edge(a, b) {
                if self.edges[eid].status == EdgeStatus::Inner {
                    return None;
                }
            }
        }
        let center = self.compute_ball_center(v0, v1, v2, radius)?;
        for &n in neighbors {
            if n == v0 || n == v1 || n == v2 {
                continue;
            }
            if (center - self.points[n]).norm() < radius - 1e-16 {
                return None;
            }
        }
        Some(center)
    }

    /// Try to grow a seed triangle from an orphan vertex
    ///
    /// Neighbor pairs are taken in spatial-query order; the first pair
    /// that passes the seed test and whose existing edges are all still
    /// pivotable is committed, and its front edges are queued.
    fn try_seed(&mut self, v: VertexId, radius: f64) -> bool {
        let neighbors: Vec<VertexId> = self
            .search
            .find_radius_neighbors(&self.points[v], 2.0 * radius)
            .into_iter()
            .map(|(idx, _)| idx)
            .collect();
        if neighbors.len() < 3 {
            return false;
        }

        for (i0, &nb0) in neighbors.iter().enumerate() {
            if self.vertices[nb0].status != VertexStatus::Orphan || nb0 == v {
                continue;
            }

            let mut seed = None;
            for &nb1 in &neighbors[i0 + 1..] {
                if self.vertices[nb1].status != VertexStatus::Orphan || nb1 == v {
                    continue;
                }
                if let Some(center) = self.try_triangle_seed(v, nb0, nb1, &neighbors, radius) {
                    seed = Some((nb1, center));
                    break;
                }
            }
            let Some((nb1, center)) = seed else {
                continue;
            };

            // a seed triangle may only reuse edges that are still front
            let mut blocked = false;
            for (a, b) in [(v, nb1), (nb0, nb1), (v, nb0)] {
                if let Some(eid) = self.find_edge(a, b) {
                    if self.edges[eid].status != EdgeStatus::Front {
                        blocked = true;
                        break;
                    }
                }
            }
            if blocked {
                continue;
            }

            self.create_triangle(v, nb0, nb1, center);

            for (a, b) in [(v, nb1), (nb0, nb1), (v, nb0)] {
                if let Some(eid) = self.find_edge(a, b) {
                    if self.edges[eid].status == EdgeStatus::Front {
                        self.edge_front.push_front(eid);
                    }
                }
            }

            if !self.edge_front.is_empty() {
                return true;
            }
        }

        false
    }

    /// Seed every still-orphan vertex in input order, expanding each
    /// successful seed before moving on
    fn find_seed_triangle(&mut self, radius: f64) {
        for vidx in 0..self.vertices.len() {
            if self.vertices[vidx].status == VertexStatus::Orphan && self.try_seed(vidx, radius) {
                debug!("seeded a patch at vertex {vidx}");
                self.expand_triangulation(radius);
            }
        }
    }

    /// Pivot the ball around a front edge and return the vertex it
    /// touches first, together with the ball center at that position
    ///
    /// Of all neighbors admitting an empty ball through the edge
    /// endpoints, the one reached by the smallest rotation from the
    /// current ball position wins. Candidates whose connecting segment
    /// would run through the existing adjacent triangle are skipped.
    fn find_candidate_vertex(&self, eid: EdgeId, radius: f64) -> Option<(VertexId, Point3d)> {
        let edge = &self.edges[eid];
        let (src, tgt) = (edge.source, edge.target);
        let Some(opp) = self.opposite_vertex(eid) else {
            debug!("edge ({src}, {tgt}) has no adjacent triangle to pivot from");
            return None;
        };
        let tid = edge.triangle0?;
        let old_center = self.triangles[tid].ball_center;

        let mp = Point3d::from((self.points[src].coords + self.points[tgt].coords) * 0.5);

        // pivot axis and reference direction to the current ball center
        let axis = (self.points[tgt] - self.points[src]).normalize();
        let a = (old_center - mp).normalize();

        let neighbors = self.search.find_radius_neighbors(&mp, 2.0 * radius);

        let mut best: Option<(VertexId, Point3d)> = None;
        let mut min_angle = 2.0 * PI;
        for &(candidate, _) in &neighbors {
            if candidate == src || candidate == tgt || candidate == opp {
                continue;
            }

            let coplanar = points_coplanar(
                &self.points[src],
                &self.points[tgt],
                &self.points[opp],
                &self.points[candidate],
            );
            if coplanar
                && (segments_min_distance(
                    &mp,
                    &self.points[candidate],
                    &self.points[src],
                    &self.points[opp],
                ) < 1e-12
                    || segments_min_distance(
                        &mp,
                        &self.points[candidate],
                        &self.points[tgt],
                        &self.points[opp],
                    ) < 1e-12)
            {
                continue;
            }

            let Some(new_center) = self.compute_ball_center(src, tgt, candidate, radius) else {
                continue;
            };

            let b = (new_center - mp).normalize();
            let cosinus = a.dot(&b).clamp(-1.0, 1.0);
            let mut angle = cosinus.acos();
            if a.cross(&b).dot(&axis) < 0.0 {
                angle = 2.0 * PI - angle;
            }
            if angle >= min_angle {
                continue;
            }

            let not_empty = neighbors.iter().any(|&(n, _)| {
                n != src
                    && n != tgt
                    && n != candidate
                    && (new_center - self.points[n]).norm() < radius - 1e-16
            });
            if !not_empty {
                min_angle = angle;
                best = Some((candidate, new_center));
            }
        }
        best
    }

    fn mark_edge_border(&mut self, eid: EdgeId) {
        self.edges[eid].status = EdgeStatus::Border;
        self.border_edges.push(eid);
    }

    /// Drain the front queue, pivoting over every edge that is still
    /// front when popped
    ///
    /// Freshly created front edges are pushed to the head of the queue
    /// so expansion stays local; stale entries whose status changed
    /// while queued are discarded on pop.
    fn expand_triangulation(&mut self, radius: f64) {
        while let Some(eid) = self.edge_front.pop_front() {
            if self.edges[eid].status != EdgeStatus::Front {
                continue;
            }
            let (src, tgt) = (self.edges[eid].source, self.edges[eid].target);

            let Some((candidate, center)) = self.find_candidate_vertex(eid, radius) else {
                self.mark_edge_border(eid);
                continue;
            };
            if self.vertices[candidate].status == VertexStatus::Inner
                || !self.is_compatible(candidate, src, tgt)
            {
                self.mark_edge_border(eid);
                continue;
            }

            let e0 = self.find_edge(candidate, src);
            let e1 = self.find_edge(candidate, tgt);
            if e0.is_some_and(|e| self.edges[e].status != EdgeStatus::Front)
                || e1.is_some_and(|e| self.edges[e].status != EdgeStatus::Front)
            {
                self.mark_edge_border(eid);
                continue;
            }

            self.create_triangle(src, tgt, candidate, center);

            if let Some(e0) = self.find_edge(candidate, src) {
                if self.edges[e0].status == EdgeStatus::Front {
                    self.edge_front.push_front(e0);
                }
            }
            if let Some(e1) = self.find_edge(candidate, tgt) {
                if self.edges[e1].status == EdgeStatus::Front {
                    self.edge_front.push_front(e1);
                }
            }
        }
    }

    /// Re-examine parked border edges for the new radius
    ///
    /// A border edge whose adjacent triangle admits an empty ball of the
    /// new radius becomes front again and re-enters the queue.
    fn revisit_border_edges(&mut self, radius: f64) {
        let mut still_border = Vec::with_capacity(self.border_edges.len());
        let mut revived = 0usize;
        for eid in std::mem::take(&mut self.border_edges) {
            let Some(tid) = self.edges[eid].triangle0 else {
                still_border.push(eid);
                continue;
            };
            let [v0, v1, v2] = self.triangles[tid].vertices;
            if let Some(center) = self.compute_ball_center(v0, v1, v2, radius) {
                let empty = self
                    .search
                    .find_radius_neighbors(&center, radius)
                    .iter()
                    .all(|&(idx, _)| idx == v0 || idx == v1 || idx == v2);
                if empty {
                    self.edges[eid].status = EdgeStatus::Front;
                    self.edge_front.push_back(eid);
                    revived += 1;
                    continue;
                }
            }
            still_border.push(eid);
        }
        self.border_edges = still_border;
        if revived > 0 {
            debug!("revived {revived} border edges for radius {radius}");
        }
    }

    /// Run the reconstruction over the given radii, in order
    fn run(&mut self, radii: &[f64]) -> Result<()> {
        self.mesh.faces.clear();
        if let Some(face_normals) = self.mesh.face_normals.as_mut() {
            face_normals.clear();
        }
        for &radius in radii {
            if radius <= 0.0 {
                return Err(Error::InvalidRadius(radius));
            }
            debug!("ball pivoting pass with radius {radius}");
            self.revisit_border_edges(radius);
            if self.edge_front.is_empty() {
                self.find_seed_triangle(radius);
            } else {
                self.expand_triangulation(radius);
            }
            debug!(
                "pass with radius {radius} done, mesh has {} triangles",
                self.mesh.faces.len()
            );
        }
        Ok(())
    }

    fn into_mesh(self) -> TriangleMesh {
        self.mesh
    }
}

/// Unit normal of the triangle (v0, v1, v2); zero vector if degenerate
fn compute_face_normal(v0: &Point3d, v1: &Point3d, v2: &Point3d) -> Vector3d {
    let normal = (v1 - v0).cross(&(v2 - v0));
    let norm = normal.norm();
    if norm > 0.0 {
        normal / norm
    } else {
        Vector3d::zeros()
    }
}

/// Ball pivoting surface reconstruction
///
/// Rolls a ball of each radius in `radii` over the cloud and collects
/// every triangle the ball rests on. Radii are processed in the given
/// order; supplying increasing radii lets later passes pivot over gaps
/// the earlier, smaller balls could not bridge.
///
/// The output mesh references the input points by index: it carries all
/// input positions, normals and colors, the emitted faces, and one
/// normal per face. Points the ball never reached simply remain
/// unreferenced by any face.
///
/// # Arguments
/// * `cloud` - Point cloud with per-point unit normals
/// * `radii` - Ball radii, each > 0
///
/// # Returns
/// * `Result<TriangleMesh>` - Reconstructed triangle mesh
///
/// # Errors
/// Fails with [`Error::MissingNormals`] if the cloud has no normals and
/// [`Error::InvalidRadius`] if any radius is not positive.
pub fn ball_pivoting_reconstruction(cloud: &PointCloud, radii: &[f64]) -> Result<TriangleMesh> {
    let index = KdTree::new(&cloud.points);
    ball_pivoting_with_index(cloud, &index, radii)
}

/// Ball pivoting surface reconstruction over a caller-supplied spatial index
///
/// Identical to [`ball_pivoting_reconstruction`] but reuses an existing
/// [`NearestNeighborSearch`] built over the cloud's points, which must
/// return results sorted by (distance, index) for the reconstruction to
/// be deterministic.
pub fn ball_pivoting_with_index<S: NearestNeighborSearch>(
    cloud: &PointCloud,
    index: &S,
    radii: &[f64],
) -> Result<TriangleMesh> {
    let mut engine = BallPivoting::new(cloud, index)?;
    engine.run(radii)?;
    let mesh = engine.into_mesh();
    info!(
        "ball pivoting produced {} triangles from {} points",
        mesh.face_count(),
        cloud.len()
    );
    Ok(mesh)
}
