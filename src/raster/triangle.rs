//! # Triangle Rasterizer
//!
//! Scan-converts a 3D triangle into integer voxels with interpolated texture
//! coordinates.
//!
//! ## Algorithm
//! 1. The axis along which the triangle is thinnest becomes the interpolation
//!    axis: it is never enumerated, only interpolated. The next axis
//!    (cyclically) is the main scan axis, the remaining one is secondary.
//! 2. Vertices are ordered along the main axis and the walk advances one unit
//!    at a time from the first vertex towards the last, drawing a line between
//!    the long edge and whichever short edge is current.
//! 3. Every scanned point is emitted. The first point landing in each
//!    (main, secondary) cell is also kept in a sparse map.
//! 4. A gap-fill pass connects every occupied cell to its nearest occupied
//!    neighbor along both scan axes, repairing holes the coarse walk leaves on
//!    off-axis triangles.
//!
//! Degenerate triangles (coincident or collinear vertices) go through the same
//! path; edge lengths along the main axis are clamped to at least one unit so
//! the walk always terminates and emits something.

use std::collections::{hash_map::Entry, HashMap, HashSet, VecDeque};

use cgmath::Point3;

use super::line::{LineSteps, RasterPoint};
use crate::geometry::Vertex;

/// One rasterized voxel with the texture coordinates interpolated at it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RasterSample {
    /// Integer voxel position
    pub voxel: Point3<i32>,
    /// Interpolated U texture coordinate
    pub u: f32,
    /// Interpolated V texture coordinate
    pub v: f32,
}

/// Axis roles chosen for one triangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Axes {
    main: usize,
    secondary: usize,
}

impl Axes {
    /// Picks the interpolation axis as the one whose largest edge extent is
    /// smallest. Ties go to the lower-indexed axis.
    fn select(points: &[RasterPoint; 3]) -> Self {
        let mut extents = [0.0f32; 3];
        for (axis, extent) in extents.iter_mut().enumerate() {
            for (a, b) in [(0, 1), (1, 2), (2, 0)] {
                *extent = extent.max((points[a].axis(axis) - points[b].axis(axis)).abs());
            }
        }

        let mut interpolation = 0;
        for axis in 1..3 {
            if extents[axis] < extents[interpolation] {
                interpolation = axis;
            }
        }

        Axes {
            main: (interpolation + 1) % 3,
            secondary: (interpolation + 2) % 3,
        }
    }
}

/// Edge delta normalized to one unit along the main axis.
fn unit_step(from: RasterPoint, to: RasterPoint, main: usize) -> RasterPoint {
    let delta = to - from;
    delta * (1.0 / delta.axis(main).abs().max(1.0))
}

/// Walks the triangle one unit at a time along its main axis, returning the
/// chosen axes and every point on the lines drawn between edges.
fn scan(a: &Vertex, b: &Vertex, c: &Vertex) -> (Axes, Vec<RasterPoint>) {
    let mut points = [a, b, c].map(|vertex| RasterPoint(vertex.components()));
    let axes = Axes::select(&points);
    let main = axes.main;
    points.sort_by(|p, q| p.axis(main).total_cmp(&q.axis(main)));
    let [v0, v1, v2] = points;

    let far = unit_step(v0, v2, main);
    let upper = unit_step(v0, v1, main);
    let lower = unit_step(v1, v2, main);

    let start = v0.axis(main);
    let split = v1.axis(main);
    let end = v2.axis(main);
    let steps = ((end - start).ceil() as usize).max(1);

    let mut scanned = Vec::new();
    for step in 0..steps {
        let position = start + step as f32;
        let near = v0 + far * (position - start);
        let far_point = if position < split {
            v0 + upper * (position - start)
        } else {
            v1 + lower * (position - split)
        };
        scanned.extend(LineSteps::new(near, far_point));
    }
    (axes, scanned)
}

/// Lazy, non-restartable sequence of voxels covering a triangle.
///
/// Construction performs the scan walk; gap-fill lines are produced on demand
/// while iterating. Each voxel is yielded at most once.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_placer::{geometry::Vertex, raster::TriangleRaster};
///
/// let a = Vertex::new(Point3::new(0.0, 0.0, 0.0), 0.0, 0.0);
/// let b = Vertex::new(Point3::new(8.0, 0.0, 0.0), 1.0, 0.0);
/// let c = Vertex::new(Point3::new(0.0, 8.0, 0.0), 0.0, 1.0);
///
/// let voxels: Vec<_> = TriangleRaster::new(&a, &b, &c).collect();
/// assert!(voxels.iter().all(|s| s.voxel.z == 0));
/// ```
pub struct TriangleRaster {
    scanned: Vec<RasterPoint>,
    cells: HashMap<(i32, i32), RasterPoint>,
    keys: Vec<(i32, i32)>,
    max_key: (i32, i32),
    scan_index: usize,
    gap_index: usize,
    pending: VecDeque<RasterPoint>,
    emitted: HashSet<Point3<i32>>,
}

impl TriangleRaster {
    /// Rasterizes the triangle `a`, `b`, `c`.
    ///
    /// Vertices must already be in target (world) coordinates.
    pub fn new(a: &Vertex, b: &Vertex, c: &Vertex) -> Self {
        let (axes, scanned) = scan(a, b, c);

        let mut raster = TriangleRaster {
            scanned: Vec::new(),
            cells: HashMap::new(),
            keys: Vec::new(),
            max_key: (i32::MIN, i32::MIN),
            scan_index: 0,
            gap_index: 0,
            pending: VecDeque::new(),
            emitted: HashSet::new(),
        };

        // Keys are offsets from the minimum occupied cell.
        let min_main = scanned.iter().map(|p| p.voxel()[axes.main]).min().unwrap_or(0);
        let min_secondary = scanned
            .iter()
            .map(|p| p.voxel()[axes.secondary])
            .min()
            .unwrap_or(0);
        for point in &scanned {
            let voxel = point.voxel();
            let key = (voxel[axes.main] - min_main, voxel[axes.secondary] - min_secondary);
            if let Entry::Vacant(entry) = raster.cells.entry(key) {
                entry.insert(*point);
                raster.keys.push(key);
                raster.max_key = (raster.max_key.0.max(key.0), raster.max_key.1.max(key.1));
            }
        }
        raster.keys.sort_unstable();
        raster.scanned = scanned;

        raster
    }

    /// Queues connecting lines from `key` to its nearest occupied neighbors
    /// further along the secondary and main axes.
    fn queue_gap_lines(&mut self, key: (i32, i32)) {
        let (main, secondary) = key;
        let Some(&origin) = self.cells.get(&key) else {
            return;
        };

        let secondary_neighbor = (secondary + 1..=self.max_key.1)
            .map(|s| (main, s))
            .find(|k| self.cells.contains_key(k));
        let main_neighbor = (main + 1..=self.max_key.0)
            .map(|m| (m, secondary))
            .find(|k| self.cells.contains_key(k));

        for (neighbor, distance) in [
            (secondary_neighbor, secondary_neighbor.map(|k| k.1 - secondary)),
            (main_neighbor, main_neighbor.map(|k| k.0 - main)),
        ] {
            // Adjacent cells leave no hole to fill.
            if let (Some(neighbor), Some(distance)) = (neighbor, distance) {
                if distance > 1 {
                    self.pending
                        .extend(LineSteps::new(origin, self.cells[&neighbor]));
                }
            }
        }
    }

    fn emit(&mut self, point: RasterPoint) -> Option<RasterSample> {
        let voxel = point.voxel();
        if !self.emitted.insert(voxel) {
            return None;
        }
        let (u, v) = point.uv();
        Some(RasterSample { voxel, u, v })
    }
}

impl Iterator for TriangleRaster {
    type Item = RasterSample;

    fn next(&mut self) -> Option<RasterSample> {
        loop {
            if let Some(point) = self.pending.pop_front() {
                if let Some(sample) = self.emit(point) {
                    return Some(sample);
                }
                continue;
            }

            if self.scan_index < self.scanned.len() {
                let point = self.scanned[self.scan_index];
                self.scan_index += 1;
                if let Some(sample) = self.emit(point) {
                    return Some(sample);
                }
                continue;
            }

            if self.gap_index < self.keys.len() {
                let key = self.keys[self.gap_index];
                self.gap_index += 1;
                self.queue_gap_lines(key);
                continue;
            }

            return None;
        }
    }
}
