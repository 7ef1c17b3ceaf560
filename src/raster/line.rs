//! 3D line stepping with interpolated texture coordinates.

use std::ops::{Add, Mul, Sub};

use cgmath::Point3;

/// A point on the raster walk: x, y, z, u, v.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct RasterPoint(pub [f32; 5]);

impl RasterPoint {
    /// Component along one of the first three axes.
    pub fn axis(&self, axis: usize) -> f32 {
        self.0[axis]
    }

    /// The voxel containing this point.
    pub fn voxel(&self) -> Point3<i32> {
        Point3::new(
            self.0[0].round() as i32,
            self.0[1].round() as i32,
            self.0[2].round() as i32,
        )
    }

    pub fn uv(&self) -> (f32, f32) {
        (self.0[3], self.0[4])
    }
}

impl Add for RasterPoint {
    type Output = RasterPoint;

    fn add(self, rhs: RasterPoint) -> RasterPoint {
        RasterPoint(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl Sub for RasterPoint {
    type Output = RasterPoint;

    fn sub(self, rhs: RasterPoint) -> RasterPoint {
        RasterPoint(std::array::from_fn(|i| self.0[i] - rhs.0[i]))
    }
}

impl Mul<f32> for RasterPoint {
    type Output = RasterPoint;

    fn mul(self, rhs: f32) -> RasterPoint {
        RasterPoint(self.0.map(|c| c * rhs))
    }
}

/// Iterator over the unit steps of a line between two raster points.
///
/// The stepping axis is whichever spatial axis has the largest absolute
/// delta, so consecutive points never skip a voxel along it. Both endpoints
/// are emitted; a zero-length line emits its start once.
pub(crate) struct LineSteps {
    from: RasterPoint,
    delta: RasterPoint,
    steps: u32,
    index: u32,
}

impl LineSteps {
    pub fn new(from: RasterPoint, to: RasterPoint) -> Self {
        let delta = to - from;
        let longest = (0..3)
            .map(|axis| delta.axis(axis).abs())
            .fold(0.0f32, f32::max);
        LineSteps {
            from,
            delta,
            steps: longest.ceil() as u32,
            index: 0,
        }
    }
}

impl Iterator for LineSteps {
    type Item = RasterPoint;

    fn next(&mut self) -> Option<RasterPoint> {
        if self.index > self.steps {
            return None;
        }
        let point = if self.steps == 0 {
            self.from
        } else {
            self.from + self.delta * (self.index as f32 / self.steps as f32)
        };
        self.index += 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.steps + 1).saturating_sub(self.index) as usize;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_length_line_emits_once() {
        let p = RasterPoint([1.0, 2.0, 3.0, 0.5, 0.5]);
        let points: Vec<_> = LineSteps::new(p, p).collect();
        assert_eq!(points, vec![p]);
    }

    #[test]
    fn test_steps_along_longest_axis() {
        let from = RasterPoint([0.0, 0.0, 0.0, 0.0, 0.0]);
        let to = RasterPoint([2.0, 6.0, 1.0, 1.0, 1.0]);
        let points: Vec<_> = LineSteps::new(from, to).collect();
        assert_eq!(points.len(), 7);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point.voxel().y, i as i32);
        }
        assert_eq!(points.last().map(|p| p.uv()), Some((1.0, 1.0)));
    }
}
