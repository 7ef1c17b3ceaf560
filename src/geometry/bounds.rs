use cgmath::{Point3, Vector3};

/// An axis-aligned integer box spanned by two inclusive corners.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoxBounds {
    /// Component-wise minimum corner (inclusive)
    pub min: Point3<i32>,
    /// Component-wise maximum corner (inclusive)
    pub max: Point3<i32>,
}

impl BoxBounds {
    /// Builds bounds from any two opposite corners.
    ///
    /// Every axis takes its own min and max, so the corners may be given in
    /// any order.
    pub fn from_corners(a: Point3<i32>, b: Point3<i32>) -> Self {
        BoxBounds {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Number of voxels along each axis, saturating at `u32::MAX`.
    pub fn size(&self) -> Vector3<u32> {
        Vector3::new(
            span(self.min.x, self.max.x),
            span(self.min.y, self.max.y),
            span(self.min.z, self.max.z),
        )
    }

    /// Whether `voxel` lies inside the bounds.
    pub fn contains(&self, voxel: Point3<i32>) -> bool {
        (self.min.x..=self.max.x).contains(&voxel.x)
            && (self.min.y..=self.max.y).contains(&voxel.y)
            && (self.min.z..=self.max.z).contains(&voxel.z)
    }
}

fn span(min: i32, max: i32) -> u32 {
    u32::try_from(i64::from(max) - i64::from(min) + 1).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corner_order_does_not_matter() {
        let a = Point3::new(5, -2, 9);
        let b = Point3::new(1, 4, 3);
        assert_eq!(BoxBounds::from_corners(a, b), BoxBounds::from_corners(b, a));
    }

    /// Each axis is min/maxed against its own coordinate; a z corner never
    /// leaks into the y extent.
    #[test]
    fn test_every_axis_uses_its_own_min_max() {
        let bounds = BoxBounds::from_corners(Point3::new(0, 10, 2), Point3::new(3, 1, 8));
        assert_eq!(bounds.min, Point3::new(0, 1, 2));
        assert_eq!(bounds.max, Point3::new(3, 10, 8));
        assert_eq!(bounds.size(), Vector3::new(4, 10, 7));
    }

    #[test]
    fn test_size_of_extreme_corners_does_not_overflow() {
        let bounds = BoxBounds::from_corners(
            Point3::new(i32::MIN, -1, i32::MAX),
            Point3::new(i32::MAX, 0, i32::MAX),
        );
        assert_eq!(bounds.size(), Vector3::new(u32::MAX, 2, 1));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let bounds = BoxBounds::from_corners(Point3::new(0, 0, 0), Point3::new(2, 2, 2));
        assert!(bounds.contains(Point3::new(2, 0, 2)));
        assert!(!bounds.contains(Point3::new(3, 0, 0)));
    }
}
