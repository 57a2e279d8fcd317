//! Three-ray vision cone against static obstacle geometry.

use bevy::math::{
    bounding::{Aabb3d, BoundingSphere, RayCast3d},
    Dir3, Quat, Vec3, Vec3A,
};

use crate::config::ObstacleShape;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObstacleId(pub usize);

/// Outcome of a single ray cast.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RayHit {
    Hit {
        distance: f32,
        point: Vec3,
        normal: Vec3,
        obstacle: ObstacleId,
    },
    #[default]
    Miss,
}

impl RayHit {
    pub fn distance(&self) -> Option<f32> {
        match *self {
            RayHit::Hit { distance, .. } => Some(distance),
            RayHit::Miss => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, RayHit::Hit { .. })
    }
}

/// Anything the vision rays can be cast against.
pub trait ObstacleQuery {
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> RayHit;
}

/// Static set of spheres and boxes.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    shapes: Vec<ObstacleShape>,
}

impl ObstacleField {
    pub fn new(shapes: impl IntoIterator<Item = ObstacleShape>) -> Self {
        Self {
            shapes: shapes.into_iter().collect(),
        }
    }

    pub fn shapes(&self) -> &[ObstacleShape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

fn aabb_normal(center: Vec3, half_extents: Vec3, point: Vec3) -> Vec3 {
    let local = (point - center) / half_extents;
    let abs = local.abs();
    if abs.x >= abs.y && abs.x >= abs.z {
        Vec3::new(local.x.signum(), 0.0, 0.0)
    } else if abs.y >= abs.z {
        Vec3::new(0.0, local.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, local.z.signum())
    }
}

impl ObstacleQuery for ObstacleField {
    fn cast_ray(&self, origin: Vec3, direction: Dir3, max_distance: f32) -> RayHit {
        let ray = RayCast3d::new(Vec3A::from(origin), direction, max_distance);
        let mut nearest = RayHit::Miss;

        for (index, shape) in self.shapes.iter().enumerate() {
            let hit = match *shape {
                ObstacleShape::Sphere { center, radius } => ray
                    .sphere_intersection_at(&BoundingSphere::new(center, radius))
                    .map(|distance| {
                        let point = origin + direction * distance;
                        (distance, point, (point - center).normalize_or(-*direction))
                    }),
                ObstacleShape::Cuboid {
                    center,
                    half_extents,
                } => ray
                    .aabb_intersection_at(&Aabb3d::new(center, half_extents))
                    .map(|distance| {
                        let point = origin + direction * distance;
                        (distance, point, aabb_normal(center, half_extents, point))
                    }),
            };

            if let Some((distance, point, normal)) = hit {
                let closer = nearest.distance().is_none_or(|d| distance < d);
                if closer {
                    nearest = RayHit::Hit {
                        distance,
                        point,
                        normal,
                        obstacle: ObstacleId(index),
                    };
                }
            }
        }

        nearest
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaySlot {
    Left,
    Center,
    Right,
}

/// Results of one vision sweep.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VisionReading {
    pub left: RayHit,
    pub center: RayHit,
    pub right: RayHit,
    pub range: f32,
}

impl VisionReading {
    pub fn rays(&self) -> [(RaySlot, RayHit); 3] {
        [
            (RaySlot::Left, self.left),
            (RaySlot::Center, self.center),
            (RaySlot::Right, self.right),
        ]
    }

    /// Closest hit across all three rays.
    pub fn nearest(&self) -> Option<(RaySlot, RayHit)> {
        self.rays()
            .into_iter()
            .filter(|(_, hit)| hit.is_hit())
            .min_by(|(_, a), (_, b)| {
                let da = a.distance().unwrap_or(f32::INFINITY);
                let db = b.distance().unwrap_or(f32::INFINITY);
                da.total_cmp(&db)
            })
    }

    pub fn nearest_distance(&self) -> Option<f32> {
        self.nearest().and_then(|(_, hit)| hit.distance())
    }

    /// Per-ray distance with misses reported as the full range.
    pub fn distance_or_range(&self, slot: RaySlot) -> f32 {
        let hit = match slot {
            RaySlot::Left => self.left,
            RaySlot::Center => self.center,
            RaySlot::Right => self.right,
        };
        hit.distance().unwrap_or(self.range)
    }
}

/// Cast forward, forward rotated by `+spread` (left) and by `-spread`
/// (right) about the vertical axis.
pub fn sweep(
    obstacles: &impl ObstacleQuery,
    origin: Vec3,
    forward: Vec3,
    spread: f32,
    range: f32,
) -> VisionReading {
    let Ok(forward) = Dir3::new(forward) else {
        return VisionReading {
            range,
            ..Default::default()
        };
    };
    let left = Quat::from_rotation_y(spread) * forward;
    let right = Quat::from_rotation_y(-spread) * forward;

    VisionReading {
        left: obstacles.cast_ray(origin, left, range),
        center: obstacles.cast_ray(origin, forward, range),
        right: obstacles.cast_ray(origin, right, range),
        range,
    }
}
