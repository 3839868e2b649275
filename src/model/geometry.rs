//! Geometry primitives used by collision and rendering.
//!
//! The world is Z-up: +X is forward, +Y is left. The player collider is a
//! vertical ("Z") cylinder whose position is the center of the cylinder.

use glam::{Mat3, Vec2, Vec3};

/// 8-bit RGBA color as written in the definition files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8::new(255, 255, 255, 255);
    pub const BLACK: Rgba8 = Rgba8::new(0, 0, 0, 255);
    pub const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl Default for Rgba8 {
    fn default() -> Self {
        Rgba8::WHITE
    }
}

/// Yaw/pitch/roll in degrees.
///
/// Yaw turns about +Z, pitch about +Y (positive pitch tips the nose down),
/// roll about +X.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub roll_degrees: f32,
}

impl EulerAngles {
    pub const ZERO: EulerAngles = EulerAngles { yaw_degrees: 0.0, pitch_degrees: 0.0, roll_degrees: 0.0 };

    pub fn new(yaw_degrees: f32, pitch_degrees: f32, roll_degrees: f32) -> Self {
        Self { yaw_degrees, pitch_degrees, roll_degrees }
    }

    /// Rotation whose columns are the forward (I), left (J) and up (K) basis
    pub fn to_mat3(self) -> Mat3 {
        Mat3::from_rotation_z(self.yaw_degrees.to_radians())
            * Mat3::from_rotation_y(self.pitch_degrees.to_radians())
            * Mat3::from_rotation_x(self.roll_degrees.to_radians())
    }

    pub fn forward(self) -> Vec3 {
        self.to_mat3().x_axis
    }

    pub fn left(self) -> Vec3 {
        self.to_mat3().y_axis
    }

    pub fn up(self) -> Vec3 {
        self.to_mat3().z_axis
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Aabb3 {
    pub fn new(mins: Vec3, maxs: Vec3) -> Self {
        Self { mins, maxs }
    }

    pub fn from_center_half_dims(center: Vec3, half_dims: Vec3) -> Self {
        Self { mins: center - half_dims, maxs: center + half_dims }
    }

    pub fn center(&self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }
}

/// Oriented box: center, orthonormal basis and half extents along that basis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb3 {
    pub center: Vec3,
    pub i_basis: Vec3,
    pub j_basis: Vec3,
    pub k_basis: Vec3,
    pub half_dims: Vec3,
}

impl Obb3 {
    pub fn new(center: Vec3, orientation: EulerAngles, half_dims: Vec3) -> Self {
        let rotation = orientation.to_mat3();
        Self {
            center,
            i_basis: rotation.x_axis,
            j_basis: rotation.y_axis,
            k_basis: rotation.z_axis,
            half_dims,
        }
    }

    /// World-space position of the local point (x, y, z)
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.center + self.i_basis * local.x + self.j_basis * local.y + self.k_basis * local.z
    }

    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        let d = world - self.center;
        Vec3::new(d.dot(self.i_basis), d.dot(self.j_basis), d.dot(self.k_basis))
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let h = self.half_dims;
        [
            self.local_to_world(Vec3::new(-h.x, -h.y, -h.z)),
            self.local_to_world(Vec3::new(h.x, -h.y, -h.z)),
            self.local_to_world(Vec3::new(h.x, h.y, -h.z)),
            self.local_to_world(Vec3::new(-h.x, h.y, -h.z)),
            self.local_to_world(Vec3::new(-h.x, -h.y, h.z)),
            self.local_to_world(Vec3::new(h.x, -h.y, h.z)),
            self.local_to_world(Vec3::new(h.x, h.y, h.z)),
            self.local_to_world(Vec3::new(-h.x, h.y, h.z)),
        ]
    }
}

/// Vertical cylinder centered on `center`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZCylinder {
    pub center: Vec3,
    pub radius: f32,
    pub height: f32,
}

impl ZCylinder {
    pub fn new(center: Vec3, radius: f32, height: f32) -> Self {
        Self { center, radius, height }
    }

    pub fn bottom(&self) -> f32 {
        self.center.z - self.height * 0.5
    }

    pub fn top(&self) -> f32 {
        self.center.z + self.height * 0.5
    }
}

fn nearest_point_on_rect(point: Vec2, mins: Vec2, maxs: Vec2) -> Vec2 {
    point.clamp(mins, maxs)
}

pub fn do_z_cylinder_and_aabb_overlap(cylinder: &ZCylinder, aabb: &Aabb3) -> bool {
    if cylinder.bottom() >= aabb.maxs.z || cylinder.top() <= aabb.mins.z {
        return false;
    }
    let disc = cylinder.center.truncate();
    let nearest = nearest_point_on_rect(disc, aabb.mins.truncate(), aabb.maxs.truncate());
    disc.distance_squared(nearest) < cylinder.radius * cylinder.radius
}

/// True when the cylinder sits on the box top, its bottom no more than
/// `tolerance` above it, with the footprints overlapping.
pub fn is_z_cylinder_resting_on_aabb(cylinder: &ZCylinder, aabb: &Aabb3, tolerance: f32) -> bool {
    let gap = cylinder.bottom() - aabb.maxs.z;
    if !(0.0..tolerance).contains(&gap) {
        return false;
    }
    let disc = cylinder.center.truncate();
    let nearest = nearest_point_on_rect(disc, aabb.mins.truncate(), aabb.maxs.truncate());
    disc.distance_squared(nearest) < cylinder.radius * cylinder.radius
}

pub fn do_z_cylinder_and_sphere_overlap(cylinder: &ZCylinder, sphere_center: Vec3, sphere_radius: f32) -> bool {
    let z = sphere_center.z.clamp(cylinder.bottom(), cylinder.top());
    let disc = cylinder.center.truncate();
    let offset = sphere_center.truncate() - disc;
    let xy = if offset.length_squared() > cylinder.radius * cylinder.radius {
        disc + offset.normalize() * cylinder.radius
    } else {
        sphere_center.truncate()
    };
    let nearest = xy.extend(z);
    nearest.distance_squared(sphere_center) < sphere_radius * sphere_radius
}

/// Displacement that moves the cylinder out of the box along the axis of
/// least penetration, or `None` when they do not overlap.
pub fn z_cylinder_push_out_of_aabb(cylinder: &ZCylinder, aabb: &Aabb3) -> Option<Vec3> {
    if !do_z_cylinder_and_aabb_overlap(cylinder, aabb) {
        return None;
    }

    let up = aabb.maxs.z - cylinder.bottom();
    let down = cylinder.top() - aabb.mins.z;

    let disc = cylinder.center.truncate();
    let mins = aabb.mins.truncate();
    let maxs = aabb.maxs.truncate();
    let nearest = nearest_point_on_rect(disc, mins, maxs);
    let horizontal = if nearest != disc {
        let away = disc - nearest;
        let dist = away.length();
        away / dist * (cylinder.radius - dist)
    } else {
        // Disc center is inside the footprint: leave through the closest edge
        let exits = [
            (disc.x - mins.x, Vec2::NEG_X),
            (maxs.x - disc.x, Vec2::X),
            (disc.y - mins.y, Vec2::NEG_Y),
            (maxs.y - disc.y, Vec2::Y),
        ];
        let (edge_dist, dir) = exits
            .iter()
            .copied()
            .fold((f32::MAX, Vec2::X), |best, e| if e.0 < best.0 { e } else { best });
        dir * (edge_dist + cylinder.radius)
    };

    let horizontal_len = horizontal.length();
    if up <= down && up <= horizontal_len {
        Some(Vec3::new(0.0, 0.0, up))
    } else if down <= horizontal_len {
        Some(Vec3::new(0.0, 0.0, -down))
    } else {
        Some(horizontal.extend(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub position: Vec3,
    pub normal: Vec3,
}

/// Slab test in the box's local frame. `direction` must be normalized.
pub fn raycast_vs_obb(start: Vec3, direction: Vec3, max_distance: f32, obb: &Obb3) -> Option<RayHit> {
    let local_start = obb.world_to_local(start);
    let local_dir = Vec3::new(direction.dot(obb.i_basis), direction.dot(obb.j_basis), direction.dot(obb.k_basis));
    let h = obb.half_dims;

    if local_start.abs().cmple(h).all() {
        return Some(RayHit { distance: 0.0, position: start, normal: -direction });
    }

    let mut t_enter = f32::MIN;
    let mut t_exit = f32::MAX;
    let mut enter_normal = Vec3::ZERO;
    let axes = [obb.i_basis, obb.j_basis, obb.k_basis];

    for axis in 0..3 {
        let s = local_start[axis];
        let d = local_dir[axis];
        if d.abs() < 1e-8 {
            if s < -h[axis] || s > h[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / d;
        let t1 = (-h[axis] - s) * inv;
        let t2 = (h[axis] - s) * inv;
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if near > t_enter {
            t_enter = near;
            enter_normal = if d > 0.0 { -axes[axis] } else { axes[axis] };
        }
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_enter < 0.0 || t_enter > max_distance {
        return None;
    }

    Some(RayHit {
        distance: t_enter,
        position: start + direction * t_enter,
        normal: enter_normal,
    })
}
