use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

use crate::layout::{Layout, MARKER_RADIUS};
use crate::rig::{Pose, FOV_Y_DEGREES, Z_FAR, Z_NEAR};

/// A world-space ray cast from the camera through a cursor position.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// Unprojects a cursor position into a world-space ray.
///
/// Uses the same projection parameters as the renderer, so a click lands
/// exactly where the marker is drawn.
pub fn screen_ray(pose: &Pose, cursor: (f32, f32), viewport: (u32, u32)) -> Ray {
    let (width, height) = viewport;
    let aspect = width as f32 / height.max(1) as f32;
    let view = Mat4::look_at_rh(pose.eye, pose.target, Vec3::Y);
    let proj = Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR);
    let inverse = (proj * view).inverse();

    let ndc_x = 2.0 * cursor.0 / width.max(1) as f32 - 1.0;
    let ndc_y = 1.0 - 2.0 * cursor.1 / height.max(1) as f32;

    let near = inverse * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
    let far = inverse * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
    let near = near.xyz() / near.w;
    let far = far.xyz() / far.w;

    Ray {
        origin: pose.eye,
        direction: (far - near).normalize(),
    }
}

/// Distance along `ray` to the nearest intersection with a sphere, if any.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt = discriminant.sqrt();
    let near = -b - sqrt;
    if near > 0.0 {
        return Some(near);
    }
    let far = -b + sqrt;
    (far > 0.0).then_some(far)
}

/// Index of the marker under the cursor, picking the closest one when the
/// ray passes through several.
pub fn pick_marker(
    pose: &Pose,
    layout: &Layout,
    count: usize,
    cursor: (f32, f32),
    viewport: (u32, u32),
) -> Option<usize> {
    let ray = screen_ray(pose, cursor, viewport);
    let mut best: Option<(usize, f32)> = None;
    for index in 0..count {
        if let Some(distance) = ray_sphere(&ray, layout.marker_position(index), MARKER_RADIUS) {
            if best.map_or(true, |(_, nearest)| distance < nearest) {
                best = Some((index, distance));
            }
        }
    }
    best.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_cursor_casts_straight_ahead() {
        let pose = Pose::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let ray = screen_ray(&pose, (400.0, 300.0), (800, 600));
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        assert_eq!(ray.origin, pose.eye);
    }

    #[test]
    fn clicking_a_marker_head_on_picks_it() {
        let layout = Layout::new(5.0, 1.0);
        let marker = layout.marker_position(0);
        let pose = Pose::new(marker + Vec3::new(0.0, 0.0, 10.0), marker);
        let picked = pick_marker(&pose, &layout, 3, (400.0, 300.0), (800, 600));
        assert_eq!(picked, Some(0));
    }

    #[test]
    fn clicking_empty_space_picks_nothing() {
        let layout = Layout::new(5.0, 1.0);
        let marker = layout.marker_position(0);
        let pose = Pose::new(marker + Vec3::new(0.0, 0.0, 10.0), marker);
        // Top-left corner of the screen, well clear of any marker.
        let picked = pick_marker(&pose, &layout, 3, (0.0, 0.0), (800, 600));
        assert_eq!(picked, None);
    }

    #[test]
    fn nearest_marker_wins_when_several_line_up() {
        let layout = Layout::new(5.0, 1.0);
        // Sight line down the lane: all three markers share y and z.
        let first = layout.marker_position(0);
        let pose = Pose::new(first - Vec3::new(20.0, 0.0, 0.0), first);
        let picked = pick_marker(&pose, &layout, 3, (400.0, 300.0), (800, 600));
        assert_eq!(picked, Some(0));
    }

    #[test]
    fn ray_sphere_misses_are_none() {
        let ray = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::X,
        };
        assert!(ray_sphere(&ray, Vec3::new(5.0, 3.0, 0.0), 1.0).is_none());
        // Sphere behind the origin.
        assert!(ray_sphere(&ray, Vec3::new(-5.0, 0.0, 0.0), 1.0).is_none());
        let hit = ray_sphere(&ray, Vec3::new(5.0, 0.0, 0.0), 1.0);
        assert_eq!(hit, Some(4.0));
    }
}
