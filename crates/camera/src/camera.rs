use glam::{Mat3, Mat4, Vec3, Vec4};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CameraError {
    /// The view matrix was read after a mutation but before `update_view_matrix`.
    #[error("view matrix read while dirty; call update_view_matrix first")]
    ViewDirty,
    /// `create_view` was given an eye equal to the target, or an up vector
    /// parallel to the viewing direction.
    #[error("degenerate camera basis (eye={eye}, target={target}, world_up={world_up})")]
    DegenerateBasis {
        eye: Vec3,
        target: Vec3,
        world_up: Vec3,
    },
}

/// Free-flight camera.
///
/// `forward` points from the target back towards the eye, so the camera looks
/// down `-forward` (right-handed convention). `walk` with a positive distance
/// therefore moves towards what the camera is looking at.
///
/// Camera motion lives outside the render backends; they only read `view()`
/// and `proj()`.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    view: Mat4,
    proj: Mat4,
    view_dirty: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            right: Vec3::X,
            up: Vec3::Y,
            view: Mat4::IDENTITY,
            proj: Mat4::IDENTITY,
            view_dirty: false,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn is_view_dirty(&self) -> bool {
        self.view_dirty
    }

    /// Move along the viewing direction. Negative distances move backwards.
    pub fn walk(&mut self, distance: f32) {
        self.position += -self.forward * distance;
        self.view_dirty = true;
    }

    pub fn strafe(&mut self, distance: f32) {
        self.position += self.right * distance;
        self.view_dirty = true;
    }

    pub fn fly(&mut self, distance: f32) {
        self.position += self.up * distance;
        self.view_dirty = true;
    }

    /// Rotate `up` and `forward` around `right`. `right` itself is left as is;
    /// the next rebuild re-derives it from the rotated pair.
    pub fn pitch(&mut self, radians: f32) {
        let rot = Mat3::from_axis_angle(self.right, radians);
        self.up = rot * self.up;
        self.forward = rot * self.forward;
        self.view_dirty = true;
    }

    /// Rotate the whole basis around world +Y.
    pub fn rotate_y(&mut self, radians: f32) {
        let rot = Mat3::from_rotation_y(radians);
        self.up = rot * self.up;
        self.forward = rot * self.forward;
        self.right = rot * self.right;
        self.view_dirty = true;
    }

    /// Re-orthonormalize the basis and rebuild the view matrix if any
    /// mutation happened since the last rebuild.
    pub fn update_view_matrix(&mut self) {
        if !self.view_dirty {
            return;
        }

        self.forward = self.forward.normalize();
        self.up = self.forward.cross(self.right).normalize();
        self.right = self.up.cross(self.forward);

        let (r, u, f) = (self.right, self.up, self.forward);
        let x = -self.position.dot(r);
        let y = -self.position.dot(u);
        let z = -self.position.dot(f);

        self.view = Mat4::from_cols(
            Vec4::new(r.x, u.x, f.x, 0.0),
            Vec4::new(r.y, u.y, f.y, 0.0),
            Vec4::new(r.z, u.z, f.z, 0.0),
            Vec4::new(x, y, z, 1.0),
        );
        self.view_dirty = false;
        tracing::trace!(position = ?self.position, "view matrix rebuilt");
    }

    /// Cached view matrix.
    ///
    /// # Panics
    /// Panics if the camera was mutated since the last `update_view_matrix`.
    pub fn view(&self) -> Mat4 {
        assert!(
            !self.view_dirty,
            "Camera::view called while dirty; call update_view_matrix first"
        );
        self.view
    }

    /// Non-panicking variant of [`Camera::view`].
    pub fn try_view(&self) -> Result<Mat4, CameraError> {
        if self.view_dirty {
            return Err(CameraError::ViewDirty);
        }
        Ok(self.view)
    }

    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    pub fn view_projection(&self) -> Mat4 {
        self.proj * self.view()
    }

    /// Place the camera at `eye` looking at `target`.
    pub fn create_view(
        &mut self,
        eye: Vec3,
        target: Vec3,
        world_up: Vec3,
    ) -> Result<(), CameraError> {
        let degenerate = CameraError::DegenerateBasis {
            eye,
            target,
            world_up,
        };
        let forward = (eye - target).try_normalize().ok_or(degenerate)?;
        let right = world_up.cross(forward).try_normalize().ok_or(degenerate)?;

        self.forward = forward;
        self.right = right;
        self.up = forward.cross(right);
        self.position = eye;
        self.view_dirty = true;
        tracing::debug!(%eye, %target, "camera view created");
        Ok(())
    }

    /// Right-handed perspective projection with a [0, 1] depth range.
    pub fn create_proj(&mut self, fov_y: f32, aspect_ratio: f32, z_near: f32, z_far: f32) {
        self.proj = Mat4::perspective_rh(fov_y, aspect_ratio, z_near, z_far);
        tracing::debug!(
            fov_y,
            aspect_ratio,
            z_near,
            z_far,
            "camera projection created"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    const EPS: f32 = 1e-5;

    fn looking_at_origin() -> Camera {
        let mut cam = Camera::new();
        cam.create_view(Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO, Vec3::Y)
            .unwrap();
        cam
    }

    fn assert_orthonormal(cam: &Camera) {
        for v in [cam.forward(), cam.right(), cam.up()] {
            assert!((v.length() - 1.0).abs() < EPS, "not unit: {v}");
        }
        assert!(cam.forward().dot(cam.right()).abs() < EPS);
        assert!(cam.forward().dot(cam.up()).abs() < EPS);
        assert!(cam.right().dot(cam.up()).abs() < EPS);
        // Right-handed: right x up == forward
        assert!(cam.right().cross(cam.up()).abs_diff_eq(cam.forward(), EPS));
    }

    #[test]
    fn translations_sum_and_keep_orientation() {
        let mut cam = looking_at_origin();
        let (f, r, u) = (cam.forward(), cam.right(), cam.up());
        let start = cam.position();

        cam.walk(2.0);
        cam.strafe(-1.5);
        cam.fly(0.5);
        cam.walk(-0.25);

        let expected = start + -f * 2.0 + r * -1.5 + u * 0.5 + -f * -0.25;
        assert!(cam.position().abs_diff_eq(expected, EPS));
        assert_eq!(cam.forward(), f);
        assert_eq!(cam.right(), r);
        assert_eq!(cam.up(), u);
    }

    #[test]
    fn walk_moves_towards_target() {
        let mut cam = looking_at_origin();
        let before = cam.position().length();
        cam.walk(1.0);
        assert!(cam.position().length() < before);
    }

    #[test]
    fn rotations_mark_dirty_and_rebuild_clears() {
        let mut cam = looking_at_origin();
        cam.update_view_matrix();
        assert!(!cam.is_view_dirty());

        cam.pitch(0.1);
        assert!(cam.is_view_dirty());
        cam.update_view_matrix();
        assert!(!cam.is_view_dirty());

        cam.rotate_y(-0.3);
        assert!(cam.is_view_dirty());
        cam.update_view_matrix();
        assert!(!cam.is_view_dirty());
    }

    #[test]
    fn pitch_leaves_right_untouched() {
        let mut cam = looking_at_origin();
        let right = cam.right();
        cam.pitch(0.4);
        assert_eq!(cam.right(), right);
    }

    #[test]
    fn rebuild_restores_orthonormal_basis() {
        let mut cam = looking_at_origin();
        for i in 0..200 {
            cam.pitch(0.013 * (i % 7) as f32 - 0.04);
            cam.rotate_y(0.021 * (i % 5) as f32 - 0.03);
            cam.walk(0.1);
        }
        cam.update_view_matrix();
        assert_orthonormal(&cam);
    }

    #[test]
    #[should_panic(expected = "dirty")]
    fn reading_dirty_view_panics() {
        let cam = looking_at_origin();
        let _ = cam.view();
    }

    #[test]
    fn try_view_reports_dirty() {
        let mut cam = looking_at_origin();
        assert_eq!(cam.try_view(), Err(CameraError::ViewDirty));
        cam.update_view_matrix();
        assert!(cam.try_view().is_ok());
    }

    #[test]
    fn projection_matches_perspective_formula() {
        let mut cam = Camera::new();
        let (fov, aspect, near, far) = (FRAC_PI_4, 16.0 / 9.0, 0.01, 1000.0);
        cam.create_proj(fov, aspect, near, far);
        let p = cam.proj();

        let h = 1.0 / (fov * 0.5).tan();
        let w = h / aspect;
        let range = far / (near - far);

        assert!((p.x_axis.x - w).abs() < EPS);
        assert!((p.y_axis.y - h).abs() < EPS);
        // Row-vector (3,3) and (3,4) entries: depth scale and the -1 that feeds w.
        assert!((p.z_axis.z - range).abs() < EPS);
        assert_eq!(p.z_axis.w, -1.0);
        // Row-vector (4,3) entry: depth offset.
        assert!((p.w_axis.z - range * near).abs() < EPS);
        assert_eq!(p.w_axis.w, 0.0);
    }

    #[test]
    fn projection_ignores_dirty_flag() {
        let mut cam = looking_at_origin();
        cam.create_proj(FRAC_PI_4, 1.0, 0.1, 10.0);
        assert!(cam.is_view_dirty());
        assert_ne!(cam.proj(), Mat4::IDENTITY);
    }

    #[test]
    fn view_projection_puts_target_inside_clip_volume() {
        let mut cam = looking_at_origin();
        cam.create_proj(FRAC_PI_4, 1.0, 0.1, 100.0);
        cam.update_view_matrix();
        assert_eq!(cam.view_projection(), cam.proj() * cam.view());

        let clip = cam.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < EPS && ndc.y.abs() < EPS);
        assert!(ndc.z > 0.0 && ndc.z < 1.0, "depth {}", ndc.z);
    }

    #[test]
    fn update_is_idempotent() {
        let mut cam = looking_at_origin();
        cam.rotate_y(0.7);
        cam.update_view_matrix();
        let first = cam.view();
        cam.update_view_matrix();
        let second = cam.view();
        assert_eq!(first.to_cols_array(), second.to_cols_array());
    }

    #[test]
    fn view_maps_eye_to_origin_and_target_in_front() {
        let eye = Vec3::new(3.0, 4.0, -5.0);
        let target = Vec3::new(-1.0, 0.5, 2.0);
        let mut cam = Camera::new();
        cam.create_view(eye, target, Vec3::Y).unwrap();
        cam.update_view_matrix();
        let view = cam.view();

        assert!(view.transform_point3(eye).abs_diff_eq(Vec3::ZERO, EPS));
        let t = view.transform_point3(target);
        // Right-handed view space looks down -Z.
        assert!(t.z < 0.0);
        assert!((-t.z - (eye - target).length()).abs() < 1e-4);
        assert!(t.x.abs() < 1e-4 && t.y.abs() < 1e-4);
    }

    #[test]
    fn view_agrees_with_look_at() {
        let mut cam = looking_at_origin();
        cam.update_view_matrix();
        let expected = Mat4::look_at_rh(Vec3::new(0.0, 10.0, 10.0), Vec3::ZERO, Vec3::Y);
        assert!(cam.view().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn degenerate_view_is_rejected() {
        let mut cam = Camera::new();
        let err = cam.create_view(Vec3::ONE, Vec3::ONE, Vec3::Y).unwrap_err();
        assert!(matches!(err, CameraError::DegenerateBasis { .. }));
        assert!(
            cam.create_view(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Y)
                .is_err()
        );
        assert!(!cam.is_view_dirty());
    }
}
