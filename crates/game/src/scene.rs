use edgeview_common::Rgba;
use edgeview_render::MeshKind;
use glam::{Mat4, Vec3};

/// A mesh instance with its own world transform and tint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneObject {
    pub mesh: MeshKind,
    pub world: Mat4,
    pub tint: Rgba,
}

/// The fixed set of objects drawn every frame.
#[derive(Debug, Clone)]
pub struct Scene {
    objects: Vec<SceneObject>,
}

impl Scene {
    /// Teapot, cone and tetrahedron around the origin.
    pub fn demo() -> Self {
        Self {
            objects: vec![
                SceneObject {
                    mesh: MeshKind::Teapot,
                    world: Mat4::from_translation(Vec3::new(-2.0, 1.0, -1.0)),
                    tint: Rgba::ALICE_BLUE,
                },
                SceneObject {
                    mesh: MeshKind::Cone,
                    world: Mat4::from_translation(Vec3::new(2.0, -1.0, 1.0)),
                    tint: Rgba::CRIMSON,
                },
                SceneObject {
                    mesh: MeshKind::Tetrahedron,
                    world: Mat4::IDENTITY,
                    tint: Rgba::CADET_BLUE,
                },
            ],
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::demo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_scene_has_three_distinct_meshes() {
        let scene = Scene::demo();
        let meshes: Vec<_> = scene.objects().iter().map(|o| o.mesh).collect();
        assert_eq!(
            meshes,
            vec![MeshKind::Teapot, MeshKind::Cone, MeshKind::Tetrahedron]
        );
        assert_eq!(
            scene.objects()[1].world.w_axis.truncate(),
            Vec3::new(2.0, -1.0, 1.0)
        );
    }
}
