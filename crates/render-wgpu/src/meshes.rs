use bytemuck::{Pod, Zeroable};
use edgeview_render::MeshKind;
use glam::{Vec2, Vec3};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle list, counter-clockwise front faces.
#[derive(Debug, Clone, Default)]
pub(crate) struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    pub fn for_kind(kind: MeshKind) -> Self {
        match kind {
            MeshKind::Teapot => teapot(4.0, 32),
            MeshKind::Cone => cone(5.0, 3.0, 32),
            MeshKind::Tetrahedron => tetrahedron(3.0),
        }
    }

    fn append(&mut self, other: MeshData) {
        let base = self.vertices.len() as u16;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }
}

/// Sweep a (radius, height) profile around +Y. Normals come from the
/// profile tangent, so each call produces one smooth strip; hard creases are
/// made by appending separate strips.
fn lathe(profile: &[Vec2], segments: u16) -> MeshData {
    let rings = profile.len();
    let mut mesh = MeshData::default();

    for (i, p) in profile.iter().enumerate() {
        let prev = profile[i.saturating_sub(1)];
        let next = profile[(i + 1).min(rings - 1)];
        let tangent = next - prev;
        let n2 = Vec2::new(tangent.y, -tangent.x).normalize_or_zero();

        for s in 0..=segments {
            let theta = std::f32::consts::TAU * s as f32 / segments as f32;
            let (sin, cos) = theta.sin_cos();
            mesh.vertices.push(Vertex {
                position: [p.x * sin, p.y, p.x * cos],
                normal: [n2.x * sin, n2.y, n2.x * cos],
            });
        }
    }

    let stride = segments + 1;
    for i in 0..(rings as u16 - 1) {
        for s in 0..segments {
            let a = i * stride + s;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            mesh.indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }
    mesh
}

/// A pot body of revolution with a domed lid, `size` tall-ish and centered.
fn teapot(size: f32, segments: u16) -> MeshData {
    let scale = size * 0.5;
    let place = |pts: &[[f32; 2]]| -> Vec<Vec2> {
        pts.iter()
            .map(|[r, y]| Vec2::new(r * scale, (y - 0.6) * scale))
            .collect()
    };

    let mut mesh = MeshData::default();
    mesh.append(lathe(&place(&[[0.0, 0.0], [0.6, 0.0]]), segments));
    mesh.append(lathe(
        &place(&[[0.6, 0.0], [0.85, 0.2], [1.0, 0.5], [0.9, 0.8], [0.7, 0.95]]),
        segments,
    ));
    mesh.append(lathe(
        &place(&[[0.7, 0.95], [0.5, 1.05], [0.15, 1.1], [0.1, 1.25], [0.0, 1.3]]),
        segments,
    ));
    mesh
}

fn cone(diameter: f32, height: f32, segments: u16) -> MeshData {
    let r = diameter * 0.5;
    let h = height * 0.5;
    let mut mesh = lathe(&[Vec2::new(0.0, -h), Vec2::new(r, -h)], segments);
    mesh.append(lathe(&[Vec2::new(r, -h), Vec2::new(0.0, h)], segments));
    mesh
}

/// Regular tetrahedron with flat faces, vertices `size / 2` from the center.
fn tetrahedron(size: f32) -> MeshData {
    let k = size * 0.5 / 3.0_f32.sqrt();
    let corners = [
        Vec3::new(1.0, 1.0, 1.0) * k,
        Vec3::new(-1.0, -1.0, 1.0) * k,
        Vec3::new(-1.0, 1.0, -1.0) * k,
        Vec3::new(1.0, -1.0, -1.0) * k,
    ];
    let faces = [[0, 1, 3], [0, 2, 1], [0, 3, 2], [1, 2, 3]];

    let mut mesh = MeshData::default();
    for face in faces {
        let [a, b, c] = face.map(|i| corners[i]);
        let mut normal = (b - a).cross(c - a).normalize();
        let (b, c) = if normal.dot(a + b + c) < 0.0 {
            normal = -normal;
            (c, b)
        } else {
            (b, c)
        };
        let base = mesh.vertices.len() as u16;
        for p in [a, b, c] {
            mesh.vertices.push(Vertex {
                position: p.to_array(),
                normal: normal.to_array(),
            });
        }
        mesh.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [MeshKind; 3] = [MeshKind::Teapot, MeshKind::Cone, MeshKind::Tetrahedron];

    fn bounds(mesh: &MeshData) -> (Vec3, Vec3) {
        mesh.vertices.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), v| {
                let p = Vec3::from(v.position);
                (lo.min(p), hi.max(p))
            },
        )
    }

    #[test]
    fn indices_are_in_range_and_whole_triangles() {
        for kind in KINDS {
            let mesh = MeshData::for_kind(kind);
            assert_eq!(mesh.indices.len() % 3, 0, "{kind:?}");
            let n = mesh.vertices.len() as u16;
            assert!(mesh.indices.iter().all(|&i| i < n), "{kind:?}");
        }
    }

    #[test]
    fn normals_are_unit() {
        for kind in KINDS {
            for v in MeshData::for_kind(kind).vertices {
                let len = Vec3::from(v.normal).length();
                assert!((len - 1.0).abs() < 1e-4, "{kind:?} normal length {len}");
            }
        }
    }

    #[test]
    fn cone_matches_requested_dimensions() {
        let (lo, hi) = bounds(&MeshData::for_kind(MeshKind::Cone));
        assert!((hi.y - lo.y - 3.0).abs() < 1e-5);
        assert!((hi.x - lo.x - 5.0).abs() < 1e-3);
        assert!((hi.y + lo.y).abs() < 1e-5);
    }

    #[test]
    fn tetrahedron_faces_point_outward() {
        let mesh = MeshData::for_kind(MeshKind::Tetrahedron);
        assert_eq!(mesh.vertices.len(), 12);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] =
                [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let winding = (b - a).cross(c - a);
            assert!(winding.dot(a + b + c) > 0.0);
        }
        let radius = Vec3::from(mesh.vertices[0].position).length();
        assert!((radius - 1.5).abs() < 1e-5);
    }

    #[test]
    fn lathe_winding_agrees_with_normals() {
        let mesh = MeshData::for_kind(MeshKind::Cone);
        for tri in mesh.indices.chunks(3) {
            let vs = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let [a, b, c] = vs.map(|v| Vec3::from(v.position));
            let face = (b - a).cross(c - a);
            if face.length_squared() < 1e-10 {
                continue;
            }
            let n: Vec3 = vs.iter().map(|v| Vec3::from(v.normal)).sum();
            assert!(face.dot(n) > 0.0);
        }
    }
}
