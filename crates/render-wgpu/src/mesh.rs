//! Unit meshes for the primitives the scene draws.
//!
//! Every mesh is centred on the origin with unit extents so a draw item's
//! model matrix can scale it to size. Triangles wind counter-clockwise seen
//! from outside.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::TAU;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Generate unit cube vertices and indices.
pub(crate) fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,       // +Z
        4,5,6, 6,7,4,       // -Z
        8,9,10, 10,11,8,    // +X
        12,13,14, 14,15,12, // -X
        16,17,18, 18,19,16, // +Y
        20,21,22, 22,23,20, // -Y
    ];
    (vertices, indices)
}

/// Unit cylinder: radius 1, height 1, axis along Y, capped at both ends.
pub(crate) fn cylinder_mesh(segments: u32) -> (Vec<Vertex>, Vec<u16>) {
    let segments = segments.max(3);
    let h = 0.5_f32;
    let ring = |i: u32| {
        let theta = i as f32 / segments as f32 * TAU;
        (theta.cos(), theta.sin())
    };

    let mut vertices = Vec::new();
    let mut indices: Vec<u16> = Vec::new();

    // Side: a bottom/top pair per ring step, seam duplicated for smooth normals.
    for i in 0..=segments {
        let (c, s) = ring(i);
        vertices.push(Vertex {
            position: [c, -h, s],
            normal: [c, 0.0, s],
        });
        vertices.push(Vertex {
            position: [c, h, s],
            normal: [c, 0.0, s],
        });
    }
    for i in 0..segments as u16 {
        let b0 = i * 2;
        let t0 = b0 + 1;
        let b1 = b0 + 2;
        let t1 = b0 + 3;
        indices.extend_from_slice(&[b0, t0, t1, b0, t1, b1]);
    }

    // Caps: a centre vertex fanned to its own ring.
    for (y, ny) in [(h, 1.0_f32), (-h, -1.0)] {
        let centre = vertices.len() as u16;
        vertices.push(Vertex {
            position: [0.0, y, 0.0],
            normal: [0.0, ny, 0.0],
        });
        for i in 0..=segments {
            let (c, s) = ring(i);
            vertices.push(Vertex {
                position: [c, y, s],
                normal: [0.0, ny, 0.0],
            });
        }
        for i in 0..segments as u16 {
            let p0 = centre + 1 + i;
            let p1 = p0 + 1;
            if ny > 0.0 {
                indices.extend_from_slice(&[centre, p1, p0]);
            } else {
                indices.extend_from_slice(&[centre, p0, p1]);
            }
        }
    }

    (vertices, indices)
}

/// Unit quad in the XZ plane facing +Y.
pub(crate) fn plane_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    let n = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex { position: [-p, 0.0, -p], normal: n },
        Vertex { position: [p, 0.0, -p], normal: n },
        Vertex { position: [p, 0.0, p], normal: n },
        Vertex { position: [-p, 0.0, p], normal: n },
    ];
    (vertices, vec![0, 2, 1, 0, 3, 2])
}

/// Generate grid line vertices hovering just above the ground.
pub(crate) fn grid_mesh(half_extent: i32, spacing: f32, height: f32) -> Vec<GridVertex> {
    let mut verts = Vec::new();
    let color = [0.33, 0.33, 0.33, 1.0];
    let extent = half_extent as f32 * spacing;

    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        // Lines along X
        verts.push(GridVertex {
            position: [-extent, height, offset],
            color,
        });
        verts.push(GridVertex {
            position: [extent, height, offset],
            color,
        });
        // Lines along Z
        verts.push(GridVertex {
            position: [offset, height, -extent],
            color,
        });
        verts.push(GridVertex {
            position: [offset, height, extent],
            color,
        });
    }
    verts
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    /// Every triangle's face normal must agree with its vertex normals.
    fn assert_outward(vertices: &[Vertex], indices: &[u16]) {
        assert_eq!(indices.len() % 3, 0);
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize]);
            let pa = Vec3::from(a.position);
            let face = (Vec3::from(b.position) - pa).cross(Vec3::from(c.position) - pa);
            for v in [a, b, c] {
                assert!(
                    face.dot(Vec3::from(v.normal)) > 0.0,
                    "inward triangle {tri:?}"
                );
            }
        }
    }

    #[test]
    fn cube_winds_outward() {
        let (v, i) = cube_mesh();
        assert_eq!(v.len(), 24);
        assert_eq!(i.len(), 36);
        assert_outward(&v, &i);
    }

    #[test]
    fn cylinder_winds_outward() {
        let (v, i) = cylinder_mesh(16);
        assert_eq!(v.len(), 2 * 17 + 2 * 18);
        assert_eq!(i.len(), 16 * 6 + 2 * 16 * 3);
        assert!(i.iter().all(|&idx| (idx as usize) < v.len()));
        assert_outward(&v, &i);
    }

    #[test]
    fn cylinder_has_unit_extents() {
        let (v, _) = cylinder_mesh(16);
        for vertex in &v {
            let [x, y, z] = vertex.position;
            assert!((x * x + z * z).sqrt() <= 1.0 + 1e-6);
            assert!(y.abs() <= 0.5);
        }
    }

    #[test]
    fn cylinder_clamps_degenerate_segments() {
        let (v, _) = cylinder_mesh(1);
        assert_eq!(v.len(), 2 * 4 + 2 * 5);
    }

    #[test]
    fn plane_faces_up() {
        let (v, i) = plane_mesh();
        assert_outward(&v, &i);
    }

    #[test]
    fn grid_line_count() {
        let verts = grid_mesh(10, 2.0, 0.01);
        assert_eq!(verts.len(), 21 * 4);
        assert!(verts.iter().all(|v| v.position[1] == 0.01));
    }
}
