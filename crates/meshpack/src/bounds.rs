//! Cluster culling bounds.
//!
//! A cluster of triangles gets a bounding sphere for frustum/occlusion culling
//! and a normal cone for backface culling of the whole cluster. The cone is
//! stored as an apex, an axis and a cutoff; a cluster can be skipped when
//! `dot(normalize(apex - camera), axis) >= cutoff`.

use glam::Vec3;

use crate::index::IndexType;

/// Bounding sphere and normal cone of a triangle cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Bounding sphere center.
    pub center: Vec3,
    /// Bounding sphere radius, never negative.
    pub radius: f32,

    /// Point every triangle plane faces away from.
    pub cone_apex: Vec3,
    /// Unit cone axis, or zero when the cone cannot cull.
    pub cone_axis: Vec3,
    /// Sine of the half-angle spread of the normals around the axis.
    /// 1 disables cone culling.
    pub cone_cutoff: f32,

    /// `cone_axis` quantized to 8-bit snorm.
    pub cone_axis_s8: [i8; 3],
    /// Conservative 8-bit cutoff that accounts for the axis quantization
    /// error; test against `cone_axis_s8 / 127` with `cone_cutoff_s8 / 127`.
    pub cone_cutoff_s8: i8,
}

impl Bounds {
    /// Bounds of a cluster with no geometry: empty sphere, cone that never culls.
    fn empty() -> Self {
        Self {
            cone_cutoff: 1.0,
            cone_cutoff_s8: 127,
            ..Self::default()
        }
    }
}

/// Quantize a float in [-1, 1] to a signed normalized integer with `bits` bits.
///
/// Values outside the range are clamped; rounding is half away from zero.
#[must_use]
pub fn quantize_snorm(v: f32, bits: u32) -> i32 {
    debug_assert!((2..=24).contains(&bits));

    let scale = ((1 << (bits - 1)) - 1) as f32;
    let round = if v >= 0.0 { 0.5 } else { -0.5 };

    (v.clamp(-1.0, 1.0) * scale + round) as i32
}

/// Read-only view of positions inside an interleaved float buffer.
struct Positions<'a> {
    data: &'a [f32],
    stride: usize,
}

impl<'a> Positions<'a> {
    /// `None` unless the stride is a whole number of floats covering a position.
    fn new(data: &'a [f32], stride_bytes: usize) -> Option<Self> {
        (stride_bytes % 4 == 0 && stride_bytes >= 12).then_some(Self {
            data,
            stride: stride_bytes / 4,
        })
    }

    fn get(&self, index: u32) -> Option<Vec3> {
        let start = (index as usize).checked_mul(self.stride)?;
        self.data.get(start..start.checked_add(3)?).map(Vec3::from_slice)
    }
}

/// Compute the bounding sphere and normal cone of a triangle cluster.
///
/// `positions` holds `x, y, z` floats at the start of every vertex, with
/// vertices `positions_stride` bytes apart. Zero-area triangles and
/// triangles referencing vertices outside `positions` do not contribute.
/// A stride that is not a multiple of 4, or shorter than a position, yields
/// the bounds of an empty cluster.
pub fn compute_cluster_bounds<T: IndexType>(
    indices: &[T],
    positions: &[f32],
    positions_stride: usize,
) -> Bounds {
    let Some(positions) = Positions::new(positions, positions_stride) else {
        tracing::debug!(positions_stride, "unusable position stride");
        return Bounds::empty();
    };

    let triangle_count = indices.len() / 3;
    let mut normals = Vec::with_capacity(triangle_count);
    let mut corners = Vec::with_capacity(triangle_count * 3);
    let mut out_of_range = 0;

    for triangle in indices.chunks_exact(3) {
        let (Some(p0), Some(p1), Some(p2)) = (
            positions.get(triangle[0].to_u32()),
            positions.get(triangle[1].to_u32()),
            positions.get(triangle[2].to_u32()),
        ) else {
            out_of_range += 1;
            continue;
        };

        let normal = (p1 - p0).cross(p2 - p0);
        let area = normal.length();

        if area == 0.0 {
            continue;
        }

        normals.push(normal / area);
        corners.extend([p0, p1, p2]);
    }

    if out_of_range > 0 {
        tracing::debug!(out_of_range, "skipped triangles referencing missing vertices");
    }

    if normals.is_empty() {
        return Bounds::empty();
    }

    let (center, radius) = bounding_sphere(&corners);

    let (normal_center, _) = bounding_sphere(&normals);
    let axis = normal_center.normalize_or_zero();

    let mindp = normals
        .iter()
        .map(|n| n.dot(axis))
        .fold(1.0f32, f32::min);

    if mindp <= 0.0 {
        // Normals span at least a hemisphere; no cone can reject the cluster.
        return Bounds {
            center,
            radius,
            ..Bounds::empty()
        };
    }

    // Move the apex back along the axis until every triangle plane faces away from it.
    let maxt = normals
        .iter()
        .zip(corners.chunks_exact(3))
        .map(|(n, corner)| (center - corner[0]).dot(*n) / axis.dot(*n))
        .fold(0.0f32, f32::max);

    let cone_cutoff = (1.0 - mindp * mindp).sqrt();

    let cone_axis_s8 = axis.to_array().map(|v| quantize_snorm(v, 8) as i8);

    let axis_error: f32 = cone_axis_s8
        .iter()
        .zip(axis.to_array())
        .map(|(&q, v)| (f32::from(q) / 127.0 - v).abs())
        .sum();

    let cone_cutoff_s8 = ((127.0 * (cone_cutoff + axis_error) + 1.0) as i32).min(127) as i8;

    Bounds {
        center,
        radius,
        cone_apex: center - axis * maxt,
        cone_axis: axis,
        cone_cutoff,
        cone_axis_s8,
        cone_cutoff_s8,
    }
}

/// Compute bounds for a meshlet given as a local vertex list and local
/// triangle indices into it.
///
/// Triangles whose local indices fall outside `meshlet_vertices` are skipped.
pub fn compute_meshlet_bounds(
    meshlet_vertices: &[u32],
    meshlet_triangles: &[u8],
    positions: &[f32],
    positions_stride: usize,
) -> Bounds {
    let mut indices = Vec::with_capacity(meshlet_triangles.len() / 3 * 3);

    let local = |i: u8| meshlet_vertices.get(usize::from(i)).copied();

    for triangle in meshlet_triangles.chunks_exact(3) {
        if let (Some(a), Some(b), Some(c)) = (local(triangle[0]), local(triangle[1]), local(triangle[2])) {
            indices.extend([a, b, c]);
        }
    }

    compute_cluster_bounds(&indices, positions, positions_stride)
}

/// Approximate bounding sphere: seed from the most distant pair of
/// axis-extremal points, then grow to cover every point.
fn bounding_sphere(points: &[Vec3]) -> (Vec3, f32) {
    let mut pmin = [0usize; 3];
    let mut pmax = [0usize; 3];

    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            if p[axis] < points[pmin[axis]][axis] {
                pmin[axis] = i;
            }
            if p[axis] > points[pmax[axis]][axis] {
                pmax[axis] = i;
            }
        }
    }

    let mut paxisd2 = 0.0;
    let mut paxis = 0;

    for axis in 0..3 {
        let d2 = points[pmin[axis]].distance_squared(points[pmax[axis]]);
        if d2 > paxisd2 {
            paxisd2 = d2;
            paxis = axis;
        }
    }

    let mut center = (points[pmin[paxis]] + points[pmax[paxis]]) / 2.0;
    let mut radius = paxisd2.sqrt() / 2.0;

    for &p in points {
        let d2 = p.distance_squared(center);

        if d2 > radius * radius {
            let d = d2.sqrt();
            let k = 0.5 + (radius / d) / 2.0;

            center = center * k + p * (1.0 - k);
            radius = (radius + d) / 2.0;
        }
    }

    (center, radius)
}
