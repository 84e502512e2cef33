use std::f32::consts::TAU;

use eframe::egui::{Color32, Context, Mesh, Pos2, Rect, Shape, Ui, Vec2, vec2};

use super::super::scene::SceneIntent;
use super::{BackendError, BackendKind, GlInfo, SceneRenderer, check_gl, paint_text_layers};

/// Batches the whole scene into a single mesh per frame.
pub struct GpuRenderer {
    gl: GlInfo,
    last_vertex_count: usize,
}

impl GpuRenderer {
    pub fn new(gl: Option<GlInfo>) -> Result<Self, BackendError> {
        Ok(Self {
            gl: check_gl(gl)?,
            last_vertex_count: 0,
        })
    }

    pub fn gl(&self) -> GlInfo {
        self.gl
    }
}

fn disk_segments(radius: f32) -> usize {
    ((radius * 1.2) as usize).clamp(8, 48)
}

/// Filled disk with a half-pixel transparent fringe for anti-aliasing.
fn add_disk(mesh: &mut Mesh, center: Pos2, radius: f32, color: Color32) {
    let segments = disk_segments(radius);
    let base = mesh.vertices.len() as u32;
    let fringe = Color32::from_rgba_premultiplied(0, 0, 0, 0);
    let inner = (radius - 0.5).max(0.0);
    let outer = radius + 0.5;

    mesh.colored_vertex(center, color);
    for step in 0..segments {
        let angle = step as f32 / segments as f32 * TAU;
        let direction = vec2(angle.cos(), angle.sin());
        mesh.colored_vertex(center + direction * inner, color);
        mesh.colored_vertex(center + direction * outer, fringe);
    }

    for step in 0..segments as u32 {
        let next = (step + 1) % segments as u32;
        let (i0, o0) = (base + 1 + step * 2, base + 2 + step * 2);
        let (i1, o1) = (base + 1 + next * 2, base + 2 + next * 2);
        mesh.add_triangle(base, i0, i1);
        mesh.add_triangle(i0, o0, o1);
        mesh.add_triangle(i0, o1, i1);
    }
}

fn add_ring(mesh: &mut Mesh, center: Pos2, radius: f32, width: f32, color: Color32) {
    let segments = disk_segments(radius);
    let base = mesh.vertices.len() as u32;
    for step in 0..segments {
        let angle = step as f32 / segments as f32 * TAU;
        let direction = vec2(angle.cos(), angle.sin());
        mesh.colored_vertex(center + direction * (radius - width * 0.5), color);
        mesh.colored_vertex(center + direction * (radius + width * 0.5), color);
    }
    for step in 0..segments as u32 {
        let next = (step + 1) % segments as u32;
        let (a, b) = (base + step * 2, base + step * 2 + 1);
        let (c, d) = (base + next * 2, base + next * 2 + 1);
        mesh.add_triangle(a, b, d);
        mesh.add_triangle(a, d, c);
    }
}

fn add_segment(mesh: &mut Mesh, from: Pos2, to: Pos2, width: f32, color: Color32) {
    let delta = to - from;
    let length = delta.length();
    if length <= f32::EPSILON {
        return;
    }
    let normal = Vec2::new(-delta.y, delta.x) / length * (width * 0.5);
    let base = mesh.vertices.len() as u32;
    mesh.colored_vertex(from + normal, color);
    mesh.colored_vertex(from - normal, color);
    mesh.colored_vertex(to + normal, color);
    mesh.colored_vertex(to - normal, color);
    mesh.add_triangle(base, base + 1, base + 2);
    mesh.add_triangle(base + 1, base + 3, base + 2);
}

pub(super) fn build_mesh(scene: &SceneIntent, capacity_hint: usize) -> Mesh {
    let mut mesh = Mesh::default();
    mesh.vertices.reserve(capacity_hint);

    for cluster in &scene.clusters {
        add_disk(&mut mesh, cluster.position, cluster.radius, cluster.fill);
    }
    for edge in &scene.edges {
        add_segment(&mut mesh, edge.from, edge.to, edge.width, edge.color);
    }
    for node in &scene.nodes {
        add_disk(&mut mesh, node.position, node.radius, node.fill);
        if let Some(outline) = node.outline {
            add_ring(&mut mesh, node.position, node.radius + 1.5, 1.5, outline);
        }
    }
    mesh
}

impl SceneRenderer for GpuRenderer {
    fn kind(&self) -> BackendKind {
        BackendKind::Gpu
    }

    fn paint(&mut self, ui: &mut Ui, rect: Rect, scene: &SceneIntent) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, scene.background);

        let mesh = build_mesh(scene, self.last_vertex_count);
        self.last_vertex_count = mesh.vertices.len();
        painter.add(Shape::mesh(mesh));

        paint_text_layers(&painter, rect, scene);
    }

    fn release(&mut self, _ctx: &Context) {
        self.last_vertex_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::super::super::scene::{SceneEdge, SceneNode};
    use super::*;

    #[test]
    fn mesh_holds_every_primitive() {
        let mut scene = SceneIntent::empty();
        scene.edges.push(SceneEdge {
            from: pos2(0.0, 0.0),
            to: pos2(10.0, 0.0),
            color: Color32::RED,
            width: 1.0,
        });
        scene.nodes.push(SceneNode {
            index: 0,
            position: pos2(5.0, 5.0),
            radius: 4.0,
            fill: Color32::BLUE,
            outline: None,
            label: None,
        });

        let mesh = build_mesh(&scene, 0);
        let disk = 1 + disk_segments(4.0) * 2;
        assert_eq!(mesh.vertices.len(), 4 + disk);
        assert_eq!(mesh.indices.len(), 6 + disk_segments(4.0) * 9);
    }

    #[test]
    fn degenerate_edges_are_skipped() {
        let mut mesh = Mesh::default();
        add_segment(&mut mesh, pos2(1.0, 1.0), pos2(1.0, 1.0), 2.0, Color32::WHITE);
        assert!(mesh.vertices.is_empty());
    }
}
