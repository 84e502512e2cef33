use eframe::egui::{Color32, Pos2, Rect};

pub const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub const NOVEL_EDGE: Color32 = Color32::from_rgb(240, 140, 60);
pub const PLAIN_EDGE: Color32 = Color32::from_rgb(120, 140, 170);
pub const LABEL: Color32 = Color32::from_rgb(228, 232, 238);

const COMMUNITY_PALETTE: [Color32; 10] = [
    Color32::from_rgb(86, 156, 214),
    Color32::from_rgb(78, 201, 176),
    Color32::from_rgb(156, 220, 254),
    Color32::from_rgb(197, 134, 192),
    Color32::from_rgb(181, 206, 168),
    Color32::from_rgb(106, 153, 85),
    Color32::from_rgb(220, 220, 170),
    Color32::from_rgb(144, 160, 240),
    Color32::from_rgb(96, 180, 140),
    Color32::from_rgb(170, 150, 210),
];

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

fn normalize_log(value: u32, max: u32) -> f32 {
    if max <= 1 {
        return if value > 0 { 1.0 } else { 0.0 };
    }
    ((value as f32).ln_1p() / (max as f32).ln_1p()).clamp(0.0, 1.0)
}

/// Warm ramp for nodes carrying novel interactions, hotter with more of them.
pub(super) fn heat_color(novel_edges: u32, max_novel_edges: u32) -> Color32 {
    let t = normalize_log(novel_edges, max_novel_edges);
    let r = (230.0 + (25.0 * t)) as u8;
    let g = (170.0 - (120.0 * t)) as u8;
    let b = (80.0 - (50.0 * t)) as u8;
    Color32::from_rgb(r, g, b)
}

pub(super) fn community_color(community: i64) -> Color32 {
    if community < 0 {
        return Color32::from_rgb(130, 136, 146);
    }
    COMMUNITY_PALETTE[(community as usize) % COMMUNITY_PALETTE.len()]
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn heat_ramp_gets_hotter() {
        let cold = heat_color(1, 50);
        let hot = heat_color(50, 50);
        assert!(hot.g() < cold.g());
        assert_eq!(heat_color(0, 0), heat_color(0, 1));
    }

    #[test]
    fn edge_crossing_viewport_is_visible() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-50.0, -10.0), pos2(150.0, -10.0), 0.0));
    }

    #[test]
    fn unassigned_community_is_grey() {
        assert_eq!(community_color(-1), Color32::from_rgb(130, 136, 146));
        assert_eq!(community_color(0), community_color(10));
    }
}
