use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

use crate::knowledge::NodeKind;

use super::viewport::ViewTransform;

pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const NEIGHBOR_COLOR: Color32 = Color32::from_rgb(246, 137, 92);
pub(super) const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
pub(super) const HIGHLIGHT_COLOR: Color32 = Color32::from_rgb(236, 92, 196);

pub(super) fn kind_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Paper => Color32::from_rgb(91, 155, 230),
        NodeKind::Hypothesis => Color32::from_rgb(171, 130, 232),
        NodeKind::Method => Color32::from_rgb(78, 196, 190),
        NodeKind::Result => Color32::from_rgb(108, 196, 110),
        NodeKind::Conclusion => Color32::from_rgb(230, 176, 72),
        NodeKind::Entity => Color32::from_rgb(226, 104, 104),
        NodeKind::Unknown => Color32::from_gray(150),
    }
}

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

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * transform.scale.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + transform.translate;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
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

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    (0..4).any(|side| segments_intersect(start, end, corners[side], corners[(side + 1) % 4]))
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

/// Line from `start` to the rim of the target disc, with an arrow head there.
pub(super) fn draw_arrow(painter: &Painter, start: Pos2, end: Pos2, target_radius: f32, stroke: Stroke) {
    let delta = end - start;
    let length = delta.length();
    if length <= target_radius + 1.0 {
        return;
    }

    let direction = delta / length;
    let tip = end - direction * target_radius;
    painter.line_segment([start, tip], stroke);

    let head = (stroke.width * 3.5).clamp(4.0, 10.0);
    let normal = Vec2::new(-direction.y, direction.x);
    let base = tip - direction * head;
    painter.add(eframe::egui::Shape::convex_polygon(
        vec![tip, base + normal * head * 0.5, base - normal * head * 0.5],
        stroke.color,
        Stroke::NONE,
    ));
}
