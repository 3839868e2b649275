use egui::{Align2, Color32, Context, FontId, Painter, Pos2, Rect, Stroke};
use glam::Vec2;

use crate::controller::game::{Game, GameState};
use crate::controller::input::{InputState, MouseButton};
use crate::controller::menu::{BorderStyle, MenuElement, ScreenRect, UiAction, SCREEN_SIZE};
use crate::model::geometry::Rgba8;

fn color32(c: Rgba8) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// Virtual menu coordinates (bottom-left origin) to a point inside `screen`
pub fn virtual_to_screen(point: Vec2, screen: Rect) -> Pos2 {
    let t = point / SCREEN_SIZE;
    Pos2::new(screen.min.x + t.x * screen.width(), screen.max.y - t.y * screen.height())
}

/// Window position (top-left origin) to virtual menu coordinates
pub fn screen_to_virtual(pos: Pos2, screen: Rect) -> Vec2 {
    let x = (pos.x - screen.min.x) / screen.width().max(1.0);
    let y = (screen.max.y - pos.y) / screen.height().max(1.0);
    Vec2::new(x, y) * SCREEN_SIZE
}

fn rect_to_screen(bounds: &ScreenRect, screen: Rect) -> Rect {
    Rect::from_two_pos(virtual_to_screen(bounds.mins, screen), virtual_to_screen(bounds.maxs, screen))
}

/// The enabled button under `point`, if any
pub fn hit_test(elements: &[MenuElement], point: Vec2) -> Option<&UiAction> {
    elements.iter().find_map(|element| match element {
        MenuElement::Button { bounds, action: Some(action), .. } if bounds.contains(point) => Some(action),
        _ => None,
    })
}

fn draw_dashed_rect(painter: &Painter, rect: Rect, stroke: Stroke, dash: f32, gap: f32) {
    let corners = [rect.left_bottom(), rect.right_bottom(), rect.right_top(), rect.left_top()];
    for (i, &start) in corners.iter().enumerate() {
        let end = corners[(i + 1) % corners.len()];
        painter.extend(egui::Shape::dashed_line(&[start, end], stroke, dash, gap));
    }
}

fn draw_menu(painter: &Painter, screen: Rect, elements: &[MenuElement], cursor: Vec2) {
    let scale = screen.height() / SCREEN_SIZE.y;
    for element in elements {
        match element {
            MenuElement::Button { bounds, label, color, hover_color, action, .. } => {
                let rect = rect_to_screen(bounds, screen);
                let hovered = action.is_some() && bounds.contains(cursor);
                painter.rect_filled(rect, 0.0, color32(if hovered { *hover_color } else { *color }));
                painter.text(rect.center(), Align2::CENTER_CENTER, label, FontId::proportional(30.0 * scale), Color32::WHITE);
            }
            MenuElement::Border { bounds, color, thickness, style, .. } => {
                let rect = rect_to_screen(bounds, screen);
                let stroke = Stroke::new(thickness * scale, color32(*color));
                match style {
                    BorderStyle::Solid => {
                        painter.rect_stroke(rect, 0.0, stroke, egui::StrokeKind::Middle);
                    }
                    BorderStyle::Dashed { dash, gap } => draw_dashed_rect(painter, rect, stroke, dash * scale, gap * scale),
                }
            }
            MenuElement::Text { text, alignment, size, color } => {
                let pos = virtual_to_screen(*alignment * SCREEN_SIZE, screen);
                painter.text(pos, Align2::CENTER_CENTER, text, FontId::proportional(size * scale), color32(*color));
            }
        }
    }
}

fn draw_hud(painter: &Painter, screen: Rect, game: &Game) {
    if game.state() != GameState::LevelPlaying {
        return;
    }
    if let Some(level) = game.current_level() {
        painter.text(
            screen.right_top() + egui::vec2(-12.0, 12.0),
            Align2::RIGHT_TOP,
            format!("{} ({}/{})", level.name, game.current_level_index() + 1, game.level_count()),
            FontId::proportional(18.0),
            Color32::WHITE,
        );
    }
    if let Some(text) = game.debug_text() {
        painter.text(
            screen.left_top() + egui::vec2(12.0, 12.0),
            Align2::LEFT_TOP,
            text,
            FontId::monospace(14.0),
            Color32::YELLOW,
        );
    }
    if game.clock().is_paused() {
        painter.text(screen.center(), Align2::CENTER_CENTER, "PAUSED", FontId::proportional(40.0), Color32::WHITE);
    }
}

/// Paints the current menu and HUD and returns the button clicked this
/// frame. `cursor` is in window points.
pub fn build_ui(ctx: &Context, game: &Game, input: &InputState, cursor: Pos2) -> Option<UiAction> {
    let screen = ctx.available_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Foreground, egui::Id::new("menu")));
    let cursor = screen_to_virtual(cursor, screen);

    draw_menu(&painter, screen, game.menu(), cursor);
    draw_hud(&painter, screen, game);

    if input.was_button_just_pressed(MouseButton::Left) {
        hit_test(game.menu(), cursor).cloned()
    } else {
        None
    }
}
