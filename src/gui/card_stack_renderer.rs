use egui::emath::Rot2;
use crate::core::{MediaKind, MediaList};
use crate::playback::SurfaceSnapshot;
use crate::stack::{draw_order, CardPosition, CardRole};
use crate::video::SimulatedPlayerHandle;

const STACK_HEIGHT: f32 = 280.0;
const CARD_SIZE: egui::Vec2 = egui::Vec2::new(180.0, 230.0);

/// What the user did to one stack this frame.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StackInteraction {
    pub clicked: Option<usize>,
    pub hovered: bool,
    /// Fraction of the stack inside the scroll viewport.
    pub visible_ratio: f32,
}

pub struct CardStackRenderer;

impl CardStackRenderer {
    pub fn show(
        ui: &mut egui::Ui,
        media: &MediaList,
        positions: &[CardPosition],
        snapshot: &SurfaceSnapshot,
        players: &[Option<SimulatedPlayerHandle>],
        is_focused: bool,
    ) -> StackInteraction {
        let (rect, response) = ui.allocate_exact_size(
            egui::Vec2::new(ui.available_width(), STACK_HEIGHT),
            egui::Sense::click(),
        );

        let visible = rect.intersect(ui.clip_rect());
        let visible_ratio = if visible.is_positive() && rect.area() > 0.0 {
            visible.area() / rect.area()
        } else {
            0.0
        };

        let mut interaction = StackInteraction {
            clicked: None,
            hovered: response.hovered(),
            visible_ratio,
        };

        if !ui.is_rect_visible(rect) {
            return interaction;
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 6.0, ui.visuals().extreme_bg_color);
        if is_focused {
            painter.rect_stroke(rect, 6.0, ui.visuals().selection.stroke);
        }

        let order = draw_order(positions);
        let mut hit_shapes: Vec<(usize, [egui::Pos2; 4])> = Vec::with_capacity(order.len());

        for index in order {
            let Some(position) = positions.get(index) else {
                continue;
            };
            let Some(item) = media.get(index) else {
                continue;
            };
            let corners = Self::card_corners(rect.center(), position);
            let failed = snapshot.failed.contains(&index);

            let base = match (item.kind(), failed) {
                (_, true) => egui::Color32::from_rgb(90, 40, 40),
                (MediaKind::Video, false) => egui::Color32::from_rgb(40, 70, 110),
                (MediaKind::Image, false) => egui::Color32::from_rgb(60, 90, 60),
            };
            let fill = base.gamma_multiply(position.opacity);
            let stroke_color = if position.role == CardRole::Active {
                egui::Color32::WHITE
            } else {
                ui.visuals().weak_text_color()
            };

            painter.add(egui::Shape::convex_polygon(
                corners.to_vec(),
                fill,
                egui::Stroke::new(1.0, stroke_color),
            ));

            let center = rect.center() + egui::Vec2::new(position.horizontal_offset, 0.0);
            let name = item.url().rsplit('/').next().unwrap_or(item.url());
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                name,
                egui::FontId::proportional(13.0 * position.scale),
                egui::Color32::WHITE.gamma_multiply(position.opacity),
            );

            if position.role == CardRole::Active {
                Self::draw_active_overlay(&painter, center, position, snapshot, players.get(index).and_then(|p| p.as_ref()), failed);
            }

            hit_shapes.push((index, corners));
        }

        if response.clicked() {
            if let Some(pointer) = response.interact_pointer_pos() {
                // Topmost card wins
                interaction.clicked = hit_shapes
                    .iter()
                    .rev()
                    .find(|(_, corners)| Self::contains(corners, pointer))
                    .map(|(index, _)| *index);
            }
        }

        interaction
    }

    fn card_corners(stack_center: egui::Pos2, position: &CardPosition) -> [egui::Pos2; 4] {
        let center = stack_center + egui::Vec2::new(position.horizontal_offset, 0.0);
        let half = CARD_SIZE * position.scale * 0.5;
        let rotation = Rot2::from_angle(position.rotation_degrees.to_radians());
        [
            egui::Vec2::new(-half.x, -half.y),
            egui::Vec2::new(half.x, -half.y),
            egui::Vec2::new(half.x, half.y),
            egui::Vec2::new(-half.x, half.y),
        ]
        .map(|corner| center + rotation * corner)
    }

    /// Point-in-convex-quad test; corners are in clockwise screen order.
    fn contains(corners: &[egui::Pos2; 4], point: egui::Pos2) -> bool {
        (0..4).all(|i| {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            (b - a).x * (point - a).y - (b - a).y * (point - a).x >= 0.0
        })
    }

    fn draw_active_overlay(
        painter: &egui::Painter,
        center: egui::Pos2,
        position: &CardPosition,
        snapshot: &SurfaceSnapshot,
        player: Option<&SimulatedPlayerHandle>,
        failed: bool,
    ) {
        let half = CARD_SIZE * position.scale * 0.5;

        let badge = if failed {
            "⚠ unavailable"
        } else if player.is_none() {
            "🖼"
        } else if snapshot.is_muted {
            "🔇"
        } else {
            "🔊"
        };
        painter.text(
            center + egui::Vec2::new(0.0, -half.y + 16.0),
            egui::Align2::CENTER_CENTER,
            badge,
            egui::FontId::proportional(16.0),
            egui::Color32::WHITE,
        );

        painter.text(
            center + egui::Vec2::new(0.0, half.y - 32.0),
            egui::Align2::CENTER_CENTER,
            snapshot.phase.label(),
            egui::FontId::proportional(11.0),
            egui::Color32::LIGHT_GRAY,
        );

        if let Some(player) = player {
            let bar_y = center.y + half.y - 12.0;
            let left = center.x - half.x + 10.0;
            let right = center.x + half.x - 10.0;
            painter.line_segment(
                [egui::Pos2::new(left, bar_y), egui::Pos2::new(right, bar_y)],
                egui::Stroke::new(3.0, egui::Color32::from_gray(70)),
            );
            let filled = left + (right - left) * player.progress();
            let color = if player.is_pending() {
                egui::Color32::YELLOW
            } else {
                egui::Color32::from_rgb(230, 80, 60)
            };
            painter.line_segment(
                [egui::Pos2::new(left, bar_y), egui::Pos2::new(filled, bar_y)],
                egui::Stroke::new(3.0, color),
            );
        }
    }
}
