/// Virtualised tree view widget: the central panel of the UI.
///
/// Only the rows inside the viewport are fetched from the browser and
/// painted, so drawing cost does not depend on how many rows exist.
use crate::state::AppState;
use egui::{Color32, Rect, Response, Sense, Ui, Vec2};
use treescout_core::RowView;

/// Height of each row in pixels.
const ROW_HEIGHT: f32 = 24.0;

/// Indentation per depth level in pixels.
const INDENT_PX: f32 = 20.0;

/// Glyph and colour for a freedesktop-style icon name.
fn glyph(icon: &str) -> (&'static str, Color32) {
    match icon {
        "folder" => ("📁", Color32::from_rgb(0xf9, 0xe2, 0xaf)),
        "emblem-symbolic-link" => ("🔗", Color32::from_rgb(0x94, 0xe2, 0xd5)),
        "image-x-generic" => ("🖼", Color32::from_rgb(0xcb, 0xa6, 0xf7)),
        "video-x-generic" => ("🎞", Color32::from_rgb(0xf3, 0x8b, 0xa8)),
        "audio-x-generic" => ("🎵", Color32::from_rgb(0xf5, 0xc2, 0xe7)),
        "package-x-generic" => ("📦", Color32::from_rgb(0xfa, 0xb3, 0x87)),
        "text-x-script" => ("📝", Color32::from_rgb(0xa6, 0xe3, 0xa1)),
        "x-office-document" => ("📑", Color32::from_rgb(0x89, 0xdc, 0xeb)),
        "application-x-executable" => ("⚙", Color32::from_rgb(0xf3, 0x8b, 0xa8)),
        _ => ("📄", Color32::from_rgb(0x89, 0xb4, 0xfa)),
    }
}

/// Draw the virtualised tree view.
pub fn tree_view(ui: &mut Ui, state: &mut AppState) -> Response {
    if state.row_count() == 0 {
        let message = if state.open_error.is_some() {
            "Nothing to show."
        } else if state.is_busy() {
            "Listing… waiting for the first entries"
        } else if state.search_text.is_empty() {
            "This folder is empty."
        } else {
            "No entries match the filter."
        };
        ui.centered_and_justified(|ui| {
            ui.label(egui::RichText::new(message).color(ui.visuals().weak_text_color()));
        });
        return ui.interact(ui.max_rect(), ui.id().with("empty_tree"), Sense::click());
    }

    let (toggle_row, new_selection) = render_tree_rows(ui, state);

    // Deferred so the rows borrowed above are gone before state changes.
    if let Some(row) = new_selection {
        state.select_row(row);
    }
    if let Some(row) = toggle_row {
        state.toggle_row(row);
    }

    ui.interact(ui.max_rect(), ui.id().with("tree_bg"), Sense::hover())
}

/// Render the visible rows. Returns (toggle_row, new_selection) indices for
/// deferred state mutation.
fn render_tree_rows(ui: &mut Ui, state: &AppState) -> (Option<usize>, Option<usize>) {
    let is_dark = ui.visuals().dark_mode;
    let color_weak = ui.visuals().weak_text_color();
    let color_normal = ui.visuals().text_color();
    let color_selection = ui.visuals().selection.bg_fill;
    let color_hover = if is_dark {
        Color32::from_rgb(0x35, 0x35, 0x4a)
    } else {
        Color32::from_rgba_unmultiplied(
            color_selection.r(),
            color_selection.g(),
            color_selection.b(),
            40,
        )
    };

    let total_rows = state.row_count();
    let total_height = total_rows as f32 * ROW_HEIGHT;

    let mut toggle_row: Option<usize> = None;
    let mut new_selection: Option<usize> = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            // Reserve the full virtual height so the scrollbar is correct.
            let (response, painter) = ui.allocate_painter(
                Vec2::new(ui.available_width(), total_height),
                Sense::click(),
            );

            let viewport = ui.clip_rect();
            let top_y = response.rect.top();

            let first_visible = ((viewport.top() - top_y) / ROW_HEIGHT).floor().max(0.0) as usize;
            let last_visible = ((viewport.bottom() - top_y) / ROW_HEIGHT)
                .ceil()
                .min(total_rows as f32) as usize;

            let rows = state.rows(first_visible, last_visible);
            for (offset, row) in rows.iter().enumerate() {
                let row_idx = first_visible + offset;
                let row_rect = Rect::from_min_size(
                    egui::pos2(response.rect.left(), top_y + row_idx as f32 * ROW_HEIGHT),
                    Vec2::new(response.rect.width(), ROW_HEIGHT),
                );
                if !viewport.intersects(row_rect) {
                    continue;
                }

                let is_selected = state.selected == Some(row.node);
                if is_selected {
                    painter.rect_filled(row_rect, 0.0, color_selection);
                }

                let row_response = ui.interact(
                    row_rect,
                    ui.id().with(("tree_row", row_idx)),
                    Sense::click(),
                );
                if row_response.hovered() && !is_selected {
                    painter.rect_filled(row_rect, 0.0, color_hover);
                }
                if row_response.clicked() {
                    new_selection = Some(row_idx);
                }
                if row_response.double_clicked() && row.expandable {
                    toggle_row = Some(row_idx);
                }

                row_response.clone().on_hover_text(row.path().display().to_string());
                row_response.context_menu(|ui| context_menu(ui, row));

                let indent = INDENT_PX * row.depth as f32 + 16.0;
                let text_x = row_rect.left() + indent + 4.0;
                let text_y = row_rect.center().y;

                // Expander.
                if row.expandable {
                    let arrow_text = if row.expanded { "▼" } else { "▶" };
                    let arrow_rect = Rect::from_min_size(
                        egui::pos2(row_rect.left() + indent - 14.0, row_rect.top()),
                        Vec2::new(16.0, ROW_HEIGHT),
                    );
                    let arrow_response =
                        ui.interact(arrow_rect, ui.id().with(("arrow", row_idx)), Sense::click());
                    if arrow_response.clicked() {
                        toggle_row = Some(row_idx);
                    }
                    painter.text(
                        egui::pos2(row_rect.left() + indent - 12.0, text_y),
                        egui::Align2::LEFT_CENTER,
                        arrow_text,
                        egui::FontId::proportional(11.0),
                        color_weak,
                    );
                }

                let (icon, icon_color) = glyph(row.icon());
                painter.text(
                    egui::pos2(text_x, text_y),
                    egui::Align2::LEFT_CENTER,
                    icon,
                    egui::FontId::proportional(13.0),
                    icon_color,
                );

                let name_x = text_x + 20.0;
                let max_name_w = (row_rect.right() - name_x - 8.0).max(20.0);
                let name_font = egui::FontId::proportional(13.0);
                let name_galley = painter.layout_no_wrap(
                    row.display_name().to_string(),
                    name_font,
                    color_normal,
                );

                if name_galley.size().x <= max_name_w {
                    painter.galley(
                        egui::pos2(name_x, text_y - name_galley.size().y / 2.0),
                        name_galley,
                        color_normal,
                    );
                } else {
                    // Clip the name and add an ellipsis.
                    let clip = Rect::from_min_size(
                        egui::pos2(name_x, row_rect.top()),
                        Vec2::new(max_name_w - 12.0, ROW_HEIGHT),
                    );
                    let clipped = painter.with_clip_rect(painter.clip_rect().intersect(clip));
                    clipped.galley(
                        egui::pos2(name_x, text_y - name_galley.size().y / 2.0),
                        name_galley,
                        color_normal,
                    );
                    painter.text(
                        egui::pos2(name_x + max_name_w - 12.0, text_y),
                        egui::Align2::LEFT_CENTER,
                        "…",
                        egui::FontId::proportional(13.0),
                        color_weak,
                    );
                }
            }

            response
        });

    (toggle_row, new_selection)
}

/// Right-click context menu for a row.
fn context_menu(ui: &mut Ui, row: &RowView) {
    let full_path = row.path().display().to_string();
    if ui.button("📋 Copy Path").clicked() {
        ui.ctx().copy_text(full_path);
        ui.close_menu();
    }
    if ui.button("📋 Copy Name").clicked() {
        ui.ctx().copy_text(row.name().to_string());
        ui.close_menu();
    }

    ui.separator();
    ui.label(format!("Kind: {}", row.entry.kind().label()));
    if row.display_name() != row.name() {
        ui.label(format!("Name on disk: {}", row.name()));
    }
}
