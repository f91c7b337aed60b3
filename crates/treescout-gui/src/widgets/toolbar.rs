/// Top action bar: search box, sort toggle, export and theme controls.
use crate::state::AppState;
use egui::Ui;
use treescout_core::tree::{CaseSensitivity, SortOrder};

/// Draw the toolbar.
pub fn toolbar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new("🌲 TreeScout")
                .size(18.0)
                .strong()
                .color(ui.visuals().hyperlink_color),
        );

        ui.separator();

        // Search box. The filter follows every keystroke.
        ui.label("🔍");
        let search = ui.add(
            egui::TextEdit::singleline(&mut state.search_text)
                .hint_text("Filter by path…")
                .desired_width(260.0),
        );
        if search.changed() {
            state.apply_search();
        }

        let ignore_case = state.case_sensitivity() == CaseSensitivity::Insensitive;
        if ui
            .selectable_label(ignore_case, "Aa")
            .on_hover_text(if ignore_case {
                "Matching ignores case"
            } else {
                "Matching is case-sensitive"
            })
            .clicked()
        {
            state.set_case_sensitivity(if ignore_case {
                CaseSensitivity::Sensitive
            } else {
                CaseSensitivity::Insensitive
            });
        }

        ui.separator();

        let (sort_label, sort_tip) = match state.sort_order() {
            SortOrder::Ascending => ("⬆ A→Z", "Sorted ascending; click to reverse"),
            SortOrder::Descending => ("⬇ Z→A", "Sorted descending; click to reverse"),
        };
        if ui
            .add(egui::Button::new(sort_label).min_size(egui::vec2(70.0, 28.0)))
            .on_hover_text(sort_tip)
            .clicked()
        {
            state.toggle_sort();
        }

        ui.separator();

        let can_export = state.row_count() > 0;
        for (label, extension) in [("📤 CSV", "csv"), ("📤 JSON", "json")] {
            let path = AppState::default_export_path(extension);
            if ui
                .add_enabled(can_export, egui::Button::new(label))
                .on_hover_text(format!("Export the visible rows to {}", path.display()))
                .clicked()
            {
                state.export(&path);
            }
        }

        // Right-aligned controls.
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let theme_label = if state.dark_mode { "☀" } else { "🌙" };
            let theme_tip = if state.dark_mode {
                "Switch to light mode"
            } else {
                "Switch to dark mode"
            };
            if ui.button(theme_label).on_hover_text(theme_tip).clicked() {
                state.dark_mode = !state.dark_mode;
            }

            ui.separator();

            if ui
                .button("🔄")
                .on_hover_text("Enumerate the folder again")
                .clicked()
            {
                let root = state.root.clone();
                state.open(root);
            }

            ui.label(
                egui::RichText::new(state.root.display().to_string())
                    .size(12.0)
                    .color(ui.visuals().weak_text_color()),
            );
        });
    });
}
