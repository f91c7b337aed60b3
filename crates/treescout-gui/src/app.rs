/// Main `eframe::App` implementation for TreeScout.
///
/// This is the top-level UI layout that composes the toolbar, status bar and
/// tree view.
use crate::state::{AppState, REPAINT_INTERVAL};
use crate::widgets;

/// The TreeScout application.
pub struct TreeScoutApp {
    state: AppState,
}

impl TreeScoutApp {
    /// Create the application from state built before the window opened, so
    /// enumeration is already running when the first frame is drawn.
    pub fn with_state(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self { state }
    }
}

impl eframe::App for TreeScoutApp {
    /// Match the GPU clear colour to the panel fill to avoid a flash
    /// between frames.
    fn clear_color(&self, visuals: &egui::Visuals) -> [f32; 4] {
        let [r, g, b, a] = visuals.panel_fill.to_array();
        [
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        ]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Apply theme ───────────────────────────────────────────────────
        if self.state.dark_mode {
            ctx.set_visuals(egui::Visuals::dark());
        } else {
            ctx.set_visuals(egui::Visuals::light());
        }

        // ── Apply enumeration results ─────────────────────────────────────
        self.state.process_messages();
        if self.state.is_busy() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }

        // ── Top toolbar ───────────────────────────────────────────────────
        egui::TopBottomPanel::top("toolbar")
            .min_height(36.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                widgets::toolbar::toolbar(ui, &mut self.state);
                ui.add_space(4.0);
            });

        // ── Bottom status bar ─────────────────────────────────────────────
        egui::TopBottomPanel::bottom("status_bar")
            .min_height(24.0)
            .show(ctx, |ui| {
                ui.add_space(2.0);
                widgets::status_bar::status_bar(ui, &self.state);
                ui.add_space(2.0);
            });

        // ── Central panel (tree) ──────────────────────────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            widgets::tree_view::tree_view(ui, &mut self.state);
        });
    }
}
