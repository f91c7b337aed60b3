/// TreeScout GUI: egui-based desktop frontend.
///
/// This crate contains all UI code. Business logic lives in `treescout-core`.
pub mod app;
pub mod state;
pub mod widgets;

pub use app::TreeScoutApp;
pub use state::AppState;
