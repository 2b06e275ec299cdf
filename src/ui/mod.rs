pub mod app;
pub mod input;
pub mod render;

pub use app::ChatApp;
pub use render::TerminalNotifier;
