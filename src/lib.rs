#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod export;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config, parse_config};
pub use export::{ExportArtifact, ExportError, ExportFormat};
pub use ir::{Automaton, AutomatonError, State, StateShape};
pub use layout::{Layout, compute_layout};
pub use render::{Surface, render_frame};
pub use theme::Theme;
pub use view::{DiagramView, Gesture, ViewTransform};
