//! Flowboard: connection and canvas engine for visual node-link editors.
//!
//! A headless core. The host owns windowing, painting and node content; it
//! feeds pointer, wheel and key events into an [`Editor`], calls
//! [`Editor::frame`] once per animation frame, and paints what the
//! [`SceneRenderer`] holds.

pub mod connector_index;
pub mod constants;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod nodes;
pub mod perf;
pub mod render;
pub mod settings;
pub mod settings_watcher;
pub mod store;
pub mod types;

pub use editor::{Editor, FrameReport};
pub use error::{CanvasError, CanvasResult, InvalidConnection, SettingsError, SettingsResult};
pub use geometry::{GeometryResolver, NodeLayout, NodeProvider};
pub use input::CanvasTransform;
pub use nodes::NodeRegistry;
pub use render::SceneRenderer;
pub use settings::EditorSettings;
pub use store::{ConnectionEvent, ConnectionStore};
pub use types::{Branch, Connection, ConnectionId, ConnectionRecord, Connector, NodeId, NodeKind, Side};

/// Install a `tracing` subscriber for hosts that don't set up their own.
///
/// Filtered by `RUST_LOG`, defaulting to `flowboard=info`. Calling it again,
/// or after another subscriber was installed, does nothing.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("flowboard=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
