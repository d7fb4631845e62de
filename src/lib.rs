#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod decode;
pub mod describe;
pub mod extract;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod normalize;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod view;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, DisplayAlignment, DisplayMode, GridBase, load_config};
pub use decode::{DecodeError, ParseOutcome, decode, parse_layout};
pub use ir::{Category, LayoutNode, LayoutTree, NodeId};
pub use layout::{GridLayout, Shape, ShapeKind, compute_layout};
pub use normalize::normalize;
pub use view::{LayoutView, ToggleOutcome};
