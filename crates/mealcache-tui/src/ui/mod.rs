//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering, layout, and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `tabs`: Today and week meal views
//! - `widgets`: Shared pieces (skeletons, error panels, empty states)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
pub mod widgets;
