//! UI components.

pub mod force_layout;
