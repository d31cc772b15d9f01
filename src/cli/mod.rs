// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface for inspecting recordings and derived labels.

pub mod args;
pub mod inspect;
pub mod logging;
pub mod show;
