//! rd_block
//!
//! The repertoire distance block: defaults for new instances, the metric
//! list editor, upgrades of stored payloads, and the projections of engine
//! results rendered by the block UI.
// Warning groups (as of rust 1.55)
#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_compatibility,
    rust_2021_compatibility,
    rust_2018_idioms,
    unused
)]

pub mod adapter;
pub mod defaults;
pub mod editor;
pub mod engine;
pub mod errors;
pub mod ids;
pub mod migrate;
pub mod model;
pub mod outputs;
pub mod session;

pub use errors::BlockError;

// initialize insta test harness
#[cfg(test)]
#[ctor::ctor]
fn init() {
    // this ensures insta knows where to find its snap tests
    let cwd = std::env::current_dir().unwrap();
    let workspace_root = cwd.parent().unwrap();
    std::env::set_var("INSTA_WORKSPACE_ROOT", workspace_root);
}
