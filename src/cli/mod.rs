//! CLI commands for statedeck.
//!
//! Each command manages stored checkpoints:
//! - **list**: recent checkpoints
//! - **show**: one checkpoint in detail
//! - **delete**: remove one checkpoint
//! - **clean**: remove old checkpoints and orphaned temp files

pub mod clean;
pub mod delete;
pub mod list;
pub mod show;

pub use clean::CleanCommand;
pub use delete::DeleteCommand;
pub use list::ListCommand;
pub use show::ShowCommand;
