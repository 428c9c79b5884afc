pub mod app;
pub mod completion;
pub mod config;
pub mod handler;
pub mod launcher;
pub mod menu;
pub mod persona;
pub mod session;
pub mod state;
pub mod store;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, Screen};
pub use completion::{CompletionClient, CompletionMessage, CompletionRequest, GroqClient};
pub use config::Config;
pub use launcher::{Launcher, LauncherConfig, LauncherEvent};
pub use menu::Menu;
pub use persona::{ChatRoute, Persona};
pub use session::{ChatSession, FALLBACK_REPLY};
pub use state::{Message, Sender};
pub use store::{KeyValueStore, SqliteStore};
