mod command;
mod feeders;
mod state;
mod styles;
mod transcript;
mod tui;
mod view;

pub use feeders::spawn_tui_feeders;
pub use state::{Action, SearchStatus, TuiState};
pub use tui::{TuiMsg, run_tui};
