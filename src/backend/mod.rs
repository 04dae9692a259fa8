/// Backend worker: a dedicated thread running a tokio runtime
///
/// - `handlers`: maps each `BackendAction` onto store calls and answers with `GuiEvent`s
/// - `main_loop`: runtime setup and the action polling loop
mod handlers;
mod main_loop;

// Re-export the main backend entry points
pub use main_loop::{run_backend, BackendOptions};
