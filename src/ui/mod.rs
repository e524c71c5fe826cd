//! Client side of the todo screen: a pure view-state machine, an HTTP
//! client for the API, and a driver that ties the two together.

pub mod app;
pub mod client;
pub mod state;

pub use app::TodoApp;
pub use client::{ClientError, HttpTodoApi, TodoApi, TodoPage};
pub use state::{Action, Effect, ViewState};
