pub mod app;
pub mod permissions;
pub mod routes;
pub mod state;

pub use app::{build_guard, build_router, build_state, AppError};
pub use routes::DrinkId;
pub use state::AppState;
