//! Resource controllers and their route registration.

pub mod users;

use std::sync::Arc;

use crate::routing::{Handler, RouteError, RouteTable};

pub use users::UserController;

/// Collection path of the users resource
pub const USERS_PATH: &str = "/users";
/// Subtree pattern for individual users
pub const USERS_SUBTREE: &str = "/users/";

/// Register every controller on `routes`.
///
/// A single `UserController` serves both the collection path and the subtree
/// beneath it.
pub fn register_controllers(routes: &mut RouteTable) -> Result<(), RouteError> {
    let users: Arc<dyn Handler> = Arc::new(UserController::new());

    routes.register(USERS_PATH, Arc::clone(&users))?;
    routes.register(USERS_SUBTREE, users)?;

    Ok(())
}
