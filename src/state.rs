use std::sync::Arc;

use crate::users::repo::UserRepo;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepo>,
}

impl AppState {
    pub fn from_parts(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }
}
