use std::sync::Arc;

use chorus_db::Database;

pub type AppState = Arc<AppStateInner>;

/// Shared request state. The database handle is injected here by the server
/// entry point; handlers never reach for globals.
pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: String) -> AppState {
        Arc::new(Self { db, jwt_secret })
    }
}
