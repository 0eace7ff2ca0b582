use std::sync::Arc;

use assistant::{ChatService, CompletionClient};
use db::DBService;
use services::ConfigService;

pub mod error;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub config: ConfigService,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(db: DBService, config: ConfigService, client: Arc<CompletionClient>) -> Self {
        let chat = ChatService::new(db.pool.clone(), client);
        Self { db, config, chat }
    }
}
