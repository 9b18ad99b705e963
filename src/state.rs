use crate::client::ApiClient;
use crate::dashboard::Dashboard;
use crate::models::FilterState;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub client: ApiClient,
    pub dashboard: Arc<Mutex<Dashboard>>,
}

impl AppState {
    pub fn new(client: ApiClient, filter: FilterState) -> Self {
        Self {
            client,
            dashboard: Arc::new(Mutex::new(Dashboard::new(filter))),
        }
    }
}
