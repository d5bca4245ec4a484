use crate::session::SessionFactory;
use ec2gate_common::Settings;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub factory: Arc<dyn SessionFactory>,
}

impl AppState {
    pub fn new(settings: Settings, factory: Arc<dyn SessionFactory>) -> Arc<Self> {
        Arc::new(Self {
            settings: Arc::new(settings),
            factory,
        })
    }
}
