use std::path::PathBuf;
use std::sync::Arc;

use crate::db::Gateway;
use crate::images::ImageStore;
use crate::session::{AdminCredentials, SessionStore};
use crate::settings::Settings;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    pub images: ImageStore,
    pub sessions: SessionStore,
    pub admin: AdminCredentials,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>, settings: &Settings) -> Self {
        Self {
            gateway,
            images: ImageStore::new(settings.image_dir.clone()),
            sessions: SessionStore::new(&settings.secret, settings.cookie_secure),
            admin: AdminCredentials::new(
                settings.admin_username.clone(),
                &settings.admin_password_hash,
            ),
            public_dir: settings.public_dir.clone(),
        }
    }
}
