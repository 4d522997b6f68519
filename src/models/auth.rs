use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthContext {
    pub user_id: String,
    pub is_admin: bool,
    pub is_staff: bool,
    pub is_active: bool,
}

impl AuthContext {
    pub fn can_manage_ledger(&self) -> bool {
        self.is_active && (self.is_admin || self.is_staff)
    }
}
