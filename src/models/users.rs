use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub balance: Decimal,
    pub bonus_balance: Decimal,
    pub currency: String,
    pub platform_user_id: Option<String>,
    pub platform_account_id: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Platform refs come as a pair or not at all; a user with only one of
    /// the two is treated as having no external account.
    pub fn platform_account(&self) -> Option<(&str, &str)> {
        match (&self.platform_user_id, &self.platform_account_id) {
            (Some(user), Some(account)) => Some((user.as_str(), account.as_str())),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UserBalances {
    pub user_id: String,
    pub balance: Decimal,
    pub bonus_balance: Decimal,
    pub currency: String,
}

impl From<&User> for UserBalances {
    fn from(user: &User) -> Self {
        UserBalances {
            user_id: user.id.clone(),
            balance: user.balance,
            bonus_balance: user.bonus_balance,
            currency: user.currency.clone(),
        }
    }
}
