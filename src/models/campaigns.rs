use std::collections::HashSet;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BonusType {
    FirstDepositOnly,
    EveryDeposit,
}

impl BonusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BonusType::FirstDepositOnly => "first_deposit_only",
            BonusType::EveryDeposit => "every_deposit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "first_deposit_only" => Some(BonusType::FirstDepositOnly),
            "every_deposit" => Some(BonusType::EveryDeposit),
            _ => None,
        }
    }
}

/// Campaign targeting, resolved from the row's `target_user_type` +
/// `target_user_ids` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetAudience {
    All,
    Specific(HashSet<String>),
}

impl TargetAudience {
    pub fn includes(&self, user_id: &str) -> bool {
        match self {
            TargetAudience::All => true,
            TargetAudience::Specific(ids) => ids.contains(user_id),
        }
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: i64,
    pub campaign_id: String,
    pub percentage_bonus: Decimal,
    pub bonus_type: String,
    pub target_user_type: String,
    pub target_user_ids: Vec<String>,
    pub user_recurrence: i32,
    pub is_active: bool,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Campaign {
    pub fn bonus_type(&self) -> Option<BonusType> {
        BonusType::parse(&self.bonus_type)
    }

    pub fn audience(&self) -> TargetAudience {
        if self.target_user_type == "specific_users" {
            TargetAudience::Specific(self.target_user_ids.iter().cloned().collect())
        } else {
            TargetAudience::All
        }
    }

    /// Active window is inclusive on both ends.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.is_active && self.start_datetime <= now && now <= self.end_datetime
    }

    /// Bonus is a straight percentage of the deposit, computed in Decimal so
    /// repeated runs never accumulate float drift.
    pub fn bonus_amount(&self, deposit_amount: Decimal) -> Decimal {
        deposit_amount * self.percentage_bonus / Decimal::from(100)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewCampaign {
    pub campaign_id: String,
    pub percentage_bonus: Decimal,
    pub bonus_type: String,
    pub target_user_type: String,
    #[serde(default)]
    pub target_user_ids: Vec<String>,
    pub user_recurrence: i32,
    pub start_datetime: NaiveDateTime,
    pub end_datetime: NaiveDateTime,
}

impl NewCampaign {
    pub fn validate(&self) -> Result<(), String> {
        if self.campaign_id.trim().is_empty() {
            return Err("campaign_id must not be empty".to_string());
        }
        if self.percentage_bonus <= Decimal::ZERO {
            return Err("percentage_bonus must be positive".to_string());
        }
        if BonusType::parse(&self.bonus_type).is_none() {
            return Err(format!("unknown bonus_type: {}", self.bonus_type));
        }
        match self.target_user_type.as_str() {
            "all_users" => {}
            "specific_users" => {
                if self.target_user_ids.is_empty() {
                    return Err(
                        "specific_users targeting requires at least one user id".to_string()
                    );
                }
            }
            other => return Err(format!("unknown target_user_type: {}", other)),
        }
        if self.user_recurrence < 1 {
            return Err("user_recurrence must be at least 1".to_string());
        }
        if self.start_datetime >= self.end_datetime {
            return Err("start_datetime must be before end_datetime".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn campaign(percentage: Decimal) -> Campaign {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Campaign {
            id: 1,
            campaign_id: "NEWYEAR25".to_string(),
            percentage_bonus: percentage,
            bonus_type: "every_deposit".to_string(),
            target_user_type: "all_users".to_string(),
            target_user_ids: vec![],
            user_recurrence: 1,
            is_active: true,
            start_datetime: start,
            end_datetime: end,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn bonus_amount_is_exact_percentage() {
        let campaign = campaign(Decimal::from(10));
        assert_eq!(
            campaign.bonus_amount(Decimal::from(1000)),
            Decimal::from(100)
        );
    }

    #[test]
    fn bonus_amount_is_stable_over_repeated_evaluation() {
        let campaign = campaign(Decimal::new(125, 1)); // 12.5%
        let first = campaign.bonus_amount(Decimal::new(33333, 2));
        for _ in 0..100 {
            assert_eq!(campaign.bonus_amount(Decimal::new(33333, 2)), first);
        }
    }

    #[test]
    fn window_excludes_one_second_past_end() {
        let campaign = campaign(Decimal::from(10));
        let end = campaign.end_datetime;
        assert!(campaign.is_active_at(end));
        assert!(!campaign.is_active_at(end + chrono::Duration::seconds(1)));
        assert!(!campaign.is_active_at(campaign.start_datetime - chrono::Duration::seconds(1)));
    }

    #[test]
    fn inactive_flag_overrides_window() {
        let mut campaign = campaign(Decimal::from(10));
        campaign.is_active = false;
        assert!(!campaign.is_active_at(campaign.start_datetime));
    }

    #[test]
    fn specific_audience_only_matches_listed_users() {
        let mut campaign = campaign(Decimal::from(10));
        campaign.target_user_type = "specific_users".to_string();
        campaign.target_user_ids = vec!["u-1".to_string(), "u-2".to_string()];

        let audience = campaign.audience();
        assert!(audience.includes("u-1"));
        assert!(!audience.includes("u-3"));
    }

    #[test]
    fn all_users_audience_matches_everyone() {
        let campaign = campaign(Decimal::from(10));
        assert!(campaign.audience().includes("anyone"));
    }

    #[test]
    fn new_campaign_validation() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut new = NewCampaign {
            campaign_id: "SPRING".to_string(),
            percentage_bonus: Decimal::from(5),
            bonus_type: "first_deposit_only".to_string(),
            target_user_type: "all_users".to_string(),
            target_user_ids: vec![],
            user_recurrence: 1,
            start_datetime: start,
            end_datetime: start + chrono::Duration::days(30),
        };
        assert!(new.validate().is_ok());

        new.percentage_bonus = Decimal::ZERO;
        assert!(new.validate().is_err());
        new.percentage_bonus = Decimal::from(5);

        new.end_datetime = new.start_datetime;
        assert!(new.validate().is_err());
        new.end_datetime = start + chrono::Duration::days(30);

        new.target_user_type = "specific_users".to_string();
        assert!(new.validate().is_err());
        new.target_user_ids = vec!["u-1".to_string()];
        assert!(new.validate().is_ok());
    }
}
