use chrono::NaiveDateTime;
use sqlx::PgPool;

use crate::models::campaigns::{Campaign, NewCampaign};

#[derive(Clone)]
pub struct CampaignRepository {
    conn: PgPool,
}

impl CampaignRepository {
    pub fn new(conn: PgPool) -> Self {
        CampaignRepository { conn }
    }

    /// Campaigns whose window covers `now`, flagged active, with a real
    /// percentage. The batch evaluates every one of them independently.
    pub async fn active_campaigns(&self, now: NaiveDateTime) -> Result<Vec<Campaign>, anyhow::Error> {
        let campaigns = sqlx::query_as::<_, Campaign>(
            r#"SELECT * FROM campaigns
            WHERE is_active = true AND start_datetime <= $1 AND end_datetime >= $1 AND percentage_bonus > 0
            ORDER BY id ASC"#,
        )
        .bind(now)
        .fetch_all(&self.conn)
        .await?;

        Ok(campaigns)
    }

    pub async fn insert_campaign(&self, new: &NewCampaign) -> Result<Campaign, anyhow::Error> {
        let campaign = sqlx::query_as::<_, Campaign>(
            r#"INSERT INTO campaigns
            (campaign_id, percentage_bonus, bonus_type, target_user_type, target_user_ids, user_recurrence, is_active, start_datetime, end_datetime)
            VALUES ($1, $2, $3, $4, $5, $6, true, $7, $8)
            RETURNING *"#,
        )
        .bind(&new.campaign_id)
        .bind(new.percentage_bonus)
        .bind(&new.bonus_type)
        .bind(&new.target_user_type)
        .bind(&new.target_user_ids)
        .bind(new.user_recurrence)
        .bind(new.start_datetime)
        .bind(new.end_datetime)
        .fetch_one(&self.conn)
        .await?;

        Ok(campaign)
    }

    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>, anyhow::Error> {
        let campaigns =
            sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns ORDER BY id DESC LIMIT 100")
                .fetch_all(&self.conn)
                .await?;

        Ok(campaigns)
    }
}
