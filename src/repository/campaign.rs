use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::campaign::{Campaign, NewCampaign};
use crate::domain::types::{CampaignId, CampaignStatus};
use crate::models::campaign::{
    Campaign as DbCampaign, CampaignProduct as DbCampaignProduct, NewCampaign as DbNewCampaign,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{CampaignReader, CampaignWriter, DieselRepository};

fn load_product_ids(
    conn: &mut SqliteConnection,
    campaign_id: i32,
) -> QueryResult<Vec<i32>> {
    use crate::schema::campaign_products;

    campaign_products::table
        .filter(campaign_products::campaign_id.eq(campaign_id))
        .order(campaign_products::position.asc())
        .select(campaign_products::product_id)
        .load(conn)
}

impl CampaignReader for DieselRepository {
    fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>> {
        use crate::schema::campaigns;

        let mut conn = self.conn()?;

        let Some(campaign) = campaigns::table
            .filter(campaigns::id.eq(id.get()))
            .first::<DbCampaign>(&mut conn)
            .optional()?
        else {
            return Ok(None);
        };

        let product_ids = load_product_ids(&mut conn, campaign.id)?;
        Ok(Some(campaign.into_domain(product_ids)?))
    }

    fn list_campaigns(&self) -> RepositoryResult<Vec<Campaign>> {
        use crate::schema::{campaign_products, campaigns};

        let mut conn = self.conn()?;

        let rows = campaigns::table
            .order((campaigns::created_at.desc(), campaigns::id.desc()))
            .load::<DbCampaign>(&mut conn)?;

        let links = campaign_products::table
            .order((
                campaign_products::campaign_id.asc(),
                campaign_products::position.asc(),
            ))
            .load::<DbCampaignProduct>(&mut conn)?;

        let mut by_campaign: HashMap<i32, Vec<i32>> = HashMap::new();
        for link in links {
            by_campaign
                .entry(link.campaign_id)
                .or_default()
                .push(link.product_id);
        }

        let campaigns = rows
            .into_iter()
            .map(|row| {
                let product_ids = by_campaign.remove(&row.id).unwrap_or_default();
                row.into_domain(product_ids)
            })
            .collect::<Result<Vec<Campaign>, _>>()?;

        Ok(campaigns)
    }
}

impl CampaignWriter for DieselRepository {
    fn create_campaign(&self, campaign: &NewCampaign) -> RepositoryResult<Campaign> {
        use crate::schema::{campaign_products, campaigns};

        let mut conn = self.conn()?;
        let db_campaign = DbNewCampaign::from(campaign);

        let (stored, product_ids) = conn.transaction(|conn| {
            let stored = diesel::insert_into(campaigns::table)
                .values(&db_campaign)
                .returning(DbCampaign::as_returning())
                .get_result(conn)?;

            let links: Vec<DbCampaignProduct> = campaign
                .product_ids
                .iter()
                .enumerate()
                .map(|(position, product_id)| DbCampaignProduct {
                    campaign_id: stored.id,
                    product_id: product_id.get(),
                    position: position as i32,
                })
                .collect();

            if !links.is_empty() {
                diesel::insert_into(campaign_products::table)
                    .values(&links)
                    .execute(conn)?;
            }

            let product_ids = load_product_ids(conn, stored.id)?;
            Ok::<_, diesel::result::Error>((stored, product_ids))
        })?;

        Ok(stored.into_domain(product_ids)?)
    }

    fn set_campaign_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> RepositoryResult<Campaign> {
        use crate::schema::campaigns;

        let mut conn = self.conn()?;
        let target = campaigns::table.filter(campaigns::id.eq(id.get()));
        let now = Utc::now().naive_utc();

        let affected = match status {
            CampaignStatus::Sending => diesel::update(target)
                .set((
                    campaigns::status.eq(status.as_str()),
                    campaigns::started_at.eq(Some(now)),
                    campaigns::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
            CampaignStatus::Completed => diesel::update(target)
                .set((
                    campaigns::status.eq(status.as_str()),
                    campaigns::completed_at.eq(Some(now)),
                    campaigns::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
            _ => diesel::update(target)
                .set((
                    campaigns::status.eq(status.as_str()),
                    campaigns::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
        };

        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        let stored = campaigns::table
            .filter(campaigns::id.eq(id.get()))
            .first::<DbCampaign>(&mut conn)?;
        let product_ids = load_product_ids(&mut conn, stored.id)?;
        Ok(stored.into_domain(product_ids)?)
    }
}
