use chrono::Utc;
use diesel::prelude::*;

use crate::domain::product::{NewProduct, Product};
use crate::domain::types::{CategoryId, ProductId, ProductStatus};
use crate::models::product::{NewProduct as DbNewProduct, Product as DbProduct};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ProductListQuery, ProductReader, ProductWriter};

impl ProductReader for DieselRepository {
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = products::table.into_boxed::<diesel::sqlite::Sqlite>();

            if let Some(status) = query.status {
                items = items.filter(products::status.eq(status.as_str()));
            }

            if let Some(category_id) = query.category_id {
                items = items.filter(products::category_id.eq(category_id.get()));
            }

            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder();

        if let Some(pagination) = &query.pagination {
            items = items
                .offset(pagination.offset() as i64)
                .limit(pagination.per_page as i64);
        }

        let items = items
            .order((products::created_at.desc(), products::id.desc()))
            .load::<DbProduct>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Product>, _>>()?;

        Ok((total, items))
    }

    fn get_product_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let product = products::table
            .filter(products::id.eq(id.get()))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        let product = product.map(TryInto::try_into).transpose()?;
        Ok(product)
    }

    fn get_products_by_ids(&self, ids: &[ProductId]) -> RepositoryResult<Vec<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let raw_ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();
        let mut rows = products::table
            .filter(products::id.eq_any(raw_ids.clone()))
            .load::<DbProduct>(&mut conn)?;

        let mut ordered = Vec::with_capacity(rows.len());
        for id in raw_ids {
            if let Some(idx) = rows.iter().position(|row| row.id == id) {
                ordered.push(rows.swap_remove(idx).try_into()?);
            }
        }
        Ok(ordered)
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, product: &NewProduct) -> RepositoryResult<Product> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_product: DbNewProduct = product.clone().into();

        let stored = diesel::insert_into(products::table)
            .values(&db_product)
            .returning(DbProduct::as_returning())
            .get_result(&mut conn)?;

        Ok(stored.try_into()?)
    }

    fn set_product_status(
        &self,
        id: ProductId,
        status: ProductStatus,
    ) -> RepositoryResult<Product> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let target = products::table.filter(products::id.eq(id.get()));

        let stored = if status == ProductStatus::Approved {
            diesel::update(target)
                .set((
                    products::status.eq(status.as_str()),
                    products::approved_at.eq(Some(Utc::now().naive_utc())),
                    products::updated_at.eq(diesel::dsl::now),
                ))
                .returning(DbProduct::as_returning())
                .get_result(&mut conn)
                .optional()?
        } else {
            diesel::update(target)
                .set((
                    products::status.eq(status.as_str()),
                    products::updated_at.eq(diesel::dsl::now),
                ))
                .returning(DbProduct::as_returning())
                .get_result(&mut conn)
                .optional()?
        };

        let stored = stored.ok_or(RepositoryError::NotFound)?;
        Ok(stored.try_into()?)
    }

    fn set_product_category(
        &self,
        id: ProductId,
        category_id: Option<CategoryId>,
    ) -> RepositoryResult<Product> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let stored = diesel::update(products::table.filter(products::id.eq(id.get())))
            .set((
                products::category_id.eq(category_id.map(|c| c.get())),
                products::updated_at.eq(diesel::dsl::now),
            ))
            .returning(DbProduct::as_returning())
            .get_result(&mut conn)
            .optional()?;

        let stored = stored.ok_or(RepositoryError::NotFound)?;
        Ok(stored.try_into()?)
    }

    fn delete_product(&self, id: ProductId) -> RepositoryResult<usize> {
        use crate::schema::{campaign_products, products};

        let mut conn = self.conn()?;

        let affected = conn.transaction(|conn| {
            diesel::delete(
                campaign_products::table.filter(campaign_products::product_id.eq(id.get())),
            )
            .execute(conn)?;

            diesel::delete(products::table.filter(products::id.eq(id.get()))).execute(conn)
        })?;

        Ok(affected)
    }
}
