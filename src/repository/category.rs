use diesel::prelude::*;

use crate::domain::category::{Category, NewCategory};
use crate::domain::types::CategorySlug;
use crate::models::category::{Category as DbCategory, NewCategory as DbNewCategory};
use crate::repository::errors::RepositoryResult;
use crate::repository::{CategoryReader, CategoryWriter, DieselRepository};

impl CategoryReader for DieselRepository {
    fn list_categories(&self, active_only: bool) -> RepositoryResult<Vec<Category>> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let mut items = categories::table.into_boxed::<diesel::sqlite::Sqlite>();
        if active_only {
            items = items.filter(categories::is_active.eq(true));
        }

        let items = items
            .order((categories::position.asc(), categories::id.asc()))
            .load::<DbCategory>(&mut conn)?
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Category>, _>>()?;

        Ok(items)
    }

    fn get_category_by_slug(&self, slug: &CategorySlug) -> RepositoryResult<Option<Category>> {
        use crate::schema::categories;

        let mut conn = self.conn()?;

        let category = categories::table
            .filter(categories::slug.eq(slug.as_str()))
            .first::<DbCategory>(&mut conn)
            .optional()?;

        let category = category.map(TryInto::try_into).transpose()?;
        Ok(category)
    }
}

impl CategoryWriter for DieselRepository {
    fn upsert_category(&self, category: &NewCategory) -> RepositoryResult<Category> {
        use crate::schema::categories;

        let mut conn = self.conn()?;
        let db_category: DbNewCategory = category.clone().into();

        let stored = conn.transaction(|conn| {
            diesel::insert_into(categories::table)
                .values(&db_category)
                .on_conflict(categories::slug)
                .do_update()
                .set((
                    categories::name.eq(&db_category.name),
                    categories::keywords.eq(&db_category.keywords),
                    categories::position.eq(db_category.position),
                    categories::is_active.eq(db_category.is_active),
                    categories::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)?;

            categories::table
                .filter(categories::slug.eq(&db_category.slug))
                .first::<DbCategory>(conn)
        })?;

        Ok(stored.try_into()?)
    }
}
