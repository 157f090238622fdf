use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::category::{Category as DomainCategory, NewCategory as DomainNewCategory};
use crate::domain::types::{CategoryName, CategorySlug, TypeConstraintError};

/// Diesel model representing the `categories` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::categories)]
pub struct Category {
    pub id: i32,
    pub slug: String,
    pub name: String,
    /// JSON array of keywords.
    pub keywords: String,
    pub position: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable/patchable form of [`Category`].
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::categories)]
pub struct NewCategory {
    pub slug: String,
    pub name: String,
    pub keywords: String,
    pub position: i32,
    pub is_active: bool,
}

impl TryFrom<Category> for DomainCategory {
    type Error = TypeConstraintError;

    fn try_from(category: Category) -> Result<Self, Self::Error> {
        let keywords: Vec<String> = serde_json::from_str(&category.keywords)
            .map_err(|e| TypeConstraintError::InvalidValue(format!("category keywords: {e}")))?;
        Ok(Self {
            id: category.id.try_into()?,
            slug: CategorySlug::new(category.slug)?,
            name: CategoryName::new(category.name)?,
            keywords,
            position: category.position,
            is_active: category.is_active,
            created_at: category.created_at,
            updated_at: category.updated_at,
        })
    }
}

impl From<DomainNewCategory> for NewCategory {
    fn from(category: DomainNewCategory) -> Self {
        // Serializing a Vec<String> cannot fail.
        let keywords = serde_json::to_string(&category.keywords).unwrap_or_else(|_| "[]".into());
        Self {
            slug: category.slug.into_inner(),
            name: category.name.into_inner(),
            keywords,
            position: category.position,
            is_active: category.is_active,
        }
    }
}
