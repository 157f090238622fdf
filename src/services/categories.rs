use crate::categorize::default_categories;
use crate::domain::category::Category;
use crate::domain::types::CategorySlug;
use crate::repository::{CategoryReader, CategoryWriter};

use super::{ServiceError, ServiceResult};

/// Insert or refresh the default category table. Safe to run repeatedly.
pub fn seed_categories<R>(repo: &R) -> ServiceResult<Vec<Category>>
where
    R: CategoryWriter,
{
    let seeds = default_categories()?;
    let mut stored = Vec::with_capacity(seeds.len());
    for seed in &seeds {
        match repo.upsert_category(seed) {
            Ok(category) => stored.push(category),
            Err(e) => return Err(ServiceError::from_repository("Failed to seed category", e)),
        }
    }
    log::info!("Seeded {} categories", stored.len());
    Ok(stored)
}

/// Active categories in priority order.
pub fn list_categories<R>(repo: &R) -> ServiceResult<Vec<Category>>
where
    R: CategoryReader,
{
    repo.list_categories(true)
        .map_err(|e| ServiceError::from_repository("Failed to list categories", e))
}

pub fn get_category<R>(slug: &str, repo: &R) -> ServiceResult<Category>
where
    R: CategoryReader,
{
    let slug = match CategorySlug::new(slug) {
        Ok(slug) => slug,
        Err(_) => return Err(ServiceError::NotFound),
    };
    match repo.get_category_by_slug(&slug) {
        Ok(Some(category)) => Ok(category),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => Err(ServiceError::from_repository("Failed to get category", e)),
    }
}
