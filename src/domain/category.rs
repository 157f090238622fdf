use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{CategoryId, CategoryName, CategorySlug};

/// Marketing category used to segment offers into WhatsApp channels.
///
/// `keywords` are matched in order against normalized product titles and
/// `position` is the priority among categories (lower wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: CategorySlug,
    pub name: CategoryName,
    pub keywords: Vec<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Data required to insert (or re-seed) a [`Category`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCategory {
    pub slug: CategorySlug,
    pub name: CategoryName,
    pub keywords: Vec<String>,
    pub position: i32,
    pub is_active: bool,
}
