//! Strongly-typed value objects used by domain entities.
//!
//! Domain structs should carry these wrappers instead of raw primitives so that
//! identifiers, text values, prices and status values are enforced at the
//! boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use validator::ValidateUrl;

/// Maximum number of characters kept for a product title.
pub const MAX_TITLE_CHARS: usize = 500;

/// Errors produced when attempting to construct constrained domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// An identifier was zero or negative.
    #[error("{0} must be greater than zero")]
    NonPositiveId(&'static str),
    /// A numeric value required to be positive was zero/negative or invalid.
    #[error("{0} must be greater than zero")]
    NonPositiveNumber(&'static str),
    /// A numeric value fell outside its allowed range.
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
    /// A string was empty or whitespace-only after trimming.
    #[error("{0} cannot be empty")]
    EmptyString(&'static str),
    /// URL validation failed.
    #[error("{0} must be a valid URL")]
    InvalidUrl(&'static str),
    /// A phone number was not numeric or too short.
    #[error("invalid recipient phone: {0}")]
    InvalidPhone(String),
    /// Catch-all for custom validation failures.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

fn trim_and_require_non_empty<S: Into<String>>(
    value: S,
    field: &'static str,
) -> Result<String, TypeConstraintError> {
    let trimmed = value.into().trim().to_string();
    if trimmed.is_empty() {
        Err(TypeConstraintError::EmptyString(field))
    } else {
        Ok(trimmed)
    }
}

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        Self::new_for_field(value, "value")
    }

    /// Same as [`Self::new`] but with field-specific error context.
    pub fn new_for_field<S: Into<String>>(
        value: S,
        field: &'static str,
    ) -> Result<Self, TypeConstraintError> {
        trim_and_require_non_empty(value, field).map(Self)
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId($field))
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<i32> for $name {
            fn eq(&self, other: &i32) -> bool {
                self.0 == *other
            }
        }
    };
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new_for_field(value, $field)?;
                Ok(Self(inner.into_inner()))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }
    };
}

macro_rules! url_string_newtype {
    ($name:ident, $doc:expr, $field:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed URL and validates its format.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let trimmed = trim_and_require_non_empty(value, $field)?;
                if !trimmed.as_str().validate_url() {
                    return Err(TypeConstraintError::InvalidUrl($field));
                }
                Ok(Self(trimmed))
            }

            /// Borrow the URL as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned URL.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.as_str() == *other
            }
        }
    };
}

/// Closed set of string-backed states persisted as lowercase text.
macro_rules! string_enum {
    ($name:ident, $doc:expr, $field:expr, { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// String representation used in persistence.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value.trim() {
                    $($value => Ok(Self::$variant),)+
                    other => Err(TypeConstraintError::InvalidValue(format!(
                        "{}: {other}",
                        $field
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::try_from(value.as_str())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }
    };
}

id_newtype!(
    CategoryId,
    "Unique identifier for a category.",
    "category_id"
);
id_newtype!(ProductId, "Unique identifier for a product.", "product_id");
id_newtype!(
    CampaignId,
    "Unique identifier for a campaign.",
    "campaign_id"
);
id_newtype!(MessageId, "Unique identifier for a message.", "message_id");
id_newtype!(
    SendJobId,
    "Unique identifier for a queued send job.",
    "send_job_id"
);

non_empty_string_newtype!(
    CategorySlug,
    "Category slug enforcing non-empty values.",
    "category slug"
);
non_empty_string_newtype!(
    CategoryName,
    "Category display name enforcing non-empty values.",
    "category name"
);
non_empty_string_newtype!(
    CampaignName,
    "Campaign name enforcing non-empty values.",
    "campaign name"
);
non_empty_string_newtype!(
    ExternalId,
    "Marketplace identifier (ASIN, MLB id, Shopee shop.item).",
    "external id"
);

url_string_newtype!(ProductUrl, "Source product page URL.", "product url");
url_string_newtype!(ImageUrl, "Product image URL.", "image url");
url_string_newtype!(
    AffiliateLink,
    "Affiliate-tagged product URL.",
    "affiliate link"
);

string_enum!(SourceSite, "Marketplace a product was scraped from.", "source site", {
    Amazon => "amazon",
    MercadoLivre => "mercadolivre",
    Shopee => "shopee",
});

string_enum!(ProductSource, "Origin of a persisted product.", "product source", {
    Amazon => "amazon",
    MercadoLivre => "mercadolivre",
    Shopee => "shopee",
    Manual => "manual",
});

string_enum!(ProductStatus, "Moderation state of a product.", "product status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Sent => "sent",
});

string_enum!(CampaignStatus, "Lifecycle state of a campaign.", "campaign status", {
    Draft => "draft",
    Scheduled => "scheduled",
    Sending => "sending",
    Completed => "completed",
    Cancelled => "cancelled",
});

string_enum!(TargetType, "Audience kind a campaign is sent to.", "target type", {
    List => "list",
    Group => "group",
    Broadcast => "broadcast",
});

string_enum!(MessageStatus, "Delivery state of an outbound message.", "message status", {
    Pending => "pending",
    Sent => "sent",
    Failed => "failed",
});

string_enum!(SendJobStatus, "State of a durable send job.", "send job status", {
    Queued => "queued",
    Processing => "processing",
    Done => "done",
    Failed => "failed",
});

impl From<SourceSite> for ProductSource {
    fn from(value: SourceSite) -> Self {
        match value {
            SourceSite::Amazon => Self::Amazon,
            SourceSite::MercadoLivre => Self::MercadoLivre,
            SourceSite::Shopee => Self::Shopee,
        }
    }
}

impl CampaignStatus {
    /// Whether a "send now" request may start dispatching this campaign.
    pub const fn can_dispatch(self) -> bool {
        matches!(self, Self::Draft | Self::Scheduled)
    }
}

/// Product title: trimmed, non-empty and cut to [`MAX_TITLE_CHARS`] characters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ProductTitle(String);

impl ProductTitle {
    /// Trims the title, rejects empty values and truncates overly long ones.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = trim_and_require_non_empty(value, "product title")?;
        let title = match trimmed.char_indices().nth(MAX_TITLE_CHARS) {
            Some((idx, _)) => trimmed[..idx].trim_end().to_string(),
            None => trimmed,
        };
        Ok(Self(title))
    }

    /// Borrow the title as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned title.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for ProductTitle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ProductTitle {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Strictly positive price in Brazilian reais, kept in whole cents.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Rounds to whole cents; the rounded value must be greater than zero.
    pub fn new(value: Decimal) -> Result<Self, TypeConstraintError> {
        let value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::NonPositiveNumber("price"))
        }
    }

    /// Builds a price from integer cents as stored in the database.
    pub fn from_cents(cents: i64) -> Result<Self, TypeConstraintError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Price rounded to whole cents.
    pub fn to_cents(self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .unwrap_or(i64::MAX)
    }

    /// Returns the raw decimal value.
    pub const fn get(self) -> Decimal {
        self.0
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discount percentage in the inclusive range 0–100.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct DiscountPct(u8);

impl DiscountPct {
    /// Constructs a validated percentage.
    pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(TypeConstraintError::OutOfRange("discount percentage"))
    }

    /// Returns the raw percentage.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Display for DiscountPct {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Minimum number of digits accepted for a recipient phone (DDD + number).
pub const MIN_PHONE_DIGITS: usize = 10;

/// Brazilian country calling code.
pub const BRAZIL_COUNTRY_CODE: &str = "55";

/// Recipient phone as international digits (`55` + DDD + number).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RecipientPhone(String);

impl RecipientPhone {
    /// Normalizes a user-supplied phone number.
    ///
    /// Formatting characters (spaces, `+`, `-`, `.`, parentheses) are dropped;
    /// anything else that is not a digit rejects the value. Numbers shorter
    /// than [`MIN_PHONE_DIGITS`] are rejected and national numbers get the
    /// Brazilian country code prepended.
    pub fn new(value: &str) -> Result<Self, TypeConstraintError> {
        let mut digits = String::with_capacity(value.len());
        for ch in value.trim().chars() {
            match ch {
                '0'..='9' => digits.push(ch),
                ' ' | '+' | '-' | '.' | '(' | ')' => {}
                _ => return Err(TypeConstraintError::InvalidPhone(value.to_string())),
            }
        }
        if digits.len() < MIN_PHONE_DIGITS {
            return Err(TypeConstraintError::InvalidPhone(value.to_string()));
        }
        // 10-11 digits is a national number (DDD + 8/9 digits).
        if digits.starts_with(BRAZIL_COUNTRY_CODE) && digits.len() >= 12 {
            Ok(Self(digits))
        } else {
            Ok(Self(format!("{BRAZIL_COUNTRY_CODE}{digits}")))
        }
    }

    /// Borrow the digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// E.164 representation (`+55...`).
    pub fn e164(&self) -> String {
        format!("+{}", self.0)
    }
}

impl Display for RecipientPhone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
