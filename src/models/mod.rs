use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Title sent on creation when the operator leaves the title blank
pub const DEFAULT_TITLE: &str = "New listing";

/// Title sent on update when the stored record has a blank title
pub const UNTITLED: &str = "(untitled)";

/// Raw JSON object returned by an update, merged field-by-field over the
/// local record
pub type PropertyPatch = Map<String, Value>;

/// Kind of deal a listing is offered under. Values the client does not
/// recognise are kept verbatim in `Other`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Buy,
    Rent,
    DailyRent,
    #[serde(untagged)]
    Other(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Buy => "buy",
            Self::Rent => "rent",
            Self::DailyRent => "daily_rent",
            Self::Other(value) => value,
        }
    }
}

impl FromStr for TransactionType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "buy" => Self::Buy,
            "rent" => Self::Rent,
            "daily_rent" => Self::DailyRent,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Currency the price is quoted in, `Other` for anything unrecognised
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Gel,
    Usd,
    #[serde(untagged)]
    Other(String),
}

impl Currency {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Gel => "GEL",
            Self::Usd => "USD",
            Self::Other(value) => value,
        }
    }
}

impl FromStr for Currency {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GEL" => Self::Gel,
            "USD" => Self::Usd,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core property data model.
///
/// Summary records (list/search) and detail records (single fetch) share
/// this shape. `id`, `owner_id`, `created_at` and `updated_at` are managed by
/// the server and never sent back. Fields the client does not know about are
/// kept in `extra` so they survive a merge and an update round-trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub transaction_type: Option<TransactionType>,

    pub city: Option<String>,
    pub district: Option<String>,
    pub street: Option<String>,

    pub currency: Option<Currency>,
    pub price: Option<f64>,

    pub area_sqm: Option<f64>,
    pub rooms: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub floor: Option<i64>,
    pub total_floors: Option<i64>,
    pub not_first_floor: Option<bool>,

    pub condition: Option<String>,
    pub building_type: Option<String>,
    pub heating_type: Option<String>,
    pub has_air_conditioning: Option<bool>,
    pub parking_type: Option<String>,
    pub has_balcony: Option<bool>,
    pub pets_allowed: Option<bool>,
    pub furnished: Option<String>,

    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Property {
    /// Shallow-merge `patch` over this record.
    ///
    /// Keys present in the patch replace the local value, everything else is
    /// preserved. The id never changes. Returns a new record so a patch that
    /// fails to decode leaves `self` untouched.
    pub fn merged(&self, patch: &PropertyPatch) -> Result<Self, serde_json::Error> {
        let mut fields = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }
        fields.insert("id".to_string(), Value::from(self.id));

        serde_json::from_value(Value::Object(fields))
    }

    /// Build the PUT body for a price change: the full record minus the
    /// server-managed fields, with `price` replaced and a blank title
    /// substituted.
    pub fn to_update(&self, price: Option<f64>) -> PropertyDraft {
        let title = self.title.trim();

        PropertyDraft {
            title: if title.is_empty() {
                UNTITLED.to_string()
            } else {
                title.to_string()
            },
            transaction_type: self.transaction_type.clone(),
            city: self.city.clone(),
            district: self.district.clone(),
            street: self.street.clone(),
            currency: self.currency.clone(),
            price,
            area_sqm: self.area_sqm,
            rooms: self.rooms,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            floor: self.floor,
            total_floors: self.total_floors,
            not_first_floor: self.not_first_floor,
            condition: self.condition.clone(),
            building_type: self.building_type.clone(),
            heating_type: self.heating_type.clone(),
            has_air_conditioning: self.has_air_conditioning,
            parking_type: self.parking_type.clone(),
            has_balcony: self.has_balcony,
            pets_allowed: self.pets_allowed,
            furnished: self.furnished.clone(),
            description: self.description.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// Client-authored listing fields, used as the creation payload and as the
/// update body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDraft {
    pub title: String,
    pub transaction_type: Option<TransactionType>,

    pub city: Option<String>,
    pub district: Option<String>,
    pub street: Option<String>,

    pub currency: Option<Currency>,
    pub price: Option<f64>,

    pub area_sqm: Option<f64>,
    pub rooms: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<i64>,
    pub floor: Option<i64>,
    pub total_floors: Option<i64>,
    pub not_first_floor: Option<bool>,

    pub condition: Option<String>,
    pub building_type: Option<String>,
    pub heating_type: Option<String>,
    pub has_air_conditioning: Option<bool>,
    pub parking_type: Option<String>,
    pub has_balcony: Option<bool>,
    pub pets_allowed: Option<bool>,
    pub furnished: Option<String>,

    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PropertyDraft {
    /// Normalise the draft for submission: the title is trimmed and a blank
    /// one is replaced with [`DEFAULT_TITLE`].
    pub fn into_submission(mut self) -> Self {
        let title = self.title.trim();
        self.title = if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title.to_string()
        };
        self
    }
}

impl Default for PropertyDraft {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            transaction_type: Some(TransactionType::Buy),
            city: Some("Tbilisi".to_string()),
            district: Some("Vake".to_string()),
            street: Some("Chavchavadze Ave".to_string()),
            currency: Some(Currency::Usd),
            price: Some(100_000.0),
            area_sqm: Some(80.0),
            rooms: Some(3),
            bedrooms: Some(2),
            bathrooms: Some(1),
            floor: Some(8),
            total_floors: Some(12),
            not_first_floor: Some(true),
            condition: Some("new_renov".to_string()),
            building_type: Some("new_building".to_string()),
            heating_type: Some("central".to_string()),
            has_air_conditioning: Some(true),
            parking_type: Some("underground".to_string()),
            has_balcony: Some(true),
            pets_allowed: Some(false),
            furnished: Some("full".to_string()),
            description: Some("Created from CLI".to_string()),
            extra: Map::new(),
        }
    }
}

/// Credentials posted to the login endpoint
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response. The server may name the bearer token either
/// `access_token` or `token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub token: Option<String>,
    pub token_type: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Option<String> {
        self.access_token
            .filter(|t| !t.is_empty())
            .or(self.token.filter(|t| !t.is_empty()))
    }
}

/// Profile of the logged-in operator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
}

/// Render a price the way it appears in an edit field: empty for no price,
/// otherwise the shortest decimal form (`100000`, `99.5`)
pub fn price_text(price: Option<f64>) -> String {
    match price {
        Some(value) => value.to_string(),
        None => String::new(),
    }
}
