use serde::{Deserialize, Serialize};

use crate::provider::ProviderError;

// Closed vocabularies shared with the mobile client. Keep in sync with the app.
pub const CATEGORY_OPTIONS: &[&str] = &[
    "Tops", "Bottoms", "Outerwear", "Dresses", "Shoes", "Accessories", "Bags", "Other",
];
pub const COLOR_OPTIONS: &[&str] = &[
    "White", "Black", "Gray", "Beige", "Brown", "Navy", "Blue", "Green", "Red", "Pink", "Purple",
    "Yellow", "Orange", "Multi",
];
pub const MATERIAL_OPTIONS: &[&str] = &[
    "Cotton", "Denim", "Silk", "Wool", "Leather", "Linen", "Polyester", "Cashmere", "Velvet",
    "Knit", "Chiffon", "Satin",
];
pub const STYLE_OPTIONS: &[&str] = &[
    "Casual", "Formal", "Sporty", "Streetwear", "Vintage", "Minimalist", "Bohemian", "Preppy",
    "Romantic", "Edgy",
];
pub const SEASON_OPTIONS: &[&str] = &["Spring", "Summer", "Fall", "Winter", "All Season"];

/// Structured result of analyzing a clothing photo.
///
/// `category`, `color` and `material` are required and must come from the
/// vocabularies above. The free-form fields default to empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClothingAnalysis {
    pub category: String,
    pub color: String,
    pub material: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub style: Vec<String>,
    #[serde(default)]
    pub season: Vec<String>,
}

fn canonical(field: &'static str, value: &str, options: &[&str]) -> Result<String, ProviderError> {
    let trimmed = value.trim();
    options
        .iter()
        .find(|option| option.eq_ignore_ascii_case(trimmed))
        .map(|option| option.to_string())
        .ok_or_else(|| ProviderError::OffVocabulary {
            field,
            value: value.to_string(),
        })
}

impl ClothingAnalysis {
    /// Checks the closed fields against their vocabularies, normalizing case
    /// to the canonical spelling.
    pub fn into_checked(self) -> Result<Self, ProviderError> {
        Ok(Self {
            category: canonical("category", &self.category, CATEGORY_OPTIONS)?,
            color: canonical("color", &self.color, COLOR_OPTIONS)?,
            material: canonical("material", &self.material, MATERIAL_OPTIONS)?,
            ..self
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeMatch {
    #[serde(default)]
    pub best_match_id: String,
    #[serde(default)]
    pub candidate_ids: Vec<String>,
}

/// Body measurements used to shape a generated avatar. Values are passed
/// through verbatim, units are implied by the prompt (cm / kg).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarMetrics {
    pub gender: String,
    pub height: String,
    pub weight: String,
    #[serde(default)]
    pub bust: String,
    #[serde(default)]
    pub waist: String,
    #[serde(default)]
    pub hips: String,
    #[serde(default)]
    pub thigh: String,
    #[serde(default)]
    pub calf: String,
    #[serde(default)]
    pub features: String,
}
