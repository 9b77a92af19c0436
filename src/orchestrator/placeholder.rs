//! Fixed output served when no provider is configured.

use anyhow::Result;

use crate::image_processing::{InlineImage, placeholder_png};
use crate::provider::ClothingAnalysis;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn analysis() -> ClothingAnalysis {
    ClothingAnalysis {
        category: "Tops".to_string(),
        color: "White".to_string(),
        material: "Cotton".to_string(),
        description: "A soft, cloudlike piece perfect for everyday elegance.".to_string(),
        tags: strings(&["casual", "everyday", "basic"]),
        style: strings(&["Casual", "Minimalist"]),
        season: strings(&["Spring", "Summer", "All Season"]),
    }
}

pub fn refined_analysis() -> ClothingAnalysis {
    ClothingAnalysis {
        category: "Tops".to_string(),
        color: "White".to_string(),
        material: "Cotton".to_string(),
        description: "A refined piece based on your feedback.".to_string(),
        tags: strings(&["refined", "custom"]),
        style: strings(&["Casual"]),
        season: strings(&["All Season"]),
    }
}

pub fn image() -> Result<InlineImage> {
    placeholder_png()
}

pub fn message(feature: &str) -> String {
    format!("{feature} - AI provider not configured, placeholder image returned")
}
