use crate::provider::types::{
    AvatarMetrics, CATEGORY_OPTIONS, COLOR_OPTIONS, ClothingAnalysis, MATERIAL_OPTIONS,
    SEASON_OPTIONS, STYLE_OPTIONS,
};

const ANALYSIS_RESPONSE_SHAPE: &str = concat!(
    "Return a JSON object with:\n",
    "{\n",
    "  \"category\": \"one from the categories list\",\n",
    "  \"color\": \"one from the colors list\",\n",
    "  \"material\": \"one from the materials list\",\n",
    "  \"description\": \"an editorial description of the piece in 1-2 sentences\",\n",
    "  \"tags\": [\"3-5 descriptive tags\"],\n",
    "  \"style\": [\"1-3 styles from the list\"],\n",
    "  \"season\": [\"1-3 seasons from the list\"]\n",
    "}"
);

pub const CUTOUT_PROMPT: &str = concat!(
    "Isolate this clothing item on a pure white background (#FFFFFF).\n",
    "Requirements:\n",
    "- Remove any background, mannequin, person or hanger\n",
    "- Retouch the fabric so it looks smooth and freshly pressed\n",
    "- Professional e-commerce product photography style\n",
    "- Preserve the exact colors and textures\n",
    "- Center the item with a balanced composition\n",
    "- Aspect ratio 3:4\n\n",
    "Output only the clothing item on the white background."
);

pub const COLLAGE_PROMPT: &str = concat!(
    "Create an editorial flat-lay collage of these clothing items.\n",
    "Style:\n",
    "- Magazine-quality arrangement on a warm beige linen background (#F5F0EB)\n",
    "- Items slightly overlapping in an artistic layout\n",
    "- Soft natural shadows for depth\n",
    "- Cohesive, balanced composition\n",
    "- Aspect ratio 3:4\n\n",
    "Output a single flat-lay image."
);

pub const TRY_ON_PROMPT: &str = concat!(
    "[VIRTUAL TRY-ON]:\n",
    "Photorealistically dress the person in the first image in the clothing items from the ",
    "following images.\n",
    "Requirements:\n",
    "- Keep the exact face likeness and body proportions of the person\n",
    "- Clothing fits naturally and follows the body contours\n",
    "- Realistic lighting, shadows, drape, folds and wrinkles\n",
    "- Keep the A-pose stance and the background\n",
    "- Aspect ratio 3:4\n\n",
    "Output a single image of the person wearing all of the items."
);

fn taxonomy_block() -> String {
    format!(
        "Categories: {}\nColors: {}\nMaterials: {}\nStyles: {}\nSeasons: {}",
        CATEGORY_OPTIONS.join(", "),
        COLOR_OPTIONS.join(", "),
        MATERIAL_OPTIONS.join(", "),
        STYLE_OPTIONS.join(", "),
        SEASON_OPTIONS.join(", "),
    )
}

pub fn build_analysis_prompt() -> String {
    format!(
        "Analyze this clothing item for a digital wardrobe app.\n\
Select values ONLY from these lists:\n{}\n\n{}",
        taxonomy_block(),
        ANALYSIS_RESPONSE_SHAPE
    )
}

pub fn build_refine_analysis_prompt(feedback: &str, previous: Option<&ClothingAnalysis>) -> String {
    let previous = previous
        .and_then(|analysis| serde_json::to_string(analysis).ok())
        .map(|json| format!("Previous analysis: {json}\n"))
        .unwrap_or_default();
    format!(
        "Refine the analysis of this clothing item based on user feedback: \"{}\"\n\
{}Keep every value within this taxonomy:\n{}\n\n{}",
        feedback.trim(),
        previous,
        taxonomy_block(),
        ANALYSIS_RESPONSE_SHAPE
    )
}

pub fn build_refine_cutout_prompt(feedback: &str) -> String {
    format!(
        "The first image is the original photo of a clothing item. The second image is a \
cutout previously generated from it.\n\
Produce an improved cutout of the item from the ORIGINAL photo on a pure white background \
(#FFFFFF), applying this feedback: \"{}\"\n\
Preserve the exact colors and textures of the original, keep the e-commerce product style \
and a 3:4 aspect ratio.\n\
Output only the clothing item on the white background.",
        feedback.trim()
    )
}

pub fn build_avatar_prompt(metrics: &AvatarMetrics) -> String {
    format!(
        "[IDENTITY & METRICS LOCK]:\n\
Generate a photorealistic full-body portrait of a {} subject based on the reference face.\n\
Construct the body geometry strictly according to:\n\
Height: {}cm, Weight: {}kg, Bust: {}cm, Waist: {}cm, Hips: {}cm, Thigh: {}cm, Calf: {}cm.\n\
Special features: {}.\n\n\
[POSE]:\n\
Standardized A-pose: standing straight, facing the camera, arms relaxed 15-20 degrees away \
from the body, hands open.\n\
Attire: minimalist, skin-tight, warm beige seamless bodysuit revealing the body contours.\n\n\
[LIGHTING & RENDER]:\n\
Soft studio lighting, editorial photography, warm 4000K tone.\n\
Solid warm off-white background (#FDFBF7).\n\n\
[NEGATIVE]:\n\
Loose or baggy clothing, jackets, dresses, shoes covering the ankles, crossed arms, hair \
covering the shoulders, complex backgrounds.",
        metrics.gender,
        metrics.height,
        metrics.weight,
        metrics.bust,
        metrics.waist,
        metrics.hips,
        metrics.thigh,
        metrics.calf,
        metrics.features,
    )
}

pub fn build_wardrobe_match_prompt(items_json: &str) -> String {
    format!(
        "Identify whether this clothing item matches any of these existing wardrobe items: {items_json}\n\
Return JSON with \"bestMatchId\" (empty string if nothing matches) and a \"candidateIds\" array."
    )
}
