use crate::api_connection::connection::{ApiConnectionError, GeminiClient};
use crate::api_connection::endpoints::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part, Schema,
};
use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Macronutrient grams for one analyzed serving.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Macros {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ingredient {
    pub name: String,
    pub calories: f64,
}

/// Structured nutritional estimate returned for one submitted image.
/// Field names on the wire are camelCase, matching the response schema
/// declared to the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub food_name: String,
    pub description: String,
    pub total_calories: f64,
    pub macros: Macros,
    pub ingredients: Vec<Ingredient>,
    pub health_score: f64,
    pub health_tips: Vec<String>,
}

const SYSTEM_INSTRUCTION: &str = "\
You are an expert nutritionist and food scientist AI.
Your task is to analyze images of food provided by the user.
Identify the food items, estimate the serving size based on visual cues, and calculate the nutritional content.
Be realistic with portion sizes. If the image contains multiple items, sum them up or list the main components.
Provide a health score from 1 (unhealthy) to 10 (very healthy) and actionable health tips.

IMPORTANT: Respond in Simplified Chinese (简体中文). All names, descriptions, and tips must be in Chinese.";

const USER_INSTRUCTION: &str =
    "Analyze this food image. Provide nutritional estimation in Simplified Chinese.";

/// Response schema handed to the model so the reply is a single JSON object
/// in the exact shape of [`AnalysisResult`].
pub fn response_schema() -> Schema {
    let mut macro_properties = HashMap::new();
    macro_properties.insert("protein".to_string(), Schema::number("蛋白质 (克)"));
    macro_properties.insert("carbs".to_string(), Schema::number("碳水化合物 (克)"));
    macro_properties.insert("fat".to_string(), Schema::number("脂肪 (克)"));
    macro_properties.insert("fiber".to_string(), Schema::number("膳食纤维 (克)"));
    let macros_schema = Schema::object(
        macro_properties,
        vec![
            "protein".to_string(),
            "carbs".to_string(),
            "fat".to_string(),
            "fiber".to_string(),
        ],
    );

    let mut ingredient_properties = HashMap::new();
    ingredient_properties.insert("name".to_string(), Schema::string("成分名称 (中文)"));
    ingredient_properties.insert("calories".to_string(), Schema::number("卡路里 (kcal)"));
    let ingredient_schema = Schema::object(
        ingredient_properties,
        vec!["name".to_string(), "calories".to_string()],
    );

    let mut properties = HashMap::new();
    properties.insert("foodName".to_string(), Schema::string("食物名称 (中文)"));
    properties.insert(
        "description".to_string(),
        Schema::string("简短的食物描述和份量估算 (中文)"),
    );
    properties.insert(
        "totalCalories".to_string(),
        Schema::number("总卡路里 (kcal)"),
    );
    properties.insert("macros".to_string(), macros_schema);
    properties.insert(
        "ingredients".to_string(),
        Schema::array(ingredient_schema).with_description("主要成分及各自的卡路里"),
    );
    properties.insert("healthScore".to_string(), Schema::number("健康评分 1-10"));
    properties.insert(
        "healthTips".to_string(),
        Schema::array(Schema::string("健康建议 (中文)")).with_description("健康建议 (中文)"),
    );

    Schema::object(
        properties,
        vec![
            "foodName".to_string(),
            "description".to_string(),
            "totalCalories".to_string(),
            "macros".to_string(),
            "ingredients".to_string(),
            "healthScore".to_string(),
            "healthTips".to_string(),
        ],
    )
}

/// Seam between the state controller and the hosted model, so canned
/// implementations can stand in for the remote call.
#[async_trait]
pub trait FoodAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        base64_image: &str,
        mime_type: &str,
    ) -> Result<AnalysisResult, ApiConnectionError>;
}

/// Analyzer backed by the Gemini `generateContent` endpoint.
pub struct GeminiAnalyzer {
    client: GeminiClient,
}

impl GeminiAnalyzer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FoodAnalyzer for GeminiAnalyzer {
    async fn analyze(
        &self,
        base64_image: &str,
        mime_type: &str,
    ) -> Result<AnalysisResult, ApiConnectionError> {
        let request = GenerateContentRequest {
            system_instruction: Some(Content::system(SYSTEM_INSTRUCTION)),
            contents: vec![Content::user(vec![
                Part::inline_data(mime_type, base64_image),
                Part::text(USER_INSTRUCTION),
            ])],
            generation_config: Some(GenerationConfig::json_with_schema(response_schema())),
        };

        debug!(
            "Sending food analysis request to model '{}' ({} base64 bytes, {})",
            self.client.model(),
            base64_image.len(),
            mime_type
        );

        let response = self.client.generate_content(&request).await.map_err(|e| {
            error!("Gemini analysis call failed: {}", e);
            e
        })?;

        extract_result(&response)
    }
}

/// Pulls the analysis JSON out of a response envelope. Empty or missing
/// content maps to [`ApiConnectionError::EmptyResponse`].
pub fn extract_result(
    response: &GenerateContentResponse,
) -> Result<AnalysisResult, ApiConnectionError> {
    let text = match response.first_text() {
        Some(t) if !t.trim().is_empty() => t,
        _ => {
            error!("Model returned no analysis content");
            return Err(ApiConnectionError::EmptyResponse);
        }
    };

    let content = strip_code_fences(text);

    serde_json::from_str(content).map_err(|e| {
        error!(
            "Failed to deserialize analysis content: {}. Content was:\n{}",
            e, content
        );
        ApiConnectionError::SerializationError(e)
    })
}

/// The model is asked for bare JSON, but replies occasionally arrive wrapped
/// in ```json fences anyway.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed);
    trimmed.trim()
}
