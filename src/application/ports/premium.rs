use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_error::AppResult;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePrompt {
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub servings: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DrinkPrompt {
    pub mood: Option<String>,
    pub flavor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub servings: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Drink {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_drink: String,
    #[serde(default)]
    pub modifications: Vec<String>,
    #[serde(default)]
    pub ordering_script: String,
}

/// Text generation backend (LLM).
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate_recipe(&self, prompt: &RecipePrompt) -> AppResult<Recipe>;
    async fn generate_drink(&self, prompt: &DrinkPrompt) -> AppResult<Drink>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Retail catalog search backend.
#[async_trait]
pub trait ProductSearch: Send + Sync {
    async fn search(&self, query: &str, limit: u8) -> AppResult<Vec<Product>>;
}
