use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::premium::{Drink, DrinkPrompt, Recipe, RecipeGenerator, RecipePrompt},
};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const RECIPE_SYSTEM_PROMPT: &str = "You are a home cooking assistant. Reply with a single JSON \
object with keys name, description, ingredients (array of strings, one ingredient with quantity \
each), instructions (array of strings) and servings (integer).";

const DRINK_SYSTEM_PROMPT: &str = "You are a Starbucks barista. Invent one drink that can be \
ordered from the standard menu. Reply with a single JSON object with keys name, description, \
base_drink, modifications (array of strings) and ordering_script (what to say at the counter).";

/// Chat completions client used for recipe and drink generation.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: SecretString,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(client: Client, api_key: SecretString, model: String) -> Self {
        Self {
            client,
            api_key,
            model,
        }
    }

    async fn complete_json<T: DeserializeOwned>(&self, system: &str, user: &str) -> AppResult<T> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.8,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", OPENAI_API_BASE))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::upstream("OpenAI request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "OpenAI API error");
            return Err(AppError::upstream("OpenAI API error", status));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream("Failed to parse OpenAI response", e))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::upstream("OpenAI API error", "empty completion"))?;

        debug!(len = content.len(), "Completion received");
        parse_completion(&content)
    }
}

fn parse_completion<T: DeserializeOwned>(content: &str) -> AppResult<T> {
    // Some models wrap JSON in a markdown fence even in json mode.
    let trimmed = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    serde_json::from_str(trimmed).map_err(|e| AppError::upstream("Malformed completion", e))
}

fn recipe_request(prompt: &RecipePrompt) -> String {
    let mut text = String::from("Create a recipe");
    if let Some(cuisine) = prompt.cuisine.as_deref().filter(|s| !s.trim().is_empty()) {
        text.push_str(&format!(" from {} cuisine", cuisine.trim()));
    }
    if let Some(diet) = prompt.diet.as_deref().filter(|s| !s.trim().is_empty()) {
        text.push_str(&format!(" that is {}", diet.trim()));
    }
    text.push_str(&format!(" for {} people.", prompt.servings.unwrap_or(2)));
    text
}

fn drink_request(prompt: &DrinkPrompt) -> String {
    let mood = prompt.mood.as_deref().unwrap_or("curious");
    match prompt.flavor.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(flavor) => format!("I'm feeling {} and want something {}.", mood, flavor),
        None => format!("I'm feeling {}.", mood),
    }
}

#[async_trait]
impl RecipeGenerator for OpenAiClient {
    async fn generate_recipe(&self, prompt: &RecipePrompt) -> AppResult<Recipe> {
        self.complete_json(RECIPE_SYSTEM_PROMPT, &recipe_request(prompt))
            .await
    }

    async fn generate_drink(&self, prompt: &DrinkPrompt) -> AppResult<Drink> {
        self.complete_json(DRINK_SYSTEM_PROMPT, &drink_request(prompt))
            .await
    }
}
