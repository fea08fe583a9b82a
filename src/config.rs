use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_HISTORY_FILE: &str = "history_data.csv";
pub const DEFAULT_REVIEW_FILE: &str = "民宿數據.xlsx - 客戶評價.csv";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct Config {
    pub history_file: PathBuf,
    pub review_file: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

impl Config {
    pub fn load() -> Self {
        dotenv().ok();

        let history_file = env::var("HISTORY_FILE").unwrap_or_else(|_| DEFAULT_HISTORY_FILE.to_string());
        let review_file = env::var("REVIEW_FILE").unwrap_or_else(|_| DEFAULT_REVIEW_FILE.to_string());

        // An empty key in .env counts as unset
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let gemini_model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_base_url = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());

        Config {
            history_file: PathBuf::from(history_file),
            review_file: PathBuf::from(review_file),
            gemini_api_key,
            gemini_model,
            gemini_base_url,
        }
    }
}
