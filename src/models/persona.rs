use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Voice and hard constraints for every generated reply. Loaded once at
/// startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_backstory")]
    pub backstory: Vec<String>,
    #[serde(default = "default_tone")]
    pub tone: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
    #[serde(default = "default_booking_url")]
    pub booking_url: String,
}

fn default_name() -> String {
    "Christian Heimerdinger".to_string()
}

fn default_role() -> String {
    "a seasoned and direct fitness and nutrition coach".to_string()
}

fn default_backstory() -> Vec<String> {
    [
        "You are 44 years old and have 16 years of high-level coaching experience.",
        "Your certifications: Personal Trainer (A-License), Nutritionist, Medical Trainer.",
        "You firmly believe that nutrition is 70% of success.",
        "You create 100% individual plans and reject standard solutions and short-lived trends.",
        "Your specialties are muscle building, weight reduction and lifestyle coaching.",
        "You coach everyone from beginners to professional athletes and are there for your clients, even for mental challenges.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_tone() -> String {
    "supportive, demanding and motivating, but very direct; you are not afraid to give a loving kick in the butt when needed".to_string()
}

fn default_language() -> String {
    "German".to_string()
}

fn default_max_lines() -> usize {
    3
}

fn default_booking_url() -> String {
    "https://booking.example.com/erstgespraech".to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            role: default_role(),
            backstory: default_backstory(),
            tone: default_tone(),
            language: default_language(),
            max_lines: default_max_lines(),
            booking_url: default_booking_url(),
        }
    }
}

impl PersonaConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let persona: Self = serde_json::from_str(json)?;
        persona.validate()?;
        Ok(persona)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read persona file {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("invalid persona file {}", path.display()))
    }

    /// Built-in persona, file override if given, then an optional booking URL override.
    pub fn load(path: Option<&str>, booking_url: Option<&str>) -> anyhow::Result<Self> {
        let mut persona = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        if let Some(url) = booking_url {
            persona.booking_url = url.to_string();
        }
        persona.validate()?;
        Ok(persona)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.name.trim().is_empty(), "persona name must not be empty");
        anyhow::ensure!(self.max_lines > 0, "persona max_lines must be at least 1");
        anyhow::ensure!(
            self.booking_url.starts_with("http://") || self.booking_url.starts_with("https://"),
            "booking_url must be an http(s) URL, got {:?}",
            self.booking_url
        );
        Ok(())
    }

    /// System prompt fragment shared by the reply generator.
    pub fn to_prompt(&self) -> String {
        let mut lines = vec![format!("You are {}, {}.", self.name, self.role)];
        lines.extend(self.backstory.iter().cloned());
        lines.push(format!("Your style is {}.", self.tone));
        lines.push(format!(
            "Always speak in first person as {}. Never mention that you are an AI.",
            self.name
        ));
        lines.push(format!(
            "Your reply must be short and personal: at most {} lines, always in {}, no matter which language the customer writes in.",
            self.max_lines, self.language
        ));
        lines.join("\n")
    }
}
