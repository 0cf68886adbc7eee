use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Language {
    #[default]
    English,
    Bangla,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Bangla];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Bangla => "Bangla",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "bangla" | "bengali" | "bn" => Ok(Self::Bangla),
            _ => Err("language must be one of: english, bangla".to_string()),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::English => Self::Bangla,
            Self::Bangla => Self::English,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
