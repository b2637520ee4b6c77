use serde::{Deserialize, Serialize};

use super::stats::{Stat, StatVector};

/// Body colour palette
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeingColor {
    #[default]
    Primary,
    Accent,
    Blue,
    Green,
}

impl BeingColor {
    pub fn display_name(&self) -> &str {
        match self {
            BeingColor::Primary => "Purple",
            BeingColor::Accent => "Pink",
            BeingColor::Blue => "Blue",
            BeingColor::Green => "Green",
        }
    }
}

impl std::fmt::Display for BeingColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BeingColor::Primary => write!(f, "primary"),
            BeingColor::Accent => write!(f, "accent"),
            BeingColor::Blue => write!(f, "blue"),
            BeingColor::Green => write!(f, "green"),
        }
    }
}

impl std::str::FromStr for BeingColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "primary" | "purple" => Ok(BeingColor::Primary),
            "accent" | "pink" => Ok(BeingColor::Accent),
            "blue" => Ok(BeingColor::Blue),
            "green" => Ok(BeingColor::Green),
            _ => Err(anyhow::anyhow!("Unknown color: {}", s)),
        }
    }
}

/// The virtual pet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Being {
    pub name: String,
    /// Free text handed to the reply generator
    pub personality: String,
    pub color: BeingColor,
    pub stats: StatVector,
    /// Generated portrait; the form placeholder is shown while absent
    pub image_url: Option<String>,
    /// Only meaningful once the terminal stage has been reached
    pub actions_since_final_evolution: u32,
}

impl Default for Being {
    fn default() -> Self {
        Being::with_color(BeingColor::default())
    }
}

impl Being {
    pub fn with_color(color: BeingColor) -> Self {
        Being {
            name: Form::Chick.name().to_string(),
            personality: Form::Chick.personality().to_string(),
            color,
            stats: StatVector::initial(),
            image_url: None,
            actions_since_final_evolution: 0,
        }
    }

    pub fn stat(&self, stat: Stat) -> i32 {
        self.stats.get(stat)
    }

    /// Take on the identity of `form`, dropping the portrait of the old one.
    pub fn assume_form(&mut self, form: Form) {
        self.name = form.name().to_string();
        self.personality = form.personality().to_string();
        self.image_url = None;
    }

    /// Stored image, or the placeholder for the current form.
    pub fn display_image<'a>(&'a self, form: &Form) -> &'a str {
        self.image_url.as_deref().unwrap_or(form.placeholder())
    }

    /// Greeting spoken by a freshly hatched being
    pub fn greeting(&self) -> String {
        format!("こんにちは！ぼく、{}だよ。これからよろしくね！", self.name)
    }
}

/// Ordinal lifecycle milestone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Stage {
    #[default]
    Hatchling = 0,
    Adolescent = 1,
    Terminal = 2,
}

impl TryFrom<u8> for Stage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Stage::Hatchling),
            1 => Ok(Stage::Adolescent),
            2 => Ok(Stage::Terminal),
            other => Err(format!("invalid evolution stage: {}", other)),
        }
    }
}

impl From<Stage> for u8 {
    fn from(stage: Stage) -> u8 {
        stage as u8
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Hatchling => write!(f, "hatchling"),
            Stage::Adolescent => write!(f, "adolescent"),
            Stage::Terminal => write!(f, "terminal"),
        }
    }
}

/// Branch chosen on reaching the terminal stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvolutionType {
    King,
    Queen,
}

impl std::fmt::Display for EvolutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvolutionType::King => write!(f, "king"),
            EvolutionType::Queen => write!(f, "queen"),
        }
    }
}

/// Persisted flat next to the being as `evolutionStage`, `evolutionType`
/// and `sleepCount`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionState {
    #[serde(rename = "evolutionStage", default)]
    pub stage: Stage,
    #[serde(rename = "evolutionType", default)]
    pub kind: Option<EvolutionType>,
    #[serde(rename = "sleepCount", default)]
    pub sleep_count: u32,
}

impl EvolutionState {
    pub fn form(&self) -> Form {
        match (self.stage, self.kind) {
            (Stage::Hatchling, _) => Form::Chick,
            (Stage::Adolescent, _) => Form::Chicken,
            (Stage::Terminal, Some(EvolutionType::Queen)) => Form::Queen,
            (Stage::Terminal, _) => Form::King,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage == Stage::Terminal
    }
}

/// Stage identity: name, personality and artwork
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Form {
    Chick,
    Chicken,
    King,
    Queen,
}

impl Form {
    pub fn name(&self) -> &'static str {
        match self {
            Form::Chick => "ぴよちゃん",
            Form::Chicken => "コケこっこ",
            Form::King => "ニワトリキング",
            Form::Queen => "ニワトリクイーン",
        }
    }

    pub fn personality(&self) -> &'static str {
        match self {
            Form::Chick => "元気いっぱいのひよこ。おしゃべりと探検が大好き！",
            Form::Chicken => "りっぱなニワトリに成長した！自信に満ちあふれている。",
            Form::King => "威厳あふれるニワトリの王。風格が漂う。",
            Form::Queen => "優雅で気品のあるニワトリの女王。みんなに優しい。",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            Form::Chick => "https://placehold.co/250x250.png",
            Form::Chicken => "https://placehold.co/300x300.png",
            Form::King | Form::Queen => "https://placehold.co/350x350.png",
        }
    }

    /// Default prompt for a new portrait
    pub fn image_prompt(&self) -> &'static str {
        match self {
            Form::Chick => "A cute, fluffy yellow chick",
            Form::Chicken => "A proud, majestic chicken",
            Form::King => "A king chicken with a majestic crown",
            Form::Queen => "A queen chicken with a beautiful tiara",
        }
    }

    pub fn emoji(&self) -> &str {
        match self {
            Form::Chick => "🐣",
            Form::Chicken => "🐔",
            Form::King => "👑",
            Form::Queen => "👸",
        }
    }
}
