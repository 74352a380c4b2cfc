//! Narrative context handed to the story model.

use serde::Serialize;

use super::scene::{ChoiceKey, Scene};

/// Number of prior summaries included in a prompt.
pub const SUMMARY_CHAIN_LEN: usize = 5;

const MAX_PROMPT_ITEMS: usize = 10;

/// The player facts a generator may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerContext {
    /// Current health.
    pub health: i32,
    /// Health ceiling.
    pub max_health: i32,
    /// Gold carried.
    pub gold: i32,
    /// Experience points.
    pub xp: i32,
    /// Derived level.
    pub level: u32,
    /// Items carried, oldest first.
    pub items: Vec<String>,
    /// Summaries of recently traversed scenes, oldest first.
    pub recent_summaries: Vec<String>,
}

/// How much trouble the player is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrisisLevel {
    /// Healthy and well supplied.
    Thriving,
    /// Doing fine.
    Stable,
    /// One serious problem.
    Struggling,
    /// Several serious problems.
    Desperate,
    /// One bad choice from death.
    Critical,
}

impl CrisisLevel {
    /// Classifies a player.
    #[must_use]
    pub fn assess(player: &PlayerContext) -> Self {
        let ratio = f64::from(player.health) / f64::from(player.max_health.max(1));
        if ratio <= 0.25 {
            Self::Critical
        } else if ratio <= 0.4 && player.gold <= 5 {
            Self::Desperate
        } else if ratio <= 0.5 || player.gold <= 5 {
            Self::Struggling
        } else if ratio >= 0.7 && player.gold >= 20 {
            Self::Stable
        } else {
            Self::Thriving
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Thriving => "THRIVING",
            Self::Stable => "STABLE",
            Self::Struggling => "STRUGGLING",
            Self::Desperate => "DESPERATE",
            Self::Critical => "CRITICAL",
        }
    }

    fn guidance(self) -> &'static str {
        match self {
            Self::Critical => {
                "SURVIVAL MODE: the player is in mortal danger. Make one choice a desperate \
                 gamble (health -20 to -40, large reward) and the other a costly but safer retreat."
            }
            Self::Desperate => {
                "DESPERATION MODE: several threats press at once. Choices should demand hard \
                 compromises; show the weight of earlier decisions."
            }
            Self::Struggling => {
                "CHALLENGE MODE: present manageable risks with fair rewards and a path to \
                 recovery that requires sacrifice."
            }
            Self::Stable => {
                "GROWTH MODE: offer opportunities for advancement and chances to help others."
            }
            Self::Thriving => {
                "POWER MODE: the player is strong. Offer temptations and choices whose \
                 consequences reach beyond the player."
            }
        }
    }
}

fn health_status(player: &PlayerContext) -> &'static str {
    match player.health {
        h if h <= 30 => "CRITICAL - near death",
        h if h <= 60 => "LOW - badly injured",
        _ => "GOOD - healthy",
    }
}

fn gold_status(player: &PlayerContext) -> &'static str {
    match player.gold {
        g if g <= 5 => "POOR - cannot afford basic items",
        g if g <= 20 => "STRUGGLING - limited purchasing power",
        _ => "WEALTHY - can afford most things",
    }
}

/// A prompt ready to send to a story model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPrompt {
    /// Standing instructions, including the required output schema.
    pub system: String,
    /// The situation to continue from.
    pub user: String,
}

const SYSTEM_PROMPT: &str = r##"You write scenes for a branching fantasy adventure.
Reply with a single JSON object and nothing else, matching exactly:
{
  "title": string (at most 80 characters),
  "description": string (2-3 sentences, use \n between lines, at most 600 characters),
  "summary": string (one sentence describing what just happened),
  "backgroundColor": string ("#RRGGBB" hex colour matching the mood),
  "choiceA": { "text": string (at most 80 characters), "statDelta": { "health": int, "gold": int, "xp": int, "item": optional string } },
  "choiceB": { "text": string (at most 80 characters), "statDelta": { "health": int, "gold": int, "xp": int, "item": optional string } }
}
Bounds: health -50..50, gold -20..50, xp 0..50. The two choices must feel meaningfully different."##;

impl StoryPrompt {
    /// Builds the prompt for continuing from `origin` along `key`.
    #[must_use]
    pub fn build(origin: &Scene, key: ChoiceKey, player: &PlayerContext) -> Self {
        let crisis = CrisisLevel::assess(player);
        let chosen = &origin.choice(key).text;

        let skip = player.items.len().saturating_sub(MAX_PROMPT_ITEMS);
        let items: Vec<&str> = player.items.iter().skip(skip).map(String::as_str).collect();
        let items = if items.is_empty() {
            "none".to_owned()
        } else {
            items.join(", ")
        };

        let mut lines = vec![
            format!("PREVIOUS SCENE: {}", origin.title),
            format!("PLAYER CHOSE: {chosen}"),
            String::new(),
            "PLAYER STATE:".to_owned(),
            format!("Crisis Level: {}", crisis.label()),
            format!(
                "Health: {}/{} ({})",
                player.health,
                player.max_health,
                health_status(player)
            ),
            format!("Gold: {} ({})", player.gold, gold_status(player)),
            format!("Level: {} (XP: {})", player.level, player.xp),
            format!("Items: {items}"),
        ];

        let skip = player.recent_summaries.len().saturating_sub(SUMMARY_CHAIN_LEN);
        let story: Vec<&String> = player.recent_summaries.iter().skip(skip).collect();
        if !story.is_empty() {
            lines.push(String::new());
            lines.push("STORY SO FAR:".to_owned());
            lines.extend(story.into_iter().map(|summary| format!("- {summary}")));
        }

        lines.push(String::new());
        lines.push(crisis.guidance().to_owned());
        lines.push(format!(
            "Write the scene the player arrives in after choosing \"{chosen}\"."
        ));
        let user = lines.join("\n");

        Self {
            system: SYSTEM_PROMPT.to_owned(),
            user,
        }
    }
}
