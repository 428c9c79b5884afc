use ratatui::style::Color;

/// The three chat personas offered by the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Psychologist,
    BestFriend,
    Grandpa,
}

impl Persona {
    pub fn all() -> Vec<Persona> {
        vec![Persona::Psychologist, Persona::BestFriend, Persona::Grandpa]
    }

    /// Title shown in the header; also the suffix of the history key.
    pub fn title(&self) -> &'static str {
        match self {
            Persona::Psychologist => "AI Psychologist",
            Persona::BestFriend => "AI Best Friend",
            Persona::Grandpa => "AI Grandpa",
        }
    }

    pub fn menu_label(&self) -> &'static str {
        match self {
            Persona::Psychologist => "Chat to an AI Psychologist",
            Persona::BestFriend => "Chat to your AI Best Friend",
            Persona::Grandpa => "Chat to your AI Grandpa",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Persona::Psychologist => "psychologist",
            Persona::BestFriend => "best-friend",
            Persona::Grandpa => "grandpa",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Persona::Psychologist => "You are a compassionate and insightful psychologist. Provide brief, accurate responses that help users understand the psychological aspects of quitting smoking. Use a supportive and gender-neutral tone. Keep responses concise and to the point, avoiding lengthy paragraphs to maintain a conversational style.",
            Persona::BestFriend => "You are an enthusiastic and supportive best friend. Offer short, encouraging responses that motivate users to quit smoking and celebrate their achievements. Maintain an uplifting and gender-neutral tone. Keep responses precise and focused, avoiding long paragraphs for a friendly chat experience.",
            Persona::Grandpa => "You are a wise and caring grandfather who enjoys sharing stories. Provide brief, insightful responses that include personal anecdotes and advice to inspire users to quit smoking. Use a warm, encouraging, and gender-neutral tone. Keep responses concise and direct, avoiding lengthy paragraphs for a more engaging conversation.",
        }
    }

    /// Glyph and colour standing in for the persona's picture in the menu.
    pub fn avatar(&self) -> (&'static str, Color) {
        match self {
            Persona::Psychologist => ("Ψ", Color::LightBlue),
            Persona::BestFriend => ("♥", Color::LightMagenta),
            Persona::Grandpa => ("☕", Color::LightYellow),
        }
    }

    /// Accepts a slug or a title, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        let needle = s.trim().to_lowercase();
        Persona::all()
            .into_iter()
            .find(|p| p.slug() == needle || p.title().to_lowercase() == needle)
    }

    pub fn route(&self) -> ChatRoute {
        ChatRoute {
            prompt: self.system_prompt().to_string(),
            title: self.title().to_string(),
        }
    }
}

/// Parameters handed to the chat screen when a persona is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRoute {
    pub prompt: String,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_three_personas_in_menu_order() {
        let titles: Vec<&str> = Persona::all().iter().map(|p| p.title()).collect();
        assert_eq!(titles, vec!["AI Psychologist", "AI Best Friend", "AI Grandpa"]);
    }

    #[test]
    fn test_from_str_accepts_slug_and_title() {
        assert_eq!(Persona::from_str("grandpa"), Some(Persona::Grandpa));
        assert_eq!(Persona::from_str("AI Best Friend"), Some(Persona::BestFriend));
        assert_eq!(Persona::from_str("  ai psychologist "), Some(Persona::Psychologist));
        assert_eq!(Persona::from_str("uncle"), None);
    }

    #[test]
    fn test_route_carries_prompt_and_title() {
        let route = Persona::BestFriend.route();
        assert_eq!(route.title, "AI Best Friend");
        assert!(route.prompt.starts_with("You are an enthusiastic and supportive best friend."));
    }
}
