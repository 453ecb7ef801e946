#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ConsoleTab {
    Services,
    Restarts,
    SliderApps,
}

impl ConsoleTab {
    pub const ALL: [Self; 3] = [Self::Services, Self::Restarts, Self::SliderApps];

    pub fn title(self) -> &'static str {
        match self {
            Self::Services => "Services",
            Self::Restarts => "Restarts",
            Self::SliderApps => "Slider Apps",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "svc" | "service" | "services" => Some(Self::Services),
            "rs" | "restart" | "restarts" | "stale" => Some(Self::Restarts),
            "sl" | "slider" | "sliders" | "apps" | "slider-apps" | "sliderapps" => {
                Some(Self::SliderApps)
            }
            _ => None,
        }
    }

    pub fn short_token(self) -> &'static str {
        match self {
            Self::Services => "svc",
            Self::Restarts => "rs",
            Self::SliderApps => "sl",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|tab| *tab == self)
            .unwrap_or_default()
    }
}
