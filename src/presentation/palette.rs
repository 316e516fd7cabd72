use serde::Serialize;

/// Colour families a background token can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PaletteKind {
    Forest,
    Twilight,
    Sky,
    Ember,
    Starlight,
}

impl PaletteKind {
    /// Pick a palette by substring match on the scene's background token.
    /// Earlier rules win: a token mentioning both green and purple is Forest.
    pub fn for_background(background: Option<&str>) -> Self {
        let Some(token) = background else {
            return Self::Starlight;
        };
        if token.contains("green") {
            Self::Forest
        } else if token.contains("purple") {
            Self::Twilight
        } else if token.contains("blue") {
            Self::Sky
        } else if token.contains("red") {
            Self::Ember
        } else {
            Self::Starlight
        }
    }

    /// Particle colours, brightest first.
    pub fn colors(&self) -> &'static [&'static str] {
        match self {
            Self::Forest => &["#ffffff", "#34d399", "#10b981", "#059669", "#047857"],
            Self::Twilight => &["#ffffff", "#a78bfa", "#8b5cf6", "#7c3aed", "#6d28d9"],
            Self::Sky => &["#ffffff", "#60a5fa", "#3b82f6", "#2563eb", "#1d4ed8"],
            Self::Ember => &["#ffffff", "#f87171", "#ef4444", "#dc2626", "#b91c1c"],
            Self::Starlight => &["#ffffff", "#fbbf24", "#60a5fa", "#a78bfa", "#f472b6"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_tokens_in_rule_order() {
        let cases = [
            (Some("bg-gradient-to-b from-green-400 to-green-600"), PaletteKind::Forest),
            (Some("from-purple-300 via-pink-300"), PaletteKind::Twilight),
            (Some("from-blue-300 to-green-400"), PaletteKind::Forest),
            (Some("from-indigo-400 to-purple-600"), PaletteKind::Twilight),
            (Some("from-sky-blue"), PaletteKind::Sky),
            (Some("bg-red-900"), PaletteKind::Ember),
            (Some("from-gray-700 to-gray-900"), PaletteKind::Starlight),
            (None, PaletteKind::Starlight),
        ];
        for (token, expected) in cases {
            assert_eq!(PaletteKind::for_background(token), expected, "{token:?}");
        }
    }

    #[test]
    fn every_palette_has_five_colors() {
        for kind in [
            PaletteKind::Forest,
            PaletteKind::Twilight,
            PaletteKind::Sky,
            PaletteKind::Ember,
            PaletteKind::Starlight,
        ] {
            assert_eq!(kind.colors().len(), 5);
            assert_eq!(kind.colors()[0], "#ffffff");
        }
    }
}
