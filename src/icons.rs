//! Icon keys used by site content. Lookup is case-insensitive and never fails.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Icon {
    Flame,
    Heart,
    Music,
    Palette,
    Users,
    Tent,
    Sun,
    Moon,
    Star,
    Calendar,
    MapPin,
    Camera,
    Gift,
    Leaf,
    Mountain,
    Hammer,
    Sparkles,
    Shield,
    Mail,
    Circle,
}

impl Icon {
    /// Returned for unknown or empty keys.
    pub const DEFAULT: Icon = Icon::Circle;

    const TABLE: &'static [(&'static str, Icon)] = &[
        ("flame", Icon::Flame),
        ("fire", Icon::Flame),
        ("heart", Icon::Heart),
        ("music", Icon::Music),
        ("palette", Icon::Palette),
        ("art", Icon::Palette),
        ("users", Icon::Users),
        ("community", Icon::Users),
        ("tent", Icon::Tent),
        ("sun", Icon::Sun),
        ("moon", Icon::Moon),
        ("star", Icon::Star),
        ("calendar", Icon::Calendar),
        ("events", Icon::Calendar),
        ("map-pin", Icon::MapPin),
        ("location", Icon::MapPin),
        ("camera", Icon::Camera),
        ("gift", Icon::Gift),
        ("donate", Icon::Gift),
        ("leaf", Icon::Leaf),
        ("mountain", Icon::Mountain),
        ("hammer", Icon::Hammer),
        ("build", Icon::Hammer),
        ("sparkles", Icon::Sparkles),
        ("shield", Icon::Shield),
        ("mail", Icon::Mail),
        ("circle", Icon::Circle),
    ];

    pub fn name(&self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, icon)| icon == self)
            .map(|(name, _)| *name)
            .unwrap_or("circle")
    }
}

pub fn lookup(key: &str) -> Icon {
    let key = key.trim();
    if key.is_empty() {
        return Icon::DEFAULT;
    }
    Icon::TABLE
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, icon)| *icon)
        .unwrap_or(Icon::DEFAULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_key_resolves() {
        assert_eq!(lookup("flame"), Icon::Flame);
        assert_eq!(lookup("map-pin"), Icon::MapPin);
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(lookup("FLAME"), lookup("flame"));
        assert_eq!(lookup(" Palette "), Icon::Palette);
    }

    #[test]
    fn unknown_and_empty_fall_back() {
        assert_eq!(lookup("unicorn"), Icon::DEFAULT);
        assert_eq!(lookup(""), Icon::DEFAULT);
        assert_eq!(lookup("   "), Icon::DEFAULT);
    }

    #[test]
    fn name_is_canonical_key() {
        assert_eq!(Icon::Flame.name(), "flame");
        assert_eq!(lookup("fire").name(), "flame");
    }
}
