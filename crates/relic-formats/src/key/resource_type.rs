//! Resource type codes

use std::fmt;

macro_rules! resource_types {
    ($($variant:ident = $code:literal, $ext:literal, $category:literal;)*) => {
        /// Type of a resource, as stored in the KEY index and archive tables
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ResourceType {
            $(
                #[doc = concat!("`.", $ext, "` (", $category, ")")]
                $variant,
            )*
            /// Any code without a known meaning
            Unknown(u16),
        }

        impl ResourceType {
            /// Map a raw type code
            pub const fn from_code(code: u16) -> Self {
                match code {
                    $($code => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            /// Raw type code
            pub const fn code(self) -> u16 {
                match self {
                    $(Self::$variant => $code,)*
                    Self::Unknown(code) => code,
                }
            }

            /// File extension without the dot
            pub const fn extension(self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($ext),)*
                    Self::Unknown(_) => None,
                }
            }

            /// Category name used when grouping resources
            pub const fn category(self) -> &'static str {
                match self {
                    $(Self::$variant => $category,)*
                    Self::Unknown(_) => "unknown",
                }
            }
        }
    };
}

resource_types! {
    Bitmap = 0x001, "bmp", "Bitmaps";
    Movie = 0x002, "mve", "Movies";
    Audio = 0x004, "wav", "Audio";
    WaveFx = 0x005, "wfx", "Wave FX";
    PaperDoll = 0x006, "plt", "Paper Dolls";
    Animation = 0x3e8, "bam", "Animations";
    Map = 0x3e9, "wed", "Maps";
    Control = 0x3ea, "chu", "Controls";
    Tiles = 0x3eb, "tis", "Tiles";
    Gui = 0x3ec, "mos", "GUIs";
    Item = 0x3ed, "itm", "Items";
    Spell = 0x3ee, "spl", "Spells";
    CompiledScript = 0x3ef, "bcs", "Compiled Scripts";
    Ids = 0x3f0, "ids", "IDs";
    Creature = 0x3f1, "cre", "Creatures";
    Area = 0x3f2, "are", "Areas";
    Dialog = 0x3f3, "dlg", "Dialogs";
    Ruleset = 0x3f4, "2da", "Rulesets";
    SaveGame = 0x3f5, "gam", "Save games";
    Store = 0x3f6, "sto", "Stores";
    WorldMap = 0x3f7, "wmp", "World maps";
    Effect = 0x3f8, "eff", "Effects";
    SpellEffect = 0x3fb, "vvc", "Spell Effects";
    Projectile = 0x3fd, "pro", "Projectiles";
}

impl ResourceType {
    /// Look a type up by its extension, ignoring case
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        (0..=0x3ff)
            .map(Self::from_code)
            .find(|ty| ty.extension() == Some(ext.as_str()))
    }
}

impl From<u16> for ResourceType {
    fn from(code: u16) -> Self {
        Self::from_code(code)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.extension() {
            Some(ext) => f.write_str(ext),
            None => write!(f, "{:#06x}", self.code()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(ResourceType::from_code(2), ResourceType::Movie);
        assert_eq!(ResourceType::Movie.extension(), Some("mve"));
        assert_eq!(ResourceType::from_code(1003).category(), "Tiles");
        assert_eq!(ResourceType::SpellEffect.code(), 1019);
        assert_eq!(ResourceType::Projectile.code(), 1021);
    }

    #[test]
    fn test_unknown_code() {
        let ty = ResourceType::from_code(0x3fc);
        assert_eq!(ty, ResourceType::Unknown(0x3fc));
        assert_eq!(ty.category(), "unknown");
        assert_eq!(ty.extension(), None);
        assert_eq!(ty.to_string(), "0x03fc");
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(
            ResourceType::from_extension("MVE"),
            Some(ResourceType::Movie)
        );
        assert_eq!(
            ResourceType::from_extension(".2da"),
            Some(ResourceType::Ruleset)
        );
        assert_eq!(ResourceType::from_extension("txt"), None);
    }
}
