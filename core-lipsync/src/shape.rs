//! Mouth shapes and the character classification table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse mouth-shape category shown by the avatar.
///
/// Both timeline producers map into this enum, so the synchronizer never
/// needs to know where a timeline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthShape {
    /// Lips together (rest pose, /b/ /p/ /m/)
    #[default]
    Closed,
    /// Half open (/f/ /v/ and most consonants)
    Mid,
    /// Wide open (vowels)
    Open,
}

impl MouthShape {
    /// Classify one spoken character, case-insensitively.
    ///
    /// Whitespace is not a shape; callers skip it before classifying.
    pub fn for_char(c: char) -> MouthShape {
        let lower = c.to_lowercase().next().unwrap_or(c);

        match lower {
            // Vowels, including accented Portuguese ones
            'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'â' | 'ê' | 'ô' | 'ã'
            | 'õ' => MouthShape::Open,

            // Bilabial: lips together
            'b' | 'p' | 'm' => MouthShape::Closed,

            // Labiodental: teeth on lip
            'f' | 'v' => MouthShape::Mid,

            // Everything else is a slight opening
            _ => MouthShape::Mid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MouthShape::Closed => "closed",
            MouthShape::Mid => "mid",
            MouthShape::Open => "open",
        }
    }
}

impl fmt::Display for MouthShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
