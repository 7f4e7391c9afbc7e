use std::fmt;

use serde::Serialize;

/// Square edge length of the classifier input.
pub const INPUT_SIZE: usize = 224;

/// Output labels of the five-class model, in output-index order.
// 0: drawings (safe)
// 1: hentai (explicit)
// 2: neutral (safe)
// 3: porn (explicit)
// 4: sexy (explicit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NsfwClass {
    Drawings,
    Hentai,
    Neutral,
    Porn,
    Sexy,
}

impl NsfwClass {
    pub const ALL: [NsfwClass; 5] = [
        NsfwClass::Drawings,
        NsfwClass::Hentai,
        NsfwClass::Neutral,
        NsfwClass::Porn,
        NsfwClass::Sexy,
    ];

    /// Classes whose probabilities make up the NSFW score.
    pub const EXPLICIT: [NsfwClass; 3] = [NsfwClass::Hentai, NsfwClass::Porn, NsfwClass::Sexy];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NsfwClass::Drawings => "drawings",
            NsfwClass::Hentai => "hentai",
            NsfwClass::Neutral => "neutral",
            NsfwClass::Porn => "porn",
            NsfwClass::Sexy => "sexy",
        }
    }

    pub fn is_explicit(self) -> bool {
        matches!(self, NsfwClass::Hentai | NsfwClass::Porn | NsfwClass::Sexy)
    }
}

impl fmt::Display for NsfwClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_follow_output_order() {
        let labels: Vec<_> = NsfwClass::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(labels, ["drawings", "hentai", "neutral", "porn", "sexy"]);
        for (i, class) in NsfwClass::ALL.iter().enumerate() {
            assert_eq!(class.index(), i);
        }
    }

    #[test]
    fn explicit_classes() {
        let explicit: Vec<_> = NsfwClass::ALL
            .into_iter()
            .filter(|c| c.is_explicit())
            .collect();
        assert_eq!(explicit, NsfwClass::EXPLICIT);
    }

    #[test]
    fn serializes_as_label() {
        assert_eq!(serde_json::to_string(&NsfwClass::Porn).unwrap(), "\"porn\"");
    }
}
