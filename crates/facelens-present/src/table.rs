//! Emotion icon tables
//!
//! The engine reports an emotion category as an index; each expression model
//! has a fixed table mapping that index to an icon.

use std::fmt;

/// Icon shown in an expression panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmotionIcon {
    Anger,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
    Positive,
    Negative,
}

impl EmotionIcon {
    pub fn as_str(self) -> &'static str {
        match self {
            EmotionIcon::Anger => "anger",
            EmotionIcon::Disgust => "disgust",
            EmotionIcon::Fear => "fear",
            EmotionIcon::Happy => "happy",
            EmotionIcon::Sad => "sad",
            EmotionIcon::Surprise => "surprise",
            EmotionIcon::Neutral => "neutral",
            EmotionIcon::Positive => "positive",
            EmotionIcon::Negative => "negative",
        }
    }
}

impl fmt::Display for EmotionIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Basic expression model, indexed 0..=6
pub const BASIC_EMOTIONS: [EmotionIcon; 7] = [
    EmotionIcon::Anger,
    EmotionIcon::Disgust,
    EmotionIcon::Fear,
    EmotionIcon::Happy,
    EmotionIcon::Sad,
    EmotionIcon::Surprise,
    EmotionIcon::Neutral,
];

/// Valence expression model, indexed 0..=2
pub const VALENCE_EMOTIONS: [EmotionIcon; 3] = [
    EmotionIcon::Positive,
    EmotionIcon::Negative,
    EmotionIcon::Neutral,
];

/// Which table an expression panel draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionModel {
    Basic,
    Valence,
}

impl ExpressionModel {
    pub fn table(self) -> &'static [EmotionIcon] {
        match self {
            ExpressionModel::Basic => &BASIC_EMOTIONS,
            ExpressionModel::Valence => &VALENCE_EMOTIONS,
        }
    }

    /// Icon for an engine-reported index, `None` if outside the table
    pub fn icon(self, index: usize) -> Option<EmotionIcon> {
        self.table().get(index).copied()
    }

    pub(crate) fn index_field(self) -> &'static str {
        match self {
            ExpressionModel::Basic => "basic.emotion_index",
            ExpressionModel::Valence => "valence.emotion_index",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes() {
        assert_eq!(ExpressionModel::Basic.table().len(), 7);
        assert_eq!(ExpressionModel::Valence.table().len(), 3);
    }

    #[test]
    fn test_icon_lookup() {
        assert_eq!(ExpressionModel::Basic.icon(3), Some(EmotionIcon::Happy));
        assert_eq!(ExpressionModel::Basic.icon(6), Some(EmotionIcon::Neutral));
        assert_eq!(ExpressionModel::Basic.icon(7), None);
        assert_eq!(ExpressionModel::Valence.icon(0), Some(EmotionIcon::Positive));
        assert_eq!(ExpressionModel::Valence.icon(3), None);
    }
}
