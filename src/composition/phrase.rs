use serde::{Deserialize, Serialize};

/// Musical-form position: groups bars into 4, 8, or 16-bar phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseDetector {
    bars_per_phrase: u32,
}

impl Default for PhraseDetector {
    fn default() -> Self {
        Self { bars_per_phrase: 4 }
    }
}

impl PhraseDetector {
    /// Create a detector. The phrase length snaps to the nearest of
    /// 4, 8, or 16 bars.
    pub fn new(bars_per_phrase: u32) -> Self {
        let mut d = Self::default();
        d.set_bars_per_phrase(bars_per_phrase);
        d
    }

    pub fn set_bars_per_phrase(&mut self, bars: u32) {
        self.bars_per_phrase = if bars <= 5 {
            4
        } else if bars <= 11 {
            8
        } else {
            16
        };
    }

    #[inline]
    pub fn bars_per_phrase(&self) -> u32 {
        self.bars_per_phrase
    }

    /// Whether `bar` is the last bar of its phrase.
    #[inline]
    pub fn is_phrase_end(&self, bar: u32) -> bool {
        bar % self.bars_per_phrase == self.bars_per_phrase - 1
    }

    /// Position of `bar` inside its phrase, 0-based.
    #[inline]
    pub fn phrase_position(&self, bar: u32) -> u32 {
        bar % self.bars_per_phrase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_end_detection() {
        let d = PhraseDetector::new(4);
        assert!(!d.is_phrase_end(0));
        assert!(!d.is_phrase_end(2));
        assert!(d.is_phrase_end(3));
        assert!(d.is_phrase_end(7));
        assert!(d.is_phrase_end(11));
    }

    #[test]
    fn test_phrase_position() {
        let d = PhraseDetector::new(8);
        assert_eq!(d.phrase_position(0), 0);
        assert_eq!(d.phrase_position(7), 7);
        assert_eq!(d.phrase_position(8), 0);
        assert_eq!(d.phrase_position(19), 3);
    }

    #[test]
    fn test_length_snaps_to_allowed_values() {
        assert_eq!(PhraseDetector::new(0).bars_per_phrase(), 4);
        assert_eq!(PhraseDetector::new(4).bars_per_phrase(), 4);
        assert_eq!(PhraseDetector::new(6).bars_per_phrase(), 8);
        assert_eq!(PhraseDetector::new(8).bars_per_phrase(), 8);
        assert_eq!(PhraseDetector::new(12).bars_per_phrase(), 16);
        assert_eq!(PhraseDetector::new(16).bars_per_phrase(), 16);
        assert_eq!(PhraseDetector::new(99).bars_per_phrase(), 16);
    }
}
