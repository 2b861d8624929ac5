//! Matching configuration
//!
//! Threshold literals are empirically chosen (no documented derivation);
//! they are exposed here so callers can tune them, but the defaults match
//! the values the engine was calibrated with.

/// Tier weights for a label hierarchy: immediate, group, section.
pub const TIER_WEIGHTS: [f32; 3] = [1.0, 0.3, 0.1];

/// Configuration for the contextual match engine and the fill pass.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Minimum final score for a candidate to survive (non-file controls).
    pub threshold: f32,
    /// Lower acceptance threshold for file-upload controls, which rarely
    /// carry conventional labels.
    pub file_threshold: f32,
    /// Minimum option score for select fills and containment acceptance.
    pub select_threshold: f32,
    /// Hierarchy tier weights, most specific first.
    pub tier_weights: [f32; 3],
    /// Words dropped before contextual combination coverage checks.
    pub stopwords: Vec<String>,
    /// Tokens that mark a control as upload-related.
    pub upload_keywords: Vec<String>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            file_threshold: 0.5,
            select_threshold: 0.7,
            tier_weights: TIER_WEIGHTS,
            stopwords: [
                "section",
                "form",
                "information",
                "details",
                "personal",
                "please",
                "enter",
                "provide",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            upload_keywords: [
                "resume", "cv", "upload", "file", "document", "attach", "drag", "drop", "pdf",
                "doc", "docx", "browse",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl MatchConfig {
    /// Acceptance threshold for a control, by whether it is a file input.
    pub fn threshold_for(&self, is_file: bool) -> f32 {
        if is_file {
            self.file_threshold
        } else {
            self.threshold
        }
    }
}
