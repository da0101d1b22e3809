/*!
 * Emotion labels and face-likelihood scoring.
 *
 * This module defines the fixed label set produced by the classification
 * pipeline and the logic that turns a detected face's per-emotion likelihood
 * scores into a single dominant label.
 */

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Emotion label produced by the classification pipeline
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    // @label: Joy
    Joy,
    // @label: Sorrow
    Sorrow,
    // @label: Anger
    Anger,
    // @label: Surprise
    Surprise,
    // @label: Neutral, the fallback when no face or no signal is available
    #[default]
    Neutral,
}

impl Emotion {
    // @returns: Lowercase label identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Joy => "joy".to_string(),
            Self::Sorrow => "sorrow".to_string(),
            Self::Anger => "anger".to_string(),
            Self::Surprise => "surprise".to_string(),
            Self::Neutral => "neutral".to_string(),
        }
    }

    /// Whether this label carries a usable emotional signal for prompting
    pub fn is_specific(&self) -> bool {
        !matches!(self, Self::Neutral)
    }
}

// Implement Display trait for Emotion
impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for Emotion
impl std::str::FromStr for Emotion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "joy" => Ok(Self::Joy),
            "sorrow" => Ok(Self::Sorrow),
            "anger" => Ok(Self::Anger),
            "surprise" => Ok(Self::Surprise),
            "neutral" => Ok(Self::Neutral),
            _ => Err(anyhow!("Invalid emotion label: {}", s)),
        }
    }
}

/// Likelihood scale reported by the face detection backend
///
/// Mirrors the Google Cloud Vision `Likelihood` enumeration; the ordinal
/// position doubles as the comparison score.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

impl Likelihood {
    // @returns: Ordinal score used for dominant-emotion comparison
    pub fn score(&self) -> u8 {
        *self as u8
    }
}

/// Per-emotion likelihoods reported for a single detected face
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnnotation {
    /// Likelihood that the face expresses joy
    #[serde(default)]
    pub joy_likelihood: Likelihood,

    /// Likelihood that the face expresses sorrow
    #[serde(default)]
    pub sorrow_likelihood: Likelihood,

    /// Likelihood that the face expresses anger
    #[serde(default)]
    pub anger_likelihood: Likelihood,

    /// Likelihood that the face expresses surprise
    #[serde(default)]
    pub surprise_likelihood: Likelihood,
}

impl FaceAnnotation {
    /// Build an annotation from the four likelihoods in label order
    pub fn new(joy: Likelihood, sorrow: Likelihood, anger: Likelihood, surprise: Likelihood) -> Self {
        Self {
            joy_likelihood: joy,
            sorrow_likelihood: sorrow,
            anger_likelihood: anger,
            surprise_likelihood: surprise,
        }
    }
}

/// Pick the dominant emotion for a detected face.
///
/// Scans the four scored labels in declaration order (joy, sorrow, anger,
/// surprise) and only replaces the current best on a strictly greater score,
/// so ties resolve to the earlier label. The tie-break is deliberate and part
/// of the published behavior.
pub fn dominant_emotion(face: &FaceAnnotation) -> Emotion {
    let scored = [
        (Emotion::Joy, face.joy_likelihood),
        (Emotion::Sorrow, face.sorrow_likelihood),
        (Emotion::Anger, face.anger_likelihood),
        (Emotion::Surprise, face.surprise_likelihood),
    ];

    let mut best = scored[0];
    for candidate in &scored[1..] {
        if candidate.1.score() > best.1.score() {
            best = *candidate;
        }
    }
    best.0
}
