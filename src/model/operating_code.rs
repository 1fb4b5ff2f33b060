//! Operating code: the user's standing rules.

use serde::{Deserialize, Serialize};

/// Principles every new account starts with.
pub const DEFAULT_PRINCIPLES: [&str; 7] = [
    "I do not negotiate with comfort. Comfort is the enemy of progress.",
    "I show up every single day regardless of how I feel.",
    "I take 10X action on everything I commit to.",
    "I refuse to make excuses. Results or reasons—never both.",
    "I protect my time like it's my most valuable asset—because it is.",
    "I invest in myself before I invest in anything else.",
    "I burn the boats. There is no Plan B.",
];

/// The default principle list as owned strings.
#[must_use]
pub fn default_principles() -> Vec<String> {
    DEFAULT_PRINCIPLES.iter().map(|p| (*p).to_string()).collect()
}

/// Standing principles plus three free-text commitment fields.
///
/// The commitment fields here are separate from the per-day ones on
/// [`DailyPlan`](super::DailyPlan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingCode {
    #[serde(default = "default_principles")]
    pub principles: Vec<String>,
    #[serde(default)]
    pub daily_sacrifice: String,
    #[serde(default)]
    pub daily_commitment: String,
    #[serde(default)]
    pub comfort_refused: String,
}

impl Default for OperatingCode {
    fn default() -> Self {
        Self {
            principles: default_principles(),
            daily_sacrifice: String::new(),
            daily_commitment: String::new(),
            comfort_refused: String::new(),
        }
    }
}

/// Partial update for the [`OperatingCode`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatingCodePatch {
    pub principles: Option<Vec<String>>,
    pub daily_sacrifice: Option<String>,
    pub daily_commitment: Option<String>,
    pub comfort_refused: Option<String>,
}

impl OperatingCodePatch {
    /// Whether the patch carries no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge this patch over `code`.
    pub fn apply_to(&self, code: &mut OperatingCode) {
        if let Some(v) = &self.principles {
            code.principles.clone_from(v);
        }
        if let Some(v) = &self.daily_sacrifice {
            code.daily_sacrifice.clone_from(v);
        }
        if let Some(v) = &self.daily_commitment {
            code.daily_commitment.clone_from(v);
        }
        if let Some(v) = &self.comfort_refused {
            code.comfort_refused.clone_from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_seven_principles() {
        let code = OperatingCode::default();
        assert_eq!(code.principles.len(), 7);
        assert!(code.daily_sacrifice.is_empty());
    }

    #[test]
    fn test_patch_keeps_untouched_fields() {
        let mut code = OperatingCode::default();
        OperatingCodePatch {
            daily_commitment: Some("ship daily".into()),
            ..OperatingCodePatch::default()
        }
        .apply_to(&mut code);
        assert_eq!(code.daily_commitment, "ship daily");
        assert_eq!(code.principles.len(), 7);
    }
}
