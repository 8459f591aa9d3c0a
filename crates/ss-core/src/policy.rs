//! Command risk classification.
//!
//! Classifies a command string into one of three risk tiers by matching it
//! against a static registry of blocking and caution patterns. Blocking
//! patterns forbid execution outright; caution patterns attach warnings
//! that the user must acknowledge before confirming.
//!
//! Classification is purely textual: it does not execute anything, does not
//! resolve shell aliases or variables, and can be evaded by obfuscation
//! (quoting, `$IFS` tricks, variable expansion). That is a known limitation
//! of the policy, not something this module tries to paper over.

use std::sync::LazyLock;

use regex::Regex;

/// Risk tier for a command, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Safe,
    Caution,
    Dangerous,
}

impl RiskTier {
    /// Machine-readable string for audit logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::Caution => "caution",
            RiskTier::Dangerous => "dangerous",
        }
    }
}

/// Classification result: the tier plus one human-readable reason per
/// matching caution pattern (registry order, duplicates kept).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub tier: RiskTier,
    pub reasons: Vec<String>,
}

impl Verdict {
    /// Reasons joined for single-line display.
    pub fn summary(&self) -> String {
        self.reasons.join(" | ")
    }
}

/// Fixed reason attached to every Dangerous verdict.
pub const BLOCKED_REASON: &str = "blocked: destructive or irreversible operation";

/// Blocking patterns — commands that are never executed.
/// Evaluated first; the first match short-circuits to Dangerous.
const BLOCKING_PATTERNS: &[&str] = &[
    // Root filesystem deletion
    r"rm\s+-rf\s*/\s*$",
    r"rm\s+-rf\s*/\b",
    r"rm\s+-rf\s+/home\s*$",
    r"rm\s+-rf\s+/etc",
    r"rm\s+-rf\s+/usr",
    r"rm\s+-rf\s+/var",
    r"rm\s+-rf\s+/bin",
    r"rm\s+-rf\s+/sbin",
    r"rm\s+-rf\s+/lib",
    r"rm\s+-rf\s+/boot",
    // Raw block-device overwrite
    r"dd\s+.*of=/dev/sd",
    r"dd\s+.*of=/dev/hd",
    r"dd\s+.*of=/dev/nvme",
    // Filesystem creation
    r"mkfs\.",
    // Fork bombs (two common spellings)
    r":\(\)\{\s*:\|:\&\s*\};:",
    r":\(\)\{\s*:\|:\s*&\s*\};:",
    // Explicit safety-rail removal
    r"--no-preserve-root",
    // World-writable / ownership changes on root
    r"chmod\s+(-R\s+)?777\s+/\s*$",
    r"chown\s+-R.*\s+/\s*$",
];

/// Caution patterns — each match contributes its reason to the verdict.
const CAUTION_PATTERNS: &[(&str, &str)] = &[
    (
        r"\bsudo\b",
        "This command requires administrator (sudo) privileges.",
    ),
    (
        r"\brm\s+-rf\b",
        "This will permanently delete files/directories.",
    ),
    (r"\brm\s+-r\b", "This will recursively delete a directory."),
    (
        r"\bcurl\b.*\|\s*(bash|sh)\b",
        "This downloads a script from the internet and runs it directly.",
    ),
    (
        r"\bwget\b.*\|\s*(bash|sh)\b",
        "This downloads a script from the internet and runs it directly.",
    ),
    (r"\bchmod\s+-R\b", "This changes permissions recursively."),
    (r"\bdd\b", "dd can be dangerous if used incorrectly."),
];

static BLOCKING: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLOCKING_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("blocking pattern must compile"))
        .collect()
});

static CAUTION: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    CAUTION_PATTERNS
        .iter()
        .map(|(p, reason)| (Regex::new(p).expect("caution pattern must compile"), *reason))
        .collect()
});

/// Classify a command string by risk tier.
///
/// Blocking patterns are evaluated first and short-circuit; otherwise every
/// matching caution pattern contributes its reason, in registry order.
pub fn classify(command: &str) -> Verdict {
    for pattern in BLOCKING.iter() {
        if pattern.is_match(command) {
            return Verdict {
                tier: RiskTier::Dangerous,
                reasons: vec![BLOCKED_REASON.to_string()],
            };
        }
    }

    let reasons: Vec<String> = CAUTION
        .iter()
        .filter(|(pattern, _)| pattern.is_match(command))
        .map(|(_, reason)| reason.to_string())
        .collect();

    if reasons.is_empty() {
        Verdict {
            tier: RiskTier::Safe,
            reasons,
        }
    } else {
        Verdict {
            tier: RiskTier::Caution,
            reasons,
        }
    }
}
