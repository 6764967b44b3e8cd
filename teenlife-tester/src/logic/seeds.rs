use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};

/// Seed metadata carried through scenario runs and reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    /// Original word when the seed was derived from text.
    pub phrase: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub const fn from_numeric(seed: u64) -> Self {
        Self { seed, phrase: None }
    }

    /// Derive a seed from a word so runs can be named ("monday", "prom").
    #[must_use]
    pub fn from_phrase(phrase: &str) -> Self {
        let digest = Sha256::digest(phrase.to_lowercase().as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self {
            seed: u64::from_le_bytes(bytes),
            phrase: Some(phrase.to_lowercase()),
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match &self.phrase {
            Some(phrase) => format!("{phrase} ({})", self.seed),
            None => self.seed.to_string(),
        }
    }
}

/// Resolve CLI seed tokens: decimal integers, `0x` hex, or alphabetic words.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut seeds: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let info = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            let value = u64::from_str_radix(hex, 16)
                .with_context(|| format!("invalid hex seed: {token}"))?;
            SeedInfo::from_numeric(value)
        } else if let Ok(value) = token.parse::<u64>() {
            SeedInfo::from_numeric(value)
        } else if let Ok(value) = token.parse::<i64>() {
            SeedInfo::from_numeric(value.unsigned_abs())
        } else if token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            SeedInfo::from_phrase(token)
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.iter().any(|existing| existing.seed == info.seed) {
            seeds.push(info);
        }
    }

    if seeds.is_empty() {
        seeds.push(SeedInfo::from_numeric(1337));
    }

    Ok(seeds)
}
