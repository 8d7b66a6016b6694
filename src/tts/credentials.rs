//! Round-robin credential assignment.
//!
//! Several interchangeable provider API keys let chunks be synthesized in
//! parallel while spreading rate-limit exposure. Assignment is a pure
//! mapping: chunk `i` always uses `pool[i mod pool.len()]`.

use crate::tts::error::PipelineError;
use std::fmt;

/// Map a chunk index to a credential.
///
/// # Errors
///
/// Returns [`PipelineError::CredentialConfig`] if `pool` is empty.
pub fn assign(chunk_index: usize, pool: &[String]) -> Result<&str, PipelineError> {
    if pool.is_empty() {
        return Err(PipelineError::CredentialConfig);
    }
    Ok(pool[chunk_index % pool.len()].as_str())
}

/// A validated, non-empty pool of provider credentials.
#[derive(Clone)]
pub struct CredentialPool {
    tokens: Vec<String>,
}

impl CredentialPool {
    /// Build a pool, discarding blank tokens.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::CredentialConfig`] if no usable token remains.
    pub fn new<I, S>(tokens: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(Into::into)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Err(PipelineError::CredentialConfig);
        }
        Ok(Self { tokens })
    }

    /// Parse a comma-separated list such as `ELEVENLABS_API_KEYS`.
    pub fn from_csv(csv: &str) -> Result<Self, PipelineError> {
        Self::new(csv.split(','))
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// The credential for `chunk_index`.
    pub fn for_chunk(&self, chunk_index: usize) -> &str {
        // Non-empty by construction.
        assign(chunk_index, &self.tokens).unwrap_or_default()
    }

    /// Pool position used for `chunk_index`; safe to log, unlike the token.
    pub fn slot(&self, chunk_index: usize) -> usize {
        chunk_index % self.tokens.len()
    }

    /// Any credential, for calls not tied to a chunk.
    pub fn first(&self) -> &str {
        &self.tokens[0]
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.tokens.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_assign_round_robin() {
        let tokens = pool(&["A", "B", "C"]);
        let assigned: Vec<&str> = (0..6).map(|i| assign(i, &tokens).unwrap()).collect();
        assert_eq!(assigned, vec!["A", "B", "C", "A", "B", "C"]);
    }

    #[test]
    fn test_assign_empty_pool_is_config_error() {
        assert!(matches!(
            assign(0, &[]),
            Err(PipelineError::CredentialConfig)
        ));
    }

    #[test]
    fn test_pool_matches_free_function() {
        let tokens = pool(&["k0", "k1"]);
        let credentials = CredentialPool::new(tokens.clone()).unwrap();
        for i in 0..10 {
            assert_eq!(credentials.for_chunk(i), assign(i, &tokens).unwrap());
            assert_eq!(credentials.slot(i), i % 2);
        }
    }

    #[test]
    fn test_from_csv_trims_and_drops_blanks() {
        let credentials = CredentialPool::from_csv(" key-a , ,key-b,").unwrap();
        assert_eq!(credentials.len(), 2);
        assert_eq!(credentials.for_chunk(0), "key-a");
        assert_eq!(credentials.for_chunk(1), "key-b");
    }

    #[test]
    fn test_from_csv_blank_is_config_error() {
        assert!(matches!(
            CredentialPool::from_csv(" , "),
            Err(PipelineError::CredentialConfig)
        ));
    }

    #[test]
    fn test_debug_does_not_leak_tokens() {
        let credentials = CredentialPool::new(["secret-token"]).unwrap();
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("secret-token"));
    }
}
