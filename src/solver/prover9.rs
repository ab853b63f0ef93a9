//! @ai:module:intent Verdict classification for Prover9 output
//! @ai:module:layer domain
//! @ai:module:public_api Prover9Classifier
//! @ai:module:stateless true

use super::{OutputClassifier, Verdict};

const PROOF_MARKER: &str = "THEOREM PROVED";
const SEARCH_FAILED_MARKER: &str = "SEARCH FAILED";

/// @ai:intent Classifies Prover9 runs
///
/// Prover9 exits with 2 when the search space is exhausted, which is a valid
/// "no proof" answer, so the textual markers are checked before the return code.
pub struct Prover9Classifier;

impl Prover9Classifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Prover9Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputClassifier for Prover9Classifier {
    /// @ai:effects pure
    fn classify(&self, return_code: i32, stdout: &str, _stderr: &str) -> Verdict {
        if stdout.contains(PROOF_MARKER) {
            return Verdict::Satisfiable;
        }
        if stdout.contains(SEARCH_FAILED_MARKER) {
            return Verdict::Unsatisfiable;
        }
        match return_code {
            0 => Verdict::Unknown,
            _ => Verdict::Error,
        }
    }
}
