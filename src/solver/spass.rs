//! @ai:module:intent Verdict classification for SPASS output
//! @ai:module:layer domain
//! @ai:module:public_api SpassClassifier
//! @ai:module:stateless true

use super::{OutputClassifier, Verdict};

const PROOF_FOUND: &str = "SPASS beiseite: Proof found";
const COMPLETION_FOUND: &str = "SPASS beiseite: Completion found";

/// @ai:intent Classifies SPASS runs from its `SPASS beiseite:` summary line
pub struct SpassClassifier;

impl SpassClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SpassClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputClassifier for SpassClassifier {
    /// @ai:effects pure
    fn classify(&self, return_code: i32, stdout: &str, _stderr: &str) -> Verdict {
        if stdout.contains(PROOF_FOUND) {
            Verdict::Satisfiable
        } else if stdout.contains(COMPLETION_FOUND) {
            Verdict::Unsatisfiable
        } else if return_code != 0 {
            Verdict::Error
        } else {
            // "Ran out of time" / "Maximal number of loops exceeded"
            Verdict::Unknown
        }
    }
}
