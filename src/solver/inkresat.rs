//! @ai:module:intent Verdict classification for InKreSAT output
//! @ai:module:layer domain
//! @ai:module:public_api InkresatClassifier
//! @ai:module:stateless true

use super::{OutputClassifier, Verdict};
use regex::Regex;

/// @ai:intent Classifies InKreSAT runs from its final answer line
pub struct InkresatClassifier {
    unsatisfiable: Regex,
    satisfiable: Regex,
}

impl InkresatClassifier {
    pub fn new() -> Self {
        Self {
            unsatisfiable: Regex::new(r"(?m)^\s*UNSATISFIABLE\b").unwrap(),
            satisfiable: Regex::new(r"(?m)^\s*SATISFIABLE\b").unwrap(),
        }
    }
}

impl Default for InkresatClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputClassifier for InkresatClassifier {
    /// @ai:effects pure
    fn classify(&self, return_code: i32, stdout: &str, _stderr: &str) -> Verdict {
        if return_code != 0 {
            return Verdict::Error;
        }
        // UNSATISFIABLE contains SATISFIABLE as a substring
        if self.unsatisfiable.is_match(stdout) {
            Verdict::Unsatisfiable
        } else if self.satisfiable.is_match(stdout) {
            Verdict::Satisfiable
        } else {
            Verdict::Unknown
        }
    }
}
