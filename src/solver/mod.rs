//! @ai:module:intent Verdicts, solver identities and the output classifier registry
//! @ai:module:layer domain
//! @ai:module:public_api Verdict, Solver, OutputClassifier, ClassifierRegistry
//! @ai:module:stateless true

pub mod inkresat;
pub mod prover9;
pub mod spass;

pub use inkresat::InkresatClassifier;
pub use prover9::Prover9Classifier;
pub use spass::SpassClassifier;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// @ai:intent Classified outcome of one benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Satisfiable,
    Unsatisfiable,
    Timeout,
    OutOfMemory,
    Error,
    Unknown,
}

impl Verdict {
    pub const ALL: [Verdict; 6] = [
        Verdict::Satisfiable,
        Verdict::Unsatisfiable,
        Verdict::Timeout,
        Verdict::OutOfMemory,
        Verdict::Error,
        Verdict::Unknown,
    ];

    /// @ai:intent Upper-case label used in logs and reports
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Satisfiable => "SATISFIABLE",
            Verdict::Unsatisfiable => "UNSATISFIABLE",
            Verdict::Timeout => "TIMEOUT",
            Verdict::OutOfMemory => "OUT_OF_MEMORY",
            Verdict::Error => "ERROR",
            Verdict::Unknown => "UNKNOWN",
        }
    }

    /// @ai:intent Whether the solver reached a definite answer
    /// @ai:effects pure
    pub fn is_solved(&self) -> bool {
        matches!(self, Verdict::Satisfiable | Verdict::Unsatisfiable)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// @ai:intent Supported solver families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Solver {
    Prover9,
    Spass,
    Inkresat,
}

impl Solver {
    pub const ALL: [Solver; 3] = [Solver::Prover9, Solver::Spass, Solver::Inkresat];

    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Solver::Prover9 => "prover9",
            Solver::Spass => "spass",
            Solver::Inkresat => "inkresat",
        }
    }

    /// @ai:intent Identify the solver from an executable path such as `/opt/bin/SPASS`
    /// @ai:effects pure
    pub fn from_executable(program: &str) -> Option<Self> {
        let name = Path::new(program).file_stem()?.to_str()?;
        name.parse().ok()
    }
}

impl fmt::Display for Solver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Solver {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Solver> for String {
    fn from(solver: Solver) -> Self {
        solver.as_str().to_string()
    }
}

impl FromStr for Solver {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prover9" => Ok(Solver::Prover9),
            "spass" => Ok(Solver::Spass),
            "inkresat" => Ok(Solver::Inkresat),
            other => Err(format!("unknown solver: {}", other)),
        }
    }
}

/// @ai:intent Maps the raw output of one finished solver process to a verdict
/// @ai:pre the process exited on its own (not killed by the supervisor)
pub trait OutputClassifier: Send + Sync {
    fn classify(&self, return_code: i32, stdout: &str, stderr: &str) -> Verdict;
}

/// @ai:intent Explicit lookup table from solver identity to classifier
pub struct ClassifierRegistry {
    classifiers: HashMap<Solver, Box<dyn OutputClassifier>>,
}

impl ClassifierRegistry {
    /// @ai:intent Registry without any classifier
    /// @ai:effects pure
    pub fn empty() -> Self {
        Self {
            classifiers: HashMap::new(),
        }
    }

    /// @ai:intent Registry with every built-in classifier
    /// @ai:effects pure
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(Solver::Prover9, Box::new(Prover9Classifier::new()));
        registry.register(Solver::Spass, Box::new(SpassClassifier::new()));
        registry.register(Solver::Inkresat, Box::new(InkresatClassifier::new()));
        registry
    }

    /// @ai:effects pure
    pub fn register(&mut self, solver: Solver, classifier: Box<dyn OutputClassifier>) {
        self.classifiers.insert(solver, classifier);
    }

    pub fn get(&self, solver: Solver) -> Option<&dyn OutputClassifier> {
        self.classifiers.get(&solver).map(|c| c.as_ref())
    }

    pub fn supports(&self, solver: Solver) -> bool {
        self.classifiers.contains_key(&solver)
    }

    /// @ai:intent Solvers with a registered classifier, in declaration order
    pub fn supported(&self) -> Vec<Solver> {
        Solver::ALL
            .into_iter()
            .filter(|s| self.supports(*s))
            .collect()
    }

    /// @ai:intent Classify output, degrading to Unknown when no classifier applies
    /// @ai:effects io
    pub fn classify(
        &self,
        solver: Option<Solver>,
        return_code: i32,
        stdout: &str,
        stderr: &str,
    ) -> Verdict {
        match solver.and_then(|s| self.get(s)) {
            Some(classifier) => classifier.classify(return_code, stdout, stderr),
            None => {
                let name = solver.map(|s| s.to_string()).unwrap_or_else(|| "unidentified".to_string());
                tracing::warn!(
                    "No output classifier registered for solver '{}', verdict set to UNKNOWN",
                    name
                );
                Verdict::Unknown
            }
        }
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for ClassifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierRegistry")
            .field("supported", &self.supported())
            .finish()
    }
}
