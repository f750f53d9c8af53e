// config.rs — Compiler configuration (ambient, spec §6.1)
//
// CLI flags are the primary source; a handful of environment variables
// provide defaults for non-interactive invocations (CI, batch runs).
// CLI always wins when both are set.
//
// Preconditions: none.
// Postconditions: none.
// Failure modes: none — unset/unparseable env vars are ignored.
// Side effects: `from_env` reads environment variables.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitStage {
    CompleteXml,
    GraphMl,
    Py,
    Run,
}

impl EmitStage {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "complete-xml" => Some(EmitStage::CompleteXml),
            "graphml" => Some(EmitStage::GraphMl),
            "py" => Some(EmitStage::Py),
            "run" => Some(EmitStage::Run),
            _ => None,
        }
    }
}

impl fmt::Display for EmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmitStage::CompleteXml => "complete-xml",
            EmitStage::GraphMl => "graphml",
            EmitStage::Py => "py",
            EmitStage::Run => "run",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticFormat {
    #[default]
    Human,
    Json,
}

impl DiagnosticFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "human" => Some(DiagnosticFormat::Human),
            "json" => Some(DiagnosticFormat::Json),
            _ => None,
        }
    }
}

/// Resolved compiler configuration for one driver invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub run: bool,
    pub emit: EmitStage,
    pub verbose: bool,
    pub diagnostic_format: DiagnosticFormat,
    pub output: Option<String>,
    /// Fixed subprocess timeout for `--run`, per spec §5.
    pub run_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: false,
            emit: EmitStage::Run,
            verbose: false,
            diagnostic_format: DiagnosticFormat::Human,
            output: None,
            run_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Overlay environment defaults under explicit CLI values. Only
    /// touches fields the CLI left at their struct default.
    pub fn with_env_defaults(mut self) -> Self {
        if !self.verbose {
            if let Ok(v) = std::env::var("AIECAD_VERBOSE") {
                self.verbose = v == "1" || v.eq_ignore_ascii_case("true");
            }
        }
        if self.diagnostic_format == DiagnosticFormat::Human {
            if let Ok(v) = std::env::var("AIECAD_DIAGNOSTIC_FORMAT") {
                if let Some(fmt) = DiagnosticFormat::parse(&v) {
                    self.diagnostic_format = fmt;
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emit_stage_parses_known_values() {
        assert_eq!(EmitStage::parse("graphml"), Some(EmitStage::GraphMl));
        assert_eq!(EmitStage::parse("bogus"), None);
    }

    #[test]
    fn default_config_runs_to_completion_without_run_flag() {
        let cfg = Config::default();
        assert!(!cfg.run);
        assert_eq!(cfg.run_timeout_secs, 30);
    }
}
