//! Workload definition structures
//!
//! A run is an ordered sequence of phases, each identified on the command line
//! by a single letter. The set of phases is closed: anything outside it is
//! rejected when the sequence is parsed, so the dispatcher never sees an
//! unknown phase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Benchmark phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `i`: create the buckets
    Init,
    /// `p`: put objects
    Put,
    /// `g`: get objects
    Get,
    /// `d`: delete objects by index
    Delete,
    /// `l`: list every object of every bucket
    List,
    /// `c`: drain every bucket of all objects
    ClearBucket,
    /// `x`: delete the buckets
    DeleteBucket,
}

impl Mode {
    /// All phases, in the order they are documented
    pub const ALL: [Mode; 7] = [
        Mode::ClearBucket,
        Mode::DeleteBucket,
        Mode::Init,
        Mode::Put,
        Mode::List,
        Mode::Get,
        Mode::Delete,
    ];

    /// Parse a single phase letter
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'i' => Some(Mode::Init),
            'p' => Some(Mode::Put),
            'g' => Some(Mode::Get),
            'd' => Some(Mode::Delete),
            'l' => Some(Mode::List),
            'c' => Some(Mode::ClearBucket),
            'x' => Some(Mode::DeleteBucket),
            _ => None,
        }
    }

    /// The letter used for this phase in a mode string
    pub fn code(self) -> char {
        match self {
            Mode::Init => 'i',
            Mode::Put => 'p',
            Mode::Get => 'g',
            Mode::Delete => 'd',
            Mode::List => 'l',
            Mode::ClearBucket => 'c',
            Mode::DeleteBucket => 'x',
        }
    }

    /// Short label used in summary records ("PUT", "BCLR", ...)
    pub fn label(self) -> &'static str {
        match self {
            Mode::Init => "BINIT",
            Mode::Put => "PUT",
            Mode::Get => "GET",
            Mode::Delete => "DEL",
            Mode::List => "LIST",
            Mode::ClearBucket => "BCLR",
            Mode::DeleteBucket => "BDEL",
        }
    }

    /// Banner text logged when the phase starts
    pub fn description(self) -> &'static str {
        match self {
            Mode::Init => "BUCKET INIT",
            Mode::Put => "OBJECT PUT",
            Mode::Get => "OBJECT GET",
            Mode::Delete => "OBJECT DELETE",
            Mode::List => "BUCKET LIST",
            Mode::ClearBucket => "BUCKET CLEAR",
            Mode::DeleteBucket => "BUCKET DELETE",
        }
    }

    /// Whether the phase iterates over object indices (as opposed to buckets)
    pub fn is_object_phase(self) -> bool {
        matches!(self, Mode::Put | Mode::Get | Mode::Delete)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered list of phases, parsed from a string such as `"cxiplgdcx"`
///
/// Phases may repeat; they run in the order given, once per loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ModeSequence(Vec<Mode>);

impl ModeSequence {
    pub fn modes(&self) -> &[Mode] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, mode: Mode) -> bool {
        self.0.contains(&mode)
    }
}

impl Default for ModeSequence {
    fn default() -> Self {
        DEFAULT_MODES
            .parse()
            .unwrap_or_else(|_| ModeSequence(Vec::new()))
    }
}

/// Default phase sequence: clear and drop leftovers, then init, put, list,
/// get, delete, and clean up again.
pub const DEFAULT_MODES: &str = "cxiplgdcx";

impl FromStr for ModeSequence {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid: Vec<char> = s.chars().filter(|c| Mode::from_code(*c).is_none()).collect();
        if !invalid.is_empty() {
            let list: Vec<String> = invalid.iter().map(|c| format!("'{}'", c)).collect();
            anyhow::bail!(
                "Invalid mode(s) {} in mode string \"{}\" (valid modes: c, x, i, p, l, g, d)",
                list.join(", "),
                s
            );
        }
        Ok(ModeSequence(s.chars().filter_map(Mode::from_code).collect()))
    }
}

impl TryFrom<String> for ModeSequence {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ModeSequence> for String {
    fn from(seq: ModeSequence) -> Self {
        seq.to_string()
    }
}

impl fmt::Display for ModeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for mode in &self.0 {
            write!(f, "{}", mode.code())?;
        }
        Ok(())
    }
}

/// Content written into every object by put phases
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadPattern {
    /// Random bytes, generated once per run
    #[default]
    Random,
    /// All zeros
    Zeros,
}
