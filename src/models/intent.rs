use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    InfoSeeking,
    ProblemDescription,
    BuyingSignal,
    Smalltalk,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::BuyingSignal,
        Intent::ProblemDescription,
        Intent::InfoSeeking,
        Intent::Smalltalk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::InfoSeeking => "INFO_SEEKING",
            Intent::ProblemDescription => "PROBLEM_DESCRIPTION",
            Intent::BuyingSignal => "BUYING_SIGNAL",
            Intent::Smalltalk => "SMALLTALK",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}
