use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the strictly ordered build sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Pass1,
    Index,
    Pass2,
    Publish,
    Done,
}

impl Stage {
    /// The only transition out of each stage; `Done` is terminal.
    pub fn next(self) -> Stage {
        match self {
            Stage::Start => Stage::Pass1,
            Stage::Pass1 => Stage::Index,
            Stage::Index => Stage::Pass2,
            Stage::Pass2 => Stage::Publish,
            Stage::Publish | Stage::Done => Stage::Done,
        }
    }

    /// Step executed while in this stage.
    pub fn step(self) -> Option<Step> {
        match self {
            Stage::Pass1 => Some(Step::Pass1),
            Stage::Index => Some(Step::Index),
            Stage::Pass2 => Some(Step::Pass2),
            Stage::Publish => Some(Step::Publish),
            Stage::Start | Stage::Done => None,
        }
    }
}

/// One of the four pipeline steps.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    #[serde(rename = "typeset_pass1")]
    Pass1,
    #[serde(rename = "index")]
    Index,
    #[serde(rename = "typeset_pass2")]
    Pass2,
    #[serde(rename = "publish")]
    Publish,
}

impl Step {
    /// Return the stable string identifier used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Pass1 => "typeset_pass1",
            Step::Index => "index",
            Step::Pass2 => "typeset_pass2",
            Step::Publish => "publish",
        }
    }

    /// Human-readable label for console summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Pass1 => "Typeset pass 1",
            Step::Index => "Index generation",
            Step::Pass2 => "Typeset pass 2",
            Step::Publish => "Publish",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Walk the state machine from `Start` to `Done`, collecting the steps.
pub fn ordered_steps() -> Vec<Step> {
    let mut steps = Vec::new();
    let mut stage = Stage::Start;
    while stage != Stage::Done {
        stage = stage.next();
        if let Some(step) = stage.step() {
            steps.push(step);
        }
    }
    steps
}
