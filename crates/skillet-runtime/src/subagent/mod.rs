//! Subagents exposed to the main agent as ordinary tools.

pub mod data_analysis;
pub mod dataframe;

pub use data_analysis::{DataAnalysisTool, RunScriptTool};
pub use dataframe::analyze_dataframe;
