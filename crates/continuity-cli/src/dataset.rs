//! JSON Lines dataset loading.
//!
//! One object per line with `story_id` (or `id`), `narrative` and
//! `backstory`. Blank lines are skipped.

use anyhow::{Context, Result};
use continuity_core::StoryInput;
use std::path::Path;

pub fn load_dataset(path: &Path) -> Result<Vec<StoryInput>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read dataset {}", path.display()))?;
    parse_dataset(&text).with_context(|| format!("invalid dataset {}", path.display()))
}

pub fn parse_dataset(text: &str) -> Result<Vec<StoryInput>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str::<StoryInput>(line)
                .with_context(|| format!("line {}: malformed example", number + 1))
        })
        .collect()
}
