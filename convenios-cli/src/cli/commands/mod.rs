//! Command handlers

pub mod add;
pub mod edit;
pub mod export;
pub mod filter;
pub mod import;
pub mod list;
pub mod normalize;
pub mod today;

use anyhow::Result;
use is_terminal::IsTerminal;

/// Ask before a destructive write. `--yes` skips the prompt; without a
/// terminal to ask on, the write is refused.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    if !std::io::stdin().is_terminal() {
        anyhow::bail!("Refusing to write without confirmation; pass --yes when not running interactively");
    }

    Ok(dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}

/// Write bytes to `path`, creating parent directories as needed
pub fn write_output(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    use anyhow::Context;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, bytes).with_context(|| format!("Failed to write output to: {}", path.display()))
}
