//! `suffix` command: show the format suffix derived from a name.

use texio::suffix_of;

use crate::error::CliError;

/// Run the suffix command.
pub fn run(name: &str) -> Result<(), CliError> {
    println!("{}", render(name));
    Ok(())
}

fn render(name: &str) -> String {
    suffix_of(name).unwrap_or_else(|| "(none)".to_string())
}
