//! `decoders` command: list decoders in dispatch order.

use texio::{TextureIo, TextureIoConfig};

use crate::error::CliError;

/// Run the decoders command.
pub fn run(config: &TextureIoConfig) -> Result<(), CliError> {
    let io = TextureIo::new(config).map_err(CliError::Setup)?;

    println!("Decoders (tried in order)");
    println!("=========================");
    for line in listing(&io.registry().names()) {
        println!("{}", line);
    }
    Ok(())
}

fn listing(names: &[&str]) -> Vec<String> {
    let last = names.len().saturating_sub(1);
    names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == last {
                format!("  {}. {} (fallback)", i + 1, name)
            } else {
                format!("  {}. {}", i + 1, name)
            }
        })
        .collect()
}
