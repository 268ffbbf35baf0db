//! `inspect` command: decode a texture and describe the result.

use std::path::PathBuf;

use clap::Args;
use texio::gl;
use texio::{DecodeRequest, TextureData, TextureIo, TextureIoConfig, TextureSource};

use crate::error::CliError;

/// Arguments for `texio inspect`.
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// File path or file://, http:// or https:// URL
    pub source: String,

    /// Format suffix hint (e.g. tga, dds, sgi)
    #[arg(long, value_name = "SUFFIX")]
    pub suffix: Option<String>,

    /// Request mipmaps
    #[arg(long)]
    pub mipmap: bool,

    /// Explicit GPU internal format (name such as GL_RGBA8, or a number)
    #[arg(long, value_parser = parse_gl_enum, requires = "pixel_format")]
    pub internal_format: Option<u32>,

    /// Explicit client pixel format (name such as GL_BGRA, or a number)
    #[arg(long, value_parser = parse_gl_enum, requires = "internal_format")]
    pub pixel_format: Option<u32>,
}

/// Run the inspect command.
pub fn run(config: &TextureIoConfig, args: InspectArgs) -> Result<(), CliError> {
    let io = TextureIo::new(config).map_err(CliError::Setup)?;
    let source = source_for(&args.source);
    let hint = args.suffix.as_deref();

    let decoded = match (args.internal_format, args.pixel_format) {
        (Some(internal), Some(pixel)) => {
            io.decode_with_formats(source, internal, pixel, args.mipmap, hint)
        }
        _ => io.decode(
            source,
            &DecodeRequest::new()
                .with_mipmap(args.mipmap)
                .with_suffix(hint),
        ),
    }
    .map_err(CliError::Decode)?;

    match decoded {
        Some(mut data) => {
            println!("Source: {}", args.source);
            for line in describe(&data) {
                println!("  {}", line);
            }
            data.release();
        }
        None => println!("{}: no decoder recognized this input", args.source),
    }
    Ok(())
}

fn source_for(source: &str) -> TextureSource<'static> {
    if source.contains("://") {
        TextureSource::Url(source.to_string())
    } else {
        TextureSource::File(PathBuf::from(source))
    }
}

/// Human-readable summary of decoded texture data.
pub fn describe(data: &TextureData) -> Vec<String> {
    let mut lines = vec![
        format!("Dimensions:      {}x{}", data.width(), data.height()),
        format!("Internal format: {}", format_enum(data.internal_format())),
        format!("Pixel format:    {}", format_enum(data.pixel_format())),
        format!("Pixel type:      {}", format_enum(data.pixel_type())),
        format!("Compressed:      {}", yes_no(data.is_compressed())),
        format!("Mipmap:          {}", yes_no(data.mipmap())),
        format!("Flip rows:       {}", yes_no(data.must_flip_vertically())),
        format!("Levels:          {}", data.mipmap_levels()),
    ];
    for (level, buffer) in data.buffers().iter().enumerate() {
        lines.push(format!("  level {}: {} bytes", level, buffer.len()));
    }
    lines.push(format!("Total size:      {} bytes", data.estimated_memory_size()));
    lines
}

fn format_enum(value: u32) -> String {
    match gl::enum_name(value) {
        Some(name) => format!("{} (0x{:04X})", name, value),
        None => format!("0x{:04X}", value),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Parse a GL enum given by name, decimal or `0x` hex.
fn parse_gl_enum(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex value '{}': {}", s, e));
    }
    if let Ok(value) = s.parse::<u32>() {
        return Ok(value);
    }
    gl::enum_value(s).ok_or_else(|| format!("unknown GL enum '{}'", s))
}
