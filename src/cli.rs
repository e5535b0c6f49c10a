//! Command-line interface for glyphd.
//!
//! Each subcommand starts a font system, waits for the font directory to
//! load, issues one kind of request and prints the result.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glyphd_config::Config;
use glyphd_fonts::{FontSpec, FontSystem, Glyph};

/// glyphd - query fonts, measure text and render glyphs
#[derive(Parser, Debug)]
#[command(name = "glyphd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to use instead of ~/.config/glyphd/config.yaml
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Font directory (overrides config)
    #[arg(long, value_name = "DIR", global = true)]
    pub fonts: Option<PathBuf>,

    /// Set debug log level (overrides config and RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Font selection shared by the text commands.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct FontArgs {
    /// Font family
    #[arg(long, default_value = FontSpec::FAMILY_DEFAULT)]
    pub family: String,

    /// Face (style) within the family
    #[arg(long, default_value = FontSpec::FACE_DEFAULT)]
    pub face: String,

    /// Pixel size
    #[arg(long, default_value_t = FontSpec::SIZE_DEFAULT)]
    pub size: f32,

    /// Display resolution
    #[arg(long, default_value_t = FontSpec::DPI_DEFAULT)]
    pub dpi: u16,
}

impl FontArgs {
    pub fn spec(&self) -> FontSpec {
        FontSpec::new(self.family.as_str(), self.face.as_str(), self.size, self.dpi)
    }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List the font families found in the font directory
    Fonts,

    /// Print vertical metrics of a font
    Metrics {
        #[command(flatten)]
        font: FontArgs,
    },

    /// Print the size of a text block
    Measure {
        text: String,

        /// Wrap lines at this width
        #[arg(long, value_name = "PIXELS")]
        width: Option<f32>,

        #[command(flatten)]
        font: FontArgs,
    },

    /// Break text into lines no wider than WIDTH
    Lines {
        text: String,

        /// Maximum line width
        #[arg(long, value_name = "PIXELS")]
        width: f32,

        #[command(flatten)]
        font: FontArgs,
    },

    /// Render the glyphs of a text
    Glyphs {
        text: String,

        /// Draw each bitmap as ASCII art
        #[arg(long)]
        ascii: bool,

        #[command(flatten)]
        font: FontArgs,
    },
}

/// Load the config for `cli`, applying command-line overrides.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(fonts) = &cli.fonts {
        config.font_directory = Some(fonts.clone());
    }
    Ok(config)
}

/// Run the subcommand selected in `cli`.
pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    crate::debug::apply_config_level(config.log_level.to_level_filter());

    let fonts = FontSystem::new(&config)?;
    let names = fonts
        .font_names()
        .wait()
        .with_context(|| {
            format!(
                "Font system failed to start (font directory: {})",
                config.resolved_font_directory().display()
            )
        })?;
    log::info!("Font system ready with {} families", names.len());

    match cli.command {
        Commands::Fonts => {
            for (family, path) in &names {
                println!("{}\t{}", family, path.display());
            }
        }
        Commands::Metrics { font } => {
            let metrics = fonts.metrics(&font.spec()).wait()?;
            println!("ascender:    {}", metrics.ascender);
            println!("descender:   {}", metrics.descender);
            println!("line height: {}", metrics.line_height);
        }
        Commands::Measure { text, width, font } => {
            let size = fonts
                .measure_wrapped(&text, width.unwrap_or(f32::MAX), &font.spec())
                .wait()?;
            println!("{} x {}", size.x, size.y);
        }
        Commands::Lines { text, width, font } => {
            for line in fonts.text_lines(&text, width, &font.spec()).wait()? {
                println!("{:>8.1}  {}", line.size.x, line.text);
            }
        }
        Commands::Glyphs { text, ascii, font } => {
            for glyph in fonts.glyphs(&text, &font.spec()).wait()? {
                println!("{}", describe_glyph(&glyph));
                if ascii {
                    print!("{}", glyph_ascii(&glyph));
                }
            }
        }
    }

    log::debug!(
        "Glyph cache: {} ({:.1}%)",
        fonts.glyph_cache_size(),
        fonts.glyph_cache_percentage()
    );
    Ok(())
}

/// One-line summary of a glyph's metrics.
pub fn describe_glyph(glyph: &Glyph) -> String {
    let code = glyph.identity.code;
    let shown = char::from_u32(code)
        .filter(|c| !c.is_control())
        .map(|c| format!(" '{}'", c))
        .unwrap_or_default();
    format!(
        "U+{:04X}{} {}x{} advance {} offset ({}, {}) lsb {} rsb {}",
        code,
        shown,
        glyph.bitmap.width,
        glyph.bitmap.height,
        glyph.advance,
        glyph.offset.x,
        glyph.offset.y,
        glyph.lsb_delta,
        glyph.rsb_delta
    )
}

/// Bitmap of `glyph` drawn with a character ramp, one text row per pixel row.
///
/// Multi-channel bitmaps use the strongest channel of each pixel.
pub fn glyph_ascii(glyph: &Glyph) -> String {
    const RAMP: &[u8] = b" .:-=+*#%@";
    let bitmap = &glyph.bitmap;
    let channels = bitmap.channels.max(1) as usize;
    let mut out = String::new();
    for y in 0..bitmap.height {
        let Some(row) = bitmap.row(y) else {
            break;
        };
        for pixel in row.chunks(channels) {
            let coverage = pixel.iter().copied().max().unwrap_or(0) as usize;
            out.push(RAMP[coverage * (RAMP.len() - 1) / 255] as char);
        }
        out.push('\n');
    }
    out
}
