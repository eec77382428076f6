use std::path::PathBuf;

use backtext::style::{FONT_OPTIONS, TextStyle};
use backtext::{BacktextResult, ENV_FONT_DIR, LineCentering, Rgb};
use clap::{Args, Parser, Subcommand};

/// Command line interface definition.
#[derive(Parser, Debug)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalOptions {
    /// Extra directory to load fonts from (repeatable)
    #[arg(long = "font-dir", value_name = "DIR", env = ENV_FONT_DIR, global = true)]
    pub font_dirs: Vec<PathBuf>,
    /// Only use fonts from --font-dir
    #[arg(long = "no-system-fonts", global = true)]
    pub no_system_fonts: bool,
    /// Log level (error, warn, info, debug, trace, off)
    #[arg(long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render styled text behind the subject and export the composite PNG
    Compose(ComposeCommand),
    /// Export the dilated subject mask of a cutout as a PNG
    Mask(MaskCommand),
    /// Export the original with the subject cut out as a PNG
    Background(BackgroundCommand),
    /// List the font families available for text
    Fonts,
}

/// Where the subject cutout comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct CutoutArgs {
    /// RGBA cutout of the subject, same size as the input
    #[arg(long, value_name = "PNG")]
    pub foreground: Option<PathBuf>,
    /// Grayscale matte of the subject, same size as the input
    #[arg(long, value_name = "PNG")]
    pub matte: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ComposeCommand {
    /// Input image path
    pub input: PathBuf,
    #[command(flatten)]
    pub cutout: CutoutArgs,
    /// Output path (defaults to `<name>-composite.png`; a directory with --unique-name)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Name the output after a hash of its content
    #[arg(long = "unique-name")]
    pub unique_name: bool,
    /// Draw the background with the subject cut out
    #[arg(long = "subtract-background")]
    pub subtract_background: bool,
    /// Mask dilation radius; the sign is ignored
    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    pub margin: i64,
    /// How lines of multi-line text are centered
    #[arg(long = "line-centering", value_enum, default_value_t = LineCentering::Independent)]
    pub line_centering: LineCentering,
    #[command(flatten)]
    pub style: StyleArgs,
}

#[derive(Args, Debug)]
pub struct MaskCommand {
    /// RGBA cutout of the subject
    pub foreground: PathBuf,
    /// Output path (defaults to `<name>-mask.png`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Mask dilation radius; the sign is ignored
    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    pub margin: i64,
}

#[derive(Args, Debug)]
pub struct BackgroundCommand {
    /// Input image path
    pub input: PathBuf,
    #[command(flatten)]
    pub cutout: CutoutArgs,
    /// Output path (defaults to `<name>-background.png`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Mask dilation radius; the sign is ignored
    #[arg(long, default_value_t = 20, allow_negative_numbers = true)]
    pub margin: i64,
}

/// Text style flags. Each one overrides the same key of `--style`.
#[derive(Args, Debug, Default)]
pub struct StyleArgs {
    /// TOML style file
    #[arg(long = "style", value_name = "FILE")]
    pub style_file: Option<PathBuf>,
    /// Text to draw; `\n` starts a new line
    #[arg(long)]
    pub text: Option<String>,
    /// Text size at a 512px wide canvas, 32-256
    #[arg(long = "text-size")]
    pub text_size: Option<f64>,
    #[arg(long = "font-family", help = font_family_help())]
    pub font_family: Option<String>,
    /// Text color as #RRGGBB
    #[arg(long = "text-color")]
    pub text_color: Option<Rgb>,
    /// Text opacity, 0-100
    #[arg(long = "text-opacity")]
    pub text_opacity: Option<f64>,
    /// Horizontal anchor, percent of width
    #[arg(long = "position-x")]
    pub position_x: Option<f64>,
    /// Vertical anchor, percent of height
    #[arg(long = "position-y")]
    pub position_y: Option<f64>,
    /// Clockwise rotation in degrees, -180 to 180
    #[arg(long, allow_negative_numbers = true)]
    pub rotation: Option<f64>,
    /// Horizontal scale in percent, 1-300
    #[arg(long = "scale-x")]
    pub scale_x: Option<f64>,
    /// Vertical scale in percent, 1-300
    #[arg(long = "scale-y")]
    pub scale_y: Option<f64>,
    /// Pixels added after each letter, -20 to 100
    #[arg(long = "letter-spacing", allow_negative_numbers = true)]
    pub letter_spacing: Option<f64>,
    /// Pixels added after each space, 0-100
    #[arg(long = "word-spacing")]
    pub word_spacing: Option<f64>,
    /// Shadow color as #RRGGBB
    #[arg(long = "shadow-color")]
    pub shadow_color: Option<Rgb>,
    /// Shadow opacity, 0-100
    #[arg(long = "shadow-opacity")]
    pub shadow_opacity: Option<f64>,
    /// Shadow blur in pixels, 0-50
    #[arg(long = "shadow-blur")]
    pub shadow_blur: Option<f64>,
    /// Shadow offset in pixels, -50 to 50
    #[arg(long = "shadow-offset-x", allow_negative_numbers = true)]
    pub shadow_offset_x: Option<f64>,
    /// Shadow offset in pixels, -50 to 50
    #[arg(long = "shadow-offset-y", allow_negative_numbers = true)]
    pub shadow_offset_y: Option<f64>,
}

fn font_family_help() -> String {
    format!("Font family ({})", FONT_OPTIONS.join(", "))
}

macro_rules! overlay {
    ($style:ident, $args:ident, $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$args.$field {
                $style.$field = value.clone();
            }
        )+
    };
}

impl StyleArgs {
    /// The style file (or defaults) with every given flag applied, clamped to range.
    pub fn resolve(&self) -> BacktextResult<TextStyle> {
        let mut style = match &self.style_file {
            Some(path) => TextStyle::load(path)?,
            None => TextStyle::default(),
        };
        let args = self;
        overlay!(
            style,
            args,
            text_size,
            font_family,
            text_color,
            text_opacity,
            position_x,
            position_y,
            rotation,
            scale_x,
            scale_y,
            letter_spacing,
            word_spacing,
            shadow_color,
            shadow_opacity,
            shadow_blur,
            shadow_offset_x,
            shadow_offset_y,
        );
        if let Some(text) = &self.text {
            style.text = text.replace("\\n", "\n");
        }
        Ok(style.validated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "backtext",
            "compose",
            "in.jpg",
            "--foreground",
            "fg.png",
            "--text",
            "one\\ntwo",
            "--text-color",
            "#ff0000",
            "--rotation",
            "-30",
            "--scale-x",
            "500",
        ])
        .unwrap();
        let Commands::Compose(cmd) = cli.command else {
            panic!("expected compose");
        };
        let style = cmd.style.resolve().unwrap();
        assert_eq!(style.text, "one\ntwo");
        assert_eq!(style.text_color, Rgb([255, 0, 0]));
        assert_eq!(style.rotation, -30.0);
        assert_eq!(style.scale_x, 300.0);
        assert_eq!(style.text_size, TextStyle::default().text_size);
    }

    #[test]
    fn cutout_source_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["backtext", "compose", "in.jpg"]).is_err());
        assert!(
            Cli::try_parse_from([
                "backtext",
                "background",
                "in.jpg",
                "--foreground",
                "a.png",
                "--matte",
                "b.png",
            ])
            .is_err()
        );
    }

    #[test]
    fn negative_margin_parses() {
        let cli = Cli::try_parse_from(["backtext", "mask", "fg.png", "--margin", "-20"]).unwrap();
        let Commands::Mask(cmd) = cli.command else {
            panic!("expected mask");
        };
        assert_eq!(cmd.margin, -20);
    }
}
