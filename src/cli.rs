use clap::{Parser, Subcommand, ValueEnum};
use picgenius_lib::DEFAULT_MAX_THREADS;
use std::path::PathBuf;

pub const DEFAULT_DESIGN_PATH: &str = "./workdir/designs";
pub const DEFAULT_OUTPUT_PATH: &str = "./workdir/products";

#[derive(Parser)]
#[command(name = "picgenius")]
#[command(
    version,
    about = "PicGenius - Generate product visuals from print-on-demand designs",
    long_about = "PicGenius\n\nCommands:\n- generate: render formatted designs, template mock-ups and preview videos for every product found under --design.\n- upscale: resample designs by an integer factor.\n\nUse --help on any subcommand for details."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(
        long,
        short = 'f',
        global = true,
        value_name = "PATH",
        default_value = "./picgenius.yml",
        help = "YAML config file declaring formats, watermarks and product types"
    )]
    pub config: PathBuf,

    #[arg(long, global = true, value_enum, default_value = "json", help = "Output format")]
    pub format: OutputFormat,

    #[arg(
        long,
        global = true,
        default_value_t = DEFAULT_MAX_THREADS,
        help = "Maximum worker threads"
    )]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate assets for every product of a product type
    Generate {
        #[command(subcommand)]
        target: GenerateTarget,
    },

    /// Upscale designs by an integer factor
    Upscale {
        #[arg(long, short, default_value = DEFAULT_DESIGN_PATH, help = "Design file or directory")]
        design: PathBuf,

        #[arg(long, short, default_value = DEFAULT_OUTPUT_PATH, help = "Output directory")]
        output: PathBuf,

        #[arg(long, short, help = "Upscale factor (2, 4, 8, 10, 12 or 16)")]
        scale: u32,

        #[arg(long, help = "Force CPU processing")]
        cpu: bool,

        #[arg(long, help = "Output file name suffix (default -x<scale>-upscaled)")]
        suffix: Option<String>,

        #[arg(long, default_value = "jpg", help = "Output file extension")]
        extension: String,
    },
}

#[derive(Subcommand)]
pub enum GenerateTarget {
    /// Formatted designs, templates and video
    All(GenerateArgs),
    /// Template mock-ups only
    Templates(GenerateArgs),
    /// Preview video only
    Video {
        #[command(flatten)]
        args: GenerateArgs,

        #[arg(long, default_value = "0", help = "Index of the design the video is made from")]
        design_index: usize,

        #[arg(long, conflicts_with = "design_index", help = "Pick the video design at random")]
        random_design: bool,
    },
    /// Print-ready formatted designs only
    FormattedDesigns(GenerateArgs),
}

impl GenerateTarget {
    pub fn args(&self) -> &GenerateArgs {
        match self {
            GenerateTarget::All(args)
            | GenerateTarget::Templates(args)
            | GenerateTarget::FormattedDesigns(args) => args,
            GenerateTarget::Video { args, .. } => args,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GenerateTarget::All(_) => "all",
            GenerateTarget::Templates(_) => "templates",
            GenerateTarget::Video { .. } => "video",
            GenerateTarget::FormattedDesigns(_) => "formatted-designs",
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(long, short, help = "Product type declared under product_types in the config")]
    pub product_type: String,

    #[arg(long, short, default_value = DEFAULT_DESIGN_PATH, help = "Design directory")]
    pub design: PathBuf,

    #[arg(long, short, default_value = DEFAULT_OUTPUT_PATH, help = "Output directory")]
    pub output: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn generate_templates_uses_defaults() {
        let cli = Cli::parse_from(["picgenius", "generate", "templates", "-p", "poster"]);

        assert!(!cli.verbose);
        assert_eq!(cli.config, Path::new("./picgenius.yml"));
        assert_eq!(cli.threads, DEFAULT_MAX_THREADS);
        assert!(matches!(cli.format, OutputFormat::Json));

        match cli.command {
            Commands::Generate {
                target: GenerateTarget::Templates(args),
            } => {
                assert_eq!(args.product_type, "poster");
                assert_eq!(args.design, Path::new(DEFAULT_DESIGN_PATH));
                assert_eq!(args.output, Path::new(DEFAULT_OUTPUT_PATH));
            }
            _ => panic!("expected generate templates"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::parse_from([
            "picgenius",
            "generate",
            "all",
            "--product-type",
            "mug",
            "--design",
            "designs",
            "--output",
            "out",
            "-f",
            "custom.yml",
            "--threads",
            "2",
            "--format",
            "pretty",
            "--verbose",
        ]);

        assert!(cli.verbose);
        assert_eq!(cli.config, Path::new("custom.yml"));
        assert_eq!(cli.threads, 2);
        assert!(matches!(cli.format, OutputFormat::Pretty));
        let Commands::Generate { target } = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(target.name(), "all");
        assert_eq!(target.args().design, Path::new("designs"));
        assert_eq!(target.args().output, Path::new("out"));
    }

    #[test]
    fn video_accepts_design_selection() {
        let cli = Cli::parse_from([
            "picgenius",
            "generate",
            "video",
            "-p",
            "poster",
            "--design-index",
            "1",
        ]);
        match cli.command {
            Commands::Generate {
                target:
                    GenerateTarget::Video {
                        design_index,
                        random_design,
                        ..
                    },
            } => {
                assert_eq!(design_index, 1);
                assert!(!random_design);
            }
            _ => panic!("expected generate video"),
        }

        let random =
            Cli::try_parse_from(["picgenius", "generate", "video", "-p", "poster", "--random-design"]);
        assert!(random.is_ok());
    }

    #[test]
    fn generate_requires_product_type() {
        assert!(Cli::try_parse_from(["picgenius", "generate", "templates"]).is_err());
    }

    #[test]
    fn upscale_parses_options() {
        let cli = Cli::parse_from([
            "picgenius",
            "upscale",
            "--design",
            "art.png",
            "--output",
            "big",
            "--scale",
            "4",
            "--cpu",
            "--suffix",
            "_x4",
            "--extension",
            "png",
        ]);
        match cli.command {
            Commands::Upscale {
                design,
                output,
                scale,
                cpu,
                suffix,
                extension,
            } => {
                assert_eq!(design, Path::new("art.png"));
                assert_eq!(output, Path::new("big"));
                assert_eq!(scale, 4);
                assert!(cpu);
                assert_eq!(suffix.as_deref(), Some("_x4"));
                assert_eq!(extension, "png");
            }
            _ => panic!("expected upscale"),
        }
    }
}
