use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use picgenius_lib::{
    Controller, ControllerOptions, DesignSelection, PicGeniusError, PicGeniusOutput,
    ProgressCallback, RunReport,
};
use tracing::debug;

use crate::cli::{GenerateTarget, OutputFormat};
use crate::formatting::{render_error, write_output};
use crate::settings::{load_config, log_effective_settings};

/// Run one of the `generate` subcommands.
pub fn run_generate(
    config_path: &Path,
    verbose: bool,
    threads: usize,
    format: OutputFormat,
    target: GenerateTarget,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(cfg) => cfg,
        Err(err) => return render_error(err, format),
    };
    log_effective_settings(config_path, &config, threads);

    let args = target.args();
    let product_type = match config.product_type(&args.product_type) {
        Ok(product_type) => product_type,
        Err(err) => return render_error(err, format),
    };

    let options = ControllerOptions {
        threads: Some(threads),
        progress: progress_printer(verbose),
    };
    let controller = match Controller::new(&args.design, Some(product_type), options) {
        Ok(controller) => controller,
        Err(err) => return render_error(err, format),
    };
    debug!(target = target.name(), products = controller.products().len(), "starting generation");

    let result = match &target {
        GenerateTarget::All(_) => controller.generate_all(&args.output),
        GenerateTarget::Templates(_) => controller.generate_templates(&args.output),
        GenerateTarget::FormattedDesigns(_) => controller.generate_formatted_designs(&args.output),
        GenerateTarget::Video {
            design_index,
            random_design,
            ..
        } => {
            let selection = if *random_design {
                DesignSelection::Random
            } else {
                DesignSelection::Index(*design_index)
            };
            controller.generate_video(&args.output, selection)
        }
    };
    if let Err(err) = result {
        return render_error(err, format);
    }

    let body = PicGeniusOutput::Run(RunReport::new(
        format!("generate {}", target.name()),
        Some(args.product_type.clone()),
        controller.products(),
        &args.output,
    ));
    if let Err(err) = write_output(&body, format) {
        return render_error(PicGeniusError::configuration(err.to_string()), format);
    }
    ExitCode::SUCCESS
}

/// Progress lines go to stderr; with --verbose the tracing output already
/// carries them.
pub fn progress_printer(verbose: bool) -> Option<ProgressCallback> {
    if verbose {
        None
    } else {
        Some(Arc::new(|msg: &str| eprintln!("{msg}")))
    }
}
