use std::path::PathBuf;
use std::process::ExitCode;

use picgenius_lib::{
    Controller, ControllerOptions, PicGeniusError, PicGeniusOutput, RunReport, UpscaleOptions,
};

use crate::cli::OutputFormat;
use crate::commands::generate::progress_printer;
use crate::formatting::{render_error, write_output};

/// Run the upscale command. No config file is needed.
#[allow(clippy::too_many_arguments)]
pub fn run_upscale(
    verbose: bool,
    threads: usize,
    format: OutputFormat,
    design: PathBuf,
    output: PathBuf,
    scale: u32,
    cpu: bool,
    suffix: Option<String>,
    extension: String,
) -> ExitCode {
    let options = UpscaleOptions {
        scale,
        cpu,
        suffix,
        extension,
    };
    let controller_options = ControllerOptions {
        threads: Some(threads),
        progress: progress_printer(verbose),
    };
    let controller = match Controller::new(&design, None, controller_options) {
        Ok(controller) => controller,
        Err(err) => return render_error(err, format),
    };
    let written = match controller.upscale_designs(&output, &options) {
        Ok(written) => written,
        Err(err) => return render_error(err, format),
    };

    let mut report = RunReport::new(format!("upscale x{scale}"), None, &[], &output);
    report.written = written;
    if let Err(err) = write_output(&PicGeniusOutput::Run(report), format) {
        return render_error(PicGeniusError::configuration(err.to_string()), format);
    }
    ExitCode::SUCCESS
}
