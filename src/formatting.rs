use std::fmt::Write as FmtWrite;
use std::io::{self, IsTerminal};
use std::process::ExitCode;

use picgenius_lib::{ErrorReport, PicGeniusError, PicGeniusOutput, PICGENIUS_OUTPUT_VERSION};

use crate::cli::OutputFormat;

/// Write output in the requested format.
pub fn write_output(body: &PicGeniusOutput, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(body)?),
        OutputFormat::Pretty => write_pretty_output(body)?,
    };
    Ok(())
}

/// Render an error and return the fatal exit code.
pub fn render_error(err: PicGeniusError, format: OutputFormat) -> ExitCode {
    let payload = PicGeniusOutput::Error(ErrorReport {
        version: PICGENIUS_OUTPUT_VERSION.to_string(),
        error: err.to_payload(),
    });

    match format {
        OutputFormat::Json => {
            let content =
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"mode\":\"error\"}".into());
            println!("{content}");
        }
        OutputFormat::Pretty => {
            if let Err(write_err) = write_pretty_output(&payload) {
                eprintln!("Failed to write error output: {}", write_err);
            }
        }
    };

    ExitCode::from(2)
}

fn write_pretty_output(body: &PicGeniusOutput) -> io::Result<()> {
    if io::stdout().is_terminal() {
        println!("{}", format_pretty(body, true));
        return Ok(());
    }

    // Pipes keep the JSON shape.
    let content =
        serde_json::to_string_pretty(body).unwrap_or_else(|_| "{\"mode\":\"error\"}".to_string());
    println!("{content}");
    Ok(())
}

/// Format output for human consumption in a terminal.
pub fn format_pretty(body: &PicGeniusOutput, colorize: bool) -> String {
    let mut buf = String::new();
    match body {
        PicGeniusOutput::Run(report) => {
            let header = color("[DONE]", "32", colorize);
            writeln!(buf, "{} picgenius {}", header, report.command).ok();
            if let Some(product_type) = &report.product_type {
                writeln!(buf, "Product type: {product_type}").ok();
            }
            if !report.products.is_empty() {
                writeln!(buf, "Products ({}):", report.products.len()).ok();
                for product in &report.products {
                    writeln!(buf, "- {:16} {}", product.name, product.designs.join(", ")).ok();
                }
            }
            if !report.written.is_empty() {
                writeln!(buf, "Written ({}):", report.written.len()).ok();
                for path in &report.written {
                    writeln!(buf, "- {}", path.display()).ok();
                }
            }
            writeln!(buf, "Output: {}", report.output_dir.display()).ok();
        }
        PicGeniusOutput::Error(report) => {
            let header = color("[ERROR]", "31", colorize);
            writeln!(buf, "{} {}", header, report.error.message).ok();
            if let Some(remediation) = &report.error.remediation {
                writeln!(buf, "Hint: {}", remediation).ok();
            }
        }
    }
    buf
}

fn color(text: &str, code: &str, colorize: bool) -> String {
    if colorize {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picgenius_lib::{ProductSummary, RunReport};
    use std::path::PathBuf;

    #[test]
    fn render_error_always_returns_fatal_exit_code() {
        let code = render_error(PicGeniusError::configuration("boom"), OutputFormat::Json);
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn format_pretty_lists_products() {
        let output = PicGeniusOutput::Run(RunReport {
            version: PICGENIUS_OUTPUT_VERSION.to_string(),
            command: "generate templates".to_string(),
            product_type: Some("poster".to_string()),
            products: vec![ProductSummary {
                name: "sunset".to_string(),
                designs: vec!["sunset".to_string()],
            }],
            output_dir: PathBuf::from("workdir/products"),
            written: Vec::new(),
        });

        let pretty = format_pretty(&output, false);
        assert!(pretty.contains("[DONE] picgenius generate templates"));
        assert!(pretty.contains("Product type: poster"));
        assert!(pretty.contains("Products (1):"));
        assert!(pretty.contains("sunset"));
        assert!(pretty.contains("Output: workdir/products"));
        assert!(!pretty.contains("Written"));
    }

    #[test]
    fn format_pretty_handles_errors() {
        let output = PicGeniusOutput::Error(ErrorReport {
            version: PICGENIUS_OUTPUT_VERSION.to_string(),
            error: PicGeniusError::resource("ffmpeg was not found on PATH").to_payload(),
        });

        let pretty = format_pretty(&output, false);
        assert!(pretty.contains("[ERROR] ffmpeg was not found on PATH"));
        assert!(pretty.contains("Hint: Install ffmpeg"));
    }
}
