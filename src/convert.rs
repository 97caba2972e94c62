//! One-call conversion between any two registered formats.
//!
//! Resolves the source format (explicit identifier wins, else the file
//! extension), the destination format (extension), and runs a single
//! parse pass. bigWig endpoints are routed through the UCSC command
//! line tools: `bigWigToWig` turns a bigWig source into a scratch WIG
//! file, `wigToBigWig` builds a bigWig destination from one, using the
//! chromosome-sizes file passed as `assembly`. A tool missing from
//! `PATH` surfaces as [`TrackError::MissingExternalTool`]; anything a
//! tool prints on failure comes back as
//! [`TrackError::Conversion`].

use crate::error::{Result, TrackError};
use crate::parse::drive;
use crate::registry::{get_parser, get_serializer, Format};
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::Command;

/// Converts `source` into `destination`.
///
/// `format` overrides source extension sniffing; `assembly` is the
/// chromosome-sizes file required by bigWig destinations.
///
/// ```no_run
/// use std::path::Path;
/// use trackio::convert;
///
/// convert(Path::new("peaks.bed"), Path::new("peaks.sql"), None, None)?;
/// # Ok::<(), trackio::TrackError>(())
/// ```
pub fn convert(
    source: &Path,
    destination: &Path,
    format: Option<&str>,
    assembly: Option<&Path>,
) -> Result<()> {
    let source_format = match format {
        Some(name) => Format::from_name(name).ok_or_else(|| TrackError::UnsupportedFormat {
            format: name.to_string(),
        })?,
        None => Format::from_path(source).ok_or_else(|| TrackError::UnsupportedFormat {
            format: source.display().to_string(),
        })?,
    };
    // The dump identifier differs by direction
    let source_format = match source_format {
        Format::Sql => Format::Track,
        other => other,
    };
    let destination_format = match Format::from_path(destination) {
        Some(Format::Track) | Some(Format::Sql) => Format::Sql,
        Some(other) => other,
        None => {
            return Err(TrackError::UnsupportedFormat {
                format: destination.display().to_string(),
            })
        }
    };

    let scratch = tempfile::tempdir()?;

    let (parse_path, parse_format) = if source_format == Format::BigWig {
        let wig = scratch.path().join("source.wig");
        run_tool("bigWigToWig", &[source.as_os_str(), wig.as_os_str()])?;
        (wig, Format::Wig)
    } else {
        (source.to_path_buf(), source_format)
    };

    if destination_format == Format::BigWig {
        let sizes = assembly.ok_or_else(|| {
            TrackError::Conversion(
                "writing bigWig requires a chromosome sizes file (assembly)".to_string(),
            )
        })?;
        let wig = scratch.path().join("destination.wig");
        run_pass(&parse_path, parse_format, &wig, Format::Wig)?;
        run_tool(
            "wigToBigWig",
            &[wig.as_os_str(), sizes.as_os_str(), destination.as_os_str()],
        )?;
        return Ok(());
    }

    run_pass(&parse_path, parse_format, destination, destination_format)
}

fn run_pass(
    source: &Path,
    source_format: Format,
    destination: &Path,
    destination_format: Format,
) -> Result<()> {
    let mut parser = get_parser(source, source_format.name())?;
    let mut serializer = get_serializer(destination, destination_format.name())?;
    drive(parser.as_mut(), serializer.as_mut())
}

/// Runs an external tool to completion. A binary that cannot be found
/// is reported as [`TrackError::MissingExternalTool`] so callers can
/// tell a missing installation from a failed conversion.
fn run_tool(tool: &str, args: &[&OsStr]) -> Result<()> {
    let output = match Command::new(tool).args(args).output() {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(TrackError::MissingExternalTool {
                tool: tool.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(TrackError::Conversion(format!(
            "{} failed: {}",
            tool,
            stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_a_distinct_error() {
        let err = run_tool("no-such-genome-tool", &[]).unwrap_err();
        assert!(matches!(
            err,
            TrackError::MissingExternalTool { tool } if tool == "no-such-genome-tool"
        ));
    }

    #[test]
    fn test_unknown_source_format_is_unsupported() {
        let err = convert(
            Path::new("in.vcf"),
            Path::new("out.sql"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TrackError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_bigwig_destination_requires_assembly() {
        let err = convert(
            Path::new("in.bed"),
            Path::new("out.bw"),
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TrackError::Conversion(_)));
    }
}
