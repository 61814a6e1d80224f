use std::path::Path;

use expositor_core::request::ImageFormat;

use super::FailureReason;

#[cfg(feature = "graphviz")]
pub(super) fn render(source: &str, output: &Path, format: ImageFormat) -> Result<(), FailureReason> {
    use std::io::ErrorKind;

    use graphviz_rust::{
        cmd::{CommandArg, Format},
        exec_dot,
    };

    let format = match format {
        ImageFormat::Png => Format::Png,
        ImageFormat::Svg => Format::Svg,
    };
    let args = vec![
        CommandArg::Format(format),
        CommandArg::Output(output.to_string_lossy().into_owned()),
    ];

    exec_dot(source.to_string(), args)
        .map(|_| ())
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => FailureReason::EngineMissing {
                program: "dot".to_string(),
            },
            _ => FailureReason::Layout(err.to_string()),
        })
}

#[cfg(not(feature = "graphviz"))]
pub(super) fn render(_source: &str, _output: &Path, _format: ImageFormat) -> Result<(), FailureReason> {
    Err(FailureReason::EngineMissing {
        program: "dot (built without the `graphviz` feature)".to_string(),
    })
}
