use std::io::Read;

use podframe_buffer::{Field, FieldKind, SerializationBuffer};
use podframe_transport::{import, Base64Encoding};

use crate::cmd::InspectArgs;
use crate::exit::{buffer_error, io_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_report, BlockReport, BufferReport, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let kinds = parse_kinds(args.kinds.as_deref().unwrap_or_default())?;
    let text = resolve_text(&args)?;

    let mut buffer = SerializationBuffer::new(args.buffer.config())
        .map_err(|err| buffer_error("allocation failed", err))?;
    import(&mut buffer, &text, &Base64Encoding)
        .map_err(|err| transport_error("import failed", err))?;

    let mut report = BufferReport::new("podframe/cli/v1/inspect", &buffer);
    while let Some(header) = buffer
        .read_block()
        .map_err(|err| buffer_error("read failed", err))?
    {
        let fields = kinds
            .iter()
            .map(|kind| buffer.read_field(*kind))
            .collect::<Result<Vec<Field>, _>>()
            .map_err(|err| {
                buffer_error(&format!("block at offset {} unreadable", header.offset), err)
            })?;
        report.blocks.push(BlockReport::new(&header, &fields));
    }

    print_report(&report, format);
    Ok(SUCCESS)
}

fn parse_kinds(raw: &[String]) -> CliResult<Vec<FieldKind>> {
    raw.iter()
        .map(|kind| {
            kind.trim()
                .parse()
                .map_err(|err| CliError::new(USAGE, format!("--kinds: {err}")))
        })
        .collect()
}

fn resolve_text(args: &InspectArgs) -> CliResult<String> {
    if let Some(text) = &args.text {
        return Ok(text.clone());
    }
    if let Some(path) = &args.file {
        return std::fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(text)
}
