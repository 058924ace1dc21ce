use podframe_buffer::{Field, FieldKind, SerializationBuffer};
use podframe_transport::{export, Base64Encoding};

use crate::cmd::EncodeArgs;
use crate::exit::{buffer_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_report, BlockReport, BufferReport, OutputFormat};

/// One `--block` argument after parsing.
#[derive(Debug, PartialEq)]
struct BlockSpec {
    id: String,
    fields: Vec<Field>,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let specs = args
        .blocks
        .iter()
        .map(|raw| parse_block_spec(raw))
        .collect::<CliResult<Vec<_>>>()?;

    let mut buffer = SerializationBuffer::new(args.buffer.config())
        .map_err(|err| buffer_error("allocation failed", err))?;
    for spec in &specs {
        buffer
            .write_block(Some(&spec.id), |buf| {
                spec.fields.iter().try_for_each(|field| buf.write_field(field))
            })
            .map_err(|err| buffer_error(&format!("block {:?} failed", spec.id), err))?;
    }

    if let Some(path) = &args.dump {
        buffer
            .dump_to_path(path)
            .map_err(|err| buffer_error(&format!("dump to {} failed", path.display()), err))?;
    }

    let encoded = export(&buffer, &Base64Encoding);
    match format {
        OutputFormat::Json => {
            let mut report = BufferReport::new("podframe/cli/v1/encode", &buffer);
            buffer.reset();
            for spec in &specs {
                let header = buffer
                    .read_block()
                    .map_err(|err| buffer_error("read back failed", err))?
                    .ok_or_else(|| CliError::new(crate::exit::INTERNAL, "written block missing"))?;
                report.blocks.push(BlockReport::new(&header, &spec.fields));
            }
            report.encoded = Some(encoded);
            print_report(&report, format);
        }
        OutputFormat::Table | OutputFormat::Pretty => println!("{encoded}"),
    }

    Ok(SUCCESS)
}

fn parse_block_spec(raw: &str) -> CliResult<BlockSpec> {
    let (id, fields) = raw.split_once('=').ok_or_else(|| {
        CliError::new(USAGE, format!("block {raw:?} is not in ID=FIELDS form"))
    })?;
    let fields = fields
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_field)
        .collect::<CliResult<Vec<_>>>()?;
    Ok(BlockSpec {
        id: id.to_string(),
        fields,
    })
}

fn parse_field(item: &str) -> CliResult<Field> {
    if item.eq_ignore_ascii_case("null") {
        return Ok(Field::Str(None));
    }
    let (kind, value) = item
        .split_once(':')
        .ok_or_else(|| CliError::new(USAGE, format!("field {item:?} is not kind:value")))?;
    let kind: FieldKind = kind
        .parse()
        .map_err(|err| CliError::new(USAGE, format!("field {item:?}: {err}")))?;
    parse_value(kind, value)
        .map_err(|err| CliError::new(USAGE, format!("field {item:?}: invalid {kind}: {err}")))
}

fn parse_value(kind: FieldKind, value: &str) -> Result<Field, String> {
    fn num<T: std::str::FromStr>(value: &str) -> Result<T, String>
    where
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|err: T::Err| err.to_string())
    }

    Ok(match kind {
        FieldKind::I8 => Field::I8(num(value)?),
        FieldKind::U8 => match value.as_bytes() {
            [c] if !c.is_ascii_digit() => Field::U8(*c),
            _ => Field::U8(num(value)?),
        },
        FieldKind::I16 => Field::I16(num(value)?),
        FieldKind::U16 => Field::U16(num(value)?),
        FieldKind::I32 => Field::I32(num(value)?),
        FieldKind::U32 => Field::U32(num(value)?),
        FieldKind::I64 => Field::I64(num(value)?),
        FieldKind::U64 => Field::U64(num(value)?),
        FieldKind::F32 => Field::F32(num(value)?),
        FieldKind::F64 => Field::F64(num(value)?),
        FieldKind::Str => Field::Str(Some(value.to_string())),
    })
}
