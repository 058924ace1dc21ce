use podframe_buffer::{Field, FieldKind, SerializationBuffer};
use podframe_transport::{export, import, Base64Encoding};
use tracing::info;

use crate::cmd::DemoArgs;
use crate::exit::{buffer_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_report, BlockReport, BufferReport, OutputFormat};

/// Field layout of every sample block: id, lowercase char, null string,
/// uppercase char, reading.
const SAMPLE_KINDS: [FieldKind; 5] = [
    FieldKind::I32,
    FieldKind::U8,
    FieldKind::Str,
    FieldKind::U8,
    FieldKind::F32,
];

pub fn run(args: DemoArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.buffer.config();
    let mut writer =
        SerializationBuffer::new(config).map_err(|err| buffer_error("allocation failed", err))?;

    for n in 0..args.blocks {
        let id = format!("dev{}", n + 1);
        writer
            .write_block(Some(&id), |buf| {
                sample_fields(n)
                    .iter()
                    .try_for_each(|field| buf.write_field(field))
            })
            .map_err(|err| buffer_error("write failed", err))?;
    }
    info!(
        blocks = args.blocks,
        length = writer.len(),
        capacity = writer.capacity(),
        "sample blocks written"
    );

    if let Some(path) = &args.dump {
        writer
            .dump_to_path(path)
            .map_err(|err| buffer_error(&format!("dump to {} failed", path.display()), err))?;
    }

    let encoded = export(&writer, &Base64Encoding);

    let mut reader =
        SerializationBuffer::new(config).map_err(|err| buffer_error("allocation failed", err))?;
    import(&mut reader, &encoded, &Base64Encoding)
        .map_err(|err| transport_error("import failed", err))?;

    let mut report = BufferReport::new("podframe/cli/v1/demo", &reader);
    report.initial_capacity = Some(config.initial_capacity);
    report.capacity = writer.capacity();
    report.encoded = Some(encoded);

    while let Some(header) = reader
        .read_block()
        .map_err(|err| buffer_error("read failed", err))?
    {
        let fields = SAMPLE_KINDS
            .iter()
            .map(|kind| reader.read_field(*kind))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| buffer_error("read failed", err))?;
        report.blocks.push(BlockReport::new(&header, &fields));
    }

    print_report(&report, format);
    Ok(SUCCESS)
}

fn sample_fields(n: u16) -> [Field; 5] {
    let letter = (n % 26) as u8;
    [
        Field::I32(4096 + i32::from(n)),
        Field::U8(b'a' + letter),
        Field::Str(None),
        Field::U8(b'A' + letter),
        Field::F32(3.14 + f32::from(n)),
    ]
}
