//! Round-trip example: a writer thread hands base64 text to a reader.
//!
//! Run with:
//!   cargo run --example round-trip

use std::sync::mpsc;
use std::thread;

use podframe::buffer::{HeaderMode, SerializationBuffer};
use podframe::transport::{export, import, Base64Encoding};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel::<String>();

    let writer = thread::spawn(
        move || -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let mut buf = SerializationBuffer::with_header_mode(HeaderMode::Variable)?;
            for (i, id) in ["thermo-1", "thermo-2", "hygro-1"].into_iter().enumerate() {
                buf.write_block(Some(id), |b| {
                    b.write(i as u32)?;
                    b.write(20.5f32 + i as f32)?;
                    b.write_string(Some("celsius"))
                })?;
            }
            tx.send(export(&buf, &Base64Encoding))?;
            Ok(())
        },
    );

    let text = rx.recv()?;
    eprintln!("[reader] received {} base64 chars", text.len());

    let mut buf = SerializationBuffer::with_header_mode(HeaderMode::Variable)?;
    import(&mut buf, &text, &Base64Encoding)?;
    while let Some(header) = buf.read_block()? {
        let seq: u32 = buf.read()?;
        let reading: f32 = buf.read()?;
        let unit = buf.read_string()?;
        eprintln!("[reader] {} #{seq}: {reading} {unit}", header.id_lossy());
    }

    writer
        .join()
        .expect("writer thread should not panic")
        .expect("writer should complete without error");
    Ok(())
}
