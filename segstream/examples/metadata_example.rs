//! Example showing the serializable image metadata summary
//!
//! Builds a small PNG in memory, parses it, and dumps the header
//! summary as JSON.

use miniz_oxide::deflate::compress_to_vec_zlib;
use segstream::{Buffer, PngDecoder, PNG_SIGNATURE};

fn chunk(ctype: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(ctype);
    out.extend_from_slice(payload);
    out.extend_from_slice(&[0, 0, 0, 0]);
    out
}

fn main() -> segstream::Result<()> {
    // 2x2 truecolor gradient, one filter byte per row
    let scanlines = [
        0, 255, 0, 0, 0, 255, 0, //
        0, 0, 0, 255, 128, 128, 128,
    ];

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&2u32.to_be_bytes());
    ihdr.extend_from_slice(&2u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);

    let mut phys = Vec::new();
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.push(1);

    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend(chunk(b"IHDR", &ihdr));
    bytes.extend(chunk(b"pHYs", &phys));
    bytes.extend(chunk(b"IDAT", &compress_to_vec_zlib(&scanlines, 6)));
    bytes.extend(chunk(b"IEND", &[]));

    let mut image = PngDecoder::from_buffer(Buffer::from_vec(bytes))?;
    image.decode_pixels()?;

    let info = image.info();
    println!("{}", serde_json::to_string_pretty(&info).expect("serializable"));

    println!("corner: {:?}", image.get_pixel(0, 0)?);
    Ok(())
}
