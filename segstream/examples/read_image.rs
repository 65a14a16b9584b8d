//! Example showing the segmented decode path for a PNG on disk
//!
//! The file is read in small segments the way a network caller would
//! append payloads, then decoded and sampled at its four corners.

use segstream::{read_file_segmented, PngDecoder};
use std::time::Instant;

fn main() -> segstream::Result<()> {
    let Some(path) = std::env::args().nth(1) else {
        println!("usage: read_image <file.png>");
        return Ok(());
    };

    println!("=== Segmented PNG Decode ===");

    let start = Instant::now();
    let list = read_file_segmented(&path, 4096)?;
    println!(
        "1. Loaded {} bytes in {} segments ({:.3}ms)",
        list.available_bytes(),
        list.available_buffers(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let start = Instant::now();
    let mut image = PngDecoder::from_list(list)?;
    println!(
        "2. Parsed chunks in {:.3}ms: {}x{}, {}-bit {}",
        start.elapsed().as_secs_f64() * 1000.0,
        image.width(),
        image.height(),
        image.bit_depth(),
        image.color_type()
    );
    if let Some(dims) = image.physical_dimensions() {
        println!("   Density: {}x{} (unit {})", dims.x, dims.y, dims.unit);
    }

    let start = Instant::now();
    image.decode_pixels()?;
    println!(
        "3. Decoded {} pixel bytes in {:.3}ms",
        image.pixels().map(<[u8]>::len).unwrap_or(0),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let right = image.width().saturating_sub(1);
    let bottom = image.height().saturating_sub(1);
    for (x, y) in [(0, 0), (right, 0), (0, bottom), (right, bottom)] {
        let [r, g, b, a] = image.get_pixel(x, y)?;
        println!("   ({x},{y}) -> rgba({r},{g},{b},{a})");
    }

    Ok(())
}
