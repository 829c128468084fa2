//! Pick the brightest of several local images.
//!
//! All images must share the same dimensions.
//!
//! ```sh
//! cargo run --example select_best -- a.png b.png c.png
//! ```

use letzai_rs::{select_best, ImageBatch};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: select_best <image>...");
        return Ok(());
    }

    let mut images = Vec::new();
    for path in &paths {
        images.push(ImageBatch::decode(&std::fs::read(path)?)?);
    }
    let batch = ImageBatch::stack(images)?;

    let index = letzai_rs::selector::best_index(&batch).unwrap_or(0);
    let best = select_best(&batch)?;
    println!("Brightest: {} (shape {:?})", paths[index], best.shape());

    Ok(())
}
