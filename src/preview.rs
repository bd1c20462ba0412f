//! Blocking on-screen preview of the annotated image.

use image::RgbImage;

use crate::error::Result;

pub const WINDOW_TITLE: &str = "Descriptors";

/// Shows `img` in a window and waits for a key press.
#[cfg(feature = "opencv")]
pub fn show(img: &RgbImage) -> Result<()> {
    use opencv::core::{Mat, Vec3b, VecN};
    use opencv::highgui;

    // highgui expects BGR
    let bgr: Vec<Vec3b> = img.pixels().map(|p| VecN([p[2], p[1], p[0]])).collect();
    let mat = Mat::new_rows_cols_with_data(img.height() as i32, img.width() as i32, &bgr)?;
    highgui::imshow(WINDOW_TITLE, &mat)?;
    highgui::wait_key(0)?;
    highgui::destroy_window(WINDOW_TITLE)?;
    Ok(())
}

/// Without a window backend there is nothing to show; block on stdin instead so the
/// interaction stays the same.
#[cfg(not(feature = "opencv"))]
pub fn show(img: &RgbImage) -> Result<()> {
    log::warn!(
        "built without the `opencv` feature, cannot open the {}x{} \"{}\" window; press Enter",
        img.width(),
        img.height(),
        WINDOW_TITLE
    );
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(())
}
