//! Stitch two image files with a tuned configuration.
//!
//! The matches file is JSON: `{"src_pts": [[x, y], ...], "dst_pts": [[x, y], ...]}`,
//! index-aligned, in 0-based pixel coordinates of the respective image.

use image::ImageReader;
use panostitch::{Interpolation, StitchConfig, Stitcher};
use std::error::Error;

#[derive(serde::Deserialize)]
struct Matches {
    src_pts: Vec<[f64; 2]>,
    dst_pts: Vec<[f64; 2]>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!(
            "Usage: {} <src.png> <dst.png> <matches.json> [out.png]",
            args[0]
        );
        std::process::exit(2);
    }

    let src = ImageReader::open(&args[1])?.decode()?.to_rgb8();
    let dst = ImageReader::open(&args[2])?.decode()?.to_rgb8();
    let matches: Matches = serde_json::from_str(&std::fs::read_to_string(&args[3])?)?;

    let mut cfg = StitchConfig::default();
    cfg.ransac.inlier_ratio = 0.6;
    cfg.ransac.max_err = 2.0;
    cfg.ransac.seed = 7;
    cfg.warp.interpolation = Interpolation::Bilinear;

    let stitcher = Stitcher::with_config(cfg);
    let pano = stitcher.stitch(&src, &dst, &matches.src_pts, &matches.dst_pts)?;

    println!(
        "Panorama {}x{}: {}/{} inliers, mean err {:.2}px, p95 {:.2}px.",
        pano.layout.width,
        pano.layout.height,
        pano.ransac.n_inliers,
        pano.ransac.n_points,
        pano.ransac.mean_err_px,
        pano.ransac.p95_err_px
    );

    let out_path = args.get(4).map(String::as_str).unwrap_or("panorama.png");
    pano.image.save(out_path)?;
    println!("Wrote {out_path}");
    Ok(())
}
