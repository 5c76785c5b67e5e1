use image_enhancer::services::{denoise, spatial, tone};
use image_enhancer::{encode_all, enhance, BgrImage, EnhanceParams, OutputFormat, SizeSpec};

fn textured(width: u32, height: u32) -> BgrImage {
    BgrImage::from_fn(width, height, |x, y| {
        let n = (x * 7 + y * 13) % 29;
        [
            (40 + x * 3 + n) as u8,
            (90 + y * 4) as u8,
            (150 + (x + y) % 60) as u8,
        ]
    })
}

#[test]
fn enhance_is_deterministic() {
    let img = textured(40, 30);
    let params = EnhanceParams {
        size: SizeSpec::ScaleFactor(1.5),
        ..EnhanceParams::default()
    };
    let a = enhance(&img, &params).unwrap();
    let b = enhance(&img, &params).unwrap();
    assert_eq!(a, b);

    let bundle_a = encode_all(&a).unwrap();
    let bundle_b = encode_all(&b).unwrap();
    for format in OutputFormat::ALL {
        assert_eq!(bundle_a.get(format), bundle_b.get(format), "{}", format.key());
    }
}

#[test]
fn stages_preserve_shape() {
    let img = textured(37, 23);
    let dims = img.dimensions();
    assert_eq!(denoise::denoise_colored(&img, 5.0, 5.0).dimensions(), dims);
    assert_eq!(tone::gray_world_white_balance(&img).dimensions(), dims);
    assert_eq!(tone::clahe_luma(&img, 2.0).dimensions(), dims);
    assert_eq!(tone::contrast_stretch_luma(&img, 1.0, 99.0).dimensions(), dims);
    assert_eq!(spatial::unsharp_mask(&img, 0.6, 1.2).dimensions(), dims);
    assert_eq!(tone::adjust_saturation(&img, 1.05).dimensions(), dims);
}

#[test]
fn upscale_hits_exact_size() {
    let img = textured(100, 50);
    let params = EnhanceParams {
        size: SizeSpec::from_options(None, Some(300), None),
        ..EnhanceParams::default()
    };
    let out = enhance(&img, &params).unwrap();
    assert_eq!(out.dimensions(), (300, 150));
}

#[test]
fn upscale_rounds_half_to_even() {
    let img = textured(100, 50);
    let params = EnhanceParams {
        size: SizeSpec::TargetWidth(301),
        ..EnhanceParams::default()
    };
    assert_eq!(enhance(&img, &params).unwrap().dimensions(), (301, 150));
}

#[test]
fn width_takes_precedence_over_scale() {
    let spec = SizeSpec::from_options(Some(4.0), Some(300), None);
    assert_eq!(spec.resolve(100, 50), (300, 150));
    assert_ne!(spec.resolve(100, 50), SizeSpec::ScaleFactor(4.0).resolve(100, 50));
}

#[test]
fn stretch_leaves_flat_image_alone() {
    let img = BgrImage::filled(50, 40, [12, 200, 77]);
    assert_eq!(tone::contrast_stretch_luma(&img, 1.0, 99.0), img);
}

#[test]
fn neutral_gray_survives_default_pipeline() {
    let img = BgrImage::filled(640, 480, [128, 128, 128]);
    let params = EnhanceParams {
        size: SizeSpec::ScaleFactor(1.0),
        ..EnhanceParams::default()
    };
    let out = enhance(&img, &params).unwrap();
    assert_eq!(out.dimensions(), (640, 480));
    assert!(out.pixels().all(|p| p == [128, 128, 128]));
}

#[test]
fn encoded_outputs_match_pipeline_size() {
    let img = textured(24, 18);
    let params = EnhanceParams {
        size: SizeSpec::TargetSize(31, 17),
        ..EnhanceParams::default()
    };
    let out = enhance(&img, &params).unwrap();
    let bundle = encode_all(&out).unwrap();
    for (format, bytes) in bundle.iter() {
        let decoded = image::load_from_memory(bytes).unwrap();
        assert_eq!(
            (decoded.width(), decoded.height()),
            (31, 17),
            "{}",
            format.key()
        );
    }

    let png = image::load_from_memory(bundle.get(OutputFormat::Png).unwrap()).unwrap();
    assert_eq!(BgrImage::from_dynamic(&png), out);
}
