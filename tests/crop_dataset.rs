mod common;

use std::fs;

use meterscan::cropper::crop_dataset;
use meterscan::dataset;

#[test]
fn centered_meter_box_produces_expected_crop() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let input = dataset::ensure_layout(&dir.path().join("input"))?;
    common::write_image(&input.images_dir.join("meter01.png"), 640, 480)?;
    fs::write(input.labels_dir.join("meter01.txt"), "0 0.5 0.5 0.4 0.6\n")?;

    let output = dir.path().join("cropped");
    let report = crop_dataset(&input.images_dir, &input.labels_dir, &output)?;

    assert_eq!(report.images_processed, 1);
    assert_eq!(report.boxes_cropped, 1);
    assert_eq!(report.boxes_skipped_degenerate, 0);

    let crop_image = output.join("images/meter01_crop_0.png");
    assert_eq!(common::image_size(&crop_image)?, (256, 288));

    let crop_label = fs::read_to_string(output.join("labels/meter01_crop_0.txt"))?;
    assert_eq!(crop_label, "0 0.5 0.5 1.0 1.0\n");
    Ok(())
}

#[test]
fn crop_count_matches_non_degenerate_boxes() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let input = dataset::ensure_layout(&dir.path().join("input"))?;
    common::write_image(&input.images_dir.join("meter01.jpg"), 320, 240)?;
    // Three records, the middle one degenerate (zero width).
    fs::write(
        input.labels_dir.join("meter01.txt"),
        "0 0.3 0.3 0.2 0.2\n1 0.5 0.5 0.0 0.2\n2 0.7 0.7 0.2 0.2\n",
    )?;

    let output = dir.path().join("cropped");
    let report = crop_dataset(&input.images_dir, &input.labels_dir, &output)?;

    assert_eq!(report.boxes_cropped, 2);
    assert_eq!(report.boxes_skipped_degenerate, 1);

    // Index counts non-degenerate boxes only, in label-file order.
    assert!(output.join("images/meter01_crop_0.jpg").is_file());
    assert!(output.join("images/meter01_crop_1.jpg").is_file());
    assert!(!output.join("images/meter01_crop_2.jpg").exists());

    // Crop labels carry the source record's class.
    assert_eq!(
        fs::read_to_string(output.join("labels/meter01_crop_0.txt"))?,
        "0 0.5 0.5 1.0 1.0\n"
    );
    assert_eq!(
        fs::read_to_string(output.join("labels/meter01_crop_1.txt"))?,
        "2 0.5 0.5 1.0 1.0\n"
    );
    Ok(())
}

#[test]
fn image_without_label_is_skipped_not_fatal() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let input = dataset::ensure_layout(&dir.path().join("input"))?;
    common::write_image(&input.images_dir.join("meter01.png"), 100, 100)?;
    common::write_image(&input.images_dir.join("meter02.png"), 100, 100)?;
    fs::write(input.labels_dir.join("meter02.txt"), "0 0.5 0.5 0.5 0.5\n")?;

    let output = dir.path().join("cropped");
    let report = crop_dataset(&input.images_dir, &input.labels_dir, &output)?;

    assert_eq!(report.images_skipped_no_label, 1);
    assert_eq!(report.images_processed, 1);
    assert_eq!(report.boxes_cropped, 1);
    assert!(output.join("images/meter02_crop_0.png").is_file());
    assert!(!output.join("images/meter01_crop_0.png").exists());
    Ok(())
}

#[test]
fn malformed_label_file_skips_that_image_only() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let input = dataset::ensure_layout(&dir.path().join("input"))?;
    common::write_image(&input.images_dir.join("meter01.png"), 100, 100)?;
    common::write_image(&input.images_dir.join("meter02.png"), 100, 100)?;
    fs::write(input.labels_dir.join("meter01.txt"), "0 not-a-number 0.5 0.5 0.5\n")?;
    fs::write(input.labels_dir.join("meter02.txt"), "0 0.5 0.5 0.5 0.5\n")?;

    let output = dir.path().join("cropped");
    let report = crop_dataset(&input.images_dir, &input.labels_dir, &output)?;

    assert_eq!(report.labels_malformed, 1);
    assert_eq!(report.images_processed, 1);
    assert!(output.join("images/meter02_crop_0.png").is_file());
    Ok(())
}

#[test]
fn box_hanging_over_the_edge_is_clamped() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let input = dataset::ensure_layout(&dir.path().join("input"))?;
    common::write_image(&input.images_dir.join("meter01.png"), 640, 480)?;
    fs::write(input.labels_dir.join("meter01.txt"), "0 0.95 0.5 0.3 0.4\n")?;

    let output = dir.path().join("cropped");
    let report = crop_dataset(&input.images_dir, &input.labels_dir, &output)?;

    assert_eq!(report.boxes_cropped, 1);
    let (w, h) = common::image_size(&output.join("images/meter01_crop_0.png"))?;
    // x1 = round(0.8 * 640) = 512, clamped right edge at 640.
    assert_eq!((w, h), (128, 192));
    Ok(())
}

#[test]
fn cropping_twice_produces_identical_output() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let input = dataset::ensure_layout(&dir.path().join("input"))?;
    common::write_image(&input.images_dir.join("meter01.png"), 200, 150)?;
    common::write_image(&input.images_dir.join("meter02.png"), 300, 200)?;
    fs::write(
        input.labels_dir.join("meter01.txt"),
        "0 0.5 0.5 0.4 0.4\n1 0.2 0.2 0.3 0.3\n",
    )?;
    fs::write(input.labels_dir.join("meter02.txt"), "0 0.6 0.6 0.2 0.2\n")?;

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    let report_a = crop_dataset(&input.images_dir, &input.labels_dir, &first)?;
    let report_b = crop_dataset(&input.images_dir, &input.labels_dir, &second)?;
    assert_eq!(report_a, report_b);

    let images_a = common::file_names(&first.join("images"))?;
    let images_b = common::file_names(&second.join("images"))?;
    assert_eq!(images_a, images_b);

    for name in common::file_names(&first.join("labels"))? {
        let a = fs::read(first.join("labels").join(&name))?;
        let b = fs::read(second.join("labels").join(&name))?;
        assert_eq!(a, b, "label {name} differs between runs");
    }
    for name in &images_a {
        let a = fs::read(first.join("images").join(name))?;
        let b = fs::read(second.join("images").join(name))?;
        assert_eq!(a, b, "crop {name} differs between runs");
    }
    Ok(())
}
