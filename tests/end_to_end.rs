//! End-to-end training smoke test on a synthetic dataset.
//!
//! Two classes of solid-color images, a handful of epochs on the CPU
//! backend at a reduced image size. Verifies that the pipeline runs to
//! completion and produces loadable artifacts with the right output width.

use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::tensor::Tensor;
use image::{Rgb, RgbImage};

use dermaclass::config::TrainConfig;
use dermaclass::model::classifier::{ModelSpec, SkinClassifier, Trainability};
use dermaclass::training::fit;

type TestBackend = Autodiff<NdArray>;

fn write_class_images(dir: &Path, class: &str, value: u8, count: usize) {
    let class_dir = dir.join(class);
    std::fs::create_dir_all(&class_dir).unwrap();

    for i in 0..count {
        let mut img = RgbImage::new(8, 8);
        for pixel in img.pixels_mut() {
            *pixel = Rgb([value, value.wrapping_add(i as u8), value]);
        }
        img.save(class_dir.join(format!("img{:02}.png", i))).unwrap();
    }
}

#[test]
fn synthetic_two_class_training_run() {
    let data_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();

    write_class_images(data_dir.path(), "benign", 40, 10);
    write_class_images(data_dir.path(), "malignant", 220, 10);

    let config = TrainConfig {
        data_dir: data_dir.path().to_path_buf(),
        image_size: 32,
        batch_size: 4,
        epochs: 3,
        validation_fraction: 0.2,
        seed: 123,
        learning_rate: 1e-3,
        dropout: 0.3,
        head_width: 16,
        patience: 5,
        output_dir: output_dir.path().to_path_buf(),
        ..Default::default()
    };

    let device = Default::default();
    let report = fit::<TestBackend>(&config, device).expect("training run failed");

    assert_eq!(report.num_classes, 2);
    assert_eq!(report.epochs_run, 3);
    assert!(!report.stopped_early, "patience 5 cannot trigger in 3 epochs");
    assert!(report.best_epoch < report.epochs_run);
    assert!((0.0..=1.0).contains(&report.best_val_accuracy));

    // Both artifacts and the label manifest exist on disk
    assert!(report.best_artifact.with_extension("mpk").exists());
    assert!(report.final_artifact.with_extension("mpk").exists());

    let manifest_path = output_dir.path().join("labels.json");
    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
    let classes = manifest["classes"].as_array().unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0], "benign");
    assert_eq!(classes[1], "malignant");

    // The final artifact loads into a width-2 model and predicts over 2 classes
    let device = Default::default();
    let spec = ModelSpec {
        num_classes: 2,
        head_width: 16,
        dropout: 0.3,
        trainability: Trainability {
            backbone: true,
            head: true,
        },
        backbone_weights: None,
    };
    let model = SkinClassifier::<NdArray>::new(&spec, &device).unwrap();
    let model = {
        use burn::module::Module;
        use burn::record::CompactRecorder;
        model
            .load_file(&report.final_artifact, &CompactRecorder::new(), &device)
            .expect("final artifact should load")
    };

    let input = Tensor::<NdArray, 4>::zeros([1, 3, 32, 32], &device);
    assert_eq!(model.forward(input).dims(), [1, 2]);
}
