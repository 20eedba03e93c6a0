//! End-to-end runs against real files on disk

use std::fs;
use std::path::Path;
use std::time::Duration;

use ezexp_core::FileFormat;
use ezexp_experiment::{
    Experiment, ExperimentConfig, ExperimentError, ExperimentFacade, MAIN_DURATION_RESULT,
};
use ezexp_timing::{ManualClock, MonotonicClock, TimeUnit};

const SHAPES: &str = "USER_ID,Color,Shape\nU1,red,circle\nU2,blue,square\nU1,green,triangle\n";

fn write(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_shapes_walkthrough() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "shapes.csv", SHAPES.as_bytes());

    let mut experiment = Experiment::load(
        &source,
        "U1",
        &ExperimentConfig::default(),
        MonotonicClock::new(),
    )
    .unwrap();
    assert_eq!(experiment.trials().len(), 2);

    let first = experiment.load_next_trial().unwrap();
    assert_eq!(first.parameter_value("Color").unwrap(), "red");
    assert_eq!(first.parameter_value("Shape").unwrap(), "circle");
    assert_eq!(first.parameter_values().len(), 3);

    let second = experiment.load_next_trial().unwrap();
    assert_eq!(second.parameter_value("Color").unwrap(), "green");
    assert_eq!(second.parameter_value("Shape").unwrap(), "triangle");

    assert!(matches!(
        experiment.load_next_trial(),
        Err(ExperimentError::AllTrialsPerformed)
    ));
}

#[test]
fn test_comment_lines_are_skipped_before_and_after_header() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(
        dir.path(),
        "shapes.csv",
        b"# generated by the lab\n#USER_ID,Color\nUSER_ID , Color\n# break\nU1,red\n",
    );

    let experiment =
        Experiment::load(&source, "U1", &ExperimentConfig::default(), ManualClock::new()).unwrap();
    assert_eq!(experiment.parameter_names(), ["USER_ID", "Color"]);
    assert_eq!(experiment.trials().len(), 1);
}

#[test]
fn test_quoted_text_in_comment_does_not_swallow_rows() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(
        dir.path(),
        "pilot.csv",
        b"# pilot,\"draft\nUSER_ID,Color\nU1,red\n\"#2\",blue\n",
    );

    let experiment =
        Experiment::load(&source, "U1", &ExperimentConfig::default(), ManualClock::new()).unwrap();
    assert_eq!(experiment.parameter_names(), ["USER_ID", "Color"]);
    assert_eq!(experiment.trials().len(), 1);

    let quoted =
        Experiment::load(&source, "#2", &ExperimentConfig::default(), ManualClock::new()).unwrap();
    assert_eq!(quoted.trials()[0].parameter_value("Color").unwrap(), "blue");
}

#[test]
fn test_semicolon_separated_gbk_source() {
    let dir = tempfile::tempdir().unwrap();
    let (bytes, _, _) = encoding_rs::GBK.encode("被试;颜色\n甲;红\n乙;蓝\n");
    let source = write(dir.path(), "trials.csv", &bytes);

    let config = ExperimentConfig {
        participant_column: "被试".to_string(),
        encoding: "gbk".to_string(),
        separator: ';',
        ..Default::default()
    };
    let mut experiment = Experiment::load(&source, "乙", &config, ManualClock::new()).unwrap();
    let trial = experiment.load_next_trial().unwrap();
    assert_eq!(trial.parameter_value("颜色").unwrap(), "蓝");
}

#[test]
fn test_json_input_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "shapes.json", b"[]");
    let config = ExperimentConfig {
        input_format: FileFormat::Json,
        ..Default::default()
    };

    let result = Experiment::load(&source, "U1", &config, ManualClock::new());
    assert!(matches!(
        result,
        Err(ExperimentError::UnsupportedFormat { format: FileFormat::Json, .. })
    ));
}

#[test]
fn test_missing_source_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Experiment::load(
        dir.path().join("nope.csv"),
        "U1",
        &ExperimentConfig::default(),
        ManualClock::new(),
    );
    assert!(matches!(result, Err(ExperimentError::Io(_))));
}

#[test]
fn test_facade_run_and_save_csv() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "shapes.csv", SHAPES.as_bytes());
    let clock = ManualClock::new();
    let config = ExperimentConfig {
        time_unit: TimeUnit::Milliseconds,
        result_columns: vec!["speed".to_string(), "accuracy".to_string()],
        ..Default::default()
    };
    let mut facade = ExperimentFacade::with_clock(config, clock.clone());

    facade
        .init_experiment(&source, "U1", "USER_ID", FileFormat::Csv, FileFormat::Csv)
        .unwrap();

    let mut speed = 10;
    loop {
        match facade.load_next_trial() {
            Ok(_) => {}
            Err(ExperimentError::AllTrialsPerformed) => break,
            Err(other) => panic!("unexpected error: {other}"),
        }
        facade.start_trial().unwrap();
        clock.advance(Duration::from_millis(250));
        facade.set_result("speed", speed.to_string()).unwrap();
        facade.end_trial().unwrap();
        speed += 5;
    }

    assert_eq!(facade.save().unwrap(), 2);
    let output = dir.path().join("U1-results.csv");
    let text = fs::read_to_string(output).unwrap();
    assert_eq!(
        text,
        format!(
            "USER_ID,Color,Shape,speed,accuracy,{MAIN_DURATION_RESULT}\n\
             U1,red,circle,10,,250\n\
             U1,green,triangle,15,,250\n"
        )
    );
}

#[test]
fn test_save_json_to_custom_path() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "shapes.csv", SHAPES.as_bytes());
    let mut facade = ExperimentFacade::with_clock(ExperimentConfig::default(), ManualClock::new());

    let experiment = facade
        .init_experiment(&source, "U2", "USER_ID", FileFormat::Csv, FileFormat::Json)
        .unwrap();
    let output = dir.path().join("custom.json");
    experiment.set_output_path(&output);

    facade.load_next_trial().unwrap();
    facade.start_trial().unwrap();
    facade.set_result("answer", "square").unwrap();

    assert_eq!(facade.save().unwrap(), 1);
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(parsed[0]["USER_ID"], "U2");
    assert_eq!(parsed[0]["Shape"], "square");
    assert_eq!(parsed[0]["answer"], "square");
}

#[test]
fn test_save_overwrites_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let source = write(dir.path(), "shapes.csv", SHAPES.as_bytes());
    let output = write(dir.path(), "U2-results.csv", b"stale contents that are longer than the new file\n");

    let mut experiment =
        Experiment::load(&source, "U2", &ExperimentConfig::default(), ManualClock::new()).unwrap();
    assert_eq!(experiment.output_path(), output);
    experiment.load_next_trial().unwrap();
    experiment.start_trial().unwrap();
    experiment.save().unwrap();

    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text, "USER_ID,Color,Shape\nU2,blue,square\n");
}
