use std::io::{BufRead, Write};

use anyhow::Result;
use ezexp_experiment::{Experiment, ExperimentError, ExperimentFacade};
use ezexp_timing::Clock;
use log::{info, warn};
use rand::Rng;

/// Column filled by `simulate` when no result columns are declared
const DEFAULT_RESULT: &str = "score";

pub fn inspect<C: Clock, W: Write>(experiment: &Experiment<C>, mut out: W) -> Result<()> {
    writeln!(
        out,
        "{} trials for participant '{}' in {}",
        experiment.trials().len(),
        experiment.participant_id(),
        experiment.source_path().display()
    )?;
    writeln!(out, "Parameters: {}", experiment.parameter_names().join(", "))?;
    for trial in experiment.trials() {
        writeln!(
            out,
            "  #{:<3} {}",
            trial.index() + 1,
            trial.serialize(", ", false, false)?
        )?;
    }
    Ok(())
}

/// Moves to the next trial; `false` once every trial has been performed.
fn next_trial<C: Clock>(facade: &mut ExperimentFacade<C>) -> Result<bool> {
    match facade.load_next_trial() {
        Ok(_) => Ok(true),
        Err(ExperimentError::AllTrialsPerformed) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Steps through the remaining trials, reading `name=value` results until a blank line.
///
/// Returns the number of trials completed. Stops early when the input closes.
pub fn run_interactive<C, R, W>(
    facade: &mut ExperimentFacade<C>,
    input: R,
    mut out: W,
) -> Result<usize>
where
    C: Clock,
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();
    let mut completed = 0;

    while next_trial(facade)? {
        facade.start_trial()?;
        let trial = facade.current_trial()?;
        writeln!(
            out,
            "Trial {}: {}",
            trial.index() + 1,
            trial.serialize(", ", false, false)?
        )?;
        writeln!(out, "Enter results as name=value, blank line ends the trial")?;

        let mut input_closed = true;
        for line in lines.by_ref() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                input_closed = false;
                break;
            }
            match line.split_once('=') {
                Some((name, value)) => {
                    if facade.set_result(name.trim(), value.trim())? {
                        writeln!(out, "  '{}' overwritten", name.trim())?;
                    }
                }
                None => {
                    warn!("ignoring input line '{line}'");
                    writeln!(out, "  expected name=value, got '{line}'")?;
                }
            }
        }

        facade.end_trial()?;
        completed += 1;
        if input_closed {
            info!("input closed after {completed} trials");
            break;
        }
    }

    Ok(completed)
}

/// Runs every remaining trial with random integer results in `0..100`.
pub fn simulate<C, R, W>(facade: &mut ExperimentFacade<C>, rng: &mut R, mut out: W) -> Result<usize>
where
    C: Clock,
    R: Rng,
    W: Write,
{
    let mut columns = facade.experiment()?.result_columns().to_vec();
    if columns.is_empty() {
        columns.push(DEFAULT_RESULT.to_string());
    }

    let mut completed = 0;
    while next_trial(facade)? {
        facade.start_trial()?;
        for column in &columns {
            let value: u32 = rng.random_range(0..100);
            facade.set_result(column, value.to_string())?;
        }
        facade.end_trial()?;

        let trial = facade.current_trial()?;
        writeln!(
            out,
            "Trial {}: {}",
            trial.index() + 1,
            trial.serialize(", ", true, false)?
        )?;
        completed += 1;
    }

    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ezexp_core::FileFormat;
    use ezexp_experiment::{ExperimentConfig, MAIN_DURATION_RESULT};
    use ezexp_timing::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    const SHAPES: &str = "USER_ID,Color,Shape\nU1,red,circle\nU2,blue,square\nU1,green,triangle\n";

    fn facade(dir: &Path, config: ExperimentConfig) -> (ExperimentFacade<ManualClock>, PathBuf) {
        let source = dir.join("shapes.csv");
        std::fs::write(&source, SHAPES).unwrap();
        let mut facade = ExperimentFacade::with_clock(config, ManualClock::new());
        facade
            .init_experiment(&source, "U1", "USER_ID", FileFormat::Csv, FileFormat::Csv)
            .unwrap();
        (facade, dir.join("U1-results.csv"))
    }

    #[test]
    fn test_inspect_lists_trials() {
        let dir = tempfile::tempdir().unwrap();
        let (facade, _) = facade(dir.path(), ExperimentConfig::default());

        let mut out = Vec::new();
        inspect(facade.experiment().unwrap(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("2 trials for participant 'U1'"));
        assert!(text.contains("Parameters: USER_ID, Color, Shape"));
        assert!(text.contains("USER_ID=U1, Color=green, Shape=triangle"));
    }

    #[test]
    fn test_run_reads_results_per_trial() {
        let dir = tempfile::tempdir().unwrap();
        let (mut facade, output) = facade(dir.path(), ExperimentConfig::default());

        let input = Cursor::new("speed=12\nbogus\nspeed=13\n\naccuracy = 0.9\n\n");
        let mut out = Vec::new();
        let completed = run_interactive(&mut facade, input, &mut out).unwrap();
        assert_eq!(completed, 2);

        let trial = facade.experiment().unwrap().trials()[0].clone();
        assert_eq!(trial.result("speed").unwrap(), "13");
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("expected name=value, got 'bogus'"));
        assert!(text.contains("'speed' overwritten"));

        facade.save().unwrap();
        let saved = std::fs::read_to_string(output).unwrap();
        assert!(saved.starts_with(&format!(
            "USER_ID,Color,Shape,speed,{MAIN_DURATION_RESULT},accuracy\n"
        )));
    }

    #[test]
    fn test_run_stops_when_input_closes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut facade, _) = facade(dir.path(), ExperimentConfig::default());

        let completed = run_interactive(&mut facade, Cursor::new("speed=1\n"), Vec::new()).unwrap();
        assert_eq!(completed, 1);
        assert_eq!(facade.experiment().unwrap().current_trial_index(), Some(0));
    }

    #[test]
    fn test_simulate_fills_declared_columns() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExperimentConfig {
            result_columns: vec!["speed".to_string(), "accuracy".to_string()],
            ..Default::default()
        };
        let (mut facade, _) = facade(dir.path(), config);

        let mut rng = StdRng::seed_from_u64(7);
        let completed = simulate(&mut facade, &mut rng, Vec::new()).unwrap();
        assert_eq!(completed, 2);

        for trial in facade.experiment().unwrap().trials() {
            let speed: u32 = trial.result("speed").unwrap().parse().unwrap();
            assert!(speed < 100);
            assert!(trial.result("accuracy").is_ok());
            assert!(trial.state().is_ended());
        }
    }

    #[test]
    fn test_simulate_defaults_to_score() {
        let dir = tempfile::tempdir().unwrap();
        let (mut facade, _) = facade(dir.path(), ExperimentConfig::default());

        let mut rng = StdRng::seed_from_u64(1);
        simulate(&mut facade, &mut rng, Vec::new()).unwrap();
        let trials = facade.experiment().unwrap().trials();
        assert!(trials.iter().all(|t| t.result(DEFAULT_RESULT).is_ok()));
    }
}
