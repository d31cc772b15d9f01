// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use crate::dataset::{DatasetConfig, RecordingDataset, Split};
use crate::error::Result;
use crate::{info, success, verbose};

use super::args::InspectArgs;
use super::logging;

/// Summarize the sessions and split sizes of a recording directory.
pub fn run(args: &InspectArgs) -> Result<()> {
    logging::set_verbose(args.verbose);

    let held_out = args.test_exercises.clone();
    let train = RecordingDataset::new(
        &args.recordings,
        DatasetConfig::new().with_test_exercises(held_out.clone()),
    )?;
    let test = RecordingDataset::new(
        &args.recordings,
        DatasetConfig::new()
            .with_test_exercises(held_out)
            .with_split(Split::Test),
    )?;

    info!("Recordings: {}", args.recordings.display());
    for dataset in [&train, &test] {
        info!(
            "{} split: {} sessions, {} frames",
            dataset.config().split,
            dataset.sessions().len(),
            dataset.len()
        );
        for session in dataset.sessions() {
            verbose!(
                "  {} (exercise '{}', {} frames)",
                session.name,
                session.exercise(),
                session.frames
            );
        }
    }

    success!("{} frames indexed", train.len() + test.len());
    Ok(())
}
