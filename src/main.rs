use std::path::Path;
use std::time::Instant;

use log::{error, info, LevelFilter};

use fast_als::{
    AlsError, Factorizer, FoldInProjector, InMemoryRatings, Preference, RatingSource,
    TrainingArgs,
};

/// Share of the ratings held out for the per-iteration error
const HOLDOUT_FRACTION: f64 = 0.1;
const HOLDOUT_SEED: u64 = 378934;

/// Headerless tab-separated `user item rating` records
fn read_ratings(path: &Path) -> Result<InMemoryRatings, AlsError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_path(path)?;

    let mut preferences = Vec::new();
    for record in reader.deserialize() {
        let preference: Preference = record?;
        preferences.push(preference);
    }
    Ok(InMemoryRatings::from_preferences(preferences))
}

fn run() -> Result<(), AlsError> {
    let args = TrainingArgs::new(std::env::args())?;

    let load_start = Instant::now();
    let ratings = read_ratings(&args.ratings_path)?;
    info!(
        "Loaded {} ratings of {} users on {} items in {}ms",
        ratings.num_preferences(),
        ratings.num_users(),
        ratings.num_items(),
        load_start.elapsed().as_millis()
    );

    let (training, test) = ratings.split(HOLDOUT_FRACTION, HOLDOUT_SEED)?;

    let train_start = Instant::now();
    let factorization = Factorizer::new(args.config, &training)?
        .with_test_data(&test)
        .factorize()?;
    info!("Model trained in {}ms", train_start.elapsed().as_millis());

    for (iteration, error) in factorization.errors().iter().enumerate() {
        info!("Error after iteration {}: {:.4}", iteration, error);
    }

    let projector = FoldInProjector::new(factorization)?;
    if let Some(&user_id) = test.user_ids().first() {
        let item_ids: Vec<u64> = test
            .preferences_from_user(user_id)?
            .iter()
            .map(|&(item_id, _)| item_id)
            .collect();
        match projector.fold_in_user(&item_ids) {
            Ok(features) => info!(
                "Folded in held-out items of user {}: {:?}",
                user_id,
                features.to_vec()
            ),
            Err(e) => info!("Could not fold in user {}: {}", user_id, e),
        }
    }

    Ok(())
}

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .expect("Failed to initialize logger");

    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("usage: fast_als <ratings.tsv> <num_features> <lambda> <num_iterations> [alpha]");
        std::process::exit(1);
    }
}
