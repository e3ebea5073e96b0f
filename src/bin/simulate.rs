use std::path::PathBuf;

use anyhow::Context;

use volley_tracker::config::TrackerConfig;
use volley_tracker::persist;
use volley_tracker::rally::Team;
use volley_tracker::sim::{self, DEMO_OPPONENT, RallySim};
use volley_tracker::state::{Command, Tracker};

fn main() -> anyhow::Result<()> {
    let matches = std::env::args()
        .nth(1)
        .map(|raw| raw.parse::<usize>())
        .transpose()
        .context("match count must be a number")?
        .unwrap_or(1)
        .max(1);
    let out = std::env::args().nth(2).map(PathBuf::from);

    let cfg = TrackerConfig::from_env();
    let opponent = if cfg.opponent.is_empty() {
        DEMO_OPPONENT.to_string()
    } else {
        cfg.opponent.clone()
    };
    let mut tracker = Tracker::from_config(&cfg);
    let mut rng = RallySim::new(cfg.sim_seed);

    for n in 0..matches {
        tracker.apply(Command::NewMatch {
            opponent: opponent.clone(),
        })?;
        let applied = sim::play_match(&mut tracker, &mut rng)?;
        let Some(saved) = tracker.archive().latest() else {
            anyhow::bail!("match {} finished without being saved", n + 1);
        };
        let sets: Vec<String> = saved
            .per_set_logs
            .iter()
            .map(|s| s.final_score.display())
            .collect();
        println!(
            "match {:>3}: {} {}-{} {} [{}] rallies={} commands={}",
            n + 1,
            cfg.home_name,
            saved.final_score.home,
            saved.final_score.away,
            saved.opponent,
            sets.join(", "),
            saved.points_for(Team::Home) + saved.points_for(Team::Away),
            applied
        );
    }

    let home_wins = tracker
        .archive()
        .matches()
        .iter()
        .filter(|m| m.winner == Team::Home)
        .count();
    println!(
        "simulated={} home_wins={} away_wins={}",
        tracker.archive().len(),
        home_wins,
        tracker.archive().len() - home_wins
    );

    if let Some(path) = out {
        persist::export_archive(tracker.archive(), &path)?;
        println!("archive written to {}", path.display());
    }
    Ok(())
}
