use std::{env, fs, io};

use comms::specs::machine_learning::SolverSpec;
use log::info;
use machine_learning::scheduling::LrScheduler;

use worker::{
    WorkerErr,
    progress::{Stage, log_msg},
};

const CONFIG_VAR: &str = "SOLVER_CONFIG";

/// Previews the learning rate schedule described by a solver config.
fn main() -> io::Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .or_else(|| env::var(CONFIG_VAR).ok())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("usage: worker <solver.json>, or set {CONFIG_VAR}"),
            )
        })?;

    info!("reading solver config from {path}");
    let spec: SolverSpec = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let scheduler = LrScheduler::from_spec(&spec).map_err(WorkerErr::from)?;

    for line in preview(&scheduler, spec.epochs.get()) {
        println!("{}", log_msg(&line, Stage::Info));
    }

    Ok(())
}

/// One line per epoch with the rate at its first batch, plus the final batch for cosine.
fn preview(scheduler: &LrScheduler, epochs: usize) -> Vec<String> {
    let mut lines = vec![format!("{epochs} epochs")];

    // Multistep only moves at the first batch of an epoch, so it carries its own rate forward.
    let mut lr = scheduler.base_lr();
    for epoch in 1..=epochs {
        lr = scheduler.learning_rate(epoch, 0, lr);
        lines.push(format!("epoch {epoch:>4}  lr {lr:.6e}"));
    }

    if let LrScheduler::Cosine(cosine) = scheduler {
        let last = cosine.batches_per_epoch() - 1;
        let final_lr = scheduler.learning_rate(epochs, last, lr);
        lines.push(format!("last batch ({epochs}, {last})  lr {final_lr:.6e}"));
    }

    lines
}

#[cfg(test)]
mod tests {
    use machine_learning::scheduling::{MultiStep, WarmupCosine};

    use super::*;

    #[test]
    fn multistep_preview_has_a_line_per_epoch() {
        let scheduler = LrScheduler::MultiStep(MultiStep::new(0.1, vec![1], 0.1));
        let lines = preview(&scheduler, 2);

        assert_eq!(lines, ["2 epochs", "epoch    1  lr 1.000000e-1", "epoch    2  lr 1.000000e-2"]);
    }

    #[test]
    fn cosine_preview_ends_with_the_last_batch() {
        let cosine = WarmupCosine::new(0.2, 0.01, 1, 3, 10).unwrap();
        let lines = preview(&LrScheduler::Cosine(cosine), 3);

        assert_eq!(lines.len(), 5);
        assert!(lines[4].starts_with("last batch (3, 9)"), "{}", lines[4]);
    }
}
