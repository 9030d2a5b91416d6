use std::num::NonZeroUsize;

use comms::{GatherErr, Gatherer};
use futures::future::try_join_all;
use machine_learning::{
    MlErr,
    arch::{
        Mode, Model,
        loss::{CrossEntropy, LossFn},
    },
    metrics::top_k_accuracy,
};
use ndarray::{Array1, Array2, ArrayD, ArrayViewD, Axis, Ix2, Slice, array, s};
use rand::{Rng, SeedableRng, rngs::StdRng};
use worker::{EvalSummary, Evaluator, WorkerErr};

type Batch = (ArrayD<f32>, Array1<usize>);

/// Hands its input back as logits and remembers the mode of every forward call.
struct Passthrough {
    mode: Mode,
    seen: Vec<Mode>,
    fail_at: Option<usize>,
}

impl Passthrough {
    fn new() -> Self {
        Self {
            mode: Mode::Train,
            seen: Vec::new(),
            fail_at: None,
        }
    }

    fn failing_at(batch: usize) -> Self {
        Self {
            fail_at: Some(batch),
            ..Self::new()
        }
    }
}

impl Model for Passthrough {
    fn forward(&mut self, x: ArrayViewD<f32>) -> machine_learning::Result<Array2<f32>> {
        let batch = self.seen.len();
        self.seen.push(self.mode);

        if self.fail_at == Some(batch) {
            return Err(MlErr::Model(format!("forward failed at batch {batch}")));
        }

        x.to_owned()
            .into_dimensionality::<Ix2>()
            .map_err(|e| MlErr::Model(e.to_string()))
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }
}

fn fixture() -> Vec<Batch> {
    vec![
        (
            array![
                [0.9, 0.1, 0.0, 0.0, 0.0, 0.0],
                [0.1, 0.2, 0.3, 0.4, 0.5, 0.6],
                [0.6, 0.5, 0.4, 0.3, 0.2, 0.1],
                [1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            ]
            .into_dyn(),
            array![0, 0, 3, 0],
        ),
        (
            array![
                [0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
                [1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            ]
            .into_dyn(),
            array![5, 5],
        ),
    ]
}

/// Splits every batch in `world` equal contiguous parts and keeps the `rank`-th one.
fn shard(batches: &[Batch], world: usize, rank: usize) -> Vec<Batch> {
    batches
        .iter()
        .map(|(x, y)| {
            let rows = y.len() / world;
            let range = rank * rows..(rank + 1) * rows;
            let x = x.slice_axis(Axis(0), Slice::from(range.clone())).to_owned();
            let y = y.slice(s![range]).to_owned();
            (x, y)
        })
        .collect()
}

fn all_rows(batches: &[Batch]) -> (Array2<f32>, Array1<usize>) {
    let xs: Vec<_> = batches
        .iter()
        .map(|(x, _)| x.view().into_dimensionality::<Ix2>().unwrap())
        .collect();
    let ys: Vec<_> = batches.iter().map(|(_, y)| y.view()).collect();

    (
        ndarray::concatenate(Axis(0), &xs).unwrap(),
        ndarray::concatenate(Axis(0), &ys).unwrap(),
    )
}

async fn run_group(shards: Vec<Vec<Batch>>) -> Vec<EvalSummary> {
    let world = NonZeroUsize::new(shards.len()).unwrap();

    let tasks = comms::group(world)
        .into_iter()
        .zip(shards)
        .map(|(gatherer, shard)| {
            tokio::spawn(async move {
                let is_master = gatherer.rank() == 0;
                let evaluator = Evaluator::new(gatherer, is_master);
                let mut model = Passthrough::new();
                evaluator.validate(&mut model, shard).await
            })
        });

    try_join_all(tasks)
        .await
        .unwrap()
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[tokio::test]
async fn single_worker_aggregates_weighted_metrics() {
    let batches = fixture();
    let mut model = Passthrough::new();
    let evaluator = Evaluator::new(Gatherer::solo(), true);

    let summary = evaluator.validate(&mut model, batches.clone()).await.unwrap();

    assert_eq!(summary.top1, 50.0);
    assert_eq!(summary.top5, 400.0 / 6.0);

    let (x, y) = all_rows(&batches);
    let expected_loss = CrossEntropy.loss(x.view(), y.view()).unwrap();
    assert!((summary.loss - f64::from(expected_loss)).abs() < 1e-5);
    assert!(summary.batch_time >= 0.0);

    let (top1, top5, loss) = summary.into_tuple();
    assert_eq!((top1, top5, loss), (summary.top1, summary.top5, summary.loss));
}

#[tokio::test]
async fn model_runs_in_inference_mode_and_is_restored() {
    let mut model = Passthrough::new();
    let evaluator = Evaluator::new(Gatherer::solo(), false);

    evaluator.validate(&mut model, fixture()).await.unwrap();

    assert_eq!(model.seen, [Mode::Inference, Mode::Inference]);
    assert_eq!(model.mode, Mode::Train);
}

#[tokio::test]
async fn forward_failure_aborts_and_restores_mode() {
    let mut model = Passthrough::failing_at(1);
    let evaluator = Evaluator::new(Gatherer::solo(), true);

    let err = evaluator.validate(&mut model, fixture()).await.unwrap_err();

    assert!(matches!(err, WorkerErr::Ml(MlErr::Model(_))));
    assert_eq!(model.seen.len(), 2);
    assert_eq!(model.mode, Mode::Train);
}

#[tokio::test]
async fn empty_shard_yields_zeroed_summary() {
    let mut model = Passthrough::new();
    let evaluator = Evaluator::new(Gatherer::solo(), true);

    let summary = evaluator.validate(&mut model, Vec::new()).await.unwrap();

    assert_eq!(summary.into_tuple(), (0.0, 0.0, 0.0));
    assert!(model.seen.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sharded_run_matches_single_worker() {
    let batches = fixture();

    let mut model = Passthrough::new();
    let solo = Evaluator::new(Gatherer::solo(), true)
        .validate(&mut model, batches.clone())
        .await
        .unwrap();

    let shards = (0..2).map(|rank| shard(&batches, 2, rank)).collect();
    let summaries = run_group(shards).await;

    // The role flag only decides who renders progress.
    for summary in summaries {
        assert_eq!(summary.top1, solo.top1);
        assert_eq!(summary.top5, solo.top5);
        assert_eq!(summary.loss, solo.loss);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 3)]
async fn random_shards_cover_the_whole_set() {
    const WORLD: usize = 3;
    const BATCHES: usize = 4;
    const ROWS: usize = 3;
    const CLASSES: usize = 10;

    let mut rng = StdRng::seed_from_u64(11);
    let batches: Vec<Batch> = (0..BATCHES)
        .map(|_| {
            let x = Array2::from_shape_fn((WORLD * ROWS, CLASSES), |_| rng.random_range(-2.0..2.0));
            let y = Array1::from_shape_fn(WORLD * ROWS, |_| rng.random_range(0..CLASSES));
            (x.into_dyn(), y)
        })
        .collect();

    let shards = (0..WORLD).map(|rank| shard(&batches, WORLD, rank)).collect();
    let summaries = run_group(shards).await;

    let (x, y) = all_rows(&batches);
    let acc = top_k_accuracy(x.view(), y.view(), &[1, 5]).unwrap();
    let loss = CrossEntropy.loss(x.view(), y.view()).unwrap();

    for summary in &summaries {
        assert!((summary.top1 - f64::from(acc[0])).abs() < 1e-4);
        assert!((summary.top5 - f64::from(acc[1])).abs() < 1e-4);
        assert!((summary.loss - f64::from(loss)).abs() < 1e-5);
        assert!(summary.top1 <= summary.top5);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mismatched_logits_fail_every_worker() {
    let six: Batch = (Array2::<f32>::zeros((1, 6)).into_dyn(), array![0]);
    let five: Batch = (Array2::<f32>::zeros((1, 5)).into_dyn(), array![0]);

    let tasks = comms::group(NonZeroUsize::new(2).unwrap())
        .into_iter()
        .zip([vec![six], vec![five]])
        .map(|(gatherer, shard)| {
            tokio::spawn(async move {
                let is_master = gatherer.rank() == 0;
                let evaluator = Evaluator::new(gatherer, is_master);
                let mut model = Passthrough::new();
                evaluator.validate(&mut model, shard).await
            })
        });

    for result in try_join_all(tasks).await.unwrap() {
        assert!(matches!(
            result,
            Err(WorkerErr::Gather(GatherErr::Shape(_)))
        ));
    }
}
