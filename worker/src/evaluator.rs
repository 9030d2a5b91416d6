use std::time::Instant;

use comms::Gatherer;
use log::{debug, info};
use machine_learning::{
    arch::{
        InferenceGuard, Model,
        loss::{CrossEntropy, LossFn},
    },
    metrics::{RunningStat, top_k_accuracy},
};
use ndarray::{Array1, ArrayD};

use crate::{
    Result,
    progress::{Progress, Stage},
};

const TOP_K: [usize; 2] = [1, 5];

/// The aggregate metrics of a validation pass, identical on every worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSummary {
    /// Top-1 accuracy, as a percentage.
    pub top1: f64,
    /// Top-5 accuracy, as a percentage.
    pub top5: f64,
    pub loss: f64,
    /// Mean wall time of an iteration, in seconds. Local to each worker.
    pub batch_time: f64,
}

impl EvalSummary {
    /// Returns `(top1, top5, loss)`.
    pub fn into_tuple(self) -> (f64, f64, f64) {
        (self.top1, self.top5, self.loss)
    }
}

/// Evaluates a model over one worker's shard of the validation set.
///
/// Every worker of the group runs its own `Evaluator` over a disjoint shard with the same amount
/// of batches. Predictions are gathered across the group on every batch, so the metrics cover
/// the whole set and come out the same on every worker.
pub struct Evaluator<L: LossFn = CrossEntropy> {
    gatherer: Gatherer,
    is_master: bool,
    loss_fn: L,
}

impl Evaluator {
    /// Creates a new `Evaluator` measuring the cross entropy loss.
    ///
    /// # Arguments
    /// * `gatherer` - This worker's handle on the gather group.
    /// * `is_master` - Whether this worker renders the progress, exactly one worker should.
    pub fn new(gatherer: Gatherer, is_master: bool) -> Self {
        Self::with_loss(gatherer, is_master, CrossEntropy::new())
    }
}

impl<L: LossFn> Evaluator<L> {
    pub fn with_loss(gatherer: Gatherer, is_master: bool, loss_fn: L) -> Self {
        Self {
            gatherer,
            is_master,
            loss_fn,
        }
    }

    /// Runs the model over every batch and aggregates the metrics across the group.
    ///
    /// The model is kept in inference mode for the whole pass and given back in its previous
    /// mode, also when the pass fails.
    ///
    /// # Arguments
    /// * `model` - The model to evaluate.
    /// * `batches` - This worker's `(images, labels)` batches.
    ///
    /// # Returns
    /// The summary of the pass.
    ///
    /// # Errors
    /// Any failure of the forward pass, the gathers or the metrics ends the pass right away.
    pub async fn validate<M, I>(&self, model: &mut M, batches: I) -> Result<EvalSummary>
    where
        M: Model + ?Sized,
        I: IntoIterator<Item = (ArrayD<f32>, Array1<usize>)>,
        I::IntoIter: ExactSizeIterator,
    {
        let batches = batches.into_iter();
        let num_iter = batches.len();
        let rank = self.gatherer.rank();

        let mut model = InferenceGuard::new(model);
        let progress = self.is_master.then(|| Progress::new(num_iter, Stage::Eval));

        let mut batch_time = RunningStat::new();
        let mut losses = RunningStat::new();
        let mut top1 = RunningStat::new();
        let mut top5 = RunningStat::new();

        debug!(rank = rank, batches = num_iter; "starting validation");
        let mut start = Instant::now();

        for (idx, (image, target)) in batches.enumerate() {
            let image = image.as_standard_layout().into_owned();
            let target = target.as_standard_layout().into_owned();

            let output = model.forward(image.view())?;

            let target_all = self.gatherer.all_gather(target).await?;
            let output_all = self.gatherer.all_gather(output).await?;

            let loss = self.loss_fn.loss(output_all.view(), target_all.view())?;
            let acc = top_k_accuracy(output_all.view(), target_all.view(), &TOP_K)?;
            let batch_size = target_all.len();

            losses.update(f64::from(loss), batch_size);
            top1.update(f64::from(acc[0]), batch_size);
            top5.update(f64::from(acc[1]), batch_size);
            batch_time.update(start.elapsed().as_secs_f64(), 1);
            start = Instant::now();

            debug!(rank = rank, batch = idx, size = batch_size; "evaluated batch");

            if let Some(progress) = &progress {
                let msg = format!("Top-1:{:.3}| Top-5:{:.3}", top1.avg(), top5.avg());
                progress.advance(&msg);
            }
        }

        if let Some(progress) = progress {
            progress.finish();
        }

        let summary = EvalSummary {
            top1: top1.avg(),
            top5: top5.avg(),
            loss: losses.avg(),
            batch_time: batch_time.avg(),
        };

        if self.is_master {
            info!(
                "validation finished: top1={:.3} top5={:.3} loss={:.4}",
                summary.top1, summary.top5, summary.loss
            );
        }

        Ok(summary)
    }
}
