use crate::domain::port::context::DestinationContext;
use crate::domain::quay::barrier::Arrival;
use crate::domain::utils::id::VesselId;
use crate::domain::utils::statistics::{StatParameter, StatisticEvent};
use crate::error::Result;

/// Runs batch cycles until the barrier is drained and returns the released batches in order.
///
/// One cycle waits for a quay-size set of arrivals, admits exactly that many
/// vessels into the quay, waits until every station was vacated and resets
/// the quay for the next batch.
pub fn run_quay_coordinator(context: &DestinationContext) -> Result<Vec<Vec<VesselId>>> {
    let quay_size = context.run.quay_size();
    let mut batches = Vec::with_capacity(context.run.batch_count());

    'cycle: loop {
        for _ in 0..quay_size {
            if context.barrier.await_arrival() == Arrival::Drained {
                break 'cycle;
            }
        }

        let batch = context.allocator.with_vacated_quay(|vacated| if vacated { context.barrier.take_batch(quay_size) } else { None });

        let Some(batch) = batch else {
            log::warn!("Unloading Quay - {} vessels waiting, quay not ready for a batch of {}", context.barrier.len(), quay_size);
            continue;
        };

        for vessel in &batch {
            context.vessel_signal(*vessel)?.release()?;
        }

        for station in 0..quay_size {
            context.station_vacated(station)?.acquire();
        }

        context.allocator.reset();

        let number = batches.len() + 1;
        log::debug!("Unloading Quay - batch {} done: {:?}", number, batch);

        let mut event = StatisticEvent::of_component("Quay", 1, "BatchDone");
        event.set(StatParameter::Batch, number);
        context.record(event);

        batches.push(batch);
    }

    log::debug!("Unloading Quay - barrier drained after {} batches", batches.len());
    Ok(batches)
}
