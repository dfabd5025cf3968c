//! Consumer-facing provenance timeline for a batch.

use herbtrace_types::{Batch, TimelineEntry, TimelineStep};

/// Title of the closing timeline step.
pub const READY_FOR_CONSUMER: &str = "Ready for Consumer";

/// The ordered steps a consumer sees when scanning a batch's QR label:
/// the collection, each processing step in timestamp order, and a closing
/// step once the trail is complete.
pub fn provenance_timeline(batch: &Batch) -> Vec<TimelineEntry> {
    let collection = &batch.collection_event;
    let mut entries = Vec::with_capacity(batch.processing_events.len().saturating_add(2));

    entries.push(TimelineEntry {
        step: TimelineStep::Collection,
        title: "Collection".to_owned(),
        timestamp: collection.timestamp,
        location: collection.location.region.clone(),
        details: format!(
            "{} {} of {} collected by {}",
            collection.quantity.normalize(),
            collection.unit.label(),
            batch.species.name,
            collection.collector.name
        ),
        completed: collection.verified,
    });

    for event in &batch.processing_events {
        entries.push(TimelineEntry {
            step: TimelineStep::Processing,
            title: format!("Processing: {}", event.process_type.label()),
            timestamp: event.timestamp,
            location: event.facility.region.clone(),
            details: format!(
                "Processed by {} ({} in, {} out)",
                event.processor.name,
                event.input_quantity.normalize(),
                event.output_quantity.normalize()
            ),
            completed: event.verified,
        });
    }

    if batch.traceability_complete() {
        let location = batch
            .processing_events
            .last()
            .map_or(&collection.location.region, |e| &e.facility.region)
            .clone();
        let details = batch.final_product.as_ref().map_or_else(
            || "Packaged and ready for distribution".to_owned(),
            |p| format!("{} by {} ({} units)", p.product_name, p.manufacturer, p.batch_size),
        );
        entries.push(TimelineEntry {
            step: TimelineStep::ReadyForConsumer,
            title: READY_FOR_CONSUMER.to_owned(),
            timestamp: batch.updated_at,
            location,
            details,
            completed: true,
        });
    }

    entries
}
