//! The trace normalizer pipeline stage.
//!
//! [`GenAiNormalizer`] walks every span of a batch, rewrites span and span
//! event attributes with an [`AttributeMapper`], optionally infers the
//! provider on spans, and then hands the batch to the next consumer.

use crate::config::Config;
use crate::consumer::{ConsumerError, TracesConsumer};
use crate::error::NormalizerError;
use crate::inference::SystemInferencer;
use crate::mapper::{AttributeMapper, MappingOutcome};
use crate::NORMALIZER_TYPE;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;

/// What a pipeline stage does to the data passing through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The stage rewrites batches in place.
    pub mutates_data: bool,
}

/// Counters for one normalised batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Spans visited.
    pub spans: usize,
    /// Span events visited.
    pub events: usize,
    /// Spans that gained an inferred system attribute.
    pub inferred: usize,
    /// Combined mapper counters.
    pub mapping: MappingOutcome,
}

/// Rewrites GenAI attributes to canonical keys and forwards the batch.
#[derive(Debug)]
pub struct GenAiNormalizer<C> {
    mapper: AttributeMapper,
    inferencer: Option<SystemInferencer>,
    next: C,
}

impl<C: TracesConsumer> GenAiNormalizer<C> {
    /// Starts building a normalizer from configuration.
    pub fn builder(config: &Config) -> NormalizerBuilder<C> {
        NormalizerBuilder::new(config)
    }

    /// Creates a normalizer from its parts.
    pub fn new(mapper: AttributeMapper, inferencer: Option<SystemInferencer>, next: C) -> Self {
        tracing::info!(
            normalizer = NORMALIZER_TYPE,
            mapping_count = mapper.table().len(),
            overwrite = mapper.overwrite(),
            drop_original = mapper.drop_original(),
            system_inference = inferencer.is_some(),
            "GenAI normalizer initialised"
        );

        Self {
            mapper,
            inferencer,
            next,
        }
    }

    /// Returns the mapper.
    pub fn mapper(&self) -> &AttributeMapper {
        &self.mapper
    }

    /// Returns the next consumer.
    pub fn next_consumer(&self) -> &C {
        &self.next
    }

    /// Declares that this stage mutates batches.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities { mutates_data: true }
    }

    /// Lifecycle hook; nothing to start.
    pub async fn start(&self) -> Result<(), NormalizerError> {
        Ok(())
    }

    /// Lifecycle hook; nothing to release.
    pub async fn shutdown(&self) -> Result<(), NormalizerError> {
        Ok(())
    }

    /// Normalises a batch in place without forwarding it.
    ///
    /// Span attributes are mapped and then, if enabled, inferred. Event
    /// attributes are mapped only. Resource and scope attributes are left
    /// alone, and no span or event is added or removed.
    pub fn normalize(&self, request: &mut ExportTraceServiceRequest) -> BatchSummary {
        let mut summary = BatchSummary::default();

        let spans = request
            .resource_spans
            .iter_mut()
            .flat_map(|rs| rs.scope_spans.iter_mut())
            .flat_map(|ss| ss.spans.iter_mut());

        for span in spans {
            summary.spans += 1;
            summary.mapping += self.mapper.apply(&mut span.attributes);

            if let Some(inferencer) = &self.inferencer
                && inferencer.apply(&mut span.attributes)
            {
                summary.inferred += 1;
            }

            for event in &mut span.events {
                summary.events += 1;
                summary.mapping += self.mapper.apply(&mut event.attributes);
            }
        }

        summary
    }

    /// Normalises a batch and passes it to the next consumer.
    ///
    /// # Errors
    ///
    /// Returns the next consumer's error unchanged.
    pub async fn consume_traces(
        &self,
        mut request: ExportTraceServiceRequest,
    ) -> Result<(), ConsumerError> {
        let summary = self.normalize(&mut request);

        tracing::debug!(
            spans = summary.spans,
            events = summary.events,
            copied = summary.mapping.copied,
            skipped = summary.mapping.skipped,
            dropped = summary.mapping.dropped,
            inferred = summary.inferred,
            "Normalised trace batch"
        );

        self.next.consume_traces(request).await
    }
}

impl<C: TracesConsumer> TracesConsumer for GenAiNormalizer<C> {
    async fn consume_traces(&self, request: ExportTraceServiceRequest) -> Result<(), ConsumerError> {
        GenAiNormalizer::consume_traces(self, request).await
    }
}

/// Builder for [`GenAiNormalizer`].
#[must_use = "builders do nothing unless .build() is called"]
pub struct NormalizerBuilder<C> {
    mapper: AttributeMapper,
    inferencer: Option<SystemInferencer>,
    next: Option<C>,
}

impl<C: TracesConsumer> NormalizerBuilder<C> {
    /// Creates a builder from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            mapper: config.mapper(),
            inferencer: config.inferencer(),
            next: None,
        }
    }

    /// Sets the next consumer.
    pub fn consumer(mut self, next: C) -> Self {
        self.next = Some(next);
        self
    }

    /// Replaces the system inferencer.
    pub fn inferencer(mut self, inferencer: Option<SystemInferencer>) -> Self {
        self.inferencer = inferencer;
        self
    }

    /// Builds the normalizer.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizerError::MissingConsumer`] if no consumer was set.
    pub fn build(self) -> Result<GenAiNormalizer<C>, NormalizerError> {
        let next = self.next.ok_or(NormalizerError::MissingConsumer)?;
        Ok(GenAiNormalizer::new(self.mapper, self.inferencer, next))
    }
}
