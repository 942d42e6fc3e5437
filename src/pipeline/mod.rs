//! LivePipeline - decode, append, and window maintenance as one unit.
//!
//! A pipeline owns exactly one [`LogBuffer`] and one [`VirtualizationEngine`]
//! and keeps them in lockstep: every appended record gets a row, every evicted
//! record loses its row. Each frame is applied atomically through `&mut self`,
//! so appends are linearized and sequence order equals arrival order.
//!
//! Frames that fail to decode are dropped whole. The failure is counted, logged
//! at warn level and handed to the observer hook, and ingestion continues.

mod offload;

pub use offload::{spawn_ordered_decoding, Decoded, OrderedDecoder};

use crate::buffer::LogBuffer;
use crate::codec;
use crate::model::{
    ConfigurationError, DecodeError, DecodeErrorKind, LogRecord, Sequence, SequencedRecord,
    WireMessage,
};
use crate::view_state::{EngineSettings, ScrollPosition, VirtualizationEngine, ViewportWindow};
use tracing::{debug, warn};

/// Callback invoked with every dropped frame's error.
pub type DecodeErrorObserver = Box<dyn FnMut(&DecodeError) + Send>;

/// Pipeline construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineSettings {
    /// Row height estimate and overscan.
    pub engine: EngineSettings,
    /// Maximum retained records; `None` keeps everything.
    pub capacity: Option<usize>,
}

/// Running counters for one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineStats {
    /// Records appended.
    pub appended: u64,
    /// Records evicted by the capacity limit.
    pub evicted: u64,
    /// Frames dropped at the envelope stage.
    pub envelope_errors: u64,
    /// Frames dropped at the base64 stage.
    pub encoding_errors: u64,
    /// Frames dropped at the decompression stage.
    pub decompression_errors: u64,
    /// Frames dropped at the schema stage.
    pub schema_errors: u64,
}

impl PipelineStats {
    /// Frames dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.envelope_errors + self.encoding_errors + self.decompression_errors + self.schema_errors
    }

    fn count_failure(&mut self, kind: DecodeErrorKind) {
        let counter = match kind {
            DecodeErrorKind::Envelope => &mut self.envelope_errors,
            DecodeErrorKind::Encoding => &mut self.encoding_errors,
            DecodeErrorKind::Decompression => &mut self.decompression_errors,
            DecodeErrorKind::Schema => &mut self.schema_errors,
        };
        *counter += 1;
    }
}

/// Buffer plus virtualization engine for one live stream.
pub struct LivePipeline {
    buffer: LogBuffer,
    engine: VirtualizationEngine,
    observer: Option<DecodeErrorObserver>,
    stats: PipelineStats,
}

impl LivePipeline {
    /// Create an empty pipeline.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ZeroCapacity`] for a capacity of zero.
    pub fn new(settings: PipelineSettings) -> Result<Self, ConfigurationError> {
        let buffer = match settings.capacity {
            Some(limit) => LogBuffer::with_capacity_limit(limit)?,
            None => LogBuffer::new(),
        };
        Ok(Self {
            buffer,
            engine: VirtualizationEngine::new(settings.engine),
            observer: None,
            stats: PipelineStats::default(),
        })
    }

    /// Install the hook that receives every decode failure. Replaces any previous hook.
    pub fn on_decode_error<F>(&mut self, observer: F)
    where
        F: FnMut(&DecodeError) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Decode a raw text frame and append it. `None` if the frame was dropped.
    pub fn ingest_text(&mut self, raw: &str) -> Option<Sequence> {
        self.ingest_decoded(codec::decode(raw))
    }

    /// Decode an already-dispatched message and append it.
    pub fn ingest_message(&mut self, message: &WireMessage) -> Option<Sequence> {
        self.ingest_decoded(codec::decode_message(message))
    }

    /// Apply the outcome of a decode that ran elsewhere.
    pub fn ingest_decoded(&mut self, decoded: Result<LogRecord, DecodeError>) -> Option<Sequence> {
        match decoded {
            Ok(record) => Some(self.append(record)),
            Err(err) => {
                self.report_decode_error(&err);
                None
            }
        }
    }

    /// Append a decoded record, evicting the oldest if over capacity.
    pub fn append(&mut self, record: LogRecord) -> Sequence {
        let append = self.buffer.append_evicting(record);
        self.engine.push_row(append.sequence);
        if append.evicted > 0 {
            self.engine.evict_front(append.evicted);
            self.stats.evicted += append.evicted as u64;
        }
        self.stats.appended += 1;
        append.sequence
    }

    fn report_decode_error(&mut self, err: &DecodeError) {
        self.stats.count_failure(err.kind());
        warn!(stage = %err.kind(), error = %err, "dropping undecodable frame");
        if let Some(observer) = self.observer.as_mut() {
            observer(err);
        }
    }

    /// Window for a viewport of `viewport_height` lines; `None` while empty.
    pub fn window(&mut self, viewport_height: usize) -> Option<ViewportWindow> {
        self.engine.window(viewport_height)
    }

    /// Report the rendered height of a record's row.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::ZeroRowHeight`] if `height` is zero.
    pub fn report_measured_height(
        &mut self,
        sequence: Sequence,
        height: u16,
    ) -> Result<bool, ConfigurationError> {
        self.engine.report_measured_height(sequence, height)
    }

    /// Forget measured heights (e.g. after a width change).
    pub fn reset_measurements(&mut self) {
        self.engine.reset_measurements();
    }

    /// Number of buffered records.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop every buffered record. Sequence numbering continues.
    pub fn clear(&mut self) {
        debug!(records = self.buffer.len(), "clearing buffer");
        self.buffer.clear();
        self.engine.clear();
    }

    /// Record by sequence.
    pub fn get(&self, sequence: Sequence) -> Option<&LogRecord> {
        self.buffer.get(sequence)
    }

    /// Record by current index.
    pub fn get_index(&self, index: usize) -> Option<&SequencedRecord> {
        self.buffer.get_index(index)
    }

    /// Pin the view to the newest record.
    pub fn follow_tail(&mut self) {
        self.engine.follow_tail();
    }

    /// Scroll by lines; unpins.
    pub fn scroll_by(&mut self, delta: isize) {
        self.engine.scroll_by(delta);
    }

    /// Jump to a position; unpins.
    pub fn scroll_to(&mut self, position: ScrollPosition) {
        self.engine.scroll_to(position);
    }

    /// Whether the view follows the newest record.
    pub fn is_pinned(&self) -> bool {
        self.engine.is_pinned()
    }

    /// Sum of all row heights.
    pub fn total_size(&self) -> usize {
        self.engine.total_size()
    }

    /// Counters.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Read access to the buffer.
    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    /// Read access to the engine.
    pub fn engine(&self) -> &VirtualizationEngine {
        &self.engine
    }
}
