//! The seam to the real-time voice provider.
//!
//! A `ProviderClient` owns the audio transport (and the microphone) for exactly one
//! call attempt. The coordinator asks a `ProviderFactory` for a brand-new client on
//! every `start_call`, handing it an `EventSink` that only ever reaches that attempt.

use crate::error::VoiceResult;
use crate::session::EventSink;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait ProviderClient: Send + Sync {
    /// Open the call. Resolves once the provider accepted (or rejected) the request;
    /// `call_started` still arrives through the sink.
    async fn start_call(&self, credential: &str, sample_rate: u32) -> VoiceResult<()>;

    /// Ask the provider to hang up. Must not block; providers may or may not
    /// follow up with `call_ended`.
    fn stop_call(&self);
}

pub trait ProviderFactory: Send + Sync {
    fn create(&self, sink: EventSink) -> Arc<dyn ProviderClient>;
}

impl<F> ProviderFactory for F
where
    F: Fn(EventSink) -> Arc<dyn ProviderClient> + Send + Sync,
{
    fn create(&self, sink: EventSink) -> Arc<dyn ProviderClient> {
        self(sink)
    }
}
