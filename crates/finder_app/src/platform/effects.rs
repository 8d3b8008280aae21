use std::time::Duration;

use finder_core::{Effect, Msg};
use finder_engine::{EngineEvent, EngineHandle, EngineStopped};
use finder_logging::finder_debug;

/// Hands core effects to the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            finder_debug!("Effect {:?}", effect);
            match effect {
                Effect::Find { ticket, request } => self.engine.find(ticket, request),
                Effect::Verify { ticket, request } => self.engine.verify(ticket, request),
                Effect::SubmitBulk {
                    kind,
                    file,
                    options,
                } => self.engine.submit_bulk(kind, file, options),
                Effect::StartPolling { job_id, poll } => self.engine.start_polling(job_id, poll),
                Effect::CancelPolling { poll } => self.engine.cancel_polling(poll),
                Effect::Download { job_id } => self.engine.download(job_id),
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(to_msg))
    }
}

pub fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::FindFinished { ticket, result } => Msg::FindCompleted { ticket, result },
        EngineEvent::VerifyFinished { ticket, result } => Msg::VerifyCompleted { ticket, result },
        EngineEvent::BulkSubmitted(result) => Msg::BulkSubmitted(result),
        EngineEvent::JobPolled { poll, result } => Msg::JobPolled { poll, result },
        EngineEvent::DownloadFinished(result) => Msg::DownloadFinished(result),
    }
}
