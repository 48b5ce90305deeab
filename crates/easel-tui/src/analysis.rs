//! Poem analysis: a one-shot request to the analysis service whose result is
//! shown under the poem until the poem changes.

use tokio::sync::mpsc;
use tracing::{debug, info};

use easel_proto::error::FetchResult;
use easel_proto::inflight::RequestSlot;
use easel_proto::protocol::{PoemPayload, PoemResult};
use easel_proto::services::ServiceClient;
use easel_proto::text::truncate_to_words;

use crate::app::AppMessage;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalysisState {
    #[default]
    Idle,
    Loading,
    Displayed(String),
}

impl AnalysisState {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Displayed(text) => Some(text),
            _ => None,
        }
    }
}

pub struct Analyst {
    services: ServiceClient,
    word_limit: usize,
    slot: RequestSlot,
}

impl Analyst {
    pub fn new(services: ServiceClient, word_limit: usize) -> Self {
        Self {
            services,
            word_limit,
            slot: RequestSlot::new(),
        }
    }

    /// Request an analysis of `poem`. Only starts from Idle; returns whether
    /// a request was started.
    pub fn request(
        &mut self,
        state: &mut AnalysisState,
        poem: &PoemResult,
        tx: &mpsc::Sender<AppMessage>,
    ) -> bool {
        if *state != AnalysisState::Idle {
            return false;
        }
        let ticket = self.slot.begin();
        *state = AnalysisState::Loading;
        info!("[analysis] requesting analysis of {:?}", poem.title);

        let services = self.services.clone();
        let text = truncate_to_words(&poem.text(), self.word_limit);
        let (title, author) = (poem.title.clone(), poem.author.clone());
        let tx = tx.clone();
        tokio::spawn(async move {
            let payload = PoemPayload {
                title: &title,
                author: &author,
                text: &text,
            };
            let result = services.analyze(&payload, &ticket.token).await;
            let _ = tx.send(AppMessage::Analysis(ticket.generation, result)).await;
        });
        true
    }

    /// Apply a finished request. Stale results are dropped; failures return
    /// to Idle and hand the error back for reporting.
    pub fn complete(
        &mut self,
        state: &mut AnalysisState,
        generation: u64,
        result: FetchResult<String>,
    ) -> FetchResult<()> {
        if !self.slot.finish(generation) {
            debug!("[analysis] dropping stale result #{}", generation);
            return Ok(());
        }
        match result {
            Ok(text) => {
                *state = AnalysisState::Displayed(text);
                Ok(())
            }
            Err(e) => {
                *state = AnalysisState::Idle;
                Err(e)
            }
        }
    }

    /// True while `generation` is the request in flight.
    pub fn is_current(&self, generation: u64) -> bool {
        self.slot.is_current(generation)
    }

    /// The displayed poem changed: discard the analysis and any request in flight.
    pub fn reset(&mut self, state: &mut AnalysisState) {
        self.slot.cancel();
        *state = AnalysisState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use easel_proto::config::ServicesConfig;
    use easel_proto::error::FetchError;
    use easel_proto::protocol::PoemSource;

    fn analyst() -> Analyst {
        let mut config = ServicesConfig::default();
        config.analysis_url = "http://127.0.0.1:9/".into();
        Analyst::new(ServiceClient::new(reqwest::Client::new(), config), 450)
    }

    fn poem() -> PoemResult {
        PoemResult {
            author: "Emily Dickinson".into(),
            title: "Hope".into(),
            lines: vec!["Hope is the thing with feathers".into()],
            source: PoemSource::Curated,
        }
    }

    #[tokio::test]
    async fn test_idle_loading_displayed() {
        let (tx, _rx) = mpsc::channel(4);
        let mut a = analyst();
        let mut state = AnalysisState::Idle;

        assert!(a.request(&mut state, &poem(), &tx));
        assert_eq!(state, AnalysisState::Loading);
        // A second press while loading does nothing.
        assert!(!a.request(&mut state, &poem(), &tx));

        let generation = a.slot.generation();
        a.complete(&mut state, generation, Ok("About hope.".into())).unwrap();
        assert_eq!(state.text(), Some("About hope."));
    }

    #[tokio::test]
    async fn test_failure_returns_to_idle() {
        let (tx, _rx) = mpsc::channel(4);
        let mut a = analyst();
        let mut state = AnalysisState::Idle;
        a.request(&mut state, &poem(), &tx);

        let generation = a.slot.generation();
        let err = a
            .complete(&mut state, generation, Err(FetchError::MissingData("empty".into())))
            .unwrap_err();
        assert!(matches!(err, FetchError::MissingData(_)));
        assert_eq!(state, AnalysisState::Idle);
    }

    #[tokio::test]
    async fn test_poem_change_discards_in_flight_result() {
        let (tx, _rx) = mpsc::channel(4);
        let mut a = analyst();
        let mut state = AnalysisState::Idle;
        a.request(&mut state, &poem(), &tx);
        let generation = a.slot.generation();

        a.reset(&mut state);
        assert_eq!(state, AnalysisState::Idle);

        a.complete(&mut state, generation, Ok("late".into())).unwrap();
        assert_eq!(state, AnalysisState::Idle);
    }

    #[tokio::test]
    async fn test_request_round_trip_reports_over_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut a = analyst();
        let mut state = AnalysisState::Idle;
        a.request(&mut state, &poem(), &tx);

        match rx.recv().await {
            Some(AppMessage::Analysis(generation, result)) => {
                assert!(result.is_err());
                assert!(a.complete(&mut state, generation, result).is_err());
                assert_eq!(state, AnalysisState::Idle);
            }
            _ => panic!("expected an analysis message"),
        }
    }
}
