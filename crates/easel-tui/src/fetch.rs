//! Refresh fan-out: one artwork request and one poem request per refresh
//! signal, each tracked by its own request slot so a newer refresh cancels
//! and supersedes the older one.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use easel_proto::art::ArtClient;
use easel_proto::config::Config;
use easel_proto::error::{FetchError, FetchResult};
use easel_proto::inflight::RequestSlot;
use easel_proto::poems::PoemClient;
use easel_proto::protocol::ArtworkResult;

use crate::app::AppMessage;
use crate::picture::Picture;

/// An artwork record plus its decoded image, when the image could be loaded.
#[derive(Debug)]
pub struct ArtworkView {
    pub artwork: ArtworkResult,
    pub picture: Option<Picture>,
}

pub struct Refresher {
    art: ArtClient,
    poems: PoemClient,
    art_slot: RequestSlot,
    poem_slot: RequestSlot,
}

impl Refresher {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            art: ArtClient::new(http.clone(), config.art.clone()),
            poems: PoemClient::new(http, config.poems.clone()),
            art_slot: RequestSlot::new(),
            poem_slot: RequestSlot::new(),
        }
    }

    /// Start a new artwork and poem fetch, cancelling any still in flight.
    pub fn start(&mut self, tx: &mpsc::Sender<AppMessage>) {
        let ticket = self.art_slot.begin();
        let art = self.art.clone();
        let art_tx = tx.clone();
        tokio::spawn(async move {
            let result = load_artwork(&art, &ticket.token).await;
            let _ = art_tx.send(AppMessage::Artwork(ticket.generation, result)).await;
        });

        let ticket = self.poem_slot.begin();
        let poems = self.poems.clone();
        let poem_tx = tx.clone();
        tokio::spawn(async move {
            let result = poems.fetch_random(&ticket.token).await;
            let _ = poem_tx.send(AppMessage::Poem(ticket.generation, result)).await;
        });
        debug!(
            "[refresh] started art #{} poem #{}",
            self.art_slot.generation(),
            self.poem_slot.generation()
        );
    }

    /// True when `generation` is the live artwork request; it is then retired.
    pub fn accept_artwork(&mut self, generation: u64) -> bool {
        self.art_slot.finish(generation)
    }

    pub fn accept_poem(&mut self, generation: u64) -> bool {
        self.poem_slot.finish(generation)
    }

    pub fn cancel_all(&mut self) {
        self.art_slot.cancel();
        self.poem_slot.cancel();
    }
}

/// Resolve a random artwork, then download and decode its image. A failed
/// image keeps the record; cancellation aborts the whole load.
pub async fn load_artwork(client: &ArtClient, cancel: &CancellationToken) -> FetchResult<ArtworkView> {
    let artwork = client.fetch_random(cancel).await?;
    let Some(url) = artwork.image_url.clone() else {
        return Ok(ArtworkView {
            artwork,
            picture: None,
        });
    };

    let picture = match client.fetch_image(&url, cancel).await {
        Ok(bytes) => match tokio::task::spawn_blocking(move || Picture::decode(&bytes)).await {
            Ok(Ok(p)) => Some(p),
            Ok(Err(e)) => {
                warn!("[art] image for #{} unusable: {}", artwork.id, e);
                None
            }
            Err(e) => {
                warn!("[art] image decode task failed: {}", e);
                None
            }
        },
        Err(FetchError::Cancelled) => return Err(FetchError::Cancelled),
        Err(e) => {
            warn!("[art] image download for #{} failed: {}", artwork.id, e);
            None
        }
    };
    Ok(ArtworkView { artwork, picture })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> Config {
        // Port 9 (discard) refuses connections on loopback.
        let mut config = Config::default();
        config.art.api_base = "http://127.0.0.1:9/api/v1".into();
        config.poems.poetrydb_base = "http://127.0.0.1:9".into();
        config.poems.random_poem_url = None;
        config
    }

    #[tokio::test]
    async fn test_superseded_refresh_is_rejected() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut refresher = Refresher::new(reqwest::Client::new(), &unreachable_config());

        refresher.start(&tx);
        refresher.start(&tx);

        let mut art_results = Vec::new();
        let mut poem_results = Vec::new();
        while art_results.len() < 2 || poem_results.len() < 2 {
            match rx.recv().await {
                Some(AppMessage::Artwork(generation, result)) => art_results.push((generation, result)),
                Some(AppMessage::Poem(generation, result)) => poem_results.push((generation, result)),
                Some(_) => {}
                None => break,
            }
        }

        for (generation, result) in &art_results {
            assert!(result.is_err());
            assert_eq!(refresher.accept_artwork(*generation), *generation == 2);
        }
        for (generation, _) in &poem_results {
            assert_eq!(refresher.accept_poem(*generation), *generation == 2);
        }
        // A generation is accepted once.
        assert!(!refresher.accept_artwork(2));
    }

    #[tokio::test]
    async fn test_cancel_all_reports_cancelled() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut refresher = Refresher::new(reqwest::Client::new(), &unreachable_config());
        refresher.start(&tx);
        refresher.cancel_all();

        for _ in 0..2 {
            match rx.recv().await {
                Some(AppMessage::Artwork(generation, _)) => assert!(!refresher.accept_artwork(generation)),
                Some(AppMessage::Poem(generation, _)) => assert!(!refresher.accept_poem(generation)),
                _ => panic!("unexpected message"),
            }
        }
    }
}
