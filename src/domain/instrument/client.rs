//! Instruments sub-client — list, fetch, create, cache.

use crate::client::TradingClient;
use crate::domain::instrument::wire::{InstrumentCreateRequest, InstrumentResponse};
use crate::domain::instrument::{Instrument, NewInstrument};
use crate::error::{HttpError, SdkError};
use crate::http::RetryPolicy;
use crate::shared::Symbol;
use std::time::Instant;

/// Sub-client for instrument operations.
pub struct Instruments<'a> {
    pub(crate) client: &'a TradingClient,
}

impl<'a> Instruments<'a> {
    /// All instruments. Refreshes the cache.
    pub async fn list(&self) -> Result<Vec<Instrument>, SdkError> {
        self.client.require_auth().await?;
        let url = self.client.http.url("/instruments/");
        let resp: Vec<InstrumentResponse> =
            self.client.http.get(&url, RetryPolicy::Idempotent).await?;

        let instruments: Vec<Instrument> = resp.into_iter().map(Instrument::from).collect();
        let now = Instant::now();
        let mut cache = self.client.instrument_cache.write().await;
        for instrument in &instruments {
            cache.insert(instrument.symbol.clone(), (instrument.clone(), now));
        }
        Ok(instruments)
    }

    /// One instrument by symbol. Uses TTL cache.
    pub async fn get(&self, symbol: &Symbol) -> Result<Instrument, SdkError> {
        {
            let cache = self.client.instrument_cache.read().await;
            if let Some((instrument, fetched_at)) = cache.get(symbol) {
                if fetched_at.elapsed() < self.client.instrument_cache_ttl {
                    return Ok(instrument.clone());
                }
            }
        }

        self.client.require_auth().await?;
        let url = self
            .client
            .http
            .url(&format!("/instruments/{}", symbol.url_segment()));
        let instrument: Instrument = self
            .client
            .http
            .get::<InstrumentResponse>(&url, RetryPolicy::Idempotent)
            .await?
            .into();
        self.cache_instrument(&instrument).await;
        Ok(instrument)
    }

    /// List a new instrument. A duplicate symbol is a validation error.
    pub async fn create(&self, new: &NewInstrument) -> Result<Instrument, SdkError> {
        new.validate()?;
        self.client.require_auth().await?;

        let url = self.client.http.url("/instruments/");
        let request = InstrumentCreateRequest::from(new);
        let instrument: Instrument = match self
            .client
            .http
            .post::<InstrumentResponse, _>(&url, &request, RetryPolicy::None)
            .await
        {
            Ok(resp) => resp.into(),
            Err(HttpError::BadRequest { detail, .. }) => return Err(SdkError::Validation(detail)),
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Created instrument {}", instrument.symbol);
        self.cache_instrument(&instrument).await;
        Ok(instrument)
    }

    pub async fn invalidate(&self, symbol: &Symbol) {
        self.client.instrument_cache.write().await.remove(symbol);
    }

    pub async fn clear_cache(&self) {
        self.client.instrument_cache.write().await.clear();
    }

    async fn cache_instrument(&self, instrument: &Instrument) {
        self.client
            .instrument_cache
            .write()
            .await
            .insert(instrument.symbol.clone(), (instrument.clone(), Instant::now()));
    }
}
