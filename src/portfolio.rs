use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::data::{
    option_net_delta, underlying_net_delta, HedgeAction, HedgeRecommendation, OptionDraft,
    OptionPosition, PortfolioSettings, PortfolioSummary, Snapshot, UnderlyingDraft,
    UnderlyingPosition,
};
use crate::error::LedgerResult;
use crate::store::SnapshotStore;

/// The portfolio ledger: both position collections, the settings record,
/// and the snapshot store it persists through after every mutation.
pub struct PortfolioLedger {
    options: Vec<OptionPosition>,
    underlying: Vec<UnderlyingPosition>,
    settings: PortfolioSettings,
    store: SnapshotStore,
}

impl PortfolioLedger {
    /// Build the ledger from the last-saved snapshot. Missing or corrupt
    /// state starts empty with default settings.
    pub fn load(store: SnapshotStore) -> Self {
        let snapshot = store.load();

        info!(
            "Loaded portfolio: {} options, {} underlying positions",
            snapshot.options.len(),
            snapshot.underlying.len()
        );

        Self {
            options: snapshot.options,
            underlying: snapshot.underlying,
            settings: snapshot.settings,
            store,
        }
    }

    pub fn options(&self) -> &[OptionPosition] {
        &self.options
    }

    pub fn underlying(&self) -> &[UnderlyingPosition] {
        &self.underlying
    }

    pub fn settings(&self) -> &PortfolioSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            options: self.options.clone(),
            underlying: self.underlying.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Add a new option position. Validation failures leave the ledger
    /// unmutated and unpersisted.
    pub fn add_option(&mut self, data: &Value) -> LedgerResult<OptionPosition> {
        let draft = OptionDraft::from_value(data)?;

        let position = OptionPosition {
            id: Uuid::new_v4().to_string(),
            net_delta: option_net_delta(
                draft.position_type,
                draft.delta,
                draft.quantity,
                self.settings.contracts_per_option,
            ),
            position_type: draft.position_type,
            delta: draft.delta,
            quantity: draft.quantity,
            price: draft.price,
            date_added: chrono::Utc::now(),
            extra: draft.extra,
        };

        self.options.push(position.clone());
        self.persist();

        info!("Added option position {}", position.id);
        Ok(position)
    }

    /// Remove an option position by id. An unmatched id is a no-op, not an
    /// error; state is persisted either way.
    pub fn remove_option(&mut self, id: &str) {
        self.options.retain(|position| position.id != id);
        self.persist();

        info!("Removed option position {}", id);
    }

    pub fn add_underlying(&mut self, data: &Value) -> LedgerResult<UnderlyingPosition> {
        let draft = UnderlyingDraft::from_value(data)?;

        let position = UnderlyingPosition {
            id: Uuid::new_v4().to_string(),
            net_delta: underlying_net_delta(draft.position_type, draft.quantity),
            position_type: draft.position_type,
            quantity: draft.quantity,
            price: draft.price,
            date_added: chrono::Utc::now(),
            extra: draft.extra,
        };

        self.underlying.push(position.clone());
        self.persist();

        info!("Added underlying position {}", position.id);
        Ok(position)
    }

    pub fn remove_underlying(&mut self, id: &str) {
        self.underlying.retain(|position| position.id != id);
        self.persist();

        info!("Removed underlying position {}", id);
    }

    /// Sum of all net deltas across both collections.
    pub fn total_delta(&self) -> Decimal {
        let option_delta: Decimal = self.options.iter().map(|position| position.net_delta).sum();
        let underlying_delta: Decimal = self
            .underlying
            .iter()
            .map(|position| position.net_delta)
            .sum();

        option_delta + underlying_delta
    }

    pub fn summary(&self) -> PortfolioSummary {
        let total_delta = self.total_delta();
        let contracts = Decimal::from(self.settings.contracts_per_option);

        let option_value: Decimal = self
            .options
            .iter()
            .map(|position| position.price * Decimal::from(position.quantity) * contracts)
            .sum();
        let underlying_value: Decimal = self
            .underlying
            .iter()
            .map(|position| position.price * Decimal::from(position.quantity))
            .sum();

        PortfolioSummary {
            total_delta,
            // "Close enough" to neutral; the threshold is fixed, not configurable.
            is_delta_neutral: total_delta.abs() < Decimal::ONE,
            option_value,
            underlying_value,
            total_value: option_value + underlying_value,
            option_count: self.options.len(),
            underlying_count: self.underlying.len(),
        }
    }

    /// Recommend the underlying trade that restores delta neutrality.
    /// Share counts round to the nearest integer, midpoints away from zero
    /// (2.5 rounds to 3).
    pub fn hedge_recommendation(&self) -> HedgeRecommendation {
        let total_delta = self.total_delta();

        if total_delta.abs() < Decimal::ONE {
            return HedgeRecommendation {
                action: HedgeAction::None,
                quantity: None,
                message: "Portfolio is already delta neutral".to_string(),
                current_delta: total_delta,
            };
        }

        let shares = total_delta
            .abs()
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u64()
            .unwrap_or(u64::MAX);

        if total_delta > Decimal::ZERO {
            HedgeRecommendation {
                action: HedgeAction::Sell,
                quantity: Some(shares),
                message: format!(
                    "Sell {} shares of the underlying to achieve delta neutrality",
                    shares
                ),
                current_delta: total_delta,
            }
        } else {
            HedgeRecommendation {
                action: HedgeAction::Buy,
                quantity: Some(shares),
                message: format!(
                    "Buy {} shares of the underlying to achieve delta neutrality",
                    shares
                ),
                current_delta: total_delta,
            }
        }
    }

    /// Apply a partial settings update, recomputing option deltas when the
    /// contract multiplier was among the updated keys.
    pub fn update_settings(&mut self, data: &Value) -> LedgerResult<PortfolioSettings> {
        let contracts_updated = self.settings.apply_update(data)?;

        if contracts_updated {
            self.recalculate_option_deltas();
        }

        self.persist();

        info!("Settings updated");
        Ok(self.settings.clone())
    }

    fn recalculate_option_deltas(&mut self) {
        for position in &mut self.options {
            position.net_delta = option_net_delta(
                position.position_type,
                position.delta,
                position.quantity,
                self.settings.contracts_per_option,
            );
        }
    }

    /// Save the full snapshot. Failures are reported, not propagated; the
    /// in-memory state stays correct and durability resumes at the next
    /// successful save.
    pub fn persist(&self) {
        if let Err(e) = self.store.save(&self.snapshot()) {
            error!(
                "Error saving portfolio data to {}: {}",
                self.store.path().display(),
                e
            );
        }
    }
}
