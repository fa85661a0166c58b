use std::fmt;

use claimlink_types::GlobalState;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct OutcomeLabels {
    outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct RelayerLabels {
    relayer: String,
}

pub struct Metrics {
    registry: Registry,
    transactions: Family<OutcomeLabels, Counter>,
    principals: Family<RelayerLabels, Gauge>,
    migrated: Family<RelayerLabels, Gauge>,
    height: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("claimlink");
        let transactions = Family::<OutcomeLabels, Counter>::default();
        let principals = Family::<RelayerLabels, Gauge>::default();
        let migrated = Family::<RelayerLabels, Gauge>::default();
        let height = Gauge::default();

        registry.register("transactions", "Submitted transactions by outcome", transactions.clone());
        registry.register("registered_principals", "Principals registered per relayer", principals.clone());
        registry.register("migrated_principals", "Principals migrated per relayer", migrated.clone());
        registry.register("chain_height", "Height of the last sealed block", height.clone());

        Self { registry, transactions, principals, migrated, height }
    }

    /// `outcome` is `applied` or the rejection kind.
    pub fn record(&self, outcome: &str) {
        self.transactions
            .get_or_create(&OutcomeLabels { outcome: outcome.to_string() })
            .inc();
    }

    pub fn render(&self, state: &GlobalState, height: u64) -> Result<String, fmt::Error> {
        self.height.set(height as i64);
        for (addr, relayer) in &state.relayers {
            let labels = RelayerLabels { relayer: hex::encode(addr) };
            self.principals
                .get_or_create(&labels)
                .set(relayer.registry.registered_count() as i64);
            self.migrated
                .get_or_create(&labels)
                .set(relayer.registry.migrated_count() as i64);
        }

        let mut buf = String::new();
        encode(&mut buf, &self.registry)?;
        Ok(buf)
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
